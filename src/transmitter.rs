//! Tick-driven frame transmitter

use crate::byte::byte_encode;
use crate::channel::{BitChannel, TickHandler};
use crate::error::{LinkError, Result};
use crate::frame::{frame_encode, Frame};
use crate::wire::FRAME_BITS;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Transmitter state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    /// Nothing to send; ticks leave the channel alone
    Idle,
    /// A frame is waiting for its first tick
    Loaded,
    /// Sending; holds the index of the next bit to write (1-43)
    Sending(usize),
}

/// What a transmitter tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxTick {
    /// No frame loaded
    Idle,
    /// One frame bit was written
    Sent,
    /// The last frame bit was written; the transmitter is idle again
    Completed,
}

/// Shifts one frame bit onto the channel per tick
#[derive(Debug)]
pub struct Transmitter<C> {
    channel: C,
    frame: Frame,
    state: TxState,
    frames_sent: u64,
}

impl<C: BitChannel> Transmitter<C> {
    /// Create an idle transmitter driving `channel`
    pub fn new(channel: C) -> Self {
        Transmitter {
            channel,
            frame: Frame::from_bits([false; FRAME_BITS]),
            state: TxState::Idle,
            frames_sent: 0,
        }
    }

    /// Queue a frame for sending
    ///
    /// Rejected with `LinkError::Busy` while a frame is on the wire. A frame
    /// that is loaded but not started yet is replaced.
    pub fn load(&mut self, frame: Frame) -> Result<()> {
        if let TxState::Sending(_position) = self.state {
            #[cfg(feature = "logging")]
            warn!("Load rejected: frame in flight at bit {}", _position);
            return Err(LinkError::Busy);
        }

        #[cfg(feature = "logging")]
        debug!("Frame loaded: {}", frame);

        self.frame = frame;
        self.state = TxState::Loaded;
        Ok(())
    }

    /// Encode a byte and queue its frame
    pub fn load_byte(&mut self, byte: u8) -> Result<Frame> {
        let frame = frame_encode(byte_encode(byte));
        self.load(frame)?;
        Ok(frame)
    }

    /// Current state
    pub fn state(&self) -> TxState {
        self.state
    }

    /// True while a frame is loaded or in flight
    pub fn is_busy(&self) -> bool {
        self.state != TxState::Idle
    }

    /// Frames completely sent since creation
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Borrow the channel
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Mutably borrow the channel
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Give the channel back
    pub fn into_channel(self) -> C {
        self.channel
    }

    fn send(&mut self, position: usize) -> TxTick {
        self.channel.write_bit(self.frame[position]);

        if position + 1 < FRAME_BITS {
            self.state = TxState::Sending(position + 1);
            return TxTick::Sent;
        }

        self.state = TxState::Idle;
        self.frames_sent += 1;

        #[cfg(feature = "logging")]
        debug!("Frame sent ({} total)", self.frames_sent);

        TxTick::Completed
    }
}

impl<C: BitChannel> TickHandler for Transmitter<C> {
    type Output = TxTick;

    fn on_tick(&mut self) -> TxTick {
        match self.state {
            TxState::Idle => TxTick::Idle,
            TxState::Loaded => self.send(0),
            TxState::Sending(position) => self.send(position),
        }
    }
}
