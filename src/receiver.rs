//! Tick-driven frame receiver
//!
//! The receiver hunts for the `0,1,0,1` start sentinel in an unsynchronized
//! bit stream, captures the rest of the 44-bit frame once locked, and then
//! holds the frame until the caller decodes it and calls [`Receiver::reset`].
//! It never restarts on its own, so a slow consumer cannot lose a frame
//! without noticing.

use crate::byte::{byte_decode, ByteDecode};
use crate::channel::{BitChannel, TickHandler};
use crate::config::LinkConfig;
use crate::core::{ErrorMask, Payload};
use crate::error::Result;
use crate::frame::{Frame, FrameCodec};
use crate::wire::{FRAME_BITS, START_SENTINEL};

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Receiver state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxState {
    /// Looking for the start sentinel; holds the number of sentinel bits
    /// matched so far (0-3)
    Hunting(usize),
    /// Locked; holds the frame index the next bit is stored at (4-43)
    Capturing(usize),
    /// A complete frame is waiting to be taken
    Ready,
}

/// What a receiver tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxTick {
    /// Still looking for a sentinel
    Hunting,
    /// The start sentinel just completed
    Synchronized,
    /// One frame bit was stored
    Capturing,
    /// A sentinel bit was wrong mid-capture; hunting again
    SyncLost,
    /// The last frame bit was stored
    FrameReady,
    /// A frame is waiting; the channel was not sampled
    Holding,
}

/// A decoded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reception {
    /// The recovered byte
    pub byte: u8,
    /// Payload bits fixed by Hamming correction
    pub mask: ErrorMask,
    /// A Hamming word had a double error; `byte` is a best guess
    pub uncorrectable: bool,
    /// Payload bits demodulated from invalid chip pairs
    pub glitches: u16,
    /// The payload as received, before correction
    pub payload: Payload,
    /// The raw frame
    pub frame: Frame,
}

/// Running counters kept by a receiver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReceiverStats {
    /// Frames captured to completion
    pub frames_captured: u64,
    /// Captures abandoned on a bad sentinel bit
    pub sync_losses: u64,
    /// Frames decoded into a byte
    pub frames_decoded: u64,
    /// Decoded frames that needed correction
    pub frames_corrected: u64,
    /// Decoded frames with an uncorrectable word
    pub frames_uncorrectable: u64,
    /// Frames rejected by the frame codec
    pub frame_errors: u64,
    /// Ticks that arrived while a frame was waiting to be taken
    pub held_ticks: u64,
}

/// Samples one channel bit per tick and assembles frames
#[derive(Debug)]
pub struct Receiver<C> {
    channel: C,
    buffer: [bool; FRAME_BITS],
    state: RxState,
    codec: FrameCodec,
    resync_on_sentinel_error: bool,
    stats: ReceiverStats,
    /// The held frame has already been counted by `decode`
    counted: bool,
}

impl<C: BitChannel> Receiver<C> {
    /// Create a receiver with the default configuration
    pub fn new(channel: C) -> Self {
        Self::with_config(channel, &LinkConfig::default())
    }

    /// Create a receiver using the chip policy and resync behavior of `config`
    pub fn with_config(channel: C, config: &LinkConfig) -> Self {
        Receiver {
            channel,
            buffer: [false; FRAME_BITS],
            state: RxState::Hunting(0),
            codec: FrameCodec::new(config.chip_policy),
            resync_on_sentinel_error: config.resync_on_sentinel_error,
            stats: ReceiverStats::default(),
            counted: false,
        }
    }

    /// Current state
    pub fn state(&self) -> RxState {
        self.state
    }

    /// True once a complete frame is held
    pub fn is_ready(&self) -> bool {
        self.state == RxState::Ready
    }

    /// Counters since creation
    pub fn stats(&self) -> &ReceiverStats {
        &self.stats
    }

    /// Borrow the channel
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Mutably borrow the channel
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// The captured frame, once ready
    ///
    /// The frame stays held; only [`Receiver::reset`] releases it.
    #[doc(alias = "take_frame")]
    pub fn held_frame(&self) -> Option<Frame> {
        match self.state {
            RxState::Ready => Some(Frame::from_bits(self.buffer)),
            _ => None,
        }
    }

    /// Decode the held frame
    ///
    /// Returns `Ok(None)` when no frame is ready. Frame-level failures are
    /// returned as errors; in either case the frame stays held until
    /// [`Receiver::reset`]. Decoding the same held frame again gives the same
    /// result and leaves the stats alone.
    pub fn decode(&mut self) -> Result<Option<Reception>> {
        let frame = match self.held_frame() {
            Some(frame) => frame,
            None => return Ok(None),
        };
        let first = !self.counted;
        self.counted = true;

        let demodulated = match self.codec.decode(&frame) {
            Ok(demodulated) => demodulated,
            Err(e) => {
                if first {
                    #[cfg(feature = "logging")]
                    warn!("Dropping frame {}: {}", frame, e);

                    self.stats.frame_errors += 1;
                }
                return Err(e);
            }
        };

        let payload = demodulated.payload;
        let decoded = byte_decode(payload.high_word(), payload.low_word());

        if first {
            self.record(payload, &decoded);
        }

        Ok(Some(Reception {
            byte: decoded.byte,
            mask: decoded.mask,
            uncorrectable: decoded.uncorrectable,
            glitches: demodulated.glitches,
            payload,
            frame,
        }))
    }

    /// Drop any partial or held frame and start hunting again
    pub fn reset(&mut self) {
        self.state = RxState::Hunting(0);
        self.counted = false;
    }

    #[cfg_attr(not(feature = "logging"), allow(unused_variables))]
    fn record(&mut self, payload: Payload, decoded: &ByteDecode) {
        self.stats.frames_decoded += 1;
        if decoded.uncorrectable {
            self.stats.frames_uncorrectable += 1;

            #[cfg(feature = "logging")]
            warn!(
                "Uncorrectable payload {} (best guess 0x{:02X})",
                payload, decoded.byte
            );
        } else if decoded.corrected() {
            self.stats.frames_corrected += 1;

            #[cfg(feature = "logging")]
            debug!("Corrected payload {} with mask {}", payload, decoded.mask);
        }
    }

    fn hunt(&mut self, matched: usize, bit: bool) -> RxTick {
        if bit != START_SENTINEL[matched] {
            self.state = RxState::Hunting(Self::restart(bit));
            return RxTick::Hunting;
        }

        let matched = matched + 1;
        if matched < START_SENTINEL.len() {
            self.state = RxState::Hunting(matched);
            return RxTick::Hunting;
        }

        self.buffer[..START_SENTINEL.len()].copy_from_slice(&START_SENTINEL);
        self.state = RxState::Capturing(START_SENTINEL.len());

        #[cfg(feature = "logging")]
        debug!("Start sentinel found, capturing frame");

        RxTick::Synchronized
    }

    fn capture(&mut self, position: usize, bit: bool) -> RxTick {
        if self.resync_on_sentinel_error
            && Frame::expected_sentinel(position).is_some_and(|expected| expected != bit)
        {
            self.stats.sync_losses += 1;
            self.state = RxState::Hunting(Self::restart(bit));

            #[cfg(feature = "logging")]
            warn!("Sentinel mismatch at frame bit {}, resynchronizing", position);

            return RxTick::SyncLost;
        }

        self.buffer[position] = bit;

        if position + 1 < FRAME_BITS {
            self.state = RxState::Capturing(position + 1);
            return RxTick::Capturing;
        }

        self.state = RxState::Ready;
        self.stats.frames_captured += 1;

        #[cfg(feature = "logging")]
        debug!("Frame captured ({} total)", self.stats.frames_captured);

        RxTick::FrameReady
    }

    /// Hunting state after a mismatch: the offending bit may itself open a
    /// new sentinel
    fn restart(bit: bool) -> usize {
        if bit == START_SENTINEL[0] {
            1
        } else {
            0
        }
    }
}

impl<C: BitChannel> TickHandler for Receiver<C> {
    type Output = RxTick;

    fn on_tick(&mut self) -> RxTick {
        match self.state {
            RxState::Ready => {
                self.stats.held_ticks += 1;
                RxTick::Holding
            }
            RxState::Hunting(matched) => {
                let bit = self.channel.read_bit();
                self.hunt(matched, bit)
            }
            RxState::Capturing(position) => {
                let bit = self.channel.read_bit();
                self.capture(position, bit)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte::byte_encode;
    use crate::channel::ScriptedChannel;
    use crate::encoding::ChipPolicy;
    use crate::error::LinkError;
    use crate::frame::frame_encode;

    fn receiver_for(bits: impl IntoIterator<Item = bool>) -> Receiver<ScriptedChannel> {
        Receiver::new(ScriptedChannel::new(bits))
    }

    fn run_until_ready<C: BitChannel>(rx: &mut Receiver<C>, max_ticks: usize) -> bool {
        for _ in 0..max_ticks {
            if rx.on_tick() == RxTick::FrameReady {
                return true;
            }
        }
        false
    }

    #[test]
    fn test_captures_clean_frame() {
        let frame = frame_encode(byte_encode(0x41));
        let mut rx = receiver_for(frame.bits().iter().copied());

        assert!(run_until_ready(&mut rx, FRAME_BITS));
        assert_eq!(rx.held_frame(), Some(frame));

        let reception = rx.decode().unwrap().unwrap();
        assert_eq!(reception.byte, 0x41);
        assert!(reception.mask.is_empty());
        assert!(!reception.uncorrectable);
        assert_eq!(rx.stats().frames_decoded, 1);
    }

    #[test]
    fn test_hunting_states() {
        let mut rx = receiver_for([true, false, false, true, false, true]);
        rx.on_tick();
        assert_eq!(rx.state(), RxState::Hunting(0));
        rx.on_tick();
        assert_eq!(rx.state(), RxState::Hunting(1));
        // A second 0 keeps the partial match
        rx.on_tick();
        assert_eq!(rx.state(), RxState::Hunting(1));
        rx.on_tick();
        assert_eq!(rx.state(), RxState::Hunting(2));
        rx.on_tick();
        assert_eq!(rx.state(), RxState::Hunting(3));
        assert_eq!(rx.on_tick(), RxTick::Synchronized);
        assert_eq!(rx.state(), RxState::Capturing(4));
    }

    #[test]
    fn test_noise_ending_in_zero_does_not_eat_sentinel() {
        let frame = frame_encode(byte_encode(0x7E));
        let noise = [true, true, false, false];
        let mut rx = receiver_for(noise.into_iter().chain(frame.bits().iter().copied()));

        assert!(run_until_ready(&mut rx, noise.len() + FRAME_BITS));
        assert_eq!(rx.held_frame(), Some(frame));
    }

    #[test]
    fn test_holds_frame_until_reset() {
        let first = frame_encode(byte_encode(0x10));
        let second = frame_encode(byte_encode(0x20));
        let mut rx = receiver_for(first.bits().iter().chain(second.bits().iter()).copied());

        assert!(run_until_ready(&mut rx, FRAME_BITS));
        assert_eq!(rx.on_tick(), RxTick::Holding);
        assert_eq!(rx.held_frame(), Some(first));
        assert_eq!(rx.stats().held_ticks, 1);

        // The held tick did not consume a channel bit
        rx.reset();
        assert!(run_until_ready(&mut rx, FRAME_BITS));
        assert_eq!(rx.decode().unwrap().unwrap().byte, 0x20);
    }

    #[test]
    fn test_held_frame_before_ready() {
        let mut rx = receiver_for([false, true]);
        rx.on_tick();
        assert_eq!(rx.held_frame(), None);
        assert_eq!(rx.decode(), Ok(None));
    }

    #[test]
    fn test_repeated_decode_counts_once() {
        let frame = frame_encode(byte_encode(0x41)).with_flipped(6);
        let mut rx = receiver_for(frame.bits().iter().copied());

        assert!(run_until_ready(&mut rx, FRAME_BITS));
        let first = rx.decode().unwrap();
        let second = rx.decode().unwrap();
        assert_eq!(first, second);
        assert_eq!(rx.stats().frames_decoded, 1);
        assert_eq!(rx.stats().frames_corrected, 1);
        assert_eq!(rx.stats().frames_uncorrectable, 0);
    }

    #[test]
    fn test_repeated_failed_decode_counts_once() {
        let config = LinkConfig {
            chip_policy: ChipPolicy::Strict,
            ..LinkConfig::default()
        };
        let bad = frame_encode(byte_encode(0x41)).with_flipped(6);
        let good = frame_encode(byte_encode(0x42));
        let channel = ScriptedChannel::new(bad.bits().iter().chain(good.bits().iter()).copied());
        let mut rx = Receiver::with_config(channel, &config);

        assert!(run_until_ready(&mut rx, FRAME_BITS));
        assert!(rx.decode().is_err());
        assert!(rx.decode().is_err());
        assert_eq!(rx.stats().frame_errors, 1);

        // A new capture is counted again
        rx.reset();
        assert!(run_until_ready(&mut rx, FRAME_BITS));
        assert_eq!(rx.decode().unwrap().unwrap().byte, 0x42);
        assert_eq!(rx.stats().frames_decoded, 1);
        assert_eq!(rx.stats().frame_errors, 1);
    }

    #[test]
    fn test_reset_mid_capture_discards_partial_frame() {
        let first = frame_encode(byte_encode(0x11));
        let second = frame_encode(byte_encode(0x22));
        let stream = first.bits()[..20]
            .iter()
            .chain(second.bits().iter())
            .copied();
        let mut rx = receiver_for(stream);

        for _ in 0..20 {
            rx.on_tick();
        }
        assert_eq!(rx.state(), RxState::Capturing(20));

        rx.reset();
        assert_eq!(rx.state(), RxState::Hunting(0));
        assert_eq!(rx.held_frame(), None);

        assert!(run_until_ready(&mut rx, FRAME_BITS));
        assert_eq!(rx.held_frame(), Some(second));
        assert_eq!(rx.decode().unwrap().unwrap().byte, 0x22);
        assert_eq!(rx.stats().frames_captured, 1);
        assert_eq!(rx.stats().sync_losses, 0);
    }

    #[test]
    fn test_bad_stop_sentinel_resynchronizes() {
        let frame = frame_encode(byte_encode(0x33)).with_flipped(20);
        let clean = frame_encode(byte_encode(0x44));
        let mut rx = receiver_for(
            frame
                .bits()
                .iter()
                .chain([true, true].iter())
                .chain(clean.bits().iter())
                .copied(),
        );

        assert!(run_until_ready(&mut rx, 2 * FRAME_BITS + 2));
        assert!(rx.stats().sync_losses >= 1);
        assert_eq!(rx.decode().unwrap().unwrap().byte, 0x44);
    }

    #[test]
    fn test_without_resync_bad_sentinel_reported_on_decode() {
        let config = LinkConfig {
            resync_on_sentinel_error: false,
            ..LinkConfig::default()
        };
        let frame = frame_encode(byte_encode(0x33)).with_flipped(43);
        let channel = ScriptedChannel::new(frame.bits().iter().copied());
        let mut rx = Receiver::with_config(channel, &config);

        assert!(run_until_ready(&mut rx, FRAME_BITS));
        assert_eq!(rx.decode(), Err(LinkError::bad_sentinel(43)));
        assert_eq!(rx.stats().frame_errors, 1);
        assert!(rx.is_ready());
    }

    #[test]
    fn test_corrects_flipped_chip() {
        let frame = frame_encode(byte_encode(0x41)).with_flipped(6);
        let mut rx = receiver_for(frame.bits().iter().copied());

        assert!(run_until_ready(&mut rx, FRAME_BITS));
        let reception = rx.decode().unwrap().unwrap();
        assert_eq!(reception.byte, 0x41);
        assert!(!reception.uncorrectable);
        assert_ne!(reception.glitches, 0);
    }

    #[test]
    fn test_strict_receiver_rejects_glitch() {
        let config = LinkConfig {
            chip_policy: ChipPolicy::Strict,
            ..LinkConfig::default()
        };
        let frame = frame_encode(byte_encode(0x41)).with_flipped(6);
        let channel = ScriptedChannel::new(frame.bits().iter().copied());
        let mut rx = Receiver::with_config(channel, &config);

        assert!(run_until_ready(&mut rx, FRAME_BITS));
        assert!(matches!(
            rx.decode(),
            Err(LinkError::InvalidChip { position: 6, .. })
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_reception_serde() {
        let frame = frame_encode(byte_encode(0x41)).with_flipped(6);
        let mut rx = receiver_for(frame.bits().iter().copied());

        assert!(run_until_ready(&mut rx, FRAME_BITS));
        let reception = rx.decode().unwrap().unwrap();
        let json = serde_json::to_string(&reception).unwrap();
        assert_eq!(serde_json::from_str::<Reception>(&json).unwrap(), reception);
    }
}
