//! A transmitter and a receiver joined by a loopback channel
//!
//! One tick source drives both ends: on every tick the transmitter writes its
//! bit first, an optional fault hook may disturb the light level, and then the
//! receiver samples it. This is the in-memory stand-in for a real optical
//! path and is what the end-to-end tests run against.

use crate::channel::{LoopbackChannel, TickHandler};
use crate::config::LinkConfig;
use crate::error::{LinkError, Result};
use crate::receiver::{Receiver, ReceiverStats, Reception, RxTick};
use crate::transmitter::{Transmitter, TxTick};

#[cfg(feature = "logging")]
use tracing::{debug, warn};

type FaultHook = Box<dyn FnMut(u64, bool) -> bool>;

/// Both ends of a link over one shared light level
pub struct SimulatedLink {
    transmitter: Transmitter<LoopbackChannel>,
    receiver: Receiver<LoopbackChannel>,
    line: LoopbackChannel,
    fault: Option<FaultHook>,
    ticks: u64,
}

impl SimulatedLink {
    /// Create a link with the given configuration
    pub fn new(config: &LinkConfig) -> Self {
        let line = LoopbackChannel::new();
        SimulatedLink {
            transmitter: Transmitter::new(line.clone()),
            receiver: Receiver::with_config(line.clone(), config),
            line,
            fault: None,
            ticks: 0,
        }
    }

    /// Install a fault hook
    ///
    /// The hook sees the tick number and the level just written and returns
    /// the level the receiver will sample.
    pub fn with_fault<F>(mut self, fault: F) -> Self
    where
        F: FnMut(u64, bool) -> bool + 'static,
    {
        self.fault = Some(Box::new(fault));
        self
    }

    /// Advance both ends by one bit interval
    pub fn tick(&mut self) -> (TxTick, RxTick) {
        let tx = self.transmitter.on_tick();

        if let Some(fault) = self.fault.as_mut() {
            let level = self.line.level();
            self.line.set_level(fault(self.ticks, level));
        }

        let rx = self.receiver.on_tick();
        self.ticks += 1;
        (tx, rx)
    }

    /// Let the line idle for `ticks` intervals
    pub fn idle(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Send one byte and wait up to `max_ticks` for the receiver to produce it
    ///
    /// The receiver is reset after every attempt, so a failed or timed-out
    /// frame never blocks the next one.
    pub fn send_byte(&mut self, byte: u8, max_ticks: usize) -> Result<Reception> {
        self.transmitter.load_byte(byte)?;

        #[cfg(feature = "logging")]
        debug!("Sending 0x{:02X}", byte);

        for _ in 0..max_ticks {
            if let (_, RxTick::FrameReady) = self.tick() {
                let reception = self.receiver.decode();
                self.receiver.reset();
                return reception?.ok_or(LinkError::Timeout { ticks: max_ticks });
            }
        }

        #[cfg(feature = "logging")]
        warn!("No frame after {} ticks", max_ticks);

        self.receiver.reset();
        Err(LinkError::Timeout { ticks: max_ticks })
    }

    /// Ticks elapsed since creation
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The transmitting end
    pub fn transmitter(&self) -> &Transmitter<LoopbackChannel> {
        &self.transmitter
    }

    /// The receiving end
    pub fn receiver(&self) -> &Receiver<LoopbackChannel> {
        &self.receiver
    }

    /// Receiver counters
    pub fn receiver_stats(&self) -> &ReceiverStats {
        self.receiver.stats()
    }
}

impl Default for SimulatedLink {
    fn default() -> Self {
        Self::new(&LinkConfig::default())
    }
}
