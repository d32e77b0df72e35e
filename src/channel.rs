//! Channel and tick abstractions
//!
//! The core never touches pins or timers. A transmitter writes one logical
//! level per tick through a [`BitChannel`], a receiver reads one, and whatever
//! owns the bit clock calls [`TickHandler::on_tick`] once per bit interval.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

/// A one-wire binary channel
pub trait BitChannel {
    /// Sample the current input level
    fn read_bit(&mut self) -> bool;

    /// Drive the output level
    fn write_bit(&mut self, level: bool);
}

impl<C: BitChannel + ?Sized> BitChannel for &mut C {
    fn read_bit(&mut self) -> bool {
        (**self).read_bit()
    }

    fn write_bit(&mut self, level: bool) {
        (**self).write_bit(level)
    }
}

/// Something driven by the periodic bit clock
///
/// Each call must finish in O(1) without blocking: the next tick arrives on
/// schedule whether or not the previous one is done.
pub trait TickHandler {
    /// What one tick reports back
    type Output;

    /// Advance by one bit interval
    fn on_tick(&mut self) -> Self::Output;
}

/// A single shared light level
///
/// Clones share the same cell, so one end can be handed to a transmitter and
/// another to a receiver on the same thread.
#[derive(Debug, Clone, Default)]
pub struct LoopbackChannel {
    level: Rc<Cell<bool>>,
}

impl LoopbackChannel {
    /// Create a channel idling low
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level without going through the channel interface
    pub fn level(&self) -> bool {
        self.level.get()
    }

    /// Force the level, e.g. to inject a fault between write and read
    pub fn set_level(&self, level: bool) {
        self.level.set(level)
    }
}

impl BitChannel for LoopbackChannel {
    fn read_bit(&mut self) -> bool {
        self.level.get()
    }

    fn write_bit(&mut self, level: bool) {
        self.level.set(level)
    }
}

/// A channel fed from a prepared bit script that records what is written
///
/// Reads past the end of the script return the idle level (low).
#[derive(Debug, Clone, Default)]
pub struct ScriptedChannel {
    input: VecDeque<bool>,
    written: Vec<bool>,
}

impl ScriptedChannel {
    /// Create a channel that will deliver `input` one bit per read
    pub fn new(input: impl IntoIterator<Item = bool>) -> Self {
        ScriptedChannel {
            input: input.into_iter().collect(),
            written: Vec::new(),
        }
    }

    /// Append more bits to the script
    pub fn feed(&mut self, bits: impl IntoIterator<Item = bool>) {
        self.input.extend(bits);
    }

    /// Bits not yet read
    pub fn remaining(&self) -> usize {
        self.input.len()
    }

    /// Everything written so far
    pub fn written(&self) -> &[bool] {
        &self.written
    }
}

impl BitChannel for ScriptedChannel {
    fn read_bit(&mut self) -> bool {
        self.input.pop_front().unwrap_or(false)
    }

    fn write_bit(&mut self, level: bool) {
        self.written.push(level);
    }
}
