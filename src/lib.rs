//! # optolink
//!
//! Codec and tick-driven transceiver for a single-bit optical link.
//!
//! One byte travels per 44-bit frame: the byte is split into two nibbles, each
//! nibble is protected with a Hamming(7,4) code plus an even parity bit, and
//! the resulting 16-bit payload is Manchester encoded into two sentinel-framed
//! sub-frames. The receiver locks onto the start sentinel in an unsynchronized
//! bit stream, captures the frame one bit per tick, corrects any single bit
//! error per Hamming word and flags double errors.
//!
//! Hardware stays outside the crate: a [`BitChannel`] reads and writes the
//! light level and whatever owns the bit clock calls [`TickHandler::on_tick`].
//!
//! ## Features
//!
//! - `logging` (default): emit `tracing` events on sync, capture and decode
//! - `serde`: Enable serialization/deserialization support
//!
//! ## Example
//!
//! ```
//! use optolink::{byte_decode, byte_encode, frame_decode, frame_encode};
//!
//! let frame = frame_encode(byte_encode(b'A'));
//! let payload = frame_decode(&frame.with_flipped(6))?;
//! let decoded = byte_decode(payload.high_word(), payload.low_word());
//!
//! assert_eq!(decoded.byte, b'A');
//! assert!(!decoded.uncorrectable);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod byte;
pub mod channel;
pub mod config;
pub mod core;
pub mod encoding;
pub mod error;
pub mod frame;
pub mod hamming;
pub mod link;
pub mod receiver;
pub mod transmitter;

pub use byte::{byte_decode, byte_encode, ByteDecode};
pub use channel::{BitChannel, LoopbackChannel, ScriptedChannel, TickHandler};
pub use config::{LinkConfig, LinkConfigBuilder};
pub use crate::core::{ErrorMask, HammingWord, Nibble, Payload};
pub use encoding::ChipPolicy;
pub use error::{LinkError, Result};
pub use frame::{frame_decode, frame_encode, Frame, FrameCodec};
pub use hamming::{hamming_decode_nibble, hamming_encode_nibble, NibbleDecode};
pub use link::SimulatedLink;
pub use receiver::{Receiver, Reception, RxState, RxTick};
pub use transmitter::{Transmitter, TxState, TxTick};

/// Wire format constants
pub mod wire {
    /// Channel bits per frame
    pub const FRAME_BITS: usize = 44;

    /// Channel bits per sub-frame
    pub const SUB_FRAME_BITS: usize = FRAME_BITS / 2;

    /// Payload bits carried by each sub-frame
    pub const BITS_PER_SUB_FRAME: usize = 8;

    /// Manchester uses 2 chips per bit
    pub const CHIPS_PER_BIT: usize = 2;

    /// Opens each sub-frame
    pub const START_SENTINEL: [bool; 4] = [false, true, false, true];

    /// Closes each sub-frame
    pub const STOP_SENTINEL: [bool; 2] = [true, false];

    /// Default tick rate in bits per second
    pub const DEFAULT_BIT_RATE: u32 = 1_000;

    /// Highest tick rate with a non-zero nanosecond tick period
    pub const MAX_BIT_RATE: u32 = 1_000_000_000;
}
