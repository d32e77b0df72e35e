//! Core value types for the optical link
//!
//! Every type here is a small `Copy` value created and consumed inside a
//! single encode or decode call.

use bitfield::bitfield;

use crate::error::{LinkError, Result};

/// A 4-bit data value (0-15)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Nibble(u8);

impl Nibble {
    /// Maximum nibble value
    pub const MAX: u8 = 0x0F;

    /// Create a new nibble, validating it's within range [0, 15]
    pub fn new(value: u8) -> Result<Self> {
        if value > Self::MAX {
            return Err(LinkError::InvalidNibble(value));
        }
        Ok(Nibble(value))
    }

    /// Take the low four bits of a byte
    pub fn low_of(byte: u8) -> Self {
        Nibble(byte & Self::MAX)
    }

    /// Take the high four bits of a byte
    pub fn high_of(byte: u8) -> Self {
        Nibble(byte >> 4)
    }

    /// Get the raw nibble value
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Data bit `d<index>` (bit 0 is the least significant)
    pub fn bit(&self, index: u8) -> bool {
        (self.0 >> index) & 1 != 0
    }
}

impl std::fmt::Display for Nibble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

bitfield! {
    /// An 8-bit Hamming(7,4) code word with an even parity bit
    ///
    /// Layout, most significant bit first: `[p0 h0 h1 h2 d0 d1 d2 d3]`.
    /// Bit 7 is the parity over bits 0-6, bits 6-4 are the Hamming check
    /// bits and bits 3-0 carry the data with `d0` at bit 3.
    #[derive(Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct HammingWord(u8);
    impl Debug;
    u8, parity_bit, set_parity_bit: 7, 7;
    pub u8, check_bits, set_check_bits: 6, 4;
    pub u8, data_bits, set_data_bits: 3, 0;
    pub u8, code, set_code: 6, 0;
}

impl HammingWord {
    /// Bit position of the parity bit
    pub const PARITY_POSITION: u8 = 7;

    /// Wrap a raw received byte
    pub fn from_bits(raw: u8) -> Self {
        HammingWord(raw)
    }

    /// Assemble a word from its 7-bit code; the parity bit is computed
    pub fn from_code(code: u8) -> Self {
        let mut word = HammingWord(0);
        word.set_code(code & 0x7F);
        word.set_parity_bit(word.code_parity() as u8);
        word
    }

    /// Get the raw byte
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Stored parity bit `p0`
    pub fn parity(&self) -> bool {
        self.parity_bit() != 0
    }

    /// Even parity (XOR reduction) of the 7 code bits
    pub fn code_parity(&self) -> bool {
        self.code().count_ones() % 2 != 0
    }

    /// Check bit `h<index>` (index 0-2)
    pub fn check(&self, index: u8) -> bool {
        (self.check_bits() >> (2 - index)) & 1 != 0
    }

    /// Data bit `d<index>` (index 0-3), which is nibble bit `index`
    pub fn data(&self, index: u8) -> bool {
        (self.data_bits() >> (3 - index)) & 1 != 0
    }

    /// The data bits as a nibble
    pub fn nibble(&self) -> Nibble {
        let value = (0..4).fold(0u8, |acc, i| acc | ((self.data(i) as u8) << i));
        Nibble(value)
    }

    /// Copy of this word with one bit (0-7) inverted
    pub fn with_flipped(&self, position: u8) -> Self {
        HammingWord(self.0 ^ (1 << (position & 7)))
    }
}

impl std::fmt::Display for HammingWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08b}", self.0)
    }
}

/// Two Hamming words carrying one source byte, high byte first
///
/// The high byte encodes the low nibble of the source byte, the low byte
/// encodes the high nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Payload(u16);

impl Payload {
    /// Wrap a raw 16-bit payload
    pub fn new(raw: u16) -> Self {
        Payload(raw)
    }

    /// Concatenate two Hamming words
    pub fn from_words(high: HammingWord, low: HammingWord) -> Self {
        Payload(((high.bits() as u16) << 8) | low.bits() as u16)
    }

    /// Get the raw payload value
    pub fn value(&self) -> u16 {
        self.0
    }

    /// Word in the high byte (carries the source byte's low nibble)
    pub fn high_word(&self) -> HammingWord {
        HammingWord((self.0 >> 8) as u8)
    }

    /// Word in the low byte (carries the source byte's high nibble)
    pub fn low_word(&self) -> HammingWord {
        HammingWord(self.0 as u8)
    }

    /// Payload bit `index` (0 is the least significant)
    pub fn bit(&self, index: usize) -> bool {
        (self.0 >> index) & 1 != 0
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Payload(0x{:04X})", self.0)
    }
}

/// Payload bits changed by error correction
///
/// Bit `i` is set when payload bit `i` differed between the received and the
/// corrected payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorMask(u16);

impl ErrorMask {
    /// Mask with no bits set
    pub const NONE: ErrorMask = ErrorMask(0);

    /// Wrap a raw mask
    pub fn new(raw: u16) -> Self {
        ErrorMask(raw)
    }

    /// Difference between a received and a corrected payload
    pub fn between(received: Payload, corrected: Payload) -> Self {
        ErrorMask(received.value() ^ corrected.value())
    }

    /// Get the raw mask value
    pub fn value(&self) -> u16 {
        self.0
    }

    /// True if no bit was corrected
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of corrected payload bits
    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Whether payload bit `index` was corrected
    pub fn contains(&self, index: usize) -> bool {
        index < 16 && (self.0 >> index) & 1 != 0
    }

    /// Corrected payload bit positions, lowest first
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        (0..16).filter(move |&i| self.contains(i))
    }
}

impl std::fmt::Display for ErrorMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016b}", self.0)
    }
}
