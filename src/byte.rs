//! Byte-level Hamming coding: one source byte travels as two Hamming words

use crate::core::{ErrorMask, HammingWord, Nibble, Payload};
use crate::hamming::{hamming_decode_nibble, hamming_encode_nibble};

/// Result of decoding one payload back into a byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ByteDecode {
    /// The recovered byte (best effort when `uncorrectable`)
    pub byte: u8,
    /// Payload bits changed by correction
    pub mask: ErrorMask,
    /// At least one of the two words carried a double error
    pub uncorrectable: bool,
}

impl ByteDecode {
    /// True if correction changed any payload bit
    pub fn corrected(&self) -> bool {
        !self.mask.is_empty()
    }
}

/// Encode a byte into a 16-bit payload
///
/// The low nibble goes into the high-order word and the high nibble into the
/// low-order word. Receivers depend on this order.
pub fn byte_encode(byte: u8) -> Payload {
    Payload::from_words(
        hamming_encode_nibble(Nibble::low_of(byte)),
        hamming_encode_nibble(Nibble::high_of(byte)),
    )
}

/// Decode two received Hamming words into a byte
///
/// `low` is the word carrying the byte's low nibble (the payload's high byte),
/// `high` the word carrying its high nibble.
pub fn byte_decode(low: HammingWord, high: HammingWord) -> ByteDecode {
    let low_decoded = hamming_decode_nibble(low);
    let high_decoded = hamming_decode_nibble(high);

    let received = Payload::from_words(low, high);
    let corrected = Payload::from_words(low_decoded.word, high_decoded.word);

    ByteDecode {
        byte: (high_decoded.nibble.value() << 4) | low_decoded.nibble.value(),
        mask: ErrorMask::between(received, corrected),
        uncorrectable: low_decoded.uncorrectable || high_decoded.uncorrectable,
    }
}

impl Payload {
    /// Decode this payload back into a byte
    pub fn decode(&self) -> ByteDecode {
        byte_decode(self.high_word(), self.low_word())
    }
}
