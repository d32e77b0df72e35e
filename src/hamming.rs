//! Hamming(7,4) code with an overall even parity bit
//!
//! Generator, with data bits `d0..d3` on the rows and `[h0 h1 h2 | d0 d1 d2 d3]`
//! on the columns:
//!
//! ```text
//! G = [ 1 1 1 | 1 0 0 0
//!       1 1 0 | 0 1 0 0
//!       1 0 1 | 0 0 1 0
//!       0 1 1 | 0 0 0 1 ]
//! ```
//!
//! The parity bit `p0` sits above the 7-bit code word and makes its weight
//! even. A single flipped bit anywhere in the 8-bit word is corrected; two
//! flipped bits are detected and reported as uncorrectable.

use crate::core::{HammingWord, Nibble};

/// The 3-bit syndrome `(s0, s1, s2)` of a received word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Syndrome {
    /// `h0 ^ d0 ^ d1 ^ d2`
    pub s0: bool,
    /// `h1 ^ d0 ^ d1 ^ d3`
    pub s1: bool,
    /// `h2 ^ d0 ^ d2 ^ d3`
    pub s2: bool,
}

impl Syndrome {
    /// Compute the syndrome of a received word
    pub fn from_word(word: HammingWord) -> Self {
        let (d0, d1, d2, d3) = (word.data(0), word.data(1), word.data(2), word.data(3));
        Syndrome {
            s0: word.check(0) ^ d0 ^ d1 ^ d2,
            s1: word.check(1) ^ d0 ^ d1 ^ d3,
            s2: word.check(2) ^ d0 ^ d2 ^ d3,
        }
    }

    /// True if the check bits agree with the data bits
    pub fn is_zero(&self) -> bool {
        !(self.s0 || self.s1 || self.s2)
    }

    /// Position in the 7-bit code word (0 = `d3` ... 6 = `h0`) that this
    /// syndrome points at, or `None` for the zero syndrome
    pub fn error_position(&self) -> Option<u8> {
        match (self.s0, self.s1, self.s2) {
            (true, false, false) => Some(6),  // h0
            (false, true, false) => Some(5),  // h1
            (false, false, true) => Some(4),  // h2
            (true, true, true) => Some(3),    // d0
            (true, true, false) => Some(2),   // d1
            (true, false, true) => Some(1),   // d2
            (false, true, true) => Some(0),   // d3
            (false, false, false) => None,
        }
    }
}

/// Result of decoding one Hamming word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NibbleDecode {
    /// Decoded data (best effort when `uncorrectable`)
    pub nibble: Nibble,
    /// The word after correction
    pub word: HammingWord,
    /// A bit was flipped back
    pub corrected: bool,
    /// Two or more bits were damaged
    pub uncorrectable: bool,
}

impl NibbleDecode {
    /// True if the word arrived intact
    pub fn is_clean(&self) -> bool {
        !self.corrected && !self.uncorrectable
    }
}

/// Encode a nibble into an 8-bit Hamming word
pub fn hamming_encode_nibble(nibble: Nibble) -> HammingWord {
    let (d0, d1, d2, d3) = (nibble.bit(0), nibble.bit(1), nibble.bit(2), nibble.bit(3));

    let h0 = d0 ^ d1 ^ d2;
    let h1 = d0 ^ d1 ^ d3;
    let h2 = d0 ^ d2 ^ d3;

    let code = (h0 as u8) << 6
        | (h1 as u8) << 5
        | (h2 as u8) << 4
        | (d0 as u8) << 3
        | (d1 as u8) << 2
        | (d2 as u8) << 1
        | d3 as u8;

    HammingWord::from_code(code)
}

/// Decode an 8-bit Hamming word, correcting a single bit error
pub fn hamming_decode_nibble(word: HammingWord) -> NibbleDecode {
    let syndrome = Syndrome::from_word(word);

    let (fixed, uncorrectable) = match syndrome.error_position() {
        None if word.code_parity() != word.parity() => {
            // Only the parity bit itself is wrong
            (word.with_flipped(HammingWord::PARITY_POSITION), false)
        }
        None => (word, false),
        Some(position) => {
            let fixed = word.with_flipped(position);
            // A second error leaves the repaired code with the wrong parity
            (fixed, fixed.code_parity() != word.parity())
        }
    };

    NibbleDecode {
        nibble: fixed.nibble(),
        word: fixed,
        corrected: fixed != word && !uncorrectable,
        uncorrectable,
    }
}
