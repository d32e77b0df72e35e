//! Manchester chip encoding and decoding for the light channel
//!
//! Each logical bit `b` is sent as the chip pair `(!b, b)`: a 1 is a
//! low-to-high transition `(0, 1)` and a 0 is high-to-low `(1, 0)`.

use crate::error::{LinkError, Result};

/// How the decoder treats chip pairs outside `{(0,1), (1,0)}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChipPolicy {
    /// Reject the frame with `LinkError::InvalidChip`
    Strict,
    /// Decode `(0,1)` as 1 and anything else as 0, reporting the glitch
    ///
    /// This matches what deployed receivers put on the payload, and lets a
    /// single damaged chip fall through to Hamming correction.
    #[default]
    Lenient,
}

/// One demodulated logical bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipDecode {
    /// The logical bit
    pub bit: bool,
    /// The chip pair was invalid and `bit` is the lenient fallback
    pub glitch: bool,
}

/// Manchester encoder
pub struct ManchesterEncoder;

impl ManchesterEncoder {
    /// Encode a single bit into its chip pair
    ///
    /// 0 = high-to-low transition (1, 0)
    /// 1 = low-to-high transition (0, 1)
    pub fn encode_bit(bit: bool) -> (bool, bool) {
        (!bit, bit)
    }

    /// Encode the low `count` bits of `value`, most significant first, into
    /// `2 * count` chips at the start of `out`
    ///
    /// `count` is capped at 16; chips past the end of `out` are not written.
    pub fn encode_bits(value: u16, count: usize, out: &mut [bool]) {
        let count = count.min(u16::BITS as usize);
        for (i, chips) in out.chunks_exact_mut(2).take(count).enumerate() {
            let bit = (value >> (count - 1 - i)) & 1 != 0;
            let (first, second) = Self::encode_bit(bit);
            chips[0] = first;
            chips[1] = second;
        }
    }
}

/// Manchester decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct ManchesterDecoder {
    policy: ChipPolicy,
}

impl ManchesterDecoder {
    /// Create a decoder with the given invalid-chip policy
    pub fn new(policy: ChipPolicy) -> Self {
        ManchesterDecoder { policy }
    }

    /// The decoder's invalid-chip policy
    pub fn policy(&self) -> ChipPolicy {
        self.policy
    }

    /// Decode a chip pair, returning `None` for an invalid pair
    pub fn decode_bit(first: bool, second: bool) -> Option<bool> {
        match (first, second) {
            (false, true) => Some(true),
            (true, false) => Some(false),
            _ => None,
        }
    }

    /// Decode a chip pair under this decoder's policy
    ///
    /// `position` is the frame index of the first chip, used for reporting.
    pub fn decode_pair(&self, first: bool, second: bool, position: usize) -> Result<ChipDecode> {
        match Self::decode_bit(first, second) {
            Some(bit) => Ok(ChipDecode { bit, glitch: false }),
            None => match self.policy {
                ChipPolicy::Strict => Err(LinkError::invalid_chip(position, first, second)),
                ChipPolicy::Lenient => Ok(ChipDecode {
                    bit: !first && second,
                    glitch: true,
                }),
            },
        }
    }

    /// Decode `chips.len() / 2` bits, most significant first
    ///
    /// Returns the bits and a mask of those that came from invalid pairs.
    /// `offset` is the frame index of `chips[0]`.
    pub fn decode_bits(&self, chips: &[bool], offset: usize) -> Result<(u16, u16)> {
        let mut value = 0u16;
        let mut glitches = 0u16;

        for (i, pair) in chips.chunks_exact(2).enumerate() {
            let decoded = self.decode_pair(pair[0], pair[1], offset + 2 * i)?;
            value = (value << 1) | decoded.bit as u16;
            glitches = (glitches << 1) | decoded.glitch as u16;
        }

        Ok((value, glitches))
    }
}
