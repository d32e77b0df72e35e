//! The 44-bit Manchester frame and its codec
//!
//! A frame is two 22-bit sub-frames. Each sub-frame is a `0,1,0,1` start
//! sentinel, eight payload bits as 16 Manchester chips (most significant
//! first) and a `1,0` stop sentinel. The first sub-frame carries payload bits
//! 15-8, the second bits 7-0.

use crate::core::Payload;
use crate::encoding::{ChipPolicy, ManchesterDecoder, ManchesterEncoder};
use crate::error::{LinkError, Result};
use crate::wire::{
    BITS_PER_SUB_FRAME, CHIPS_PER_BIT, FRAME_BITS, START_SENTINEL, STOP_SENTINEL, SUB_FRAME_BITS,
};

const CHIPS_OFFSET: usize = START_SENTINEL.len();
const STOP_OFFSET: usize = CHIPS_OFFSET + BITS_PER_SUB_FRAME * CHIPS_PER_BIT;

/// One frame as it appears on the channel, one entry per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame([bool; FRAME_BITS]);

impl Frame {
    /// Wrap raw channel bits
    pub fn from_bits(bits: [bool; FRAME_BITS]) -> Self {
        Frame(bits)
    }

    /// The frame bits in transmission order
    pub fn bits(&self) -> &[bool; FRAME_BITS] {
        &self.0
    }

    /// Bit at `position`; positions past the end read as 0
    pub fn bit(&self, position: usize) -> bool {
        self.0.get(position).copied().unwrap_or(false)
    }

    /// Copy of this frame with one bit inverted
    pub fn with_flipped(&self, position: usize) -> Self {
        let mut bits = self.0;
        if let Some(bit) = bits.get_mut(position) {
            *bit = !*bit;
        }
        Frame(bits)
    }

    /// The sentinel bit a valid frame carries at `position`, or `None` for
    /// chip positions
    pub fn expected_sentinel(position: usize) -> Option<bool> {
        if position >= FRAME_BITS {
            return None;
        }
        match position % SUB_FRAME_BITS {
            p if p < CHIPS_OFFSET => Some(START_SENTINEL[p]),
            p if p >= STOP_OFFSET => Some(STOP_SENTINEL[p - STOP_OFFSET]),
            _ => None,
        }
    }

    /// Index of the first sentinel bit that does not match, if any
    pub fn sentinel_mismatch(&self) -> Option<usize> {
        (0..FRAME_BITS).find(|&position| {
            Frame::expected_sentinel(position).is_some_and(|expected| self.0[position] != expected)
        })
    }
}

impl std::ops::Index<usize> for Frame {
    type Output = bool;

    fn index(&self, position: usize) -> &bool {
        &self.0[position]
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &bit in self.0.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Frame {
    type Err = LinkError;

    /// Parse a string of `0` and `1`; `_` and whitespace are ignored
    fn from_str(s: &str) -> Result<Self> {
        let mut bits = [false; FRAME_BITS];
        let mut count = 0;

        for c in s.chars().filter(|c| *c != '_' && !c.is_whitespace()) {
            let bit = match c {
                '0' => false,
                '1' => true,
                other => {
                    return Err(LinkError::invalid_frame(format!(
                        "unexpected character {:?}",
                        other
                    )))
                }
            };
            if count == FRAME_BITS {
                return Err(LinkError::invalid_frame(format!(
                    "more than {} bits",
                    FRAME_BITS
                )));
            }
            bits[count] = bit;
            count += 1;
        }

        if count != FRAME_BITS {
            return Err(LinkError::invalid_frame(format!(
                "expected {} bits, got {}",
                FRAME_BITS, count
            )));
        }

        Ok(Frame(bits))
    }
}

/// Serialized as its `0`/`1` text form
#[cfg(feature = "serde")]
impl serde::Serialize for Frame {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Frame {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = <String as serde::Deserialize>::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// A demodulated frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Demodulated {
    /// The recovered payload
    pub payload: Payload,
    /// Payload bits that came from invalid chip pairs
    pub glitches: u16,
}

/// Frame encoder and decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCodec {
    decoder: ManchesterDecoder,
}

impl FrameCodec {
    /// Create a codec with the given invalid-chip policy
    pub fn new(policy: ChipPolicy) -> Self {
        FrameCodec {
            decoder: ManchesterDecoder::new(policy),
        }
    }

    /// Lay a payload out as a frame
    pub fn encode(&self, payload: Payload) -> Frame {
        let mut bits = [false; FRAME_BITS];
        let halves = [payload.value() >> 8, payload.value() & 0xFF];

        for (sub_frame, half) in bits.chunks_exact_mut(SUB_FRAME_BITS).zip(halves) {
            sub_frame[..CHIPS_OFFSET].copy_from_slice(&START_SENTINEL);
            ManchesterEncoder::encode_bits(
                half,
                BITS_PER_SUB_FRAME,
                &mut sub_frame[CHIPS_OFFSET..STOP_OFFSET],
            );
            sub_frame[STOP_OFFSET..].copy_from_slice(&STOP_SENTINEL);
        }

        Frame(bits)
    }

    /// Check the sentinels and demodulate the payload
    pub fn decode(&self, frame: &Frame) -> Result<Demodulated> {
        if let Some(position) = frame.sentinel_mismatch() {
            return Err(LinkError::bad_sentinel(position));
        }

        let mut payload = 0u16;
        let mut glitches = 0u16;

        for (index, sub_frame) in frame.0.chunks_exact(SUB_FRAME_BITS).enumerate() {
            let offset = index * SUB_FRAME_BITS + CHIPS_OFFSET;
            let (bits, glitched) = self
                .decoder
                .decode_bits(&sub_frame[CHIPS_OFFSET..STOP_OFFSET], offset)?;
            payload = (payload << BITS_PER_SUB_FRAME) | bits;
            glitches = (glitches << BITS_PER_SUB_FRAME) | glitched;
        }

        Ok(Demodulated {
            payload: Payload::new(payload),
            glitches,
        })
    }
}

/// Encode a payload into a frame
pub fn frame_encode(payload: Payload) -> Frame {
    FrameCodec::default().encode(payload)
}

/// Decode a frame with the default (lenient) chip policy
pub fn frame_decode(frame: &Frame) -> Result<Payload> {
    FrameCodec::default().decode(frame).map(|d| d.payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_0X78D2: &str = "0101_1001010101101010_10_0101_0101100110100110_10";

    #[test]
    fn test_encode_layout() {
        let frame = frame_encode(Payload::new(0x78D2));
        assert_eq!(frame, FRAME_0X78D2.parse().unwrap());
        assert_eq!(frame.sentinel_mismatch(), None);
    }

    #[test]
    fn test_roundtrip_all_payloads() {
        let codec = FrameCodec::new(ChipPolicy::Strict);
        for raw in 0..=u16::MAX {
            let payload = Payload::new(raw);
            let decoded = codec.decode(&codec.encode(payload)).unwrap();
            assert_eq!(decoded.payload, payload);
            assert_eq!(decoded.glitches, 0);
        }
    }

    #[test]
    fn test_expected_sentinel_positions() {
        assert_eq!(Frame::expected_sentinel(0), Some(false));
        assert_eq!(Frame::expected_sentinel(3), Some(true));
        assert_eq!(Frame::expected_sentinel(4), None);
        assert_eq!(Frame::expected_sentinel(19), None);
        assert_eq!(Frame::expected_sentinel(20), Some(true));
        assert_eq!(Frame::expected_sentinel(21), Some(false));
        assert_eq!(Frame::expected_sentinel(22), Some(false));
        assert_eq!(Frame::expected_sentinel(26), None);
        assert_eq!(Frame::expected_sentinel(42), Some(true));
        assert_eq!(Frame::expected_sentinel(43), Some(false));
        assert_eq!(Frame::expected_sentinel(44), None);
    }

    #[test]
    fn test_bad_sentinel_rejected() {
        let frame = frame_encode(Payload::new(0x1234));
        for position in [0, 3, 20, 21, 22, 25, 42, 43] {
            assert_eq!(
                frame_decode(&frame.with_flipped(position)),
                Err(LinkError::bad_sentinel(position))
            );
        }
    }

    #[test]
    fn test_invalid_chip_policies() {
        let frame = frame_encode(Payload::new(0x8000)).with_flipped(4);
        // Bit 15 was (0,1); now (1,1)

        let strict = FrameCodec::new(ChipPolicy::Strict);
        assert_eq!(
            strict.decode(&frame),
            Err(LinkError::invalid_chip(4, true, true))
        );

        let lenient = FrameCodec::new(ChipPolicy::Lenient).decode(&frame).unwrap();
        assert_eq!(lenient.payload, Payload::new(0x0000));
        assert_eq!(lenient.glitches, 0x8000);
    }

    #[test]
    fn test_frame_text_parsing() {
        assert!("0101".parse::<Frame>().is_err());
        assert!(format!("{}2", &FRAME_0X78D2[1..]).parse::<Frame>().is_err());
        assert!(format!("{}0", FRAME_0X78D2).parse::<Frame>().is_err());

        let frame: Frame = FRAME_0X78D2.parse().unwrap();
        assert_eq!(frame.to_string().parse::<Frame>().unwrap(), frame);
        assert_eq!(frame.to_string().len(), FRAME_BITS);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_frame_serde_as_bit_string() {
        let frame: Frame = FRAME_0X78D2.parse().unwrap();
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, format!("\"{}\"", FRAME_0X78D2.replace('_', "")));
        assert_eq!(serde_json::from_str::<Frame>(&json).unwrap(), frame);

        assert!(serde_json::from_str::<Frame>("\"0101\"").is_err());
        assert!(serde_json::from_str::<Frame>("42").is_err());
    }
}
