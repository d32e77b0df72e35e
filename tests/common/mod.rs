//! Helpers shared by the integration tests

#![allow(dead_code)]

use optolink::wire::START_SENTINEL;

/// Sentinel bits matched after `bit`, mirroring the receiver's hunt
fn advance(matched: usize, bit: bool) -> usize {
    if bit == START_SENTINEL[matched] {
        matched + 1
    } else if bit == START_SENTINEL[0] {
        1
    } else {
        0
    }
}

/// Rewrite raw noise so it never completes a start sentinel, neither on its
/// own nor together with the first bits of a frame that follows it
pub fn scrub_noise(raw: impl IntoIterator<Item = bool>) -> Vec<bool> {
    let mut noise = Vec::new();
    let mut matched = 0;

    for mut bit in raw {
        if matched == START_SENTINEL.len() - 1 && bit == START_SENTINEL[matched] {
            bit = !bit;
        }
        matched = advance(matched, bit);
        noise.push(bit);
    }

    // "01" followed by a frame's "01..." would lock two bits early
    if matched == 2 {
        noise.push(true);
    }

    noise
}

/// True if `bits` contains a start sentinel anywhere
pub fn contains_sentinel(bits: &[bool]) -> bool {
    bits.windows(START_SENTINEL.len())
        .any(|window| window == &START_SENTINEL[..])
}
