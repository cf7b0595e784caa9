//! Sampling string hash used to validate benchmark output.

/// Seed for the running XOR of per-iteration result hashes.
pub const INITIAL_TOTAL_HASH: i32 = 0xdeadbeef_u32 as i32;

const SEED: i32 = 5381;
const STRIDE: usize = 919;

/// Hash a string by sampling every 919th UTF-16 code unit from the end.
///
/// The walk starts one past the last unit, which contributes zero. The
/// arithmetic wraps at 32 bits so the value matches across hosts.
pub fn quick_hash(text: &str) -> i32 {
    let units: Vec<u16> = text.encode_utf16().collect();
    let mut hash = SEED;
    let mut i = units.len();
    while i > 0 {
        let unit = units.get(i).copied().unwrap_or(0) as i32;
        hash = hash.wrapping_mul(33) ^ unit;
        i = i.saturating_sub(STRIDE);
    }
    hash
}
