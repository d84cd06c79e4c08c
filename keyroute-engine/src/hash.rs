//! Stable 32-bit key hashing for the HASH strategy.
//!
//! FNV-1a is used because it is dependency-free and fully specified, so
//! ports of this engine in other languages produce identical placements.
//! The constants are the published 32-bit FNV parameters; do not change
//! them without re-sharding every HASH rule.

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// FNV-1a 32-bit hash of the key's canonical byte representation.
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in bytes {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
