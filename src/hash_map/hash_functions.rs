//! Coordinate hashing
//!
//! Coordinates are folded with a multiplicative scale in wrapping 64-bit
//! arithmetic. The 1-D, 2-D and 3-D variants are unrolled forms of the general
//! fold and always agree with [`hash_coords`], so a hash computed through any of
//! them can be passed back to the containers as a hint.

/// Multiplier applied between coordinate components
pub const HASH_SCALE: u64 = 0x5bd1_e995;

#[inline(always)]
fn component(i: i32) -> u64 {
    i as i64 as u64
}

/// Hash of a 1-D coordinate
#[inline]
pub fn hash1(i0: i32) -> u64 {
    component(i0)
}

/// Hash of a 2-D coordinate
#[inline]
pub fn hash2(i0: i32, i1: i32) -> u64 {
    component(i0).wrapping_mul(HASH_SCALE).wrapping_add(component(i1))
}

/// Hash of a 3-D coordinate
#[inline]
pub fn hash3(i0: i32, i1: i32, i2: i32) -> u64 {
    hash2(i0, i1).wrapping_mul(HASH_SCALE).wrapping_add(component(i2))
}

/// Hash of an N-D coordinate by the general fold
#[inline]
pub fn hash_nd(idx: &[i32]) -> u64 {
    idx.iter()
        .fold(0u64, |h, &i| h.wrapping_mul(HASH_SCALE).wrapping_add(component(i)))
}

/// Hash of a coordinate of any arity, using the unrolled forms when available
#[inline]
pub fn hash_coords(idx: &[i32]) -> u64 {
    match *idx {
        [i0] => hash1(i0),
        [i0, i1] => hash2(i0, i1),
        [i0, i1, i2] => hash3(i0, i1, i2),
        _ => hash_nd(idx),
    }
}
