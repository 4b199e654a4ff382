//! Per-element conversion dispatch
//!
//! Conversions are looked up by `(from, to)` depth in a table of
//! monomorphised functions operating on raw element bytes. Every function
//! converts `cn` channels with saturation to the destination range.

use super::{Depth, DepthValue};
use std::mem::size_of;

/// Plain conversion: `dst[i] = saturate(src[i])`
pub type ConvertData = fn(from: &[u8], to: &mut [u8], cn: usize);

/// Scaled conversion: `dst[i] = saturate(src[i] * alpha + beta)`
pub type ConvertScaleData = fn(from: &[u8], to: &mut [u8], cn: usize, alpha: f64, beta: f64);

/// Saturating cast between two channel types
///
/// Integer to integer clamps exactly; everything else goes through `f64`.
#[inline]
pub fn saturate_cast<T1: DepthValue, T2: DepthValue>(v: T1) -> T2 {
    match v.to_i64() {
        Some(i) => T2::saturate_from_i64(i),
        None => T2::saturate_from_f64(v.to_f64()),
    }
}

fn convert_data<T1: DepthValue, T2: DepthValue>(from: &[u8], to: &mut [u8], cn: usize) {
    let (s1, s2) = (size_of::<T1>(), size_of::<T2>());
    for i in 0..cn {
        let v = T1::read(&from[i * s1..]);
        saturate_cast::<T1, T2>(v).write(&mut to[i * s2..]);
    }
}

fn convert_scale_data<T1: DepthValue, T2: DepthValue>(
    from: &[u8],
    to: &mut [u8],
    cn: usize,
    alpha: f64,
    beta: f64,
) {
    let (s1, s2) = (size_of::<T1>(), size_of::<T2>());
    for i in 0..cn {
        let v = T1::read(&from[i * s1..]).to_f64();
        T2::saturate_from_f64(v * alpha + beta).write(&mut to[i * s2..]);
    }
}

macro_rules! convert_row {
    ($f:ident, $t1:ty) => {
        [
            $f::<$t1, u8>,
            $f::<$t1, i8>,
            $f::<$t1, u16>,
            $f::<$t1, i16>,
            $f::<$t1, i32>,
            $f::<$t1, f32>,
            $f::<$t1, f64>,
        ]
    };
}

macro_rules! convert_table {
    ($f:ident) => {
        [
            convert_row!($f, u8),
            convert_row!($f, i8),
            convert_row!($f, u16),
            convert_row!($f, i16),
            convert_row!($f, i32),
            convert_row!($f, f32),
            convert_row!($f, f64),
        ]
    };
}

static CONVERT_TAB: [[ConvertData; 7]; 7] = convert_table!(convert_data);
static CONVERT_SCALE_TAB: [[ConvertScaleData; 7]; 7] = convert_table!(convert_scale_data);

/// Look up the plain conversion function for a depth pair
#[inline]
pub fn get_convert_elem(from: Depth, to: Depth) -> ConvertData {
    CONVERT_TAB[from.index()][to.index()]
}

/// Look up the scaled conversion function for a depth pair
#[inline]
pub fn get_convert_scale_elem(from: Depth, to: Depth) -> ConvertScaleData {
    CONVERT_SCALE_TAB[from.index()][to.index()]
}
