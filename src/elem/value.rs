//! Typed views over element bytes

use super::{Depth, ElemType};
use std::fmt;
use std::mem::size_of;

/// A numeric channel type that can live inside an element
///
/// Values are stored native-endian with no alignment requirement on the
/// backing bytes.
pub trait DepthValue: Copy + PartialOrd + Default + fmt::Debug + 'static {
    /// Depth tag of this type
    const DEPTH: Depth;
    /// Smallest representable value
    const MIN_VALUE: Self;
    /// Largest representable value
    const MAX_VALUE: Self;

    /// Read from the first `size_of::<Self>()` bytes
    fn read(bytes: &[u8]) -> Self;

    /// Write into the first `size_of::<Self>()` bytes
    fn write(self, bytes: &mut [u8]);

    /// Widen to `f64`
    fn to_f64(self) -> f64;

    /// Exact integer value, `None` for floating point types
    fn to_i64(self) -> Option<i64>;

    /// Round half to even and clamp into range; NaN maps to zero for integers
    fn saturate_from_f64(v: f64) -> Self;

    /// Clamp into range
    fn saturate_from_i64(v: i64) -> Self;
}

macro_rules! impl_int_depth_value {
    ($t:ty, $depth:ident) => {
        impl DepthValue for $t {
            const DEPTH: Depth = Depth::$depth;
            const MIN_VALUE: Self = <$t>::MIN;
            const MAX_VALUE: Self = <$t>::MAX;

            #[inline]
            fn read(bytes: &[u8]) -> Self {
                let mut buf = [0u8; size_of::<$t>()];
                buf.copy_from_slice(&bytes[..size_of::<$t>()]);
                <$t>::from_ne_bytes(buf)
            }

            #[inline]
            fn write(self, bytes: &mut [u8]) {
                bytes[..size_of::<$t>()].copy_from_slice(&self.to_ne_bytes());
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn to_i64(self) -> Option<i64> {
                Some(self as i64)
            }

            #[inline]
            fn saturate_from_f64(v: f64) -> Self {
                // float to int `as` casts saturate and send NaN to 0
                v.round_ties_even() as $t
            }

            #[inline]
            fn saturate_from_i64(v: i64) -> Self {
                v.clamp(<$t>::MIN as i64, <$t>::MAX as i64) as $t
            }
        }
    };
}

macro_rules! impl_float_depth_value {
    ($t:ty, $depth:ident) => {
        impl DepthValue for $t {
            const DEPTH: Depth = Depth::$depth;
            const MIN_VALUE: Self = <$t>::MIN;
            const MAX_VALUE: Self = <$t>::MAX;

            #[inline]
            fn read(bytes: &[u8]) -> Self {
                let mut buf = [0u8; size_of::<$t>()];
                buf.copy_from_slice(&bytes[..size_of::<$t>()]);
                <$t>::from_ne_bytes(buf)
            }

            #[inline]
            fn write(self, bytes: &mut [u8]) {
                bytes[..size_of::<$t>()].copy_from_slice(&self.to_ne_bytes());
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn to_i64(self) -> Option<i64> {
                None
            }

            #[inline]
            fn saturate_from_f64(v: f64) -> Self {
                v as $t
            }

            #[inline]
            fn saturate_from_i64(v: i64) -> Self {
                v as $t
            }
        }
    };
}

impl_int_depth_value!(u8, U8);
impl_int_depth_value!(i8, I8);
impl_int_depth_value!(u16, U16);
impl_int_depth_value!(i16, I16);
impl_int_depth_value!(i32, I32);
impl_float_depth_value!(f32, F32);
impl_float_depth_value!(f64, F64);

/// A whole element: one scalar or a fixed array of channels
pub trait Element: Copy + fmt::Debug + 'static {
    /// Channel type
    type Scalar: DepthValue;
    /// Channel count
    const CHANNELS: usize;

    /// Element type descriptor matching this Rust type
    fn elem_type() -> ElemType {
        ElemType::new(<Self::Scalar as DepthValue>::DEPTH, Self::CHANNELS)
    }

    /// Decode from element bytes
    fn read_elem(bytes: &[u8]) -> Self;

    /// Encode into element bytes
    fn write_elem(&self, bytes: &mut [u8]);

    /// All-zero value
    fn zero() -> Self;
}

macro_rules! impl_scalar_element {
    ($($t:ty),*) => {
        $(
            impl Element for $t {
                type Scalar = $t;
                const CHANNELS: usize = 1;

                #[inline]
                fn read_elem(bytes: &[u8]) -> Self {
                    <$t as DepthValue>::read(bytes)
                }

                #[inline]
                fn write_elem(&self, bytes: &mut [u8]) {
                    DepthValue::write(*self, bytes)
                }

                #[inline]
                fn zero() -> Self {
                    <$t>::default()
                }
            }
        )*
    };
}

impl_scalar_element!(u8, i8, u16, i16, i32, f32, f64);

impl<T: DepthValue, const N: usize> Element for [T; N] {
    type Scalar = T;
    const CHANNELS: usize = N;

    fn read_elem(bytes: &[u8]) -> Self {
        let sz = size_of::<T>();
        std::array::from_fn(|i| T::read(&bytes[i * sz..]))
    }

    fn write_elem(&self, bytes: &mut [u8]) {
        let sz = size_of::<T>();
        for (i, v) in self.iter().enumerate() {
            v.write(&mut bytes[i * sz..]);
        }
    }

    fn zero() -> Self {
        [T::default(); N]
    }
}
