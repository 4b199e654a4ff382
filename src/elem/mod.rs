//! Element type descriptors
//!
//! A sparse matrix stores every element as a type-erased byte region whose size
//! and alignment come from an [`ElemType`]: a numeric [`Depth`] times a channel
//! count. Typed views over those bytes go through the [`DepthValue`] and
//! [`Element`] traits, and cross-type conversion through the dispatch tables in
//! [`convert`].

pub mod convert;
mod value;

pub use convert::{
    get_convert_elem, get_convert_scale_elem, saturate_cast, ConvertData, ConvertScaleData,
};
pub use value::{DepthValue, Element};

use crate::error::{Result, SparseError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of channels in one element
pub const CN_MAX: usize = 512;

/// Numeric kind of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Depth {
    /// Unsigned 8-bit integer
    U8 = 0,
    /// Signed 8-bit integer
    I8 = 1,
    /// Unsigned 16-bit integer
    U16 = 2,
    /// Signed 16-bit integer
    I16 = 3,
    /// Signed 32-bit integer
    I32 = 4,
    /// 32-bit float
    F32 = 5,
    /// 64-bit float
    F64 = 6,
}

impl Depth {
    /// All depths, in table order
    pub const ALL: [Depth; 7] = [
        Depth::U8,
        Depth::I8,
        Depth::U16,
        Depth::I16,
        Depth::I32,
        Depth::F32,
        Depth::F64,
    ];

    /// Byte width of one channel
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            Depth::U8 | Depth::I8 => 1,
            Depth::U16 | Depth::I16 => 2,
            Depth::I32 | Depth::F32 => 4,
            Depth::F64 => 8,
        }
    }

    /// Whether the depth is a floating point kind
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Depth::F32 | Depth::F64)
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            Depth::U8 => "8U",
            Depth::I8 => "8S",
            Depth::U16 => "16U",
            Depth::I16 => "16S",
            Depth::I32 => "32S",
            Depth::F32 => "32F",
            Depth::F64 => "64F",
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Element type: numeric depth times channel count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElemType {
    /// Numeric kind of each channel
    pub depth: Depth,
    /// Number of channels, `1..=CN_MAX`
    pub channels: usize,
}

impl ElemType {
    /// Create an element type
    pub const fn new(depth: Depth, channels: usize) -> Self {
        Self { depth, channels }
    }

    /// Single channel element of the given depth
    pub const fn scalar(depth: Depth) -> Self {
        Self::new(depth, 1)
    }

    /// Check the channel count
    pub fn validate(&self) -> Result<()> {
        if self.channels == 0 || self.channels > CN_MAX {
            return Err(SparseError::invalid_data(format!(
                "channel count {} outside 1..={}",
                self.channels, CN_MAX
            )));
        }
        Ok(())
    }

    /// Byte size of the whole element
    #[inline]
    pub const fn elem_size(&self) -> usize {
        self.depth.size() * self.channels
    }

    /// Byte size of one channel; also the alignment of the value region
    #[inline]
    pub const fn elem_size1(&self) -> usize {
        self.depth.size()
    }

    /// Same channel count, different depth
    #[inline]
    pub const fn with_depth(&self, depth: Depth) -> Self {
        Self::new(depth, self.channels)
    }
}

impl fmt::Display for ElemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}C{}", self.depth, self.channels)
    }
}

/// True when every byte of the element is zero
#[inline]
pub fn is_zero_elem(data: &[u8]) -> bool {
    data.iter().all(|&b| b == 0)
}

/// Write `value` saturated to `ty` into every channel of `out`
pub fn fill_scalar(ty: ElemType, value: f64, out: &mut [u8]) {
    let src: Vec<u8> = std::iter::repeat(value.to_ne_bytes())
        .take(ty.channels)
        .flatten()
        .collect();
    let cvt = get_convert_elem(Depth::F64, ty.depth);
    cvt(&src, out, ty.channels);
}
