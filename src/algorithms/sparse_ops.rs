//! Reductions over sparse matrices
//!
//! Norms, extrema and normalization computed with a single pass over the
//! stored elements. Absent elements count as zero for the norms and are
//! ignored by [`min_max_loc`].
//!
//! Only single-channel `F32` and `F64` matrices are supported.
//!
//! # Examples
//!
//! ```
//! use sparsemat::algorithms::sparse_ops::*;
//! use sparsemat::{Depth, ElemType, SparseMat};
//!
//! let mut m = SparseMat::with_shape(&[4, 4], ElemType::scalar(Depth::F64))?;
//! m.set(&[0, 0], 3.0f64)?;
//! m.set(&[3, 3], -4.0f64)?;
//!
//! assert_eq!(norm(&m, NormType::L1)?, 7.0);
//! assert_eq!(norm(&m, NormType::L2)?, 5.0);
//! assert_eq!(norm(&m, NormType::Inf)?, 4.0);
//!
//! let mm = min_max_loc(&m)?;
//! assert_eq!(mm.min_loc, Some(vec![3, 3]));
//! # Ok::<(), sparsemat::SparseError>(())
//! ```

use crate::containers::{SparseHeader, SparseMat};
use crate::elem::{Depth, DepthValue};
use crate::error::{Result, SparseError};

/// Norm selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormType {
    /// Largest absolute value
    Inf,
    /// Sum of absolute values
    L1,
    /// Square root of the sum of squares
    L2,
}

/// Extreme values and where they are stored
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxLoc {
    /// Smallest stored value, the type's maximum when nothing is stored
    pub min_val: f64,
    /// Largest stored value, the negated type maximum when nothing is stored
    pub max_val: f64,
    /// Coordinates of `min_val`
    pub min_loc: Option<Vec<i32>>,
    /// Coordinates of `max_val`
    pub max_loc: Option<Vec<i32>>,
}

fn reduction_depth(src: &SparseMat) -> Result<Depth> {
    let ty = src.elem_type().ok_or(SparseError::Uninitialized)?;
    match ty.depth {
        Depth::F32 | Depth::F64 if ty.channels == 1 => Ok(ty.depth),
        _ => Err(SparseError::not_supported("Only 32f and 64f are supported")),
    }
}

fn norm_of<T: DepthValue>(hdr: &SparseHeader, norm_type: NormType) -> f64 {
    let values = hdr.iter().map(|node| T::read(node.value_bytes()).to_f64());
    match norm_type {
        NormType::Inf => values.fold(0.0, |acc, v| acc.max(v.abs())),
        NormType::L1 => values.map(f64::abs).sum(),
        NormType::L2 => values.map(|v| v * v).sum::<f64>().sqrt(),
    }
}

/// Norm of the stored elements
pub fn norm(src: &SparseMat, norm_type: NormType) -> Result<f64> {
    let depth = reduction_depth(src)?;
    let hdr = src.header()?;
    Ok(match depth {
        Depth::F32 => norm_of::<f32>(&hdr, norm_type),
        _ => norm_of::<f64>(&hdr, norm_type),
    })
}

fn min_max_of<T: DepthValue>(hdr: &SparseHeader) -> MinMaxLoc {
    let mut min_val = T::MAX_VALUE.to_f64();
    let mut max_val = -min_val;
    let mut min_node = None;
    let mut max_node = None;

    for node in hdr.iter() {
        let v = T::read(node.value_bytes()).to_f64();
        if v < min_val {
            min_val = v;
            min_node = Some(node);
        }
        if v > max_val {
            max_val = v;
            max_node = Some(node);
        }
    }

    MinMaxLoc {
        min_val,
        max_val,
        min_loc: min_node.map(|n| n.coords()),
        max_loc: max_node.map(|n| n.coords()),
    }
}

/// Smallest and largest stored values with their coordinates
pub fn min_max_loc(src: &SparseMat) -> Result<MinMaxLoc> {
    let depth = reduction_depth(src)?;
    let hdr = src.header()?;
    Ok(match depth {
        Depth::F32 => min_max_of::<f32>(&hdr),
        _ => min_max_of::<f64>(&hdr),
    })
}

/// Scale `src` into `dst` so that its norm becomes `a`
///
/// A matrix whose norm is at most `f64::EPSILON` is scaled by zero.
pub fn normalize(src: &SparseMat, dst: &mut SparseMat, a: f64, norm_type: NormType) -> Result<()> {
    let n = norm(src, norm_type)?;
    let scale = if n > f64::EPSILON { a / n } else { 0.0 };
    log::debug!("Normalizing sparse matrix: norm={}, scale={}", n, scale);
    src.convert_to(dst, None, scale, 0.0)
}
