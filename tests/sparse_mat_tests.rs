//! Integration tests for sparse matrix storage
//!
//! End-to-end scenarios through the public API: element access, rehashing,
//! iteration, conversion, dense interop and reductions.

use sparsemat::config::{Config, SparseMatConfig};
use sparsemat::{
    min_max_loc, norm, normalize, DenseMat, DenseTarget, Depth, ElemType, NormType, SparseError,
    SparseMat, MAX_DIM,
};
use std::collections::{HashMap, HashSet};

fn f32_mat(sizes: &[i32]) -> SparseMat {
    SparseMat::with_shape(sizes, ElemType::scalar(Depth::F32)).unwrap()
}

// =============================================================================
// ELEMENT ACCESS
// =============================================================================

#[test]
fn test_insert_lookup_round_trip() {
    let mut m = f32_mat(&[50, 50]);
    for i in 0..50 {
        m.set(&[i, 49 - i], i as f32 * 0.5).unwrap();
    }
    for i in 0..50 {
        let p = m.ptr(&[i, 49 - i], false, None).unwrap().unwrap();
        assert_eq!(&*p, &(i as f32 * 0.5).to_ne_bytes());
    }
    assert_eq!(m.nz_count(), 50);
}

#[test]
fn test_fresh_matrix_has_no_elements() {
    let mut m = f32_mat(&[7, 5, 3]);
    for i in 0..7 {
        for j in 0..5 {
            for k in 0..3 {
                assert!(m.ptr(&[i, j, k], false, None).unwrap().is_none());
            }
        }
    }
    assert_eq!(m.nz_count(), 0);
    assert_eq!(m.header().unwrap().iter().count(), 0);
}

#[test]
fn test_erase_removes_exactly_one() {
    let mut m = f32_mat(&[10, 10]);
    m.set(&[1, 1], 11.0f32).unwrap();
    m.set(&[2, 2], 22.0f32).unwrap();

    assert!(m.erase(&[1, 1], None).unwrap());
    assert_eq!(m.nz_count(), 1);
    assert!(m.ptr(&[1, 1], false, None).unwrap().is_none());
    assert_eq!(m.find::<f32>(&[2, 2]).unwrap(), Some(22.0));

    // Erasing an absent coordinate is a no-op
    assert!(!m.erase(&[1, 1], None).unwrap());
    assert!(!m.erase(&[9, 9], None).unwrap());
    assert_eq!(m.nz_count(), 1);
}

#[test]
fn test_rehash_preserves_membership() {
    let mut m = SparseMat::with_shape(&[1000], ElemType::scalar(Depth::I32)).unwrap();
    let n = 500;
    for i in 0..n {
        m.set(&[i * 2], i).unwrap();
    }
    assert!(m.hash_size() > 8);
    assert_eq!(m.nz_count(), n as usize);
    for i in 0..n {
        assert_eq!(m.find::<i32>(&[i * 2]).unwrap(), Some(i));
        assert_eq!(m.find::<i32>(&[i * 2 + 1]).unwrap(), None);
    }
}

#[test]
fn test_fill_factor_bound_holds() {
    let mut m = f32_mat(&[10_000]);
    for i in 0..3000 {
        m.set(&[i], 1.0f32).unwrap();
        let stats = m.stats().unwrap();
        assert!(stats.node_count <= stats.hash_size * 3);
    }
}

#[test]
fn test_max_dims() {
    let sizes = [2i32; MAX_DIM];
    let mut m = SparseMat::with_shape(&sizes, ElemType::scalar(Depth::U8)).unwrap();
    let mut idx = [0i32; MAX_DIM];
    idx[MAX_DIM - 1] = 1;
    m.set(&idx, 5u8).unwrap();
    idx[0] = 1;
    m.set(&idx, 6u8).unwrap();

    assert_eq!(m.nz_count(), 2);
    assert_eq!(m.value::<u8>(&idx).unwrap(), 6);
    let nodes: Vec<Vec<i32>> = m.header().unwrap().iter().map(|n| n.coords()).collect();
    assert!(nodes.iter().all(|c| c.len() == MAX_DIM));

    assert!(SparseMat::with_shape(&[2i32; MAX_DIM + 1], ElemType::scalar(Depth::U8)).is_err());
}

#[test]
fn test_negative_coordinates_without_bounds_check() {
    let mut m = f32_mat(&[4, 4]);
    m.set(&[-1, -7], 2.0f32).unwrap();
    assert_eq!(m.value::<f32>(&[-1, -7]).unwrap(), 2.0);
    assert_eq!(m.value::<f32>(&[-7, -1]).unwrap(), 0.0);
}

// =============================================================================
// ITERATION
// =============================================================================

#[test]
fn test_iteration_matches_inserted_set() {
    let mut m = SparseMat::with_shape(&[30, 30, 30], ElemType::scalar(Depth::U16)).unwrap();
    let mut expected = HashSet::new();
    for i in 0..30 {
        for j in (0..30).step_by(7) {
            let idx = [i, j, (i * j) % 30];
            m.set(&idx, (i + j) as u16).unwrap();
            expected.insert(idx.to_vec());
        }
    }
    for i in (0..30).step_by(3) {
        let idx = [i, 0, 0];
        if m.erase(&idx, None).unwrap() {
            expected.remove(&idx.to_vec());
        }
    }

    let hdr = m.header().unwrap();
    let visited: Vec<Vec<i32>> = hdr.iter().map(|n| n.coords()).collect();
    assert_eq!(visited.len(), hdr.nz_count());
    let visited: HashSet<Vec<i32>> = visited.into_iter().collect();
    assert_eq!(visited, expected);
}

#[test]
fn test_iteration_is_restartable() {
    let mut m = f32_mat(&[100]);
    for i in 0..40 {
        m.set(&[i], i as f32).unwrap();
    }
    let hdr = m.header().unwrap();
    let first: Vec<usize> = hdr.iter().map(|n| n.offset()).collect();
    let second: Vec<usize> = hdr.iter().map(|n| n.offset()).collect();
    assert_eq!(first, second);
}

// =============================================================================
// CONVERSION
// =============================================================================

#[test]
fn test_identity_conversion() {
    let mut m = SparseMat::with_shape(&[20, 20], ElemType::new(Depth::I16, 2)).unwrap();
    m.set(&[1, 2], [100i16, -100]).unwrap();
    m.set(&[19, 0], [i16::MAX, i16::MIN]).unwrap();

    let mut out = SparseMat::new();
    m.convert_to(&mut out, Some(Depth::I16), 1.0, 0.0).unwrap();
    assert_eq!(out.elem_type(), m.elem_type());
    assert_eq!(out.nz_count(), 2);
    for node in m.header().unwrap().iter() {
        let idx = node.coords();
        assert_eq!(
            out.value::<[i16; 2]>(&idx).unwrap(),
            node.value::<[i16; 2]>().unwrap()
        );
    }
}

#[test]
fn test_scaled_conversion_3x3() {
    let mut m = f32_mat(&[3, 3]);
    m.set(&[0, 0], 1.0f32).unwrap();
    m.set(&[1, 1], 2.5f32).unwrap();
    m.set(&[2, 2], -3.0f32).unwrap();

    let mut out = SparseMat::new();
    m.convert_to(&mut out, None, 2.0, 1.0).unwrap();
    assert_eq!(out.value::<f32>(&[0, 0]).unwrap(), 3.0);
    assert_eq!(out.value::<f32>(&[1, 1]).unwrap(), 6.0);
    assert_eq!(out.value::<f32>(&[2, 2]).unwrap(), -5.0);
    assert_eq!(out.nz_count(), 3);
}

#[test]
fn test_saturating_conversion_to_bytes() {
    let mut m = SparseMat::with_shape(&[4], ElemType::scalar(Depth::F64)).unwrap();
    m.set(&[0], -10.0f64).unwrap();
    m.set(&[1], 127.5f64).unwrap();
    m.set(&[2], 128.5f64).unwrap();
    m.set(&[3], 1e9f64).unwrap();

    let mut out = SparseMat::new();
    m.convert_to(&mut out, Some(Depth::I8), 1.0, 0.0).unwrap();
    assert_eq!(out.value::<i8>(&[0]).unwrap(), -10);
    assert_eq!(out.value::<i8>(&[1]).unwrap(), 127);
    assert_eq!(out.value::<i8>(&[3]).unwrap(), 127);

    m.convert_to(&mut out, Some(Depth::U8), 1.0, 0.0).unwrap();
    assert_eq!(out.value::<u8>(&[0]).unwrap(), 0);
    assert_eq!(out.value::<u8>(&[1]).unwrap(), 128);
    assert_eq!(out.value::<u8>(&[2]).unwrap(), 128);
    assert_eq!(out.value::<u8>(&[3]).unwrap(), 255);
}

// =============================================================================
// DENSE INTEROP
// =============================================================================

#[test]
fn test_copy_to_dense_leaves_zero_fill() {
    let mut m = SparseMat::with_shape(&[3, 3], ElemType::scalar(Depth::I32)).unwrap();
    m.set(&[0, 2], 4i32).unwrap();
    m.set(&[2, 0], -4i32).unwrap();

    let mut dense = DenseMat::with_shape(&[1], ElemType::scalar(Depth::U8)).unwrap();
    dense.fill(9.0).unwrap();
    m.copy_to_dense(&mut dense).unwrap();
    assert_eq!(dense.size(), &[3, 3]);
    for i in 0..3 {
        for j in 0..3 {
            let expected = match (i, j) {
                (0, 2) => 4,
                (2, 0) => -4,
                _ => 0,
            };
            assert_eq!(dense.at::<i32>(&[i, j]).unwrap(), expected);
        }
    }
}

#[test]
fn test_from_dense_skips_zero_elements() {
    let mut dense = DenseMat::with_shape(&[4, 4], ElemType::new(Depth::F32, 2)).unwrap();
    dense.set(&[0, 0], [0.0f32, 1.0]).unwrap();
    dense.set(&[3, 3], [2.0f32, 0.0]).unwrap();
    let sparse = SparseMat::from_dense(&dense).unwrap();
    assert_eq!(sparse.nz_count(), 2);
    assert_eq!(sparse.value::<[f32; 2]>(&[0, 0]).unwrap(), [0.0, 1.0]);
    assert_eq!(sparse.value::<[f32; 2]>(&[1, 1]).unwrap(), [0.0, 0.0]);
}

/// Minimal collaborator recording what the sparse side writes
#[derive(Default)]
struct RecordingTarget {
    elem_size: usize,
    fill: Option<f64>,
    writes: HashMap<Vec<i32>, Vec<u8>>,
}

impl DenseTarget for RecordingTarget {
    fn create(&mut self, _sizes: &[i32], elem_type: ElemType) -> sparsemat::Result<()> {
        self.elem_size = elem_type.elem_size();
        self.writes.clear();
        Ok(())
    }

    fn fill(&mut self, value: f64) -> sparsemat::Result<()> {
        self.fill = Some(value);
        Ok(())
    }

    fn ptr_mut(&mut self, idx: &[i32]) -> sparsemat::Result<&mut [u8]> {
        let size = self.elem_size;
        Ok(self
            .writes
            .entry(idx.to_vec())
            .or_insert_with(|| vec![0; size])
            .as_mut_slice())
    }
}

#[test]
fn test_custom_dense_target() {
    let mut m = f32_mat(&[8, 8]);
    m.set(&[1, 7], 1.5f32).unwrap();
    m.set(&[6, 0], 2.5f32).unwrap();

    let mut target = RecordingTarget::default();
    m.convert_to_dense(&mut target, Some(Depth::F64), 2.0, 1.0).unwrap();
    assert_eq!(target.fill, Some(1.0));
    assert_eq!(target.writes.len(), 2);
    assert_eq!(target.writes[&vec![1, 7]], 4.0f64.to_ne_bytes().to_vec());
    assert_eq!(target.writes[&vec![6, 0]], 6.0f64.to_ne_bytes().to_vec());
}

// =============================================================================
// REDUCTIONS
// =============================================================================

#[test]
fn test_concrete_scenario() {
    let mut m = f32_mat(&[1000, 1000]);
    m.set(&[5, 5], 1.0f32).unwrap();
    m.set(&[5, 6], 2.0f32).unwrap();
    m.set(&[999, 999], 3.0f32).unwrap();

    assert_eq!(norm(&m, NormType::L1).unwrap(), 6.0);

    let mm = min_max_loc(&m).unwrap();
    assert_eq!(mm.min_val, 1.0);
    assert_eq!(mm.min_loc, Some(vec![5, 5]));
    assert_eq!(mm.max_val, 3.0);
    assert_eq!(mm.max_loc, Some(vec![999, 999]));

    assert!(m.erase(&[5, 6], None).unwrap());
    let hdr = m.header().unwrap();
    let nodes: HashSet<Vec<i32>> = hdr.iter().map(|n| n.coords()).collect();
    assert_eq!(nodes.len(), 2);
    assert!(nodes.contains(&vec![5, 5]));
    assert!(nodes.contains(&vec![999, 999]));
}

#[test]
fn test_normalize_inf() {
    let mut m = f32_mat(&[10]);
    m.set(&[2], -8.0f32).unwrap();
    m.set(&[4], 2.0f32).unwrap();
    let mut out = SparseMat::new();
    normalize(&m, &mut out, 1.0, NormType::Inf).unwrap();
    assert_eq!(out.value::<f32>(&[2]).unwrap(), -1.0);
    assert_eq!(out.value::<f32>(&[4]).unwrap(), 0.25);
}

// =============================================================================
// CONFIGURATION AND ERRORS
// =============================================================================

#[test]
fn test_presets_produce_working_matrices() {
    for config in [
        SparseMatConfig::performance_preset(),
        SparseMatConfig::memory_preset(),
        SparseMatConfig::realtime_preset(),
        SparseMatConfig::balanced_preset(),
    ] {
        let initial = config.initial_hash_size;
        let mut m = SparseMat::with_config(config).unwrap();
        m.create(&[64, 64], ElemType::scalar(Depth::F64)).unwrap();
        assert_eq!(m.hash_size(), initial);
        for i in 0..64 {
            m.set(&[i, i], i as f64).unwrap();
        }
        assert_eq!(m.nz_count(), 64);
        assert_eq!(norm(&m, NormType::L1).unwrap(), (0..64).sum::<i32>() as f64);
    }
}

#[test]
fn test_invalid_config_rejected() {
    let config = SparseMatConfig::default().with_initial_hash_size(12);
    let err = SparseMat::with_config(config).unwrap_err();
    assert_eq!(err.category(), "config");
    assert!(!err.is_recoverable());
}

fn exercise_config(config: SparseMatConfig) {
    let initial = config.initial_hash_size;
    let fill = config.max_fill_factor;
    let mut m = SparseMat::with_config(config).unwrap();
    m.create(&[200, 200], ElemType::scalar(Depth::I32)).unwrap();

    for i in 0..300 {
        m.set(&[i % 200, i / 200], i).unwrap();
    }
    assert_eq!(m.nz_count(), 300);
    assert!(m.nz_count() <= m.hash_size() * fill);

    for i in (0..300).step_by(3) {
        assert!(m.erase(&[i % 200, i / 200], None).unwrap());
    }
    assert_eq!(m.nz_count(), 200);
    for i in 0..300 {
        let expected = if i % 3 == 0 { None } else { Some(i) };
        assert_eq!(m.find::<i32>(&[i % 200, i / 200]).unwrap(), expected);
    }

    m.clear().unwrap();
    assert_eq!(m.nz_count(), 0);
    assert_eq!(m.hash_size(), initial);
    m.set(&[7, 7], -1i32).unwrap();
    assert_eq!(m.value::<i32>(&[7, 7]).unwrap(), -1);
}

#[test]
fn test_accepted_config_boundaries() {
    exercise_config(SparseMatConfig::default().with_min_pool_nodes(1));
    exercise_config(SparseMatConfig::default().with_max_fill_factor(1));
    exercise_config(SparseMatConfig::default().with_initial_hash_size(64));
    exercise_config(
        SparseMatConfig::default()
            .with_min_pool_nodes(1)
            .with_max_fill_factor(1)
            .with_initial_hash_size(1024),
    );
    exercise_config(SparseMatConfig::default().with_max_fill_factor(1 << 16));
    exercise_config(SparseMatConfig::memory_preset());
}

#[test]
fn test_oversized_config_rejected() {
    for config in [
        SparseMatConfig::default().with_max_fill_factor(usize::MAX),
        SparseMatConfig::default().with_min_pool_nodes(usize::MAX),
        SparseMatConfig::default().with_initial_hash_size(usize::MAX / 2 + 1),
    ] {
        let err = SparseMat::with_config(config).unwrap_err();
        assert!(matches!(err, SparseError::Configuration { .. }));
    }
}

#[test]
fn test_usage_errors_are_not_recoverable() {
    let mut m = SparseMat::new();
    let err = m.create(&[0], ElemType::scalar(Depth::U8)).unwrap_err();
    assert!(matches!(err, SparseError::InvalidSize { .. }));
    assert!(!err.is_recoverable());

    let err = m.erase(&[0], None).unwrap_err();
    assert!(matches!(err, SparseError::Uninitialized));
    assert!(!err.is_recoverable());
}
