//! Tests for the configuration system: validation, presets, environment
//! parsing and file persistence.

use super::*;
use super::sparse::{MAX_FILL_FACTOR, MAX_INITIAL_HASH_SIZE, MAX_POOL_NODES};
use crate::error::SparseError;
use std::env;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_default_is_valid() {
    let config = SparseMatConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.initial_hash_size, 8);
    assert_eq!(config.max_fill_factor, 3);
    assert!(!config.bounds_check);
}

#[test]
fn test_all_presets_valid() {
    assert!(SparseMatConfig::performance_preset().validate().is_ok());
    assert!(SparseMatConfig::memory_preset().validate().is_ok());
    assert!(SparseMatConfig::realtime_preset().validate().is_ok());
    assert_eq!(SparseMatConfig::balanced_preset(), SparseMatConfig::default());
    assert_ne!(SparseMatConfig::memory_preset(), SparseMatConfig::default());
    assert!(
        SparseMatConfig::memory_preset().min_pool_nodes
            < SparseMatConfig::default().min_pool_nodes
    );
}

#[test]
fn test_rejects_bad_hash_size() {
    for bad in [0usize, 4, 12, 100] {
        let config = SparseMatConfig::default().with_initial_hash_size(bad);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, SparseError::Configuration { .. }));
        assert!(err.to_string().contains("initial_hash_size"));
    }
    assert!(SparseMatConfig::default().with_initial_hash_size(1024).validate().is_ok());
}

#[test]
fn test_upper_bounds() {
    let at_limit = SparseMatConfig::default()
        .with_initial_hash_size(MAX_INITIAL_HASH_SIZE)
        .with_max_fill_factor(MAX_FILL_FACTOR)
        .with_min_pool_nodes(MAX_POOL_NODES);
    assert!(at_limit.validate().is_ok());

    let over = SparseMatConfig::default()
        .with_initial_hash_size(MAX_INITIAL_HASH_SIZE * 2)
        .with_max_fill_factor(usize::MAX)
        .with_min_pool_nodes(usize::MAX);
    let msg = over.validate().unwrap_err().to_string();
    assert!(msg.contains("initial_hash_size"));
    assert!(msg.contains("max_fill_factor"));
    assert!(msg.contains("min_pool_nodes"));
}

#[test]
fn test_lower_bounds_accepted() {
    let config = SparseMatConfig::default()
        .with_max_fill_factor(1)
        .with_min_pool_nodes(1);
    assert!(config.validate().is_ok());
}

#[test]
fn test_rejects_zero_fill_and_growth() {
    let config = SparseMatConfig::default()
        .with_max_fill_factor(0)
        .with_min_pool_nodes(0);
    let msg = config.validate().unwrap_err().to_string();
    assert!(msg.contains("max_fill_factor"));
    assert!(msg.contains("min_pool_nodes"));
}

#[test]
fn test_validation_error_display() {
    let err = ValidationError::new("field", "7", "too odd").with_suggestion("8");
    let text = err.to_string();
    assert!(text.contains("'field'"));
    assert!(text.contains("too odd"));
    assert!(text.ends_with("Suggested values: 8"));
}

#[test]
fn test_from_env_with_prefix() {
    env::set_var("TEST_SPARSE_HASH_SIZE", "64");
    env::set_var("TEST_SPARSE_FILL_FACTOR", "5");
    env::set_var("TEST_SPARSE_BOUNDS_CHECK", "yes");

    let config = SparseMatConfig::from_env_with_prefix("TEST_SPARSE_").unwrap();
    assert_eq!(config.initial_hash_size, 64);
    assert_eq!(config.max_fill_factor, 5);
    assert_eq!(config.min_pool_nodes, 8);
    assert!(config.bounds_check);

    env::remove_var("TEST_SPARSE_HASH_SIZE");
    env::remove_var("TEST_SPARSE_FILL_FACTOR");
    env::remove_var("TEST_SPARSE_BOUNDS_CHECK");
}

#[test]
fn test_from_env_rejects_invalid() {
    env::set_var("BADENV_SPARSE_HASH_SIZE", "10");
    assert!(SparseMatConfig::from_env_with_prefix("BADENV_SPARSE_").is_err());
    env::remove_var("BADENV_SPARSE_HASH_SIZE");
}

#[test]
fn test_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sparse.json");

    let config = SparseMatConfig::realtime_preset().with_bounds_check(true);
    config.save_to_file(&path).unwrap();
    let loaded = SparseMatConfig::load_from_file(&path).unwrap();
    assert_eq!(config, loaded);
}

#[test]
fn test_load_rejects_invalid_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(
        &path,
        r#"{"initial_hash_size":3,"max_fill_factor":3,"min_pool_nodes":8,"bounds_check":false}"#,
    )
    .unwrap();
    assert!(SparseMatConfig::load_from_file(&path).is_err());

    fs::write(&path, "not json").unwrap();
    let err = SparseMatConfig::load_from_file(&path).unwrap_err();
    assert_eq!(err.category(), "config");
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = SparseMatConfig::load_from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, SparseError::Io(_)));
    assert_eq!(err.category(), "io");

    let err = SparseMatConfig::default()
        .save_to_file(dir.path().join("no_such_dir").join("sparse.json"))
        .unwrap_err();
    assert!(matches!(err, SparseError::Io(_)));
}
