//! Tests for configuration module

use super::*;
use crate::error::{Error, Result};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn create_temp_config_file(content: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .map_err(|e| Error::config(format!("Failed to create temp file: {e}")))?;
    file.write_all(content.as_bytes())
        .map_err(|e| Error::config(format!("Failed to write temp file: {e}")))?;
    file.flush()
        .map_err(|e| Error::config(format!("Failed to flush temp file: {e}")))?;
    Ok(file)
}

#[test]
fn test_default_config_reports_nothing() {
    let config = Config::default();
    assert!(!config.watch.any_enabled());
    assert_eq!(config.output.mode, OutputMode::Notify);
    assert_eq!(config.output.app_name, "filemon");
    assert_eq!(config.watch.move_pair_window(), Duration::from_millis(100));
    assert_eq!(
        config.watch.change_coalesce_window(),
        Duration::from_millis(500)
    );
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_toml_str_valid() {
    let toml = r#"
        [watch]
        writes = true
        deletion = true
        move_pair_window_ms = 250
        change_coalesce_ms = 0

        [output]
        mode = "print"
    "#;

    let config = Config::from_toml_str(toml).expect("Failed to parse valid TOML");
    assert!(config.watch.writes);
    assert!(config.watch.deletion);
    assert!(!config.watch.moves);
    assert_eq!(config.watch.move_pair_window_ms, 250);
    assert_eq!(config.watch.change_coalesce_ms, 0);
    assert!(config.validate().is_ok());
    assert_eq!(config.output.mode, OutputMode::Print);
    assert_eq!(config.output.app_name, "filemon");
}

#[test]
fn test_from_toml_str_minimal() {
    let config = Config::from_toml_str("").expect("Failed to parse empty TOML");
    assert_eq!(config.watch.ignore_patterns, default_ignore_patterns());
    assert_eq!(config.watch.max_queue_size, 10_000);
}

#[test]
fn test_from_toml_str_rejects_unknown_mode() {
    let toml = r#"
        [output]
        mode = "carrier-pigeon"
    "#;
    assert!(Config::from_toml_str(toml).is_err());
}

#[test]
fn test_from_file_partial_section() {
    let file = create_temp_config_file(
        r#"
        [watch]
        creation = true
        ignore_patterns = ["*.part"]
    "#,
    )
    .expect("test setup failed");

    let config = Config::from_file(file.path()).expect("Failed to load config");
    assert!(config.watch.creation);
    assert!(!config.watch.writes);
    assert_eq!(config.watch.ignore_patterns, vec!["*.part".to_string()]);
    assert_eq!(config.watch.move_pair_window_ms, 100);
    assert_eq!(config.output.mode, OutputMode::Notify);
}

#[test]
fn test_from_file_missing_uses_defaults() {
    let dir = tempfile::tempdir().expect("test setup failed");
    let config =
        Config::from_file(&dir.path().join("absent.toml")).expect("Failed to load config");
    assert_eq!(config.watch.max_queue_size, 10_000);
}

#[test]
fn test_load_rejects_missing_explicit_file() {
    let dir = tempfile::tempdir().expect("test setup failed");
    let result = Config::load(Some(&dir.path().join("absent.toml")));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_validate_rejects_zero_window() {
    let mut config = Config::default();
    config.watch.move_pair_window_ms = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_zero_queue() {
    let mut config = Config::default();
    config.watch.max_queue_size = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_bad_pattern() {
    let mut config = Config::default();
    config.watch.ignore_patterns.push("[unclosed".to_string());
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("[unclosed"));
}

#[test]
fn test_global_config_path_location() {
    if let Ok(path) = global_config_path() {
        assert!(path.ends_with(".filemon/config.toml"));
    }
}
