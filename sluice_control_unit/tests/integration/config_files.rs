//! Integration test: loading site files from disk.

use std::io::Write;
use std::path::Path;

use sluice_common::config::ConfigError;
use sluice_control_unit::config::load_config;
use tempfile::NamedTempFile;

use super::SITE;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}

#[test]
fn loads_site_file() {
    let file = write_temp(SITE);
    let loaded = load_config(file.path()).unwrap();
    assert_eq!(loaded.shared.service_name, "sluice-it");
    assert_eq!(loaded.gate_count(), 3);
    assert_eq!(loaded.catalog.len(), 11);
    assert!(loaded.catalog.get("p50").is_some());
}

#[test]
fn missing_file_is_reported() {
    let err = load_config(Path::new("/nonexistent/sluice.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));
}

#[test]
fn malformed_file_is_parse_error() {
    let file = write_temp("[[stations]\nname = ");
    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn duplicate_gate_is_rejected() {
    let dup = SITE.replacen("name = \"Gate 2\"", "name = \"Gate 1\"", 1);
    let file = write_temp(&dup);
    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}

#[test]
fn control_overrides_are_applied() {
    let content = format!("{SITE}\n[control]\nstep_pct = 5.0\nidle_timeout_s = 600\n");
    let file = write_temp(&content);
    let loaded = load_config(file.path()).unwrap();
    assert_eq!(loaded.control.step_pct, 5.0);
    assert_eq!(loaded.control.idle_timeout_s, 600);
    assert_eq!(loaded.control.tick_interval_ms, 1000);
}
