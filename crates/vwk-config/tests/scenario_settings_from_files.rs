//! Settings resolve from layered files on disk, with defaults for absent keys.

use std::fs;
use std::path::PathBuf;

use vwk_config::{load_layered_yaml, load_layered_yaml_from_strings, Settings};

#[test]
fn absent_keys_take_defaults() {
    let loaded = load_layered_yaml_from_strings(&["{}"]).unwrap();
    assert_eq!(loaded.settings().unwrap(), Settings::default());
}

#[test]
fn repo_base_yaml_matches_defaults() {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../config/defaults/base.yaml");
    let base = base.to_string_lossy().to_string();

    let loaded = load_layered_yaml(&[base.as_str()]).unwrap();
    assert_eq!(loaded.settings().unwrap(), Settings::default());
}

#[test]
fn file_layers_merge_in_order() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let base = dir.path().join("base.yaml");
    let local = dir.path().join("local.yaml");
    fs::write(&base, "reconcile:\n  skip_distance: 10\nstore:\n  preferences_path: a.json\n")?;
    fs::write(&local, "store:\n  preferences_path: b.json\n")?;

    let base_s = base.to_string_lossy().to_string();
    let local_s = local.to_string_lossy().to_string();
    let settings = load_layered_yaml(&[base_s.as_str(), local_s.as_str()])?.settings()?;

    assert_eq!(settings.preferences_path, PathBuf::from("b.json"));
    assert_eq!(settings.skip_distance, 10);
    Ok(())
}

#[test]
fn missing_file_names_the_path() {
    let err = load_layered_yaml(&["/definitely/not/here.yaml"]).unwrap_err();
    assert!(err.to_string().contains("/definitely/not/here.yaml"));
}

#[test]
fn wrong_type_is_rejected() {
    let loaded =
        load_layered_yaml_from_strings(&["dispatch:\n  full_debounce_ms: soon\n"]).unwrap();
    let err = loaded.settings().unwrap_err();
    assert!(err.to_string().contains("/dispatch/full_debounce_ms"));
}

#[test]
fn negative_debounce_is_rejected() {
    let loaded =
        load_layered_yaml_from_strings(&["dispatch:\n  incremental_debounce_ms: -5\n"]).unwrap();
    assert!(loaded.settings().is_err());
}
