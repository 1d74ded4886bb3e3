use vwk_config::{load_layered_yaml_from_strings, report_unused_keys, UnusedKeyPolicy};

/// scenario_unused_keys_warn_or_fail
///
/// Validates:
/// 1) Unused keys are detected in WARN mode but do not error.
/// 2) Unused keys cause failure in FAIL mode.
/// 3) Keys under consumed prefixes are not flagged.
/// 4) Deterministic ordering of unused pointers.

#[test]
fn warn_mode_reports_unused_keys_without_error() {
    let yaml = r#"
reconcile:
  skip_distance: 4
  skip_distnace: 8

ui:
  theme: dark
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).expect("config load must succeed");
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)
        .expect("warn mode must not error");

    assert!(!report.is_clean());
    assert_eq!(
        report.unused_leaf_pointers,
        vec![
            "/reconcile/skip_distnace".to_string(),
            "/ui/theme".to_string()
        ]
    );
}

#[test]
fn fail_mode_errors_on_unused_keys() {
    let yaml = r#"
dispatch:
  full_debounce_ms: 100
  debounce_everything: true
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let err = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail)
        .expect_err("fail mode must error on unused keys");

    let msg = err.to_string();
    assert!(msg.contains("CONFIG_UNUSED_KEYS"), "got: {msg}");
    assert!(msg.contains("/dispatch/debounce_everything"), "got: {msg}");
}

#[test]
fn fully_consumed_config_is_clean_in_fail_mode() {
    let yaml = r#"
reconcile:
  skip_distance: 10
dispatch:
  full_debounce_ms: 200
  incremental_debounce_ms: 50
store:
  preferences_path: "prefs.json"
log:
  filter: "info"
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean(), "unexpected: {:?}", report.unused_leaf_pointers);
}

#[test]
fn empty_config_is_clean() {
    let loaded = load_layered_yaml_from_strings(&["{}"]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean());
}
