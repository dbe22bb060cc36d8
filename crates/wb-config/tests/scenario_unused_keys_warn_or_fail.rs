use wb_config::{load_layered_yaml_from_strings, report_unused_keys, UnusedKeyPolicy};

/// Unused-key detection.
///
/// 1) Unused keys are reported in WARN mode without error.
/// 2) Unused keys fail in FAIL mode.
/// 3) Keys under consumed sections are never flagged.
/// 4) Reported pointers are sorted.

#[test]
fn warn_mode_reports_unused_keys_without_error() {
    let yaml = r#"
auction:
  base_url: "http://auction:8000"

auctoin:
  dry_run: true
  path: "/x"
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).expect("config load must succeed");
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)
        .expect("warn mode must not error");

    assert!(!report.is_clean());
    assert!(report
        .unused_leaf_pointers
        .contains(&"/auctoin/dry_run".to_string()));
    assert!(report.unused_leaf_pointers.contains(&"/auctoin/path".to_string()));
}

#[test]
fn fail_mode_errors_on_unused_keys() {
    let yaml = r#"
bidding:
  invocation_timeout_secs: 10
strategies:
  foo: 1
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).expect("config load must succeed");
    let result = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail);

    let msg = format!("{:?}", result.expect_err("fail policy must error"));
    assert!(msg.contains("CONFIG_UNUSED_KEYS"), "got: {msg}");
}

#[test]
fn consumed_sections_cover_nested_keys() {
    let yaml = r#"
daemon:
  addr: "0.0.0.0:8899"
database:
  url_env: "WB_DATABASE_URL"
  max_connections: 2
auction:
  request_timeout_secs: 10
bidding:
  timezone: "UTC"
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).expect("config load must succeed");
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail)
        .expect("every key is consumed");
    assert!(report.is_clean());
}

#[test]
fn deterministic_unused_pointer_ordering() {
    let yaml = r#"
unused:
  b: 2
  a: 1
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).expect("config load must succeed");
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)
        .expect("warn mode must not error");

    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/unused/a".to_string(), "/unused/b".to_string()]
    );
}
