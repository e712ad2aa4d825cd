//! tailguard.toml 통합 설정 테스트
//!
//! - tailguard.toml.example 파싱 테스트
//! - 부분 설정 (일부 섹션만) 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use tailguard_core::config::{TailguardConfig, default_patterns, default_thresholds};
use tailguard_core::error::{ConfigError, TailguardError};

const EXAMPLE: &str = include_str!("../../../tailguard.toml.example");

// =============================================================================
// tailguard.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let config = TailguardConfig::parse(EXAMPLE).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.scan.mode, "local");
    assert!(config.remote_hosts.is_empty());
}

#[test]
fn example_config_passes_validation() {
    let config = TailguardConfig::parse(EXAMPLE).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_patterns_match_code_defaults() {
    let config = TailguardConfig::parse(EXAMPLE).expect("should parse");
    assert_eq!(config.patterns, default_patterns());
    assert_eq!(config.thresholds, default_thresholds());
}

#[test]
fn example_config_matches_code_defaults() {
    let from_file = TailguardConfig::parse(EXAMPLE).expect("should parse");
    let from_code = TailguardConfig::default();

    assert_eq!(from_file.general.log_level, from_code.general.log_level);
    assert_eq!(from_file.general.log_format, from_code.general.log_format);
    assert_eq!(from_file.general.data_dir, from_code.general.data_dir);
    assert_eq!(from_file.general.pid_file, from_code.general.pid_file);

    assert_eq!(from_file.scan.mode, from_code.scan.mode);
    assert_eq!(from_file.scan.interval_secs, from_code.scan.interval_secs);
    assert_eq!(from_file.scan.local_paths, from_code.scan.local_paths);
    assert_eq!(from_file.scan.filename_globs, from_code.scan.filename_globs);
    assert_eq!(
        from_file.scan.remote_read_timeout_secs,
        from_code.scan.remote_read_timeout_secs
    );
    assert_eq!(from_file.scan.sample_limit, from_code.scan.sample_limit);
    assert_eq!(from_file.scan.patterns_file, from_code.scan.patterns_file);

    assert_eq!(from_file.storage.sqlite_path, from_code.storage.sqlite_path);
    assert_eq!(from_file.storage.csv_path, from_code.storage.csv_path);
    assert_eq!(
        from_file.storage.maintenance_interval_hours,
        from_code.storage.maintenance_interval_hours
    );

    assert_eq!(from_file.alerts.log_enabled, from_code.alerts.log_enabled);
    assert_eq!(
        from_file.alerts.email.smtp_port,
        from_code.alerts.email.smtp_port
    );
    assert_eq!(
        from_file.alerts.webhook.timeout_secs,
        from_code.alerts.webhook.timeout_secs
    );

    assert_eq!(from_file.metrics.enabled, from_code.metrics.enabled);
    assert_eq!(from_file.metrics.port, from_code.metrics.port);
    assert_eq!(from_file.metrics.endpoint, from_code.metrics.endpoint);
}

// =============================================================================
// 부분 설정 로딩 테스트
// =============================================================================

#[test]
fn partial_config_general_only() {
    let toml = r#"
[general]
log_level = "debug"
log_format = "pretty"
"#;
    let config = TailguardConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.general.log_format, "pretty");
    // 나머지 섹션은 기본값
    assert_eq!(config.scan.interval_secs, 10);
    assert_eq!(config.patterns.len(), 3);
}

#[test]
fn partial_config_thresholds_replace_defaults() {
    let toml = r#"
[thresholds]
CRASH = 2
"#;
    let config = TailguardConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.thresholds.len(), 1);
    assert_eq!(config.thresholds.get("CRASH"), Some(&2));
}

#[test]
fn partial_config_mixed_mode_with_hosts() {
    let toml = r#"
[scan]
mode = "mixed"
local_paths = ["/var/log/app"]

[[remote_hosts]]
host = "10.0.0.5"
port = 2222
username = "ops"
password = "secret"
paths = ["/var/log/auth.log"]

[[remote_hosts]]
host = "10.0.0.6"
username = "ops"
paths = ["/var/log"]
"#;
    let config = TailguardConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert!(config.scan.includes_local());
    assert!(config.scan.includes_remote());
    assert_eq!(config.remote_hosts.len(), 2);
    assert_eq!(config.remote_hosts[0].label(), "10.0.0.5:2222");
    assert_eq!(config.remote_hosts[1].port, 22);
}

#[test]
fn partial_config_alert_channels() {
    let toml = r#"
[alerts.webhook]
enabled = true
url = "https://hooks.example.com/T000/B000"

[alerts.email]
enabled = true
smtp_host = "smtp.example.com"
from = "tailguard@example.com"
to = ["oncall@example.com"]
"#;
    let config = TailguardConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert!(config.alerts.log_enabled);
    assert!(config.alerts.webhook.enabled);
    assert_eq!(config.alerts.webhook.timeout_secs, 10);
    assert_eq!(config.alerts.email.smtp_port, 587);
    assert!(config.alerts.email.use_tls);
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

fn with_env<T>(key: &str, value: &str, f: impl FnOnce() -> T) -> T {
    let original = std::env::var(key).ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var(key, value);
    }

    let result = f();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var(key, val),
            None => std::env::remove_var(key),
        }
    }
    result
}

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[general]
log_level = "info"
"#;
    let result = with_env("TAILGUARD_GENERAL_LOG_LEVEL", "error", || {
        let mut config = TailguardConfig::parse(toml).expect("should parse");
        config.apply_env_overrides();
        config.general.log_level
    });
    assert_eq!(result, "error");
}

#[test]
#[serial_test::serial]
fn env_override_csv_for_vec_fields() {
    let result = with_env("TAILGUARD_SCAN_LOCAL_PATHS", "/a.log, /b/dir", || {
        let mut config = TailguardConfig::parse("").expect("should parse");
        config.apply_env_overrides();
        config.scan.local_paths
    });
    assert_eq!(result, vec!["/a.log", "/b/dir"]);
}

#[test]
#[serial_test::serial]
fn env_override_bool_field() {
    let result = with_env("TAILGUARD_ALERTS_LOG_ENABLED", "false", || {
        let mut config = TailguardConfig::parse("").expect("should parse");
        config.apply_env_overrides();
        config.alerts.log_enabled
    });
    assert!(!result);
}

#[test]
#[serial_test::serial]
fn env_override_numeric_field() {
    let result = with_env("TAILGUARD_SCAN_INTERVAL_SECS", "30", || {
        let mut config = TailguardConfig::parse("").expect("should parse");
        config.apply_env_overrides();
        config.scan.interval_secs
    });
    assert_eq!(result, 30);
}

#[test]
#[serial_test::serial]
fn env_override_invalid_numeric_keeps_value() {
    let result = with_env("TAILGUARD_SCAN_SAMPLE_LIMIT", "many", || {
        let mut config = TailguardConfig::parse("").expect("should parse");
        config.apply_env_overrides();
        config.scan.sample_limit
    });
    assert_eq!(result, 5);
}

// =============================================================================
// 에러 케이스
// =============================================================================

#[test]
fn empty_file_is_valid_default() {
    let config = TailguardConfig::parse("").expect("empty should parse");
    config.validate().expect("defaults should validate");
}

#[test]
fn wrong_type_is_parse_error() {
    let err = TailguardConfig::parse("[scan]\ninterval_secs = \"ten\"").unwrap_err();
    assert!(matches!(
        err,
        TailguardError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[tokio::test]
#[serial_test::serial]
async fn load_from_file_applies_validation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tailguard.toml");
    std::fs::write(&path, "[scan]\nsample_limit = 0\n").expect("write");

    let err = TailguardConfig::load(&path).await.unwrap_err();
    assert!(err.to_string().contains("scan.sample_limit"));
}

#[tokio::test]
#[serial_test::serial]
async fn load_from_file_succeeds_for_example() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tailguard.toml");
    std::fs::write(&path, EXAMPLE).expect("write");

    let config = TailguardConfig::load(&path).await.expect("should load");
    assert_eq!(config.scan.filename_globs, vec!["*.log", "*.out", "*.txt"]);
}
