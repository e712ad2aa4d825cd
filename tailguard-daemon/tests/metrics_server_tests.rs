//! Integration tests for metrics server functionality.

use serial_test::serial;
use tailguard_core::config::MetricsConfig;
use tailguard_daemon::metrics_server;

#[test]
#[serial]
fn test_install_metrics_recorder_rejects_unsupported_endpoint() {
    // Given: A custom endpoint path
    let config = MetricsConfig {
        enabled: true,
        listen_addr: "127.0.0.1".to_owned(),
        port: 19187,
        endpoint: "/stats".to_owned(),
    };

    // When: Installing the metrics recorder
    let result = metrics_server::install_metrics_recorder(&config);

    // Then: Should fail before binding anything
    let err = result.unwrap_err();
    assert!(err.to_string().contains("unsupported metrics endpoint"));
}

#[test]
#[serial]
fn test_install_metrics_recorder_fails_with_invalid_address() {
    // Given: An invalid listen address
    let config = MetricsConfig {
        enabled: true,
        listen_addr: "999.999.999.999".to_owned(),
        port: 19187,
        endpoint: "/metrics".to_owned(),
    };

    // When: Installing the metrics recorder
    let result = metrics_server::install_metrics_recorder(&config);

    // Then: Should fail
    let err = result.unwrap_err();
    assert!(err.to_string().contains("invalid metrics listen address"));
}

#[tokio::test]
#[serial]
async fn test_install_metrics_recorder_succeeds_with_valid_config() {
    // Given: A valid configuration on a non-standard port
    let config = MetricsConfig {
        enabled: true,
        listen_addr: "127.0.0.1".to_owned(),
        port: 19188,
        endpoint: "/metrics".to_owned(),
    };

    // When: Installing the metrics recorder inside a runtime
    let result = metrics_server::install_metrics_recorder(&config);

    // Then: Should succeed
    assert!(
        result.is_ok(),
        "install_metrics_recorder should succeed with valid config: {:?}",
        result.err()
    );
}
