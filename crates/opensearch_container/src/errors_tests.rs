//! Tests for launcher error types.

use super::*;
use std::error::Error as _;

#[test]
fn test_launch_error_keeps_runtime_error_as_source() {
    let err = Error::Launch(RuntimeError::PortNotMapped(9200));

    assert_eq!(
        err.to_string(),
        "Failed to launch OpenSearch container: Port 9200/tcp is not mapped to a host port"
    );
    let source = err.source().expect("launch error should have a source");
    assert_eq!(source.to_string(), "Port 9200/tcp is not mapped to a host port");
}

#[test]
fn test_lookup_error_display() {
    let err = Error::Lookup(RuntimeError::ContainerNotRunning("abc123".to_string()));

    assert!(err.to_string().contains("resolve OpenSearch container address"));
    assert!(err.to_string().contains("abc123"));
}

#[test]
fn test_readiness_timeout_display_includes_url_and_last_outcome() {
    let err = RuntimeError::ReadinessTimeout {
        url: "https://localhost:32768/".to_string(),
        elapsed: Duration::from_secs(300),
        last_outcome: "status 503".to_string(),
    };

    let message = err.to_string();
    assert!(message.contains("https://localhost:32768/"));
    assert!(message.contains("300s"));
    assert!(message.contains("status 503"));
}

#[test]
fn test_configuration_error_display() {
    let err = Error::Configuration("OPENSEARCH_STARTUP_TIMEOUT_SECS must be positive".to_string());

    assert_eq!(
        err.to_string(),
        "Invalid launcher configuration: OPENSEARCH_STARTUP_TIMEOUT_SECS must be positive"
    );
    assert!(err.source().is_none());
}

#[test]
fn test_host_resolution_error_display() {
    let err = Error::Launch(RuntimeError::HostResolution(
        "DOCKER_HOST 'tcp://' has no host".to_string(),
    ));

    assert_eq!(
        err.to_string(),
        "Failed to launch OpenSearch container: Failed to determine container host: DOCKER_HOST 'tcp://' has no host"
    );
}
