//! End-to-end tests against real OpenSearch containers.
//!
//! These tests start containers on the local Docker daemon and make real
//! HTTP requests against them.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p e2e_tests --test opensearch_endpoints -- --ignored --test-threads=1
//! ```
//!
//! Set `OPENSEARCH_IMAGE` to test against a different release.

use anyhow::Result;
use e2e_tests::{get_root, init_test_logging};
use opensearch_container::{
    generate_container_name, run_container, with_container_name, with_security_enabled,
    DockerRuntime, Error, SecurityMode,
};
use reqwest::StatusCode;
use std::time::Duration;

/// Test the default launch: security disabled, plain HTTP, no credentials needed.
///
/// Verifies:
/// - The address uses the `http` scheme
/// - GET / returns 200 without authentication
/// - The response is the cluster info document
#[tokio::test]
#[ignore = "Requires a Docker daemon"]
async fn test_opensearch_default() -> Result<()> {
    init_test_logging();

    let mut container = run_container(Vec::new()).await?;

    let url = container.http_host_address().await?;
    assert!(
        url.starts_with("http://"),
        "url: want prefix 'http://', got '{}'",
        url
    );
    assert_eq!(container.security_mode(), SecurityMode::Disabled);

    let response = get_root(&container, false).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await?;
    tracing::info!("body: {}", body);
    assert!(
        body["version"]["number"].is_string(),
        "Root document should report a version"
    );

    container.terminate().await?;
    Ok(())
}

/// Test launching with the security plugin enabled.
///
/// Verifies:
/// - The address uses the `https` scheme
/// - GET / with the default credentials returns 200
/// - GET / without credentials is rejected with 401
#[tokio::test]
#[ignore = "Requires a Docker daemon"]
async fn test_opensearch_with_security_enabled() -> Result<()> {
    init_test_logging();

    let mut container = run_container(vec![with_security_enabled()]).await?;

    let url = container.http_host_address().await?;
    assert!(
        url.starts_with("https://"),
        "url: want prefix 'https://', got '{}'",
        url
    );
    assert!(container.is_security_enabled());

    let response = get_root(&container, true).await?;
    assert_eq!(
        response.status(),
        StatusCode::OK,
        "Authenticated request should succeed"
    );

    let response = get_root(&container, false).await?;
    assert_eq!(
        response.status(),
        StatusCode::UNAUTHORIZED,
        "Unauthenticated request should be rejected"
    );

    container.terminate().await?;
    Ok(())
}

/// Test that address lookups fail once the container has been terminated.
#[tokio::test]
#[ignore = "Requires a Docker daemon"]
async fn test_address_lookup_fails_after_terminate() -> Result<()> {
    init_test_logging();

    let mut container = run_container(Vec::new()).await?;
    container.terminate().await?;

    let result = container.http_host_address().await;
    assert!(
        matches!(result, Err(Error::Lookup(_))),
        "Lookup after terminate should fail, got {:?}",
        result
    );

    // Second terminate is a no-op
    container.terminate().await?;
    Ok(())
}

/// Test that the orphan sweep leaves fresh containers alone.
#[tokio::test]
#[ignore = "Requires a Docker daemon"]
async fn test_orphan_cleanup_skips_fresh_containers() -> Result<()> {
    init_test_logging();

    let name = generate_container_name();
    let mut container = run_container(vec![with_container_name(name.clone())]).await?;

    let runtime = DockerRuntime::connect()?;
    let removed = runtime
        .cleanup_orphaned_containers(Duration::from_secs(3600))
        .await?;

    assert!(
        !removed.contains(&name),
        "Fresh container {} should not be swept",
        name
    );
    assert!(container.http_host_address().await.is_ok());

    container.terminate().await?;
    Ok(())
}
