//! E2E test utilities for OpenSearch containers.

use anyhow::{Context, Result};
use opensearch_container::OpenSearchContainer;
use reqwest::{Client, Response};

/// Build an HTTP client able to talk to `container`.
///
/// With security enabled the node presents a self-signed certificate, so
/// certificate validation is skipped.
pub fn http_client(container: &OpenSearchContainer) -> Result<Client> {
    Client::builder()
        .danger_accept_invalid_certs(container.is_security_enabled())
        .build()
        .context("Failed to create HTTP client")
}

/// GET the REST API root, optionally with the container's credentials.
pub async fn get_root(container: &OpenSearchContainer, authenticate: bool) -> Result<Response> {
    let url = container.http_host_address().await?;
    let client = http_client(container)?;

    let mut request = client.get(&url);
    if authenticate {
        request = request.basic_auth(container.username(), Some(container.password()));
    }

    let response = request
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?;

    tracing::info!(url = %url, status = %response.status(), "Probed OpenSearch root");
    Ok(response)
}

// Re-export logging setup for test binaries
pub use opensearch_container::init_test_logging;
