//! Error types for launching and inspecting OpenSearch containers.
//!
//! Two layers exist. [`RuntimeError`] is what a [`crate::ContainerRuntime`]
//! reports about its own work (Docker API calls, readiness probing, port
//! lookups). [`Error`] is what the launcher and the container handle return to
//! callers, and it records *which* operation the runtime failed in.

use std::time::Duration;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors returned by the launcher and by [`crate::OpenSearchContainer`].
///
/// ## Examples
///
/// ```rust,ignore
/// use opensearch_container::{run_container, Error};
///
/// match run_container([]).await {
///     Ok(container) => println!("started {}", container.id()),
///     Err(Error::Launch(e)) => eprintln!("container never became ready: {}", e),
///     Err(err) => eprintln!("other error: {}", err),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The runtime failed to create, start or ready-check the container.
    ///
    /// Launches are not retried. When this is returned no container handle
    /// exists and the runtime has already removed anything it created.
    #[error("Failed to launch OpenSearch container: {0}")]
    Launch(#[source] RuntimeError),

    /// Host or mapped port resolution failed for a running handle.
    ///
    /// This typically means the container has already been terminated.
    #[error("Failed to resolve OpenSearch container address: {0}")]
    Lookup(#[source] RuntimeError),

    /// Stopping or removing the container failed.
    #[error("Failed to terminate OpenSearch container: {0}")]
    Terminate(#[source] RuntimeError),

    /// A launcher setting read from the environment was invalid.
    #[error("Invalid launcher configuration: {0}")]
    Configuration(String),
}

/// Errors reported by a container runtime.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The Docker Engine API returned an error.
    #[error("Docker API error: {0}")]
    Docker(#[from] bollard::errors::Error),

    /// The HTTP client used for readiness probing could not be built.
    #[error("Failed to build readiness probe client: {0}")]
    ProbeClient(#[source] reqwest::Error),

    /// The readiness probe did not observe an accepted status in time.
    ///
    /// `last_outcome` describes the final probe attempt, either the status code
    /// that was returned or the transport error.
    #[error("Container at {url} was not ready after {elapsed:?} (last probe: {last_outcome})")]
    ReadinessTimeout {
        url: String,
        elapsed: Duration,
        last_outcome: String,
    },

    /// The container does not publish the requested port on the host.
    #[error("Port {0}/tcp is not mapped to a host port")]
    PortNotMapped(u16),

    /// The container has been terminated or is no longer running.
    #[error("Container {0} is not running")]
    ContainerNotRunning(String),

    /// The runtime could not determine the host the container is reachable on.
    #[error("Failed to determine container host: {0}")]
    HostResolution(String),
}
