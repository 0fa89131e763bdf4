//! OpenSearch containers for integration tests.
//!
//! This crate starts a single-node OpenSearch container, waits until it is
//! ready and hands back a handle exposing its address and credentials. By
//! default the security plugin is disabled and the node serves plain HTTP;
//! pass [`with_security_enabled`] to get HTTPS with basic authentication.
//!
//! # Usage
//!
//! ```no_run
//! use opensearch_container::run_container;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut container = run_container([]).await?;
//! let url = container.http_host_address().await?;
//! assert!(url.starts_with("http://"));
//! container.terminate().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod container;
pub mod container_spec;
pub mod docker;
pub mod errors;
pub mod launcher;
pub mod naming;
pub mod readiness;
pub mod runtime;
pub mod security;

#[cfg(test)]
mod test_support;

pub use config::LauncherConfig;
pub use container::OpenSearchContainer;
pub use container_spec::{
    ContainerSpec, Customization, HTTP_PORT, TRANSPORT_PORT, with_container_name, with_env_var,
    with_exposed_port, with_image, with_label, with_security_enabled, with_startup_timeout,
};
pub use docker::{DockerContainer, DockerRuntime};
pub use errors::{Error, RuntimeError};
pub use launcher::{OpenSearchLauncher, prepare_launch, run_container};
pub use naming::{generate_container_name, get_workflow_context};
pub use readiness::ReadinessStrategy;
pub use runtime::{ContainerRuntime, LaunchRequest, RunningContainer};
pub use security::{Credentials, SecurityMode};

/// Initialize test logging (call once per test binary).
///
/// Honors `RUST_LOG`; defaults to `warn,opensearch_container=debug`.
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,opensearch_container=debug")),
        )
        .with_test_writer()
        .try_init();
}
