//! Launching OpenSearch containers.

use crate::config::LauncherConfig;
use crate::container::OpenSearchContainer;
use crate::container_spec::{ContainerSpec, Customization};
use crate::docker::DockerRuntime;
use crate::errors::Error;
use crate::readiness::ReadinessStrategy;
use crate::runtime::{ContainerRuntime, LaunchRequest};
use crate::security::SecurityMode;
use tracing::info;

#[cfg(test)]
#[path = "launcher_tests.rs"]
mod tests;

/// Build the launch request for a set of customizations.
///
/// Starts from the default single-node spec, applies `customizations` in
/// order, resolves the security mode from the resulting environment, strips
/// the security flag when security is enabled and attaches the matching
/// readiness probe.
pub fn prepare_launch<I>(config: &LauncherConfig, customizations: I) -> (LaunchRequest, SecurityMode)
where
    I: IntoIterator<Item = Customization>,
{
    let mut spec = ContainerSpec::opensearch_default(config).customize(customizations);

    let mode = SecurityMode::from_environment(&spec.env);
    mode.finalize_environment(&mut spec.env);

    let readiness = ReadinessStrategy::for_mode(mode, spec.startup_timeout);

    (LaunchRequest { spec, readiness }, mode)
}

/// Starts OpenSearch containers on a [`ContainerRuntime`].
///
/// Each launch is independent; the launcher holds no per-container state.
pub struct OpenSearchLauncher<R> {
    runtime: R,
    config: LauncherConfig,
}

impl<R> OpenSearchLauncher<R>
where
    R: ContainerRuntime,
{
    pub fn new(runtime: R, config: LauncherConfig) -> Self {
        Self { runtime, config }
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Start a container and wait until it is ready.
    ///
    /// Runtime failures are returned as [`Error::Launch`] without retrying.
    pub async fn launch<I>(&self, customizations: I) -> Result<OpenSearchContainer, Error>
    where
        I: IntoIterator<Item = Customization>,
    {
        let (request, mode) = prepare_launch(&self.config, customizations);

        info!(
            image = %request.spec.image,
            security_enabled = mode.is_enabled(),
            "Launching OpenSearch container"
        );

        let container = self.runtime.start(request).await.map_err(Error::Launch)?;

        info!(
            container_id = %container.id(),
            security_enabled = mode.is_enabled(),
            "✓ OpenSearch container is ready"
        );

        Ok(OpenSearchContainer::new(container, mode))
    }
}

/// Launch a container on the local Docker daemon.
///
/// Configuration comes from [`LauncherConfig::from_env`]. The caller is
/// responsible for calling [`OpenSearchContainer::terminate`].
///
/// # Examples
///
/// ```no_run
/// use opensearch_container::{run_container, with_security_enabled};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut container = run_container([with_security_enabled()]).await?;
///
/// let url = container.http_host_address().await?;
/// assert!(url.starts_with("https://"));
///
/// container.terminate().await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_container<I>(customizations: I) -> Result<OpenSearchContainer, Error>
where
    I: IntoIterator<Item = Customization>,
{
    let config = LauncherConfig::from_env()?;
    let runtime = DockerRuntime::connect().map_err(Error::Launch)?;

    OpenSearchLauncher::new(runtime, config)
        .launch(customizations)
        .await
}
