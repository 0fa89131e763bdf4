//! Docker-backed container runtime.
//!
//! Talks to the local Docker daemon through bollard: pulls the image when it
//! is missing, creates the container with every exposed port published on a
//! random host port, starts it and blocks on the readiness probe.

use crate::errors::RuntimeError;
use crate::naming::{
    CONTEXT_LABEL, MANAGED_LABEL, generate_container_name, get_workflow_context,
    is_generated_container_name,
};
use crate::runtime::{ContainerRuntime, LaunchRequest, RunningContainer};
use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions, LogsOptions,
    RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::service::{HostConfig, PortMap};
use futures_util::stream::{StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;

/// Seconds Docker waits for the node to shut down before killing it.
const STOP_TIMEOUT_SECS: i64 = 5;

/// Number of log lines captured when a container fails to become ready.
const FAILURE_LOG_TAIL: &str = "100";

/// Opens a Docker client.
///
/// Kept alongside each container so cleanup on drop can talk to the daemon
/// from its own thread and runtime.
pub type DockerConnector =
    Arc<dyn Fn() -> Result<Docker, bollard::errors::Error> + Send + Sync>;

/// Runs containers on the local Docker daemon.
pub struct DockerRuntime {
    docker: Docker,
    connector: DockerConnector,
    host: String,
}

impl DockerRuntime {
    /// Connect to the Docker daemon using the local defaults (`DOCKER_HOST` or the local socket).
    ///
    /// The host containers are reached on is taken from `OPENSEARCH_CONTAINER_HOST`
    /// if set, otherwise from a `tcp://` `DOCKER_HOST`, otherwise `localhost`.
    pub fn connect() -> Result<Self, RuntimeError> {
        let host = resolve_host(
            env::var("OPENSEARCH_CONTAINER_HOST").ok().as_deref(),
            env::var("DOCKER_HOST").ok().as_deref(),
        )?;

        Self::with_connector(Arc::new(Docker::connect_with_local_defaults), host)
    }

    /// Use a custom way of reaching the daemon, e.g. `Docker::connect_with_http`.
    pub fn with_connector(
        connector: DockerConnector,
        host: impl Into<String>,
    ) -> Result<Self, RuntimeError> {
        let docker = connector()?;

        Ok(Self {
            docker,
            connector,
            host: host.into(),
        })
    }

    /// Pull `image` unless it is already present locally.
    async fn ensure_image(&self, image: &str) -> Result<(), RuntimeError> {
        if self.docker.inspect_image(image).await.is_ok() {
            debug!(image = image, "Image already present");
            return Ok(());
        }

        info!(image = image, "Pulling image");

        let (repository, tag) = split_image_reference(image);
        let options = CreateImageOptions {
            from_image: repository,
            tag,
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);
        while let Some(progress) = stream.next().await {
            let info = progress?;
            if let Some(status) = info.status {
                debug!(image = image, progress = info.progress.as_deref().unwrap_or(""), "{}", status);
            }
        }

        info!(image = image, "✓ Image pulled");
        Ok(())
    }

    /// Force-remove managed containers older than `max_age`.
    ///
    /// Only containers carrying the managed label and a generated name are
    /// considered; containers launched with a fixed name are left alone.
    /// Returns the names of the removed containers. Containers that cannot be
    /// removed are logged and skipped.
    pub async fn cleanup_orphaned_containers(
        &self,
        max_age: Duration,
    ) -> Result<Vec<String>, RuntimeError> {
        let filters = HashMap::from([(
            "label".to_string(),
            vec![format!("{}=true", MANAGED_LABEL)],
        )]);

        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all: true,
                filters,
                ..Default::default()
            }))
            .await?;

        let now = chrono::Utc::now().timestamp();
        let mut removed = Vec::new();

        for container in containers {
            let (Some(id), Some(created)) = (container.id, container.created) else {
                continue;
            };
            let name = container
                .names
                .and_then(|names| names.into_iter().next())
                .map(|name| name.trim_start_matches('/').to_string())
                .unwrap_or_else(|| id.clone());

            if !is_sweepable(&name, created, now, max_age) {
                debug!(container = %name, "Skipping container during orphan sweep");
                continue;
            }

            match self
                .docker
                .remove_container(
                    &id,
                    Some(RemoveContainerOptions {
                        force: true,
                        ..Default::default()
                    }),
                )
                .await
            {
                Ok(()) => {
                    info!(container = %name, "✓ Removed orphaned container");
                    removed.push(name);
                }
                Err(e) => {
                    warn!(container = %name, error = %e, "Failed to remove orphaned container");
                }
            }
        }

        Ok(removed)
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn start(&self, request: LaunchRequest) -> Result<Box<dyn RunningContainer>, RuntimeError> {
        let LaunchRequest { spec, readiness } = request;

        self.ensure_image(&spec.image).await?;

        let name = spec.name.clone().unwrap_or_else(generate_container_name);

        let mut labels: HashMap<String, String> = spec.labels.clone().into_iter().collect();
        labels.insert(MANAGED_LABEL.to_string(), "true".to_string());
        labels.insert(CONTEXT_LABEL.to_string(), get_workflow_context());

        let exposed_ports: HashMap<String, HashMap<(), ()>> = spec
            .exposed_ports
            .iter()
            .map(|port| (format!("{}/tcp", port), HashMap::new()))
            .collect();

        let host_config = HostConfig {
            publish_all_ports: Some(true),
            ..Default::default()
        };

        let container_config = Config {
            image: Some(spec.image.clone()),
            env: Some(spec.env_pairs()),
            exposed_ports: Some(exposed_ports),
            labels: Some(labels),
            host_config: Some(host_config),
            ..Default::default()
        };

        let created = self
            .docker
            .create_container(
                Some(CreateContainerOptions {
                    name: name.as_str(),
                    ..Default::default()
                }),
                container_config,
            )
            .await?;

        let mut container = DockerContainer::new(
            self.docker.clone(),
            Arc::clone(&self.connector),
            created.id,
            name,
            self.host.clone(),
        );

        if let Err(e) = self
            .docker
            .start_container(&container.id, None::<StartContainerOptions<String>>)
            .await
        {
            container.discard().await;
            return Err(e.into());
        }

        info!(
            container_id = %container.id,
            container = %container.name,
            image = %spec.image,
            "Container started"
        );

        let host_port = match container.mapped_port(readiness.port).await {
            Ok(port) => port,
            Err(e) => {
                container.discard().await;
                return Err(e);
            }
        };

        if let Err(e) = readiness.wait_until_ready(&container.host, host_port).await {
            error!(container_id = %container.id, error = %e, "Container failed readiness check. Fetching logs...");
            match container.logs().await {
                Ok(logs) => error!("Container logs:\n{}", logs),
                Err(log_err) => warn!(error = %log_err, "Failed to fetch container logs"),
            }
            container.discard().await;
            return Err(e);
        }

        Ok(Box::new(container))
    }
}

/// A container running on the Docker daemon.
///
/// Dropping it without calling [`RunningContainer::terminate`] force-removes
/// it before `drop` returns.
pub struct DockerContainer {
    docker: Docker,
    connector: DockerConnector,
    id: String,
    name: String,
    host: String,
    terminated: bool,
}

impl DockerContainer {
    fn new(
        docker: Docker,
        connector: DockerConnector,
        id: String,
        name: String,
        host: String,
    ) -> Self {
        Self {
            docker,
            connector,
            id,
            name,
            host,
            terminated: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn logs(&self) -> Result<String, RuntimeError> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            tail: FAILURE_LOG_TAIL.to_string(),
            ..Default::default()
        };

        let mut logs = self.docker.logs(&self.id, Some(options));
        let mut output = String::new();

        while let Some(log) = logs.try_next().await? {
            output.push_str(&log.to_string());
        }

        Ok(output)
    }

    /// Terminate on a failure path, logging instead of returning errors.
    async fn discard(&mut self) {
        if let Err(e) = self.terminate().await {
            warn!(container_id = %self.id, error = %e, "Failed to remove container after launch failure");
        }
    }
}

#[async_trait]
impl RunningContainer for DockerContainer {
    fn id(&self) -> &str {
        &self.id
    }

    async fn host(&self) -> Result<String, RuntimeError> {
        if self.terminated {
            return Err(RuntimeError::ContainerNotRunning(self.id.clone()));
        }
        Ok(self.host.clone())
    }

    async fn mapped_port(&self, container_port: u16) -> Result<u16, RuntimeError> {
        if self.terminated {
            return Err(RuntimeError::ContainerNotRunning(self.id.clone()));
        }

        let details = match self
            .docker
            .inspect_container(&self.id, None::<InspectContainerOptions>)
            .await
        {
            Ok(details) => details,
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => return Err(RuntimeError::ContainerNotRunning(self.id.clone())),
            Err(e) => return Err(e.into()),
        };

        let running = details
            .state
            .as_ref()
            .and_then(|state| state.running)
            .unwrap_or(false);
        if !running {
            return Err(RuntimeError::ContainerNotRunning(self.id.clone()));
        }

        details
            .network_settings
            .and_then(|settings| settings.ports)
            .and_then(|ports| find_host_port(&ports, container_port))
            .ok_or(RuntimeError::PortNotMapped(container_port))
    }

    async fn terminate(&mut self) -> Result<(), RuntimeError> {
        if self.terminated {
            return Ok(());
        }

        info!(container_id = %self.id, "Stopping container");

        if let Err(e) = self
            .docker
            .stop_container(&self.id, Some(StopContainerOptions { t: STOP_TIMEOUT_SECS }))
            .await
        {
            // Already stopped or never started; force removal below still applies.
            debug!(container_id = %self.id, error = %e, "Stop request failed");
        }

        match self
            .docker
            .remove_container(
                &self.id,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await
        {
            Ok(())
            | Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => {}
            Err(e) => return Err(e.into()),
        }

        self.terminated = true;
        info!(container_id = %self.id, "✓ Container stopped and removed");
        Ok(())
    }
}

impl Drop for DockerContainer {
    fn drop(&mut self) {
        if self.terminated {
            return;
        }

        // The caller's runtime may be shutting down (end of a `#[tokio::test]`),
        // so removal runs to completion on a dedicated thread with a fresh client.
        let connector = Arc::clone(&self.connector);
        let id = self.id.clone();
        let cleanup = thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!(container_id = %id, error = %e, "Failed to build cleanup runtime");
                    return;
                }
            };

            let result = runtime.block_on(async {
                let docker = connector()?;
                docker
                    .remove_container(
                        &id,
                        Some(RemoveContainerOptions {
                            force: true,
                            ..Default::default()
                        }),
                    )
                    .await
            });

            match result {
                Ok(()) => info!(container_id = %id, "✓ Removed dropped container"),
                Err(e) => warn!(container_id = %id, error = %e, "Failed to remove dropped container"),
            }
        });

        if cleanup.join().is_err() {
            warn!(container_id = %self.id, "Container cleanup thread panicked");
        }
    }
}

/// Work out which host published container ports are reachable on.
pub fn resolve_host(
    host_override: Option<&str>,
    docker_host: Option<&str>,
) -> Result<String, RuntimeError> {
    if let Some(host) = host_override.map(str::trim).filter(|host| !host.is_empty()) {
        return Ok(host.to_string());
    }

    match docker_host {
        Some(docker_host) if docker_host.starts_with("tcp://") => {
            let url = Url::parse(docker_host).map_err(|e| {
                RuntimeError::HostResolution(format!("invalid DOCKER_HOST '{}': {}", docker_host, e))
            })?;
            url.host_str().map(str::to_string).ok_or_else(|| {
                RuntimeError::HostResolution(format!("DOCKER_HOST '{}' has no host", docker_host))
            })
        }
        _ => Ok("localhost".to_string()),
    }
}

/// Split an image reference into repository and tag for a pull.
///
/// Untagged references resolve to `latest`. Digest references are passed
/// through whole with an empty tag.
pub fn split_image_reference(image: &str) -> (&str, &str) {
    if image.contains('@') {
        return (image, "");
    }

    let name_start = image.rfind('/').map(|i| i + 1).unwrap_or(0);
    match image[name_start..].rfind(':') {
        Some(i) => (&image[..name_start + i], &image[name_start + i + 1..]),
        None => (image, "latest"),
    }
}

/// Host port bound to `container_port`, preferring the IPv4 binding.
pub fn find_host_port(ports: &PortMap, container_port: u16) -> Option<u16> {
    let bindings = ports.get(&format!("{}/tcp", container_port))?.as_ref()?;

    let parse = |binding: &bollard::service::PortBinding| {
        binding
            .host_port
            .as_deref()
            .and_then(|port| port.parse::<u16>().ok())
    };

    bindings
        .iter()
        .filter(|binding| {
            binding
                .host_ip
                .as_deref()
                .is_none_or(|ip| !ip.contains(':'))
        })
        .find_map(parse)
        .or_else(|| bindings.iter().find_map(parse))
}

/// Whether a container created at `created` (unix seconds) is older than `max_age` at `now`.
pub fn is_orphaned(created: i64, now: i64, max_age: Duration) -> bool {
    let age = now.saturating_sub(created);
    age >= 0 && age as u64 >= max_age.as_secs()
}

/// Whether the orphan sweep may remove a managed container.
pub fn is_sweepable(name: &str, created: i64, now: i64, max_age: Duration) -> bool {
    is_generated_container_name(name) && is_orphaned(created, now, max_age)
}
