//! The seam between the launcher and whatever actually runs containers.

use crate::container_spec::ContainerSpec;
use crate::errors::RuntimeError;
use crate::readiness::ReadinessStrategy;
use async_trait::async_trait;

/// A finalized spec together with the probe that decides when it is ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub spec: ContainerSpec,
    pub readiness: ReadinessStrategy,
}

/// Creates and starts containers.
///
/// `start` must not return until the request's readiness strategy has
/// succeeded. If it fails after creating a container, the implementation is
/// responsible for removing that container before returning the error.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn start(&self, request: LaunchRequest) -> Result<Box<dyn RunningContainer>, RuntimeError>;
}

/// A container started by a [`ContainerRuntime`].
#[async_trait]
pub trait RunningContainer: Send + Sync {
    /// Runtime-specific identifier.
    fn id(&self) -> &str;

    /// Host name or address the container's published ports are reachable on.
    async fn host(&self) -> Result<String, RuntimeError>;

    /// Host port a container TCP port is published on.
    async fn mapped_port(&self, container_port: u16) -> Result<u16, RuntimeError>;

    /// Stop and remove the container. Calling this more than once is a no-op.
    async fn terminate(&mut self) -> Result<(), RuntimeError>;
}
