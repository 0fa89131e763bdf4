//! In-memory container runtime for unit tests.

use crate::errors::RuntimeError;
use crate::runtime::{ContainerRuntime, LaunchRequest, RunningContainer};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Records every launch request and hands back a [`FakeContainer`].
#[derive(Default, Clone)]
pub struct FakeRuntime {
    requests: Arc<Mutex<Vec<LaunchRequest>>>,
    fail_with_timeout: bool,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// A runtime whose containers never become ready.
    pub fn failing() -> Self {
        Self {
            fail_with_timeout: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<LaunchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> LaunchRequest {
        self.requests()
            .pop()
            .expect("runtime should have received a request")
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn start(&self, request: LaunchRequest) -> Result<Box<dyn RunningContainer>, RuntimeError> {
        let exposed: Vec<u16> = request.spec.exposed_ports.iter().copied().collect();
        let scheme = if request.readiness.tls { "https" } else { "http" };
        self.requests.lock().unwrap().push(request);

        if self.fail_with_timeout {
            return Err(RuntimeError::ReadinessTimeout {
                url: format!("{}://localhost:32768/", scheme),
                elapsed: std::time::Duration::from_secs(300),
                last_outcome: "status 503".to_string(),
            });
        }

        let ports = exposed
            .into_iter()
            .enumerate()
            .map(|(i, port)| (port, 32768 + i as u16))
            .collect();

        Ok(Box::new(FakeContainer::new(ports)))
    }
}

/// A "running" container with fixed port mappings.
pub struct FakeContainer {
    ports: HashMap<u16, u16>,
    terminated: bool,
    terminate_calls: Arc<Mutex<u32>>,
}

impl FakeContainer {
    pub fn new(ports: HashMap<u16, u16>) -> Self {
        Self {
            ports,
            terminated: false,
            terminate_calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn terminate_calls(&self) -> Arc<Mutex<u32>> {
        Arc::clone(&self.terminate_calls)
    }
}

#[async_trait]
impl RunningContainer for FakeContainer {
    fn id(&self) -> &str {
        "fake-container"
    }

    async fn host(&self) -> Result<String, RuntimeError> {
        if self.terminated {
            return Err(RuntimeError::ContainerNotRunning("fake-container".to_string()));
        }
        Ok("localhost".to_string())
    }

    async fn mapped_port(&self, container_port: u16) -> Result<u16, RuntimeError> {
        if self.terminated {
            return Err(RuntimeError::ContainerNotRunning("fake-container".to_string()));
        }
        self.ports
            .get(&container_port)
            .copied()
            .ok_or(RuntimeError::PortNotMapped(container_port))
    }

    async fn terminate(&mut self) -> Result<(), RuntimeError> {
        if !self.terminated {
            *self.terminate_calls.lock().unwrap() += 1;
            self.terminated = true;
        }
        Ok(())
    }
}
