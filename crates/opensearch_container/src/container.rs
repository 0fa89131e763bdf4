//! Handle to a running OpenSearch container.

use crate::container_spec::HTTP_PORT;
use crate::errors::Error;
use crate::runtime::RunningContainer;
use crate::security::{Credentials, SecurityMode};
use std::fmt;

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;

/// A started OpenSearch container and the security mode it was launched in.
///
/// Stopping the container is explicit: call [`terminate`](Self::terminate)
/// when the test is done with it.
pub struct OpenSearchContainer {
    inner: Box<dyn RunningContainer>,
    security: SecurityMode,
    credentials: Credentials,
}

impl OpenSearchContainer {
    pub fn new(inner: Box<dyn RunningContainer>, security: SecurityMode) -> Self {
        Self {
            inner,
            security,
            credentials: Credentials::default(),
        }
    }

    pub fn id(&self) -> &str {
        self.inner.id()
    }

    pub fn security_mode(&self) -> SecurityMode {
        self.security
    }

    pub fn is_security_enabled(&self) -> bool {
        self.security.is_enabled()
    }

    /// Credentials the image provisions when security is enabled.
    ///
    /// Returned in both modes; with security disabled the server ignores them.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    pub fn password(&self) -> &str {
        &self.credentials.password
    }

    /// Base URL of the REST API, e.g. `http://localhost:49153`.
    ///
    /// The scheme is `https` when security is enabled.
    pub async fn http_host_address(&self) -> Result<String, Error> {
        let host = self.inner.host().await.map_err(Error::Lookup)?;
        let port = self.mapped_port(HTTP_PORT).await?;

        Ok(format!("{}://{}:{}", self.security.scheme(), host, port))
    }

    /// Host port a container port is published on.
    pub async fn mapped_port(&self, container_port: u16) -> Result<u16, Error> {
        self.inner
            .mapped_port(container_port)
            .await
            .map_err(Error::Lookup)
    }

    /// Stop and remove the container.
    pub async fn terminate(&mut self) -> Result<(), Error> {
        self.inner.terminate().await.map_err(Error::Terminate)
    }
}

impl fmt::Debug for OpenSearchContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenSearchContainer")
            .field("id", &self.inner.id())
            .field("security", &self.security)
            .finish()
    }
}
