//! Container specification and the customizations applied to it.
//!
//! A [`ContainerSpec`] is built fresh for every launch. Callers shape it by
//! passing an ordered list of [`Customization`]s; each one takes the spec by
//! value and returns the updated spec, so later customizations win when two
//! of them touch the same key.

use crate::config::LauncherConfig;
use crate::security::SECURITY_PLUGIN_DISABLED_ENV;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

#[cfg(test)]
#[path = "container_spec_tests.rs"]
mod tests;

/// REST API port inside the container.
pub const HTTP_PORT: u16 = 9200;

/// Node-to-node transport port inside the container.
pub const TRANSPORT_PORT: u16 = 9300;

/// Environment key selecting the cluster discovery mode.
pub const DISCOVERY_TYPE_ENV: &str = "discovery.type";

/// Everything the runtime needs to create the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Image reference including tag, e.g. `opensearchproject/opensearch:2.5.0`.
    pub image: String,

    /// Environment variables passed to the container.
    pub env: BTreeMap<String, String>,

    /// Container ports (TCP) published to the host on random ports.
    pub exposed_ports: BTreeSet<u16>,

    /// Fixed container name. The runtime generates one when this is `None`.
    pub name: Option<String>,

    /// Extra container labels.
    pub labels: BTreeMap<String, String>,

    /// Upper bound on how long the runtime waits for the container to become ready.
    pub startup_timeout: Duration,
}

impl ContainerSpec {
    /// The single-node, security-disabled spec every launch starts from.
    pub fn opensearch_default(config: &LauncherConfig) -> Self {
        let env = BTreeMap::from([
            (SECURITY_PLUGIN_DISABLED_ENV.to_string(), "true".to_string()),
            (DISCOVERY_TYPE_ENV.to_string(), "single-node".to_string()),
        ]);

        Self {
            image: config.image.clone(),
            env,
            exposed_ports: BTreeSet::from([HTTP_PORT, TRANSPORT_PORT]),
            name: None,
            labels: BTreeMap::new(),
            startup_timeout: config.startup_timeout,
        }
    }

    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_exposed_port(mut self, port: u16) -> Self {
        self.exposed_ports.insert(port);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    /// Environment in the `KEY=value` form the Docker API expects.
    pub fn env_pairs(&self) -> Vec<String> {
        self.env
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect()
    }

    /// Apply customizations in order.
    pub fn customize<I>(self, customizations: I) -> Self
    where
        I: IntoIterator<Item = Customization>,
    {
        customizations
            .into_iter()
            .fold(self, |spec, customization| customization.apply(spec))
    }
}

/// A caller-supplied transformation of the pending [`ContainerSpec`].
///
/// ```
/// use opensearch_container::{Customization, with_security_enabled};
///
/// let customizations = vec![
///     with_security_enabled(),
///     Customization::new(|spec| spec.with_env_var("OPENSEARCH_JAVA_OPTS", "-Xms512m -Xmx512m")),
/// ];
/// # assert_eq!(customizations.len(), 2);
/// ```
pub struct Customization(Box<dyn FnOnce(ContainerSpec) -> ContainerSpec + Send>);

impl Customization {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(ContainerSpec) -> ContainerSpec + Send + 'static,
    {
        Self(Box::new(f))
    }

    pub fn apply(self, spec: ContainerSpec) -> ContainerSpec {
        (self.0)(spec)
    }
}

impl fmt::Debug for Customization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Customization(..)")
    }
}

/// Turn the OpenSearch security plugin on.
///
/// The container then serves HTTPS with a self-signed certificate and
/// requires the default credentials.
pub fn with_security_enabled() -> Customization {
    Customization::new(|spec| spec.with_env_var(SECURITY_PLUGIN_DISABLED_ENV, "false"))
}

pub fn with_env_var(key: impl Into<String>, value: impl Into<String>) -> Customization {
    let key = key.into();
    let value = value.into();
    Customization::new(move |spec| spec.with_env_var(key, value))
}

/// Use a different image, e.g. another OpenSearch release.
pub fn with_image(image: impl Into<String>) -> Customization {
    let image = image.into();
    Customization::new(move |spec| spec.with_image(image))
}

pub fn with_exposed_port(port: u16) -> Customization {
    Customization::new(move |spec| spec.with_exposed_port(port))
}

pub fn with_startup_timeout(timeout: Duration) -> Customization {
    Customization::new(move |spec| spec.with_startup_timeout(timeout))
}

pub fn with_container_name(name: impl Into<String>) -> Customization {
    let name = name.into();
    Customization::new(move |spec| spec.with_name(name))
}

pub fn with_label(key: impl Into<String>, value: impl Into<String>) -> Customization {
    let key = key.into();
    let value = value.into();
    Customization::new(move |spec| spec.with_label(key, value))
}
