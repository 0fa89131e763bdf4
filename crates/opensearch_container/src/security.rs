//! Security mode detection and the default OpenSearch credentials.

use std::collections::BTreeMap;

#[cfg(test)]
#[path = "security_tests.rs"]
mod tests;

/// Environment variable the OpenSearch image reads to turn off its security plugin.
pub const SECURITY_PLUGIN_DISABLED_ENV: &str = "DISABLE_SECURITY_PLUGIN";

/// Username configured by the image when the security plugin is active.
pub const DEFAULT_USERNAME: &str = "admin";

/// Password configured by the image when the security plugin is active.
pub const DEFAULT_PASSWORD: &str = "admin";

/// Whether the container enforces TLS and authentication.
///
/// The mode is resolved once, right before launch, and never changes for the
/// lifetime of the resulting container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityMode {
    /// Plaintext HTTP, no authentication.
    Disabled,
    /// TLS with a self-signed certificate and basic authentication.
    Enabled,
}

impl SecurityMode {
    /// Resolve the mode from a container environment.
    ///
    /// Only the exact value `"true"` disables security. Any other value, or the
    /// variable being absent, leaves the image's secure default in place.
    pub fn from_environment(env: &BTreeMap<String, String>) -> Self {
        match env.get(SECURITY_PLUGIN_DISABLED_ENV).map(String::as_str) {
            Some("true") => Self::Disabled,
            _ => Self::Enabled,
        }
    }

    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }

    /// URL scheme the container serves its REST API on.
    pub fn scheme(self) -> &'static str {
        match self {
            Self::Disabled => "http",
            Self::Enabled => "https",
        }
    }

    /// Bring an environment in line with this mode before it is handed to the runtime.
    ///
    /// The image treats the presence of the security flag as meaningful, so in
    /// enabled mode the key is removed entirely rather than set to `"false"`.
    pub fn finalize_environment(self, env: &mut BTreeMap<String, String>) {
        if self.is_enabled() {
            env.remove(SECURITY_PLUGIN_DISABLED_ENV);
        }
    }
}

/// A username/password pair for HTTP basic authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Default for Credentials {
    /// The credentials the image provisions when security is enabled.
    fn default() -> Self {
        Self::new(DEFAULT_USERNAME, DEFAULT_PASSWORD)
    }
}
