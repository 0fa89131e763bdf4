//! Launcher configuration loaded from environment variables.

use crate::errors::Error;
use std::env;
use std::time::Duration;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Image used when `OPENSEARCH_IMAGE` is not set.
pub const DEFAULT_IMAGE: &str = "opensearchproject/opensearch:2.5.0";

/// Startup timeout used when `OPENSEARCH_STARTUP_TIMEOUT_SECS` is not set.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Defaults for the spec every launch starts from.
///
/// Customizations passed to a launch still override these values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherConfig {
    /// Image reference including tag.
    pub image: String,

    /// Overall time allowed for the container to become ready.
    pub startup_timeout: Duration,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
        }
    }
}

impl LauncherConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `OPENSEARCH_IMAGE`: image reference (default `opensearchproject/opensearch:2.5.0`)
    /// - `OPENSEARCH_STARTUP_TIMEOUT_SECS`: startup timeout in whole seconds (default 300)
    pub fn from_env() -> Result<Self, Error> {
        let image = match env::var("OPENSEARCH_IMAGE") {
            Ok(image) if !image.trim().is_empty() => image.trim().to_string(),
            _ => DEFAULT_IMAGE.to_string(),
        };

        let startup_timeout = match env::var("OPENSEARCH_STARTUP_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout_secs(&raw)?,
            Err(_) => DEFAULT_STARTUP_TIMEOUT,
        };

        Ok(Self {
            image,
            startup_timeout,
        })
    }
}

fn parse_timeout_secs(raw: &str) -> Result<Duration, Error> {
    let secs = raw.trim().parse::<u64>().map_err(|_| {
        Error::Configuration(format!(
            "OPENSEARCH_STARTUP_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
            raw
        ))
    })?;

    if secs == 0 {
        return Err(Error::Configuration(
            "OPENSEARCH_STARTUP_TIMEOUT_SECS must be greater than zero".to_string(),
        ));
    }

    Ok(Duration::from_secs(secs))
}
