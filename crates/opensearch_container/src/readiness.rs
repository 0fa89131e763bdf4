//! HTTP readiness probing for freshly started containers.
//!
//! OpenSearch boots in one of two postures. With security disabled it answers
//! plain HTTP and a `200` means it is ready. With security enabled it serves
//! HTTPS with a self-signed certificate and may answer `401` while the
//! security index initialises, so both `200` and `401` count as ready and the
//! probe sends the default credentials.

use crate::container_spec::HTTP_PORT;
use crate::errors::RuntimeError;
use crate::security::{Credentials, SecurityMode};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info};

#[cfg(test)]
#[path = "readiness_tests.rs"]
mod tests;

/// Timeout of a single probe request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Delay after each attempt before attempt number [`DEFAULT_FAST_POLL_ATTEMPTS`].
pub const DEFAULT_FAST_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Delay after attempt number [`DEFAULT_FAST_POLL_ATTEMPTS`] and every later one.
pub const DEFAULT_SLOW_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Attempt number (1-based) from which the slow interval applies.
pub const DEFAULT_FAST_POLL_ATTEMPTS: u32 = 10;

const STATUS_OK: u16 = 200;
const STATUS_UNAUTHORIZED: u16 = 401;

/// Description of an HTTP readiness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessStrategy {
    /// Request path, e.g. `/`.
    pub path: String,

    /// Container port the probe targets. The runtime maps it to a host port.
    pub port: u16,

    /// Probe over HTTPS instead of HTTP.
    pub tls: bool,

    /// Skip certificate validation when `tls` is set.
    pub accept_invalid_certs: bool,

    /// Credentials sent with every probe request.
    pub basic_auth: Option<Credentials>,

    /// Status codes that mean the container is ready.
    pub accepted_statuses: Vec<u16>,

    pub request_timeout: Duration,
    pub fast_poll_interval: Duration,
    pub slow_poll_interval: Duration,
    pub fast_poll_attempts: u32,

    /// Overall deadline for the container to become ready.
    pub startup_timeout: Duration,
}

impl ReadinessStrategy {
    /// A plain HTTP probe accepting only `200`.
    pub fn new(path: impl Into<String>, port: u16) -> Self {
        Self {
            path: path.into(),
            port,
            tls: false,
            accept_invalid_certs: false,
            basic_auth: None,
            accepted_statuses: vec![STATUS_OK],
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            fast_poll_interval: DEFAULT_FAST_POLL_INTERVAL,
            slow_poll_interval: DEFAULT_SLOW_POLL_INTERVAL,
            fast_poll_attempts: DEFAULT_FAST_POLL_ATTEMPTS,
            startup_timeout: crate::config::DEFAULT_STARTUP_TIMEOUT,
        }
    }

    /// The probe matching an OpenSearch container booted in `mode`.
    pub fn for_mode(mode: SecurityMode, startup_timeout: Duration) -> Self {
        let strategy = Self::new("/", HTTP_PORT).with_startup_timeout(startup_timeout);
        match mode {
            SecurityMode::Disabled => strategy,
            SecurityMode::Enabled => strategy
                .with_tls(true)
                .with_basic_auth(Credentials::default())
                .with_accepted_statuses([STATUS_OK, STATUS_UNAUTHORIZED]),
        }
    }

    /// Probe over HTTPS. Certificate validation is relaxed together with TLS
    /// because the image ships a self-signed certificate.
    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self.accept_invalid_certs = tls;
        self
    }

    pub fn with_basic_auth(mut self, credentials: Credentials) -> Self {
        self.basic_auth = Some(credentials);
        self
    }

    pub fn with_accepted_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.accepted_statuses = statuses.into_iter().collect();
        self
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Use a single polling interval for every attempt.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.fast_poll_interval = interval;
        self.slow_poll_interval = interval;
        self
    }

    pub fn accepts(&self, status: u16) -> bool {
        self.accepted_statuses.contains(&status)
    }

    pub fn url(&self, host: &str, host_port: u16) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        let path = self.path.trim_start_matches('/');
        format!("{}://{}:{}/{}", scheme, host, host_port, path)
    }

    /// Delay after `attempt` (1-based) before the next one.
    ///
    /// Attempts below `fast_poll_attempts` use the fast interval.
    pub fn interval_for_attempt(&self, attempt: u32) -> Duration {
        if attempt < self.fast_poll_attempts {
            self.fast_poll_interval
        } else {
            self.slow_poll_interval
        }
    }

    /// Poll `host:host_port` until an accepted status is returned.
    ///
    /// Transport errors (connection refused, TLS handshake failures while the
    /// node is still booting) count as "not ready yet". Fails with
    /// [`RuntimeError::ReadinessTimeout`] once `startup_timeout` has elapsed.
    pub async fn wait_until_ready(&self, host: &str, host_port: u16) -> Result<(), RuntimeError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(RuntimeError::ProbeClient)?;

        let url = self.url(host, host_port);
        let started = Instant::now();
        let mut attempt: u32 = 0;

        info!(url = %url, timeout = ?self.startup_timeout, "Waiting for container to become ready");

        loop {
            attempt += 1;
            let remaining = self.startup_timeout.saturating_sub(started.elapsed());

            let mut request = client
                .get(&url)
                .timeout(self.request_timeout.min(remaining.max(Duration::from_millis(1))));
            if let Some(credentials) = &self.basic_auth {
                request = request.basic_auth(&credentials.username, Some(&credentials.password));
            }

            let last_outcome = match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if self.accepts(status) {
                        info!(
                            url = %url,
                            status = status,
                            attempt = attempt,
                            elapsed = ?started.elapsed(),
                            "Container is ready"
                        );
                        return Ok(());
                    }
                    debug!(url = %url, status = status, attempt = attempt, "Readiness probe returned unaccepted status");
                    format!("status {}", status)
                }
                Err(e) => {
                    debug!(url = %url, error = %e, attempt = attempt, "Readiness probe failed");
                    e.to_string()
                }
            };

            let elapsed = started.elapsed();
            if elapsed >= self.startup_timeout {
                return Err(RuntimeError::ReadinessTimeout {
                    url,
                    elapsed,
                    last_outcome,
                });
            }

            let remaining = self.startup_timeout - elapsed;
            sleep(self.interval_for_attempt(attempt).min(remaining)).await;
        }
    }
}
