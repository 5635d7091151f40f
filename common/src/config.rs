use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ValidationError;
use crate::registry;

pub const DEFAULT_LISTEN_PORT: u16 = 9090;
pub const DEFAULT_DOCKER_URL: &str = "unix:///var/run/docker.sock";
pub const DEFAULT_LOOKUP_PATH: &str = "/";
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(50);
/// Upper bound on the periodic re-check, one year.
pub const MAX_WATCH_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);
/// Path the lookup server reserves for its health check.
pub const HEALTH_PATH: &str = "/health";

/// Where the lookup server takes the caller's identity from.
///
/// This is a deployment decision, never a per-request one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum IdentityMode {
    /// Hostname, IP and MAC are read from the request body.
    #[default]
    Remote,
    /// The TCP peer address is the identity; body identity fields are ignored.
    SourceIp,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    /// Address of the container engine API.
    pub docker_url: String,
    pub mode: IdentityMode,
    pub lookup_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_LISTEN_PORT)),
            docker_url: DEFAULT_DOCKER_URL.to_string(),
            mode: IdentityMode::default(),
            lookup_path: DEFAULT_LOOKUP_PATH.to_string(),
        }
    }
}

impl ServerConfig {
    /// The lookup endpoint must be an absolute path that does not shadow
    /// [`HEALTH_PATH`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.lookup_path.starts_with('/') || self.lookup_path == HEALTH_PATH {
            return Err(ValidationError::InvalidLookupPath(self.lookup_path.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Name of the watched service, which is also its file name.
    pub service: String,
    /// Directory holding the registry files.
    pub registry_path: PathBuf,
    /// Periodic re-check, in case change notifications are missed or coalesced.
    pub interval: Duration,
    /// Quiet period after a change event before the cycle completes.
    pub settle: Duration,
}

impl WatchConfig {
    pub fn new(service: impl Into<String>, registry_path: impl Into<PathBuf>) -> Self {
        Self {
            service: service.into(),
            registry_path: registry_path.into(),
            interval: DEFAULT_WATCH_INTERVAL,
            settle: DEFAULT_SETTLE,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.service.is_empty() {
            return Err(ValidationError::MissingField("service"));
        }
        registry::validate_service_name(&self.service)?;
        if self.registry_path.as_os_str().is_empty() {
            return Err(ValidationError::MissingField("registry_path"));
        }
        if self.interval.is_zero() {
            return Err(ValidationError::ZeroInterval);
        }
        if self.interval > MAX_WATCH_INTERVAL {
            return Err(ValidationError::IntervalTooLong {
                max_secs: MAX_WATCH_INTERVAL.as_secs(),
            });
        }
        Ok(())
    }
}
