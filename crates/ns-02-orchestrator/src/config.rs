//! # Configuration
//!
//! Per-invocation inputs (`WorkflowConfig`, `DecentralizeConfig`) are built by
//! the caller for each run and passed by reference. `RuntimeConfig` describes
//! where the sandbox and the registry live and is loaded once per process.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use ns_01_service_registry::DEFAULT_REGISTRY_FILE;

/// Sandbox JSON-RPC endpoint used when none is configured.
pub const DEFAULT_SANDBOX_ENDPOINT: &str = "http://127.0.0.1:9710";

/// Seconds allowed to establish a connection to the sandbox.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// What happens after a decentralization failure in the start workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Persist the provisioned node anyway and report the decentralization
    /// failure as the run's originating error. The node exists either way, so
    /// the registry must know about it.
    #[default]
    RecordWhatSucceeded,
    /// Stop after the failed decentralization without touching the registry.
    AbortOnDecentralizationFailure,
}

/// Inputs of one `icon` start run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Submit the node for decentralization after it starts.
    pub decentralize: bool,
    /// Custom genesis archive. `None` uses the sandbox's bundled one.
    pub genesis: Option<PathBuf>,
    /// Custom node config JSON. `None` uses the built-in defaults.
    pub node_config: Option<PathBuf>,
    pub failure_policy: FailurePolicy,
}

/// Inputs of one decentralize-existing run. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecentralizeConfig {
    pub service_name: String,
    pub node_endpoint: String,
    pub keystore_path: String,
    pub key_password: String,
    pub network_id: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("sandbox endpoint {0:?} must be an http:// or https:// URL")]
    InvalidEndpoint(String),

    #[error("registry path must not be empty")]
    EmptyRegistryPath,

    #[error("connect timeout must be at least one second")]
    ZeroTimeout,

    #[error("request timeout must be at least one second")]
    ZeroRequestTimeout,
}

/// Process-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Base URL of the sandbox's JSON-RPC server.
    pub sandbox_endpoint: String,
    /// Location of the service registry document.
    pub registry_path: PathBuf,
    pub connect_timeout_secs: u64,
    /// Whole-request timeout. `None` lets sandbox calls run until they
    /// complete or the run is cancelled.
    pub request_timeout_secs: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            sandbox_endpoint: DEFAULT_SANDBOX_ENDPOINT.to_string(),
            registry_path: PathBuf::from(DEFAULT_REGISTRY_FILE),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: None,
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by `NS_SANDBOX_ENDPOINT`, `NS_REGISTRY_PATH`,
    /// `NS_CONNECT_TIMEOUT_SECS` and `NS_REQUEST_TIMEOUT_SECS`.
    ///
    /// Unparseable numbers are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(endpoint) = lookup("NS_SANDBOX_ENDPOINT") {
            config.sandbox_endpoint = endpoint;
        }
        if let Some(path) = lookup("NS_REGISTRY_PATH") {
            config.registry_path = PathBuf::from(path);
        }
        if let Some(secs) = lookup("NS_CONNECT_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(secs) => config.connect_timeout_secs = secs,
                Err(_) => warn!(
                    value = %secs,
                    "NS_CONNECT_TIMEOUT_SECS is not a number, using default"
                ),
            }
        }
        if let Some(secs) = lookup("NS_REQUEST_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(secs) => config.request_timeout_secs = Some(secs),
                Err(_) => warn!(
                    value = %secs,
                    "NS_REQUEST_TIMEOUT_SECS is not a number, ignoring"
                ),
            }
        }

        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.sandbox_endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidEndpoint(self.sandbox_endpoint.clone()));
        }
        if self.registry_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyRegistryPath);
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::ZeroRequestTimeout);
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
