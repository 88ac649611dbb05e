//! # Provision Inputs
//!
//! What the sandbox needs to start an ICON node: a genesis archive and the
//! node's network config. Operator-supplied files are checked here, before
//! the sandbox is called.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shared_types::WorkflowError;

use crate::config::WorkflowConfig;

/// Genesis archive bundled with the sandbox package, relative to its root.
pub const DEFAULT_GENESIS_FILE: &str = "../../static-files/config/genesis-icon-0.zip";

/// Chain the node belongs to. Sent to the sandbox as-is.
pub const ICON_CHAIN: &str = "icon";

/// Where the node's genesis comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenesisSource {
    /// The archive shipped with the sandbox package.
    Bundled,
    /// An operator-supplied archive on the local filesystem.
    Custom(PathBuf),
}

impl GenesisSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Bundled => Path::new(DEFAULT_GENESIS_FILE),
            Self::Custom(path) => path,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

/// Network settings of an ICON node, as read from `--config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    pub private_port: u16,
    pub public_port: u16,
    pub p2p_listen_address: String,
    pub p2p_address: String,
    /// Chain id of the genesis the node boots from.
    pub cid: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            private_port: 9080,
            public_port: 8090,
            p2p_listen_address: "7080".to_string(),
            p2p_address: "8080".to_string(),
            cid: "0xacbc4e".to_string(),
        }
    }
}

impl NodeConfig {
    /// Load and check a config file.
    pub fn load(path: &Path) -> Result<Self, WorkflowError> {
        let bytes = fs::read(path).map_err(|e| {
            WorkflowError::Validation(format!("cannot read config {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_slice(&bytes).map_err(|e| {
            WorkflowError::Validation(format!("invalid config {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.private_port == 0 || self.public_port == 0 {
            return Err(WorkflowError::Validation(
                "node ports must be non-zero".to_string(),
            ));
        }
        if self.private_port == self.public_port {
            return Err(WorkflowError::Validation(format!(
                "private and public port must differ (both {})",
                self.private_port
            )));
        }
        for (name, value) in [
            ("p2p_listen_address", &self.p2p_listen_address),
            ("p2p_address", &self.p2p_address),
            ("cid", &self.cid),
        ] {
            if value.trim().is_empty() {
                return Err(WorkflowError::Validation(format!(
                    "config field {name} must not be empty"
                )));
            }
        }
        Ok(())
    }
}

/// Everything the provisioner sends to the sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub chain: &'static str,
    pub genesis: GenesisSource,
    pub node_config: NodeConfig,
}

impl ProvisionRequest {
    /// Resolve the operator's flags into a provision request.
    ///
    /// # Errors
    /// `WorkflowError::Validation` if a supplied genesis file does not exist or
    /// a supplied config file cannot be read or parsed.
    pub fn from_config(config: &WorkflowConfig) -> Result<Self, WorkflowError> {
        let genesis = match &config.genesis {
            Some(path) => {
                if !path.is_file() {
                    return Err(WorkflowError::Validation(format!(
                        "genesis file {} does not exist",
                        path.display()
                    )));
                }
                GenesisSource::Custom(path.clone())
            }
            None => GenesisSource::Bundled,
        };

        let node_config = match &config.node_config {
            Some(path) => NodeConfig::load(path)?,
            None => NodeConfig::default(),
        };

        Ok(Self {
            chain: ICON_CHAIN,
            genesis,
            node_config,
        })
    }
}
