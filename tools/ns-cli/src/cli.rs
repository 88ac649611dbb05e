//! Command-line surface of `nsbox`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ns_02_orchestrator::{DecentralizeConfig, WorkflowConfig};

/// Start blockchain nodes in the local sandbox and decentralize them.
#[derive(Parser, Debug)]
#[command(name = "nsbox", version)]
#[command(about = "Start sandboxed blockchain nodes and record them in services.json")]
pub struct Cli {
    /// Sandbox JSON-RPC endpoint
    #[arg(long, global = true, env = "NS_SANDBOX_ENDPOINT")]
    pub sandbox_endpoint: Option<String>,

    /// Service registry file
    #[arg(long, global = true, env = "NS_REGISTRY_PATH")]
    pub registry: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an ICON node, or decentralize a running one.
    Icon(IconArgs),
}

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct IconArgs {
    #[command(subcommand)]
    pub action: Option<IconAction>,

    /// Custom genesis archive
    #[arg(short, long)]
    pub genesis: Option<PathBuf>,

    /// Custom node config JSON
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Decentralize the node once it is running
    #[arg(short, long)]
    pub decentralization: bool,
}

#[derive(Subcommand, Debug)]
pub enum IconAction {
    /// Decentralize an already running ICON node.
    Decentralize(DecentralizeArgs),
}

#[derive(Args, Debug)]
pub struct DecentralizeArgs {
    /// Name of the node's service
    #[arg(short = 's', long = "serviceName")]
    pub service_name: String,

    /// Private endpoint of the node
    #[arg(short = 'e', long = "nodeEndpoint")]
    pub node_endpoint: String,

    /// Keystore of the node's wallet
    #[arg(short = 'k', long = "keystorePath")]
    pub keystore_path: String,

    /// Password of the keystore
    #[arg(short = 'p', long = "keyPassword")]
    pub key_password: String,

    /// Network id
    #[arg(short = 'n', long = "nid")]
    pub nid: String,
}

impl IconArgs {
    pub fn workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            decentralize: self.decentralization,
            genesis: self.genesis.clone(),
            node_config: self.config.clone(),
            ..WorkflowConfig::default()
        }
    }
}

impl From<DecentralizeArgs> for DecentralizeConfig {
    fn from(args: DecentralizeArgs) -> Self {
        Self {
            service_name: args.service_name,
            node_endpoint: args.node_endpoint,
            keystore_path: args.keystore_path,
            key_password: args.key_password,
            network_id: args.nid,
        }
    }
}
