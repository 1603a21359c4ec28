use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::config::DappConfig;
use crate::core::errors::DappError;
use crate::core::validation::EntityKind;

/// dApp CLI (library-facing definitions)
#[derive(Debug, Parser)]
#[command(name = "dapp-cli", about = "Build, inspect and submit ledger transaction manifests", version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Network defaults used when no configuration file is given
    #[arg(long, global = true, default_value = "stokenet")]
    pub network: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the manifest an operation would submit
    Manifest {
        /// Account acting as initiator
        #[arg(long)]
        account: String,
        operation: String,
        args: Vec<String>,
    },
    /// List the known operations and their arguments
    Operations,
    /// Show fungible and non-fungible holdings of an account
    Balances {
        #[arg(long)]
        account: String,
    },
    /// Look up the status of a submitted transaction
    Status {
        #[arg(long = "intent-hash")]
        intent_hash: String,
    },
    /// Build and submit an operation through the wallet relay
    Submit {
        operation: String,
        args: Vec<String>,
        /// Plain-text message attached to the transaction
        #[arg(long)]
        message: Option<String>,
    },
    /// Check an address' checksum, entity kind and network
    ValidateAddress {
        address: String,
        #[arg(long, value_enum, default_value_t = KindArg::Account)]
        kind: KindArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Account,
    Component,
    Resource,
    Validator,
    Package,
    Pool,
}

impl From<KindArg> for EntityKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Account => EntityKind::Account,
            KindArg::Component => EntityKind::Component,
            KindArg::Resource => EntityKind::Resource,
            KindArg::Validator => EntityKind::Validator,
            KindArg::Package => EntityKind::Package,
            KindArg::Pool => EntityKind::Pool,
        }
    }
}

impl Cli {
    /// Configuration file if given, otherwise network defaults; `DAPP_*` overrides on top.
    pub fn load_config(&self) -> Result<DappConfig, DappError> {
        let config = match &self.config {
            Some(path) => DappConfig::load(path)?,
            None => DappConfig::for_network(&self.network)?,
        };
        Ok(config.apply_env())
    }
}
