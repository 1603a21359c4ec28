use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::errors::DappError;

/// Gateway/network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub network_id: u8,
    pub gateway_url: String,
    /// Network part of address hrps (`rdx`, `tdx_2_`).
    pub hrp_suffix: String,
}

impl NetworkConfig {
    pub fn mainnet() -> Self {
        Self {
            name: "mainnet".to_string(),
            network_id: 1,
            gateway_url: "https://mainnet.radixdlt.com".to_string(),
            hrp_suffix: "rdx".to_string(),
        }
    }

    pub fn stokenet() -> Self {
        Self {
            name: "stokenet".to_string(),
            network_id: 2,
            gateway_url: "https://stokenet.radixdlt.com".to_string(),
            hrp_suffix: "tdx_2_".to_string(),
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "mainnet" => Some(Self::mainnet()),
            "stokenet" => Some(Self::stokenet()),
            _ => None,
        }
    }

    /// Switches the network identity to `preset`. A gateway URL that was
    /// customised (anything other than the current network's public gateway)
    /// is kept.
    fn switch_to(&mut self, preset: NetworkConfig) {
        let customised_gateway = Self::preset(&self.name)
            .map(|current| current.gateway_url != self.gateway_url)
            .unwrap_or(true);
        let gateway_url = std::mem::take(&mut self.gateway_url);
        *self = preset;
        if customised_gateway {
            self.gateway_url = gateway_url;
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::stokenet()
    }
}

/// Wallet relay configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Base URL of the signing wallet relay.
    pub relay_url: Option<String>,
}

/// Component and resource addresses the operation templates need.
///
/// Every field is optional; templates report which one is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressBook {
    pub component: Option<String>,
    pub admin_badge: Option<String>,
    pub staking_token: Option<String>,
    pub staker_badge: Option<String>,
    pub validator: Option<String>,
    pub user_badge: Option<String>,
    pub tokenizer_token: Option<String>,
    pub principal_token: Option<String>,
    pub underlying_token: Option<String>,
    pub fund_component: Option<String>,
    pub share_token: Option<String>,
    pub insurance_component: Option<String>,
    pub insurer_badge: Option<String>,
    pub insured_badge: Option<String>,
    pub claim_badge: Option<String>,
    pub fee_resource: Option<String>,
    pub lending_component: Option<String>,
    /// Currency lent, borrowed and repaid.
    pub lending_token: Option<String>,
    pub lender_badge: Option<String>,
    /// Borrower identity badge, presented as a proof.
    pub borrower_badge: Option<String>,
    pub credit_badge: Option<String>,
}

/// Submission/polling knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    #[serde(default = "SubmissionConfig::default_status_poll_attempts")]
    pub status_poll_attempts: u32,

    #[serde(default = "SubmissionConfig::default_status_poll_interval_ms")]
    pub status_poll_interval_ms: u64,

    /// Delay before the post-success state refresh.
    #[serde(default = "SubmissionConfig::default_refresh_delay_ms")]
    pub refresh_delay_ms: u64,

    #[serde(default = "SubmissionConfig::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl SubmissionConfig {
    fn default_status_poll_attempts() -> u32 { 10 }
    fn default_status_poll_interval_ms() -> u64 { 1_000 }
    fn default_refresh_delay_ms() -> u64 { 100 }
    fn default_request_timeout_secs() -> u64 { 30 }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.status_poll_interval_ms)
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            status_poll_attempts: Self::default_status_poll_attempts(),
            status_poll_interval_ms: Self::default_status_poll_interval_ms(),
            refresh_delay_ms: Self::default_refresh_delay_ms(),
            request_timeout_secs: Self::default_request_timeout_secs(),
        }
    }
}

/// dApp configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DappConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub addresses: AddressBook,
    #[serde(default)]
    pub submission: SubmissionConfig,
    /// Where the connected account address is mirrored, if anywhere.
    pub account_store_path: Option<PathBuf>,
}

impl DappConfig {
    pub fn for_network(name: &str) -> Result<Self, DappError> {
        let network = NetworkConfig::preset(name)
            .ok_or_else(|| DappError::Config(format!("unknown network '{}'", name)))?;
        Ok(Self { network, ..Default::default() })
    }

    /// Loads a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DappError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DappError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: DappConfig = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), network = %config.network.name, "Loaded dApp configuration");
        Ok(config)
    }

    /// Applies `DAPP_*` environment overrides on top of the loaded values.
    ///
    /// `DAPP_NETWORK` switches the network identity but keeps a gateway URL
    /// set in the file; `DAPP_GATEWAY_URL` always wins.
    pub fn apply_env(mut self) -> Self {
        self.apply_env_with(|key| std::env::var(key).ok());
        self
    }

    fn apply_env_with<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(network) = get("DAPP_NETWORK") {
            match NetworkConfig::preset(&network) {
                Some(preset) => self.network.switch_to(preset),
                None => tracing::warn!("Ignoring unknown DAPP_NETWORK '{}'", network),
            }
        }
        if let Some(url) = get("DAPP_GATEWAY_URL") {
            self.network.gateway_url = url;
        }
        if let Some(url) = get("DAPP_WALLET_RELAY_URL") {
            self.wallet.relay_url = Some(url);
        }
        if let Some(path) = get("DAPP_ACCOUNT_STORE") {
            self.account_store_path = Some(PathBuf::from(path));
        }

        let book = &mut self.addresses;
        let slots: [(&str, &mut Option<String>); 21] = [
            ("DAPP_COMPONENT_ADDRESS", &mut book.component),
            ("DAPP_ADMIN_BADGE", &mut book.admin_badge),
            ("DAPP_STAKING_TOKEN", &mut book.staking_token),
            ("DAPP_STAKER_BADGE", &mut book.staker_badge),
            ("DAPP_VALIDATOR_ADDRESS", &mut book.validator),
            ("DAPP_USER_BADGE", &mut book.user_badge),
            ("DAPP_TOKENIZER_TOKEN", &mut book.tokenizer_token),
            ("DAPP_PT_RESOURCE_ADDRESS", &mut book.principal_token),
            ("DAPP_UNDERLYING_TOKEN", &mut book.underlying_token),
            ("DAPP_FUND_COMPONENT", &mut book.fund_component),
            ("DAPP_SHARE_TOKEN", &mut book.share_token),
            ("DAPP_INSURANCE_COMPONENT", &mut book.insurance_component),
            ("DAPP_INSURER_BADGE", &mut book.insurer_badge),
            ("DAPP_INSURED_BADGE", &mut book.insured_badge),
            ("DAPP_CLAIM_BADGE", &mut book.claim_badge),
            ("DAPP_FEE_RESOURCE", &mut book.fee_resource),
            ("DAPP_LENDING_COMPONENT", &mut book.lending_component),
            ("DAPP_LENDING_TOKEN", &mut book.lending_token),
            ("DAPP_LENDER_BADGE", &mut book.lender_badge),
            ("DAPP_BORROWER_BADGE", &mut book.borrower_badge),
            ("DAPP_CREDIT_BADGE", &mut book.credit_badge),
        ];
        for (key, slot) in slots {
            if let Some(value) = get(key) {
                *slot = Some(value);
            }
        }
    }
}
