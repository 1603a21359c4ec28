use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::blockchain::models::{
    CommittedDetailsResponse, EntityDetailsItem, LegacyComponentResponse, LegacyNonFungibleResponse,
    TransactionStatusResponse,
};
use crate::core::errors::DappError;

/// Read access to the ledger through the gateway HTTP API.
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// Vault-level details for each address, in request order.
    async fn entity_details(&self, addresses: &[String]) -> Result<Vec<EntityDetailsItem>, DappError>;

    /// Legacy explorer view of a component (JSON-string state plus owned resources).
    async fn component(&self, address: &str) -> Result<LegacyComponentResponse, DappError>;

    /// Legacy explorer view of a single non-fungible.
    async fn non_fungible(&self, resource: &str, id: &str) -> Result<LegacyNonFungibleResponse, DappError>;

    async fn transaction_status(&self, intent_hash: &str) -> Result<TransactionStatusResponse, DappError>;

    async fn committed_details(&self, intent_hash: &str) -> Result<CommittedDetailsResponse, DappError>;
}

/// An account the wallet has shared with the dApp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAccount {
    pub address: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// Manifest handed to the wallet for review and signing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub transaction_manifest: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TransactionRequest {
    pub fn new(transaction_manifest: String) -> Self {
        Self { transaction_manifest, version: 1, message: None }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// What the wallet returns once the user approved and the transaction was submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIntent {
    pub intent_hash: String,
}

/// The signing wallet. Keys never leave it.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Snapshot of the accounts currently shared with the dApp.
    async fn accounts(&self) -> Result<Vec<WalletAccount>, DappError>;

    /// Asks the wallet to sign and submit a manifest.
    async fn send_transaction(&self, request: &TransactionRequest) -> Result<TransactionIntent, DappError>;
}
