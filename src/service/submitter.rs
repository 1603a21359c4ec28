use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::blockchain::models::CommittedDetailsResponse;
use crate::blockchain::traits::{GatewayApi, TransactionRequest, WalletConnector};
use crate::blockchain::wallet::extract_error_message;
use crate::core::config::SubmissionConfig;
use crate::core::domain::{ReceiptStatus, TransactionReceipt};
use crate::core::errors::DappError;
use crate::manifest::{render, TransactionManifest};
use crate::monitoring::DappMetrics;

/// Hands manifests to the wallet and waits for the ledger's verdict.
pub struct TransactionSubmitter<W: WalletConnector + ?Sized, G: GatewayApi + ?Sized> {
    wallet: Arc<W>,
    gateway: Arc<G>,
    config: SubmissionConfig,
    message: Option<String>,
    metrics: Option<Arc<DappMetrics>>,
}

impl<W: WalletConnector + ?Sized, G: GatewayApi + ?Sized> TransactionSubmitter<W, G> {
    pub fn new(wallet: Arc<W>, gateway: Arc<G>, config: SubmissionConfig) -> Self {
        Self { wallet, gateway, config, message: None, metrics: None }
    }

    /// Plain-text message attached to every transaction request.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<DappMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &SubmissionConfig {
        &self.config
    }

    /// Submits `manifest` and returns the receipt.
    ///
    /// Errors are reserved for failures to get an answer at all (wallet
    /// refusal, transport). A transaction the ledger rejected or failed comes
    /// back as a receipt with a non-success status.
    pub async fn submit(&self, manifest: &TransactionManifest) -> Result<TransactionReceipt, DappError> {
        let mut request = TransactionRequest::new(render(manifest));
        if let Some(message) = &self.message {
            request = request.with_message(message.clone());
        }

        let started = Instant::now();
        if let Some(metrics) = &self.metrics {
            metrics.record_submission();
        }
        info!(instructions = manifest.len(), "Submitting transaction");

        let intent = match self.wallet.send_transaction(&request).await {
            Ok(intent) => intent,
            Err(e) => {
                self.record(false, started);
                return Err(e);
            }
        };
        info!(intent_hash = %intent.intent_hash, "Wallet accepted transaction");

        let receipt = match self.await_receipt(&intent.intent_hash).await {
            Ok(receipt) => receipt,
            Err(e) => {
                self.record(false, started);
                return Err(e);
            }
        };
        self.record(receipt.status.is_success(), started);

        if receipt.status.is_success() {
            info!(intent_hash = %receipt.intent_hash, "Transaction committed");
        } else {
            warn!(
                intent_hash = %receipt.intent_hash,
                status = %receipt.status,
                error = receipt.error_message.as_deref().unwrap_or_default(),
                "Transaction did not succeed"
            );
        }
        Ok(receipt)
    }

    /// Polls the status of `intent_hash` and assembles its receipt.
    pub async fn await_receipt(&self, intent_hash: &str) -> Result<TransactionReceipt, DappError> {
        let attempts = self.config.status_poll_attempts.max(1);
        let mut status = ReceiptStatus::Pending;
        let mut status_error = None;

        for attempt in 1..=attempts {
            let response = self.gateway.transaction_status(intent_hash).await?;
            status = ReceiptStatus::from_gateway(&response.status);
            status_error = response.error_message;
            debug!(intent_hash, attempt, status = %status, "Polled transaction status");
            if status.is_final() {
                break;
            }
            if attempt < attempts {
                tokio::time::sleep(self.config.poll_interval()).await;
            }
        }

        match status {
            ReceiptStatus::Success | ReceiptStatus::Failure => {
                let details = match self.gateway.committed_details(intent_hash).await {
                    Ok(details) => Some(details),
                    Err(e) => {
                        warn!(intent_hash, error = %e, "Committed details unavailable");
                        None
                    }
                };
                let mut receipt = match details {
                    Some(details) => receipt_from_details(intent_hash, status, details),
                    None => TransactionReceipt::new(intent_hash, status),
                };
                if receipt.error_message.is_none() {
                    receipt.error_message = status_error;
                }
                Ok(receipt)
            }
            other => {
                let mut receipt = TransactionReceipt::new(intent_hash, other);
                receipt.error_message = status_error;
                Ok(receipt)
            }
        }
    }

    fn record(&self, success: bool, started: Instant) {
        if let Some(metrics) = &self.metrics {
            metrics.record_outcome(success, started.elapsed().as_secs_f64());
        }
    }
}

/// Builds a receipt from `/transaction/committed-details`.
///
/// New entities are split by entity type: anything typed as a resource goes
/// to `new_resources`, everything else to `new_components`.
pub fn receipt_from_details(
    intent_hash: &str,
    polled: ReceiptStatus,
    details: CommittedDetailsResponse,
) -> TransactionReceipt {
    let tx = details.transaction;
    let status = match ReceiptStatus::from_gateway(&tx.transaction_status) {
        ReceiptStatus::Unknown => polled,
        s => s,
    };
    let mut receipt = TransactionReceipt::new(tx.intent_hash.unwrap_or_else(|| intent_hash.to_string()), status);
    receipt.confirmed_at = tx.confirmed_at;

    let mut error = tx.error_message;
    if let Some(engine) = tx.receipt {
        receipt.logs = engine.events.into_iter().map(|e| e.name).collect();
        if let Some(updates) = engine.state_updates {
            for entity in updates.new_global_entities {
                if entity.entity_type.contains("Resource") || entity.entity_address.starts_with("resource_") {
                    receipt.new_resources.push(entity.entity_address);
                } else {
                    receipt.new_components.push(entity.entity_address);
                }
            }
        }
        error = error.or(engine.error_message);
    }
    receipt.error_message = error.map(|raw| extract_error_message(&raw).unwrap_or(raw));
    receipt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::mock::{MockGateway, MockWallet, ScriptedReply};
    use crate::core::domain::{AccountRef, Amount};
    use crate::manifest::ManifestBuilder;
    use serde_json::json;

    const ACCOUNT: &str = "account_tdx_2_12y0nsx972ueel0args3jnapz9qsexyj9vpfqtm6ay9ceymrwrglq0qty";

    fn fast_config() -> SubmissionConfig {
        SubmissionConfig { status_poll_attempts: 3, status_poll_interval_ms: 1, ..SubmissionConfig::default() }
    }

    fn manifest() -> TransactionManifest {
        ManifestBuilder::new(AccountRef::new(ACCOUNT).unwrap())
            .lock_fee(Amount::from_units(10))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_submit_success_collects_details() {
        let wallet = Arc::new(MockWallet::with_account(ACCOUNT));
        let gateway = Arc::new(MockGateway::new());
        gateway.script_statuses(["Pending", "CommittedSuccess"]);
        gateway.set_committed_details(json!({
            "transaction": {
                "transaction_status": "CommittedSuccess",
                "confirmed_at": "2024-01-02T03:04:05Z",
                "receipt": {
                    "status": "CommittedSuccess",
                    "state_updates": { "new_global_entities": [
                        { "entity_type": "GlobalGenericComponent", "entity_address": "component_tdx_2_1new" },
                        { "entity_type": "GlobalFungibleResource", "entity_address": "resource_tdx_2_1new" }
                    ]},
                    "events": [ { "name": "WithdrawEvent" }, { "name": "DepositEvent" } ]
                }
            }
        }));

        let submitter = TransactionSubmitter::new(wallet.clone(), gateway, fast_config());
        let receipt = submitter.submit(&manifest()).await.unwrap();

        assert_eq!(receipt.status, ReceiptStatus::Success);
        assert_eq!(receipt.intent_hash, "txid_mock_0");
        assert_eq!(receipt.logs, vec!["WithdrawEvent", "DepositEvent"]);
        assert_eq!(receipt.new_components, vec!["component_tdx_2_1new"]);
        assert_eq!(receipt.new_resources, vec!["resource_tdx_2_1new"]);
        assert!(receipt.confirmed_at.is_some());
        assert!(wallet.sent()[0].transaction_manifest.starts_with("CALL_METHOD"));
    }

    #[tokio::test]
    async fn test_failed_commit_is_a_receipt_not_an_error() {
        let gateway = Arc::new(MockGateway::new());
        gateway.script_statuses(["CommittedFailure"]);
        gateway.set_committed_details(json!({
            "transaction": {
                "transaction_status": "CommittedFailure",
                "error_message": "KernelError(PanicMessage(\"Pool is empty@lib.rs:12\"))"
            }
        }));
        let submitter =
            TransactionSubmitter::new(Arc::new(MockWallet::with_account(ACCOUNT)), gateway, fast_config());

        let receipt = submitter.submit(&manifest()).await.unwrap();
        assert_eq!(receipt.status, ReceiptStatus::Failure);
        assert_eq!(receipt.error_message.as_deref(), Some("Pool is empty"));
    }

    #[tokio::test]
    async fn test_polling_gives_up_as_pending() {
        let gateway = Arc::new(MockGateway::new());
        gateway.script_statuses(["Pending"]);
        let submitter =
            TransactionSubmitter::new(Arc::new(MockWallet::with_account(ACCOUNT)), gateway, fast_config());

        let receipt = submitter.submit(&manifest()).await.unwrap();
        assert_eq!(receipt.status, ReceiptStatus::Pending);
    }

    #[tokio::test]
    async fn test_wallet_rejection_propagates() {
        let wallet = Arc::new(MockWallet::with_account(ACCOUNT));
        wallet.push_reply(ScriptedReply::Fail { code: "rejectedByUser".into(), message: String::new() });
        let metrics = Arc::new(DappMetrics::new().unwrap());
        let submitter = TransactionSubmitter::new(wallet, Arc::new(MockGateway::new()), fast_config())
            .with_metrics(metrics.clone());

        assert!(matches!(submitter.submit(&manifest()).await, Err(DappError::UserRejected)));
        assert_eq!(metrics.transactions_failed.get() as u64, 1);
    }

    #[tokio::test]
    async fn test_message_is_attached() {
        let wallet = Arc::new(MockWallet::with_account(ACCOUNT));
        let submitter = TransactionSubmitter::new(wallet.clone(), Arc::new(MockGateway::new()), fast_config())
            .with_message("hello");
        submitter.submit(&manifest()).await.unwrap();
        assert_eq!(wallet.sent()[0].message.as_deref(), Some("hello"));
    }
}
