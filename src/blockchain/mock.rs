//! Scripted in-memory wallet and gateway for dry runs and tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::blockchain::models::{
    CommittedDetailsResponse, EntityDetailsItem, LegacyComponentResponse, LegacyNonFungibleResponse,
    TransactionStatusResponse,
};
use crate::blockchain::traits::{GatewayApi, TransactionIntent, TransactionRequest, WalletAccount, WalletConnector};
use crate::blockchain::wallet::classify_wallet_error;
use crate::core::errors::DappError;

/// What the mock wallet answers to the next `send_transaction`.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Approve(String),
    Fail { code: String, message: String },
    Unavailable,
}

/// Wallet that approves everything unless told otherwise.
#[derive(Debug, Default)]
pub struct MockWallet {
    accounts: Mutex<Vec<WalletAccount>>,
    replies: Mutex<VecDeque<ScriptedReply>>,
    sent: Mutex<Vec<TransactionRequest>>,
    delay: Option<Duration>,
    counter: AtomicUsize,
}

impl MockWallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(address: &str) -> Self {
        let wallet = Self::new();
        wallet.set_accounts(vec![WalletAccount { address: address.to_string(), label: None }]);
        wallet
    }

    /// Holds every `send_transaction` for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_accounts(&self, accounts: Vec<WalletAccount>) {
        *self.accounts.lock() = accounts;
    }

    pub fn push_reply(&self, reply: ScriptedReply) {
        self.replies.lock().push_back(reply);
    }

    /// Requests received so far.
    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl WalletConnector for MockWallet {
    async fn accounts(&self) -> Result<Vec<WalletAccount>, DappError> {
        Ok(self.accounts.lock().clone())
    }

    async fn send_transaction(&self, request: &TransactionRequest) -> Result<TransactionIntent, DappError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.sent.lock().push(request.clone());
        let reply = self.replies.lock().pop_front();
        match reply {
            Some(ScriptedReply::Approve(intent_hash)) => Ok(TransactionIntent { intent_hash }),
            Some(ScriptedReply::Fail { code, message }) => Err(classify_wallet_error(Some(&code), &message)),
            Some(ScriptedReply::Unavailable) => Err(DappError::WalletUnavailable("mock wallet offline".to_string())),
            None => {
                let n = self.counter.fetch_add(1, Ordering::SeqCst);
                Ok(TransactionIntent { intent_hash: format!("txid_mock_{}", n) })
            }
        }
    }
}

/// Gateway answering from canned JSON documents.
#[derive(Debug, Default)]
pub struct MockGateway {
    entities: Mutex<HashMap<String, Value>>,
    components: Mutex<HashMap<String, Value>>,
    non_fungibles: Mutex<HashMap<String, Value>>,
    failing: Mutex<HashSet<String>>,
    statuses: Mutex<VecDeque<String>>,
    committed: Mutex<Option<Value>>,
    entity_calls: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a `/state/entity/details` item (the `address` key is filled in).
    pub fn set_entity(&self, address: &str, mut item: Value) {
        if let Value::Object(map) = &mut item {
            map.insert("address".to_string(), Value::String(address.to_string()));
        }
        self.entities.lock().insert(address.to_string(), item);
    }

    pub fn set_component(&self, address: &str, body: Value) {
        self.components.lock().insert(address.to_string(), body);
    }

    pub fn set_non_fungible(&self, resource: &str, id: &str, body: Value) {
        self.non_fungibles.lock().insert(format!("{}{}", resource, id), body);
    }

    /// Requests touching `address` fail with a network error.
    pub fn fail_address(&self, address: &str) {
        self.failing.lock().insert(address.to_string());
    }

    /// Statuses returned by successive polls; the last one repeats.
    pub fn script_statuses<I, S>(&self, statuses: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.statuses.lock() = statuses.into_iter().map(Into::into).collect();
    }

    pub fn set_committed_details(&self, body: Value) {
        *self.committed.lock() = Some(body);
    }

    /// Number of `entity_details` calls served.
    pub fn entity_calls(&self) -> usize {
        self.entity_calls.load(Ordering::SeqCst)
    }

    fn check(&self, address: &str) -> Result<(), DappError> {
        if self.failing.lock().contains(address) {
            Err(DappError::NetworkFailure(format!("mock failure for {}", address)))
        } else {
            Ok(())
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(what: &str, body: Value) -> Result<T, DappError> {
    serde_json::from_value(body).map_err(|e| DappError::schema_mismatch(what, "gateway response", e.to_string()))
}

#[async_trait]
impl GatewayApi for MockGateway {
    async fn entity_details(&self, addresses: &[String]) -> Result<Vec<EntityDetailsItem>, DappError> {
        self.entity_calls.fetch_add(1, Ordering::SeqCst);
        let mut items = Vec::with_capacity(addresses.len());
        for address in addresses {
            self.check(address)?;
            let body = self.entities.lock().get(address).cloned();
            if let Some(body) = body {
                items.push(decode(address, body)?);
            }
        }
        Ok(items)
    }

    async fn component(&self, address: &str) -> Result<LegacyComponentResponse, DappError> {
        self.check(address)?;
        let body = self.components.lock().get(address).cloned();
        match body {
            Some(body) => decode(address, body),
            None => Err(DappError::NetworkFailure(format!("404 /component/{}", address))),
        }
    }

    async fn non_fungible(&self, resource: &str, id: &str) -> Result<LegacyNonFungibleResponse, DappError> {
        self.check(resource)?;
        let key = format!("{}{}", resource, id);
        let body = self.non_fungibles.lock().get(&key).cloned();
        match body {
            Some(body) => decode(&key, body),
            None => Err(DappError::NetworkFailure(format!("404 /non-fungible/{}", key))),
        }
    }

    async fn transaction_status(&self, intent_hash: &str) -> Result<TransactionStatusResponse, DappError> {
        self.check(intent_hash)?;
        let status = {
            let mut statuses = self.statuses.lock();
            if statuses.len() > 1 {
                statuses.pop_front()
            } else {
                statuses.front().cloned()
            }
        };
        Ok(TransactionStatusResponse {
            status: status.unwrap_or_else(|| "CommittedSuccess".to_string()),
            intent_status: None,
            error_message: None,
        })
    }

    async fn committed_details(&self, intent_hash: &str) -> Result<CommittedDetailsResponse, DappError> {
        self.check(intent_hash)?;
        let body = self.committed.lock().clone();
        let body = body.unwrap_or_else(|| {
            serde_json::json!({ "transaction": { "transaction_status": "CommittedSuccess" } })
        });
        decode(intent_hash, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_wallet_default_approves() {
        let wallet = MockWallet::with_account("account_tdx_2_1abc");
        let intent = wallet.send_transaction(&TransactionRequest::new("DROP_ALL_PROOFS\n;".into())).await.unwrap();
        assert_eq!(intent.intent_hash, "txid_mock_0");
        assert_eq!(wallet.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_wallet_scripted_rejection() {
        let wallet = MockWallet::new();
        wallet.push_reply(ScriptedReply::Fail { code: "rejectedByUser".into(), message: String::new() });
        let err = wallet.send_transaction(&TransactionRequest::new(String::new())).await.unwrap_err();
        assert!(matches!(err, DappError::UserRejected));
    }

    #[tokio::test]
    async fn test_mock_gateway_status_script() {
        let gateway = MockGateway::new();
        gateway.script_statuses(["Pending", "CommittedSuccess"]);
        assert_eq!(gateway.transaction_status("tx").await.unwrap().status, "Pending");
        assert_eq!(gateway.transaction_status("tx").await.unwrap().status, "CommittedSuccess");
        assert_eq!(gateway.transaction_status("tx").await.unwrap().status, "CommittedSuccess");
    }
}
