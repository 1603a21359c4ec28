//! Wallet boundary: the HTTP relay to a signing wallet and error classification.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::blockchain::traits::{TransactionIntent, TransactionRequest, WalletAccount, WalletConnector};
use crate::core::errors::DappError;

static PANIC_MESSAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"PanicMessage\("([^@]*)@"#).expect("Hardcoded regex should always compile"));
static RESOURCE_ERROR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ResourceError\(([^)]*)").expect("Hardcoded regex should always compile"));

/// Pulls the human readable reason out of an engine error dump.
///
/// `PanicMessage("Not enough stake@src/lib.rs:10")` yields `Not enough stake`;
/// failing that, the body of the first `ResourceError(...)`.
pub fn extract_error_message(raw: &str) -> Option<String> {
    PANIC_MESSAGE
        .captures(raw)
        .or_else(|| RESOURCE_ERROR.captures(raw))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|s| !s.is_empty())
}

/// Maps a wallet error code/message pair to a structured error.
pub fn classify_wallet_error(code: Option<&str>, message: &str) -> DappError {
    let code = code.unwrap_or_default();
    let lower = code.to_ascii_lowercase();
    if lower == "rejectedbyuser" || lower == "userrejected" || message.contains("rejectedByUser") {
        return DappError::UserRejected;
    }
    if lower.contains("walletnotfound") || lower.contains("notconnected") || lower.contains("missingextension") {
        return DappError::WalletUnavailable(if message.is_empty() { code.to_string() } else { message.to_string() });
    }
    if let Some(reason) = extract_error_message(message) {
        return DappError::rejection(reason);
    }
    let raw = if message.is_empty() { code } else { message };
    DappError::rejection(raw)
}

#[derive(Debug, Deserialize)]
struct AccountsResponse {
    #[serde(default)]
    accounts: Vec<WalletAccount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    #[serde(default)]
    transaction_intent_hash: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Talks to a signing wallet over an HTTP relay.
///
/// `GET {relay}/accounts` returns `{"accounts": [{"address": ...}]}` and
/// `POST {relay}/transactions` takes the transaction request and answers with
/// `{"transactionIntentHash": ...}` or `{"error": ..., "message": ...}`.
#[derive(Clone)]
pub struct WalletRelay {
    base_url: String,
    client: Client,
}

impl WalletRelay {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DappError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DappError::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), client })
    }

    fn unavailable(err: reqwest::Error) -> DappError {
        if err.is_connect() || err.is_timeout() {
            DappError::WalletUnavailable(err.to_string())
        } else {
            DappError::from(err)
        }
    }
}

#[async_trait]
impl WalletConnector for WalletRelay {
    async fn accounts(&self) -> Result<Vec<WalletAccount>, DappError> {
        let url = format!("{}/accounts", self.base_url);
        debug!(%url, "Requesting wallet accounts");
        let resp = self.client.get(&url).send().await.map_err(Self::unavailable)?;
        if !resp.status().is_success() {
            return Err(DappError::WalletUnavailable(format!("relay answered {}", resp.status())));
        }
        let body: AccountsResponse = resp.json().await?;
        Ok(body.accounts)
    }

    async fn send_transaction(&self, request: &TransactionRequest) -> Result<TransactionIntent, DappError> {
        let url = format!("{}/transactions", self.base_url);
        info!(version = request.version, "Sending transaction to wallet");
        let resp = self.client.post(&url).json(request).send().await.map_err(Self::unavailable)?;
        let status = resp.status();
        let body: SendResponse = resp.json().await?;

        match body {
            SendResponse { transaction_intent_hash: Some(intent_hash), .. } if status.is_success() => {
                Ok(TransactionIntent { intent_hash })
            }
            SendResponse { error, message, .. } => {
                let err = classify_wallet_error(error.as_deref(), message.as_deref().unwrap_or_default());
                warn!(error = %err, "Wallet refused transaction");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("PanicMessage(\"Not enough stake@src/validator.rs:88:13\")", Some("Not enough stake") ; "panic message")]
    #[test_case("ApplicationError(ResourceError(InsufficientBalance))", Some("InsufficientBalance") ; "resource error")]
    #[test_case("something else entirely", None ; "no match")]
    fn test_extract_error_message(raw: &str, expected: Option<&str>) {
        assert_eq!(extract_error_message(raw).as_deref(), expected);
    }

    #[test]
    fn test_classify_user_rejection() {
        assert!(matches!(classify_wallet_error(Some("rejectedByUser"), ""), DappError::UserRejected));
    }

    #[test]
    fn test_classify_missing_wallet() {
        assert!(matches!(
            classify_wallet_error(Some("walletNotFound"), "no wallet"),
            DappError::WalletUnavailable(_)
        ));
    }

    #[test]
    fn test_classify_falls_back_to_raw_text() {
        match classify_wallet_error(Some("submittedTransactionHasFailedTransactionStatus"), "fee too low") {
            DappError::LedgerRejection { reason } => assert_eq!(reason, "fee too low"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_classify_extracts_panic() {
        let err = classify_wallet_error(
            Some("failedToPrepareTransaction"),
            "KernelError(PanicMessage(\"Pool is empty@lib.rs:1\"))",
        );
        assert_eq!(err.user_message(), "Pool is empty");
    }
}
