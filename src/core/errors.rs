use thiserror::Error;

/// Error type shared by the manifest, gateway, wallet and flow layers.
#[derive(Debug, Error)]
pub enum DappError {
    /// No wallet is reachable (extension missing, relay down).
    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),
    /// The wallet is reachable but reports no connected account.
    #[error("No account connected")]
    NotConnected,
    /// The user declined the signing request in the wallet.
    #[error("Transaction rejected by user")]
    UserRejected,
    /// Transport or HTTP level failure talking to the gateway or wallet relay.
    #[error("Network failure: {0}")]
    NetworkFailure(String),
    /// The ledger (or the wallet preview) refused the transaction.
    #[error("Ledger rejected transaction: {reason}")]
    LedgerRejection { reason: String },
    /// A gateway payload did not have the expected shape.
    #[error("Schema mismatch at '{field}': expected {expected}, found {found}")]
    SchemaMismatch { field: String, expected: String, found: String },
    /// User supplied an amount that is not a valid non-negative decimal.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    /// Address is malformed or belongs to the wrong network/entity kind.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    /// Operation name not known to the template catalogue.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
    /// Structural manifest errors (unknown bucket, duplicate name, ...).
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),
    /// A bucket or the worktop would be left holding resources.
    #[error("Stranded resource: {0}")]
    StrandedResource(String),
    /// A submission is already running for this flow.
    #[error("A transaction is already being submitted")]
    SubmissionInFlight,
    /// Configuration errors.
    #[error("Configuration error: {0}")]
    Config(String),
    /// IO errors.
    #[error("IO error: {0}")]
    Io(String),
    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DappError {
    pub fn schema_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::SchemaMismatch { field: field.into(), expected: expected.into(), found: found.into() }
    }

    pub fn rejection(reason: impl Into<String>) -> Self {
        Self::LedgerRejection { reason: reason.into() }
    }

    /// Short text suitable for a toast/notification.
    pub fn user_message(&self) -> String {
        match self {
            DappError::WalletUnavailable(_) => "Wallet not available. Is it installed and running?".to_string(),
            DappError::NotConnected => "Please connect an account first.".to_string(),
            DappError::UserRejected => "Transaction was rejected in the wallet.".to_string(),
            DappError::NetworkFailure(_) => "Something went wrong, please try again.".to_string(),
            DappError::LedgerRejection { reason } => reason.clone(),
            DappError::InvalidAmount(input) => format!("'{}' is not a valid amount.", input),
            other => other.to_string(),
        }
    }

    /// Network errors may succeed on a later attempt; nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DappError::NetworkFailure(_) | DappError::WalletUnavailable(_))
    }
}

impl From<reqwest::Error> for DappError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DappError::Serialization(err.to_string())
        } else {
            DappError::NetworkFailure(err.to_string())
        }
    }
}

impl From<std::io::Error> for DappError {
    fn from(err: std::io::Error) -> Self {
        DappError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DappError {
    fn from(err: serde_json::Error) -> Self {
        DappError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for DappError {
    fn from(err: toml::de::Error) -> Self {
        DappError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_schema_mismatch() {
        let err = DappError::schema_mismatch("total_staked", "Decimal", "String");
        assert_eq!(
            err.to_string(),
            "Schema mismatch at 'total_staked': expected Decimal, found String"
        );
    }

    #[test]
    fn test_user_message_uses_rejection_reason() {
        let err = DappError::rejection("Not enough stake");
        assert_eq!(err.user_message(), "Not enough stake");
    }

    #[test]
    fn test_retryable_only_for_transport() {
        assert!(DappError::NetworkFailure("timeout".into()).is_retryable());
        assert!(!DappError::rejection("x").is_retryable());
        assert!(!DappError::InvalidAmount("abc".into()).is_retryable());
    }

    #[test]
    fn test_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: DappError = json_err.into();
        assert!(matches!(err, DappError::Serialization(_)));
    }
}
