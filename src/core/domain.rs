use once_cell::sync::Lazy;
use primitive_types::U256;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::core::errors::DappError;

/// Maximum number of fractional digits the ledger's `Decimal` type accepts.
pub const MAX_DECIMAL_PLACES: u32 = 18;

static AMOUNT_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)(?:\.(\d{1,18}))?$").expect("Hardcoded regex should always compile")
});

/// Address of the account currently connected in the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountRef(String);

impl AccountRef {
    /// Returns `None` for an empty/blank address, which callers treat as "not connected".
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        let trimmed = address.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-negative ledger amount.
///
/// Stored losslessly as a count of 10^-18 units, bounded by the ledger's
/// 192-bit signed `Decimal`. Always renders in plain decimal notation: no
/// exponent, no thousands separators, `.` as the decimal point and no
/// trailing zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(U256);

impl Amount {
    pub const ZERO: Amount = Amount(U256([0; 4]));

    /// Largest representable amount, `(2^191 - 1) / 10^18`.
    pub fn max_value() -> Self {
        Amount((U256::one() << 191usize) - U256::one())
    }

    pub fn from_decimal(value: Decimal) -> Result<Self, DappError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DappError::InvalidAmount(value.to_string()));
        }
        Self::parse(&value.abs().normalize().to_string())
    }

    pub fn from_units(units: u64) -> Self {
        Self(U256::from(units) * U256::exp10(MAX_DECIMAL_PLACES as usize))
    }

    /// Builds an amount from a raw count of 10^-18 units.
    pub fn from_atto(atto: U256) -> Result<Self, DappError> {
        let amount = Amount(atto);
        if amount > Self::max_value() {
            return Err(DappError::InvalidAmount(format!("{} exceeds the ledger Decimal range", amount)));
        }
        Ok(amount)
    }

    /// Accepts `digits` or `digits.fraction` with at most 18 fractional
    /// digits. Never rounds: anything else is rejected.
    pub fn parse(input: &str) -> Result<Self, DappError> {
        let trimmed = input.trim();
        let invalid = || DappError::InvalidAmount(input.to_string());
        let caps = AMOUNT_FORMAT.captures(trimmed).ok_or_else(invalid)?;
        let whole = &caps[1];
        let fraction = caps.get(2).map_or("", |m| m.as_str());

        let mut digits = String::with_capacity(whole.len() + MAX_DECIMAL_PLACES as usize);
        digits.push_str(whole);
        digits.push_str(fraction);
        digits.extend(std::iter::repeat('0').take(MAX_DECIMAL_PLACES as usize - fraction.len()));
        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            return Ok(Self::ZERO);
        }
        let atto = U256::from_dec_str(digits).map_err(|_| invalid())?;
        Self::from_atto(atto).map_err(|_| invalid())
    }

    pub fn atto(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(&self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).and_then(|sum| Self::from_atto(sum).ok())
    }
}

impl FromStr for Amount {
    type Err = DappError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse(s)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let places = MAX_DECIMAL_PLACES as usize;
        let digits = format!("{:0>width$}", self.0.to_string(), width = places + 1);
        let (whole, fraction) = digits.split_at(digits.len() - places);
        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            f.write_str(whole)
        } else {
            write!(f, "{}.{}", whole, fraction)
        }
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Amount::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Fungible balance derived from a gateway response. Last fetch wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceBalance {
    pub resource_address: String,
    pub amount: Amount,
}

/// Non-fungible holding of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonFungibleHolding {
    pub resource_address: String,
    pub count: u64,
    #[serde(default)]
    pub ids: Vec<String>,
}

/// Outcome reported for a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    Success,
    Failure,
    Rejected,
    Pending,
    Unknown,
}

impl ReceiptStatus {
    /// Maps gateway status strings (`CommittedSuccess`, legacy `Success`, ...).
    pub fn from_gateway(status: &str) -> Self {
        match status {
            "CommittedSuccess" | "Success" => ReceiptStatus::Success,
            "CommittedFailure" | "Failure" | "Failed" => ReceiptStatus::Failure,
            "Rejected" | "PermanentlyRejected" | "PermanentRejection" => ReceiptStatus::Rejected,
            "Pending" | "CommitPendingOutcomeUnknown" | "LikelyButNotCertainRejection" => {
                ReceiptStatus::Pending
            }
            _ => ReceiptStatus::Unknown,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ReceiptStatus::Success)
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, ReceiptStatus::Pending | ReceiptStatus::Unknown)
    }
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReceiptStatus::Success => "Success",
            ReceiptStatus::Failure => "Failure",
            ReceiptStatus::Rejected => "Rejected",
            ReceiptStatus::Pending => "Pending",
            ReceiptStatus::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Result of one submission. Produced once, consumed immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub intent_hash: String,
    pub status: ReceiptStatus,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub new_components: Vec<String>,
    #[serde(default)]
    pub new_resources: Vec<String>,
    pub error_message: Option<String>,
    pub confirmed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl TransactionReceipt {
    pub fn new(intent_hash: impl Into<String>, status: ReceiptStatus) -> Self {
        Self {
            intent_hash: intent_hash.into(),
            status,
            logs: Vec::new(),
            new_components: Vec::new(),
            new_resources: Vec::new(),
            error_message: None,
            confirmed_at: None,
        }
    }

    pub fn with_logs<I, S>(mut self, logs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.logs = logs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}
