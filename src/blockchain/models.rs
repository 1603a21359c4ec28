//! Gateway request/response payloads.
//!
//! Only the fields the state reader and submitter look at are modelled; unknown
//! fields are ignored so additive gateway changes do not break decoding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---- /state/entity/details ----

#[derive(Debug, Clone, Serialize)]
pub struct EntityDetailsRequest {
    pub addresses: Vec<String>,
    pub aggregation_level: &'static str,
}

impl EntityDetailsRequest {
    pub fn vault_level(addresses: Vec<String>) -> Self {
        Self { addresses, aggregation_level: "Vault" }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityDetailsResponse {
    #[serde(default)]
    pub items: Vec<EntityDetailsItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityDetailsItem {
    pub address: String,
    #[serde(default)]
    pub fungible_resources: Option<FungibleResources>,
    #[serde(default)]
    pub non_fungible_resources: Option<NonFungibleResources>,
    #[serde(default)]
    pub details: Option<EntityDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FungibleResources {
    #[serde(default)]
    pub items: Vec<FungibleResourceItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FungibleResourceItem {
    pub resource_address: String,
    /// Present with global aggregation.
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub vaults: Option<VaultPage<FungibleVault>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VaultPage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FungibleVault {
    pub vault_address: String,
    pub amount: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NonFungibleResources {
    #[serde(default)]
    pub items: Vec<NonFungibleResourceItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NonFungibleResourceItem {
    pub resource_address: String,
    #[serde(default)]
    pub amount: Option<u64>,
    #[serde(default)]
    pub vaults: Option<VaultPage<NonFungibleVault>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NonFungibleVault {
    pub vault_address: String,
    pub total_count: u64,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityDetails {
    #[serde(rename = "type")]
    pub kind: String,
    /// Programmatic SBOR JSON; decoded lazily against a `StateSchema`.
    #[serde(default)]
    pub state: Option<serde_json::Value>,
}

// ---- /transaction/status ----

#[derive(Debug, Clone, Serialize)]
pub struct TransactionStatusRequest {
    pub intent_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionStatusResponse {
    pub status: String,
    #[serde(default)]
    pub intent_status: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

// ---- /transaction/committed-details ----

#[derive(Debug, Clone, Serialize)]
pub struct CommittedDetailsRequest {
    pub intent_hash: String,
    pub opt_ins: CommittedDetailsOptIns,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommittedDetailsOptIns {
    pub receipt_state_changes: bool,
    pub receipt_events: bool,
}

impl CommittedDetailsRequest {
    pub fn new(intent_hash: &str) -> Self {
        Self {
            intent_hash: intent_hash.to_string(),
            opt_ins: CommittedDetailsOptIns { receipt_state_changes: true, receipt_events: true },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommittedDetailsResponse {
    pub transaction: CommittedTransaction,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommittedTransaction {
    pub transaction_status: String,
    #[serde(default)]
    pub intent_hash: Option<String>,
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub receipt: Option<CommittedReceipt>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommittedReceipt {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub state_updates: Option<StateUpdates>,
    #[serde(default)]
    pub events: Vec<ReceiptEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateUpdates {
    #[serde(default)]
    pub new_global_entities: Vec<NewGlobalEntity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGlobalEntity {
    pub entity_type: String,
    pub entity_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptEvent {
    pub name: String,
}

// ---- legacy explorer endpoints ----

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyComponentResponse {
    /// JSON document encoded as a string.
    pub state: String,
    #[serde(default)]
    pub owned_resources: Vec<LegacyOwnedResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyOwnedResource {
    pub resource_address: String,
    pub amount: String,
    #[serde(default)]
    pub non_fungible_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyNonFungibleResponse {
    pub immutable_data: String,
    pub mutable_data: String,
}

/// Error body returned by the gateway on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayErrorResponse {
    pub message: String,
    #[serde(default)]
    pub code: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_details_tolerates_missing_sections() {
        let resp: EntityDetailsResponse = serde_json::from_value(json!({
            "ledger_state": { "state_version": 1 },
            "items": [{ "address": "account_tdx_2_1abc" }]
        }))
        .unwrap();
        assert_eq!(resp.items.len(), 1);
        assert!(resp.items[0].fungible_resources.is_none());
    }

    #[test]
    fn test_vault_level_request_shape() {
        let body = serde_json::to_value(EntityDetailsRequest::vault_level(vec!["a".into()])).unwrap();
        assert_eq!(body, json!({ "addresses": ["a"], "aggregation_level": "Vault" }));
    }

    #[test]
    fn test_committed_details_new_entities() {
        let resp: CommittedDetailsResponse = serde_json::from_value(json!({
            "transaction": {
                "transaction_status": "CommittedSuccess",
                "confirmed_at": "2024-03-01T10:00:00Z",
                "receipt": {
                    "status": "CommittedSuccess",
                    "state_updates": {
                        "new_global_entities": [
                            { "entity_type": "GlobalGenericComponent", "entity_address": "component_tdx_2_1c" }
                        ]
                    }
                }
            }
        }))
        .unwrap();
        let receipt = resp.transaction.receipt.unwrap();
        assert_eq!(receipt.state_updates.unwrap().new_global_entities[0].entity_address, "component_tdx_2_1c");
        assert!(resp.transaction.confirmed_at.is_some());
    }
}
