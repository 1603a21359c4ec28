use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::Value;
use tracing::debug;

use crate::blockchain::models::EntityDetailsItem;
use crate::blockchain::sbor::{DecodedState, SborNode, StateSchema};
use crate::blockchain::traits::GatewayApi;
use crate::core::domain::{AccountRef, Amount, NonFungibleHolding, ResourceBalance};
use crate::core::errors::DappError;
use crate::core::validation::strip_unit_suffix;

/// Holdings of one entity. Built fresh on every read; nothing is cached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountBalances {
    pub address: String,
    /// Fungible totals summed across vaults; zero balances are dropped.
    pub fungibles: Vec<ResourceBalance>,
    /// Non-fungible counts; empty holdings are dropped.
    pub non_fungibles: Vec<NonFungibleHolding>,
    /// Per-vault fungible amounts.
    pub vaults: BTreeMap<String, Amount>,
}

impl AccountBalances {
    /// Amount held of `resource`, zero when absent.
    pub fn fungible(&self, resource: &str) -> Amount {
        self.fungibles
            .iter()
            .find(|b| b.resource_address == resource)
            .map(|b| b.amount)
            .unwrap_or(Amount::ZERO)
    }

    pub fn non_fungible_count(&self, resource: &str) -> u64 {
        self.non_fungibles
            .iter()
            .find(|h| h.resource_address == resource)
            .map(|h| h.count)
            .unwrap_or(0)
    }

    pub fn from_entity(item: &EntityDetailsItem) -> Result<Self, DappError> {
        let mut balances = AccountBalances { address: item.address.clone(), ..Default::default() };

        if let Some(fungibles) = &item.fungible_resources {
            for resource in &fungibles.items {
                let total = match &resource.vaults {
                    Some(page) => {
                        let mut total = Amount::ZERO;
                        for vault in &page.items {
                            let amount = gateway_amount(&vault.amount)?;
                            balances.vaults.insert(vault.vault_address.clone(), amount);
                            total = total.checked_add(amount).ok_or_else(|| {
                                DappError::schema_mismatch(&resource.resource_address, "Decimal", "overflow")
                            })?;
                        }
                        total
                    }
                    None => match &resource.amount {
                        Some(raw) => gateway_amount(raw)?,
                        None => Amount::ZERO,
                    },
                };
                if !total.is_zero() {
                    balances
                        .fungibles
                        .push(ResourceBalance { resource_address: resource.resource_address.clone(), amount: total });
                }
            }
        }

        if let Some(non_fungibles) = &item.non_fungible_resources {
            for resource in &non_fungibles.items {
                let (count, ids) = match &resource.vaults {
                    Some(page) => page.items.iter().fold((0u64, Vec::new()), |(count, mut ids), vault| {
                        ids.extend(vault.items.iter().cloned());
                        (count + vault.total_count, ids)
                    }),
                    None => (resource.amount.unwrap_or(0), Vec::new()),
                };
                if count > 0 {
                    balances.non_fungibles.push(NonFungibleHolding {
                        resource_address: resource.resource_address.clone(),
                        count,
                        ids,
                    });
                }
            }
        }

        Ok(balances)
    }
}

fn gateway_amount(raw: &str) -> Result<Amount, DappError> {
    Amount::parse(raw).map_err(|_| DappError::schema_mismatch("amount", "Decimal", raw))
}

/// Staking position carried in a staker badge's data fields.
///
/// Field order: validator address, validator name, unstaking amount, epoch at
/// which unstaking completes, amount available for withdrawal, staked amount.
/// Amounts arrive with unit decorations (`Decimal("5")`, `100 NAR`) which
/// are stripped before parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct StakerInfo {
    pub validator: String,
    pub validator_name: String,
    pub unstaking: Amount,
    pub unstake_done_epoch: u64,
    pub withdrawable: Amount,
    pub staked: Amount,
}

impl StakerInfo {
    pub fn from_metadata(values: &[String]) -> Result<Self, DappError> {
        let field = |index: usize, name: &str| {
            values
                .get(index)
                .map(String::as_str)
                .ok_or_else(|| DappError::schema_mismatch(name, "staker data field", "missing"))
        };
        let amount = |index: usize, name: &str| -> Result<Amount, DappError> {
            let raw = field(index, name)?;
            Amount::parse(&strip_unit_suffix(raw)).map_err(|_| DappError::schema_mismatch(name, "Decimal", raw))
        };
        let epoch_raw = field(3, "unstake_done_epoch")?;
        let unstake_done_epoch = strip_unit_suffix(epoch_raw.trim_end_matches("u64"))
            .parse::<u64>()
            .map_err(|_| DappError::schema_mismatch("unstake_done_epoch", "u64", epoch_raw))?;

        Ok(Self {
            validator: field(0, "validator")?.to_string(),
            validator_name: field(1, "validator_name")?.to_string(),
            unstaking: amount(2, "unstaking")?,
            unstake_done_epoch,
            withdrawable: amount(4, "withdrawable")?,
            staked: amount(5, "staked")?,
        })
    }
}

/// `.fields[].value` of a legacy JSON-string document, as text.
fn legacy_field_values(document: &str) -> Result<Vec<String>, DappError> {
    let parsed: Value = serde_json::from_str(document)?;
    let fields = parsed
        .get("fields")
        .and_then(Value::as_array)
        .ok_or_else(|| DappError::schema_mismatch("fields", "Array", parsed.to_string()))?;
    Ok(fields
        .iter()
        .map(|field| match field.get("value") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        })
        .collect())
}

/// Read-only queries against the gateway.
pub struct StateReader<G: GatewayApi + ?Sized> {
    gateway: Arc<G>,
}

impl<G: GatewayApi + ?Sized> Clone for StateReader<G> {
    fn clone(&self) -> Self {
        Self { gateway: Arc::clone(&self.gateway) }
    }
}

impl<G: GatewayApi + ?Sized> StateReader<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Vault-level details of a single entity.
    pub async fn entity(&self, address: &str) -> Result<EntityDetailsItem, DappError> {
        let items = self.gateway.entity_details(&[address.to_string()]).await?;
        items
            .into_iter()
            .find(|item| item.address == address)
            .ok_or_else(|| DappError::schema_mismatch("items", address, "missing"))
    }

    pub async fn account_balances(&self, account: &AccountRef) -> Result<AccountBalances, DappError> {
        let item = self.entity(account.as_str()).await?;
        let balances = AccountBalances::from_entity(&item)?;
        debug!(
            account = %account,
            fungibles = balances.fungibles.len(),
            non_fungibles = balances.non_fungibles.len(),
            "Fetched balances"
        );
        Ok(balances)
    }

    /// Fungible amount of one resource; zero when the account holds none.
    pub async fn resource_amount(&self, account: &AccountRef, resource: &str) -> Result<Amount, DappError> {
        Ok(self.account_balances(account).await?.fungible(resource))
    }

    /// Component state decoded against `schema`.
    pub async fn component_state(&self, address: &str, schema: &StateSchema) -> Result<DecodedState, DappError> {
        let item = self.entity(address).await?;
        let state = item
            .details
            .as_ref()
            .and_then(|d| d.state.as_ref())
            .ok_or_else(|| DappError::schema_mismatch("details.state", "component state", "missing"))?;
        schema.decode(&SborNode::from_programmatic_json(state)?)
    }

    /// Component state from the legacy explorer endpoint.
    pub async fn legacy_component_state(&self, address: &str, schema: &StateSchema) -> Result<DecodedState, DappError> {
        let component = self.gateway.component(address).await?;
        let document: Value = serde_json::from_str(&component.state)
            .map_err(|e| DappError::schema_mismatch("state", "JSON document", e.to_string()))?;
        schema.decode(&SborNode::from_legacy(&document)?)
    }

    /// Balance of `resource` among a legacy component's owned resources.
    pub async fn legacy_balance(&self, address: &str, resource: &str) -> Result<Amount, DappError> {
        let component = self.gateway.component(address).await?;
        match component.owned_resources.iter().find(|r| r.resource_address == resource) {
            Some(owned) => gateway_amount(&owned.amount),
            None => Ok(Amount::ZERO),
        }
    }

    /// Immutable then mutable data fields of a non-fungible, as given.
    pub async fn nft_metadata(&self, resource: &str, id: &str) -> Result<Vec<String>, DappError> {
        let nft = self.gateway.non_fungible(resource, id).await?;
        let mut values = legacy_field_values(&nft.immutable_data)?;
        values.extend(legacy_field_values(&nft.mutable_data)?);
        Ok(values)
    }

    /// Staking position behind a staker badge.
    pub async fn staker_info(&self, badge_resource: &str, id: &str) -> Result<StakerInfo, DappError> {
        StakerInfo::from_metadata(&self.nft_metadata(badge_resource, id).await?)
    }

    /// Fetches several entities at once. Any failure fails the whole batch.
    pub async fn entities_concurrently(&self, addresses: &[String]) -> Result<Vec<EntityDetailsItem>, DappError> {
        try_join_all(addresses.iter().map(|address| self.entity(address))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::mock::MockGateway;
    use crate::blockchain::sbor::FieldKind;
    use serde_json::json;

    const ACCOUNT: &str = "account_tdx_2_1abc";
    const XRD: &str = "resource_tdx_2_1xrd";
    const BADGE: &str = "resource_tdx_2_1badge";

    fn reader() -> (Arc<MockGateway>, StateReader<MockGateway>) {
        let gateway = Arc::new(MockGateway::new());
        gateway.set_entity(
            ACCOUNT,
            json!({
                "fungible_resources": { "items": [
                    { "resource_address": XRD, "vaults": { "items": [
                        { "vault_address": "internal_vault_1", "amount": "100.5" },
                        { "vault_address": "internal_vault_2", "amount": "20" }
                    ]}},
                    { "resource_address": "resource_tdx_2_1empty", "vaults": { "items": [
                        { "vault_address": "internal_vault_3", "amount": "0" }
                    ]}}
                ]},
                "non_fungible_resources": { "items": [
                    { "resource_address": BADGE, "vaults": { "items": [
                        { "vault_address": "internal_vault_4", "total_count": 2, "items": ["#1#", "#2#"] }
                    ]}}
                ]}
            }),
        );
        (gateway.clone(), StateReader::new(gateway))
    }

    #[tokio::test]
    async fn test_balances_sum_vaults_and_drop_zero() {
        let (_, reader) = reader();
        let balances = reader.account_balances(&AccountRef::new(ACCOUNT).unwrap()).await.unwrap();
        assert_eq!(balances.fungible(XRD).to_string(), "120.5");
        assert_eq!(balances.fungibles.len(), 1);
        assert_eq!(balances.vaults.len(), 3);
        assert_eq!(balances.non_fungible_count(BADGE), 2);
        assert_eq!(balances.non_fungibles[0].ids, vec!["#1#", "#2#"]);
    }

    #[tokio::test]
    async fn test_resource_amount_absent_is_zero() {
        let (_, reader) = reader();
        let amount = reader
            .resource_amount(&AccountRef::new(ACCOUNT).unwrap(), "resource_tdx_2_1none")
            .await
            .unwrap();
        assert!(amount.is_zero());
    }

    #[tokio::test]
    async fn test_component_state_schema() {
        let (gateway, reader) = reader();
        gateway.set_entity(
            "component_tdx_2_1pool",
            json!({
                "details": { "type": "Component", "state": {
                    "kind": "Tuple",
                    "fields": [{ "kind": "Decimal", "field_name": "total", "value": "42" }]
                }}
            }),
        );
        let schema = StateSchema::new().field("total", FieldKind::Decimal);
        let state = reader.component_state("component_tdx_2_1pool", &schema).await.unwrap();
        assert_eq!(state.amount("total").unwrap(), Amount::from_units(42));

        let wrong = StateSchema::new().field("total", FieldKind::String);
        assert!(matches!(
            reader.component_state("component_tdx_2_1pool", &wrong).await,
            Err(DappError::SchemaMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_fetch_is_all_or_nothing() {
        let (gateway, reader) = reader();
        gateway.set_entity("component_tdx_2_1ok", json!({}));
        let ok = reader
            .entities_concurrently(&[ACCOUNT.to_string(), "component_tdx_2_1ok".to_string()])
            .await
            .unwrap();
        assert_eq!(ok.len(), 2);

        gateway.fail_address("component_tdx_2_1down");
        let err = reader
            .entities_concurrently(&[ACCOUNT.to_string(), "component_tdx_2_1down".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, DappError::NetworkFailure(_)));
    }

    #[tokio::test]
    async fn test_nft_metadata_keeps_units() {
        let (gateway, reader) = reader();
        gateway.set_non_fungible(
            BADGE,
            "#1#",
            json!({
                "immutable_data": r#"{"type":"Struct","fields":[{"type":"ComponentAddress","value":"component_tdx_2_1val"}]}"#,
                "mutable_data": r#"{"type":"Struct","fields":[{"type":"Decimal","value":"100 NAR"},{"type":"u64","value":12}]}"#
            }),
        );
        let values = reader.nft_metadata(BADGE, "#1#").await.unwrap();
        assert_eq!(values, vec!["component_tdx_2_1val", "100 NAR", "12"]);
    }

    #[tokio::test]
    async fn test_staker_info_strips_units() {
        let (gateway, reader) = reader();
        gateway.set_non_fungible(
            BADGE,
            "#7#",
            json!({
                "immutable_data": r#"{"type":"Struct","fields":[
                    {"type":"ComponentAddress","value":"component_tdx_2_1val"},
                    {"type":"String","value":"Neutral Validator"}]}"#,
                "mutable_data": r#"{"type":"Struct","fields":[
                    {"type":"Decimal","value":"Decimal(\"12.5\")"},
                    {"type":"u64","value":"340u64"},
                    {"type":"Decimal","value":"Decimal(\"0\")"},
                    {"type":"Decimal","value":"100 NAR"}]}"#
            }),
        );
        let info = reader.staker_info(BADGE, "#7#").await.unwrap();
        assert_eq!(
            info,
            StakerInfo {
                validator: "component_tdx_2_1val".into(),
                validator_name: "Neutral Validator".into(),
                unstaking: Amount::parse("12.5").unwrap(),
                unstake_done_epoch: 340,
                withdrawable: Amount::ZERO,
                staked: Amount::from_units(100),
            }
        );
    }

    #[test]
    fn test_staker_info_short_record_is_schema_mismatch() {
        let values = vec!["component_tdx_2_1val".to_string(), "name".to_string()];
        assert!(matches!(StakerInfo::from_metadata(&values), Err(DappError::SchemaMismatch { .. })));
    }

    #[tokio::test]
    async fn test_legacy_component_state_decodes_fields() {
        let (gateway, reader) = reader();
        gateway.set_component(
            "component_tdx_2_1legacy",
            json!({
                "state": r#"{"type":"Struct","fields":[
                    {"type":"Decimal","value":"Decimal(\"250\")"},
                    {"type":"String","value":"NeuRacle"}]}"#,
                "owned_resources": []
            }),
        );
        let schema = StateSchema::new().field("pool", FieldKind::Decimal).field("name", FieldKind::String);
        let state = reader.legacy_component_state("component_tdx_2_1legacy", &schema).await.unwrap();
        assert_eq!(state.amount("pool").unwrap(), Amount::from_units(250));
        assert_eq!(state.string("name").unwrap(), "NeuRacle");

        let wrong = StateSchema::new().field("pool", FieldKind::Bool);
        assert!(matches!(
            reader.legacy_component_state("component_tdx_2_1legacy", &wrong).await,
            Err(DappError::SchemaMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_balances_beyond_28_digits_are_exact() {
        let gateway = Arc::new(MockGateway::new());
        gateway.set_entity(
            ACCOUNT,
            json!({
                "fungible_resources": { "items": [
                    { "resource_address": XRD, "vaults": { "items": [
                        { "vault_address": "internal_vault_1", "amount": "100" }
                    ]}},
                    { "resource_address": BADGE, "vaults": { "items": [
                        { "vault_address": "internal_vault_2", "amount": "100000000000000000000000000000" },
                        { "vault_address": "internal_vault_3", "amount": "0.000000000000000001" }
                    ]}}
                ]}
            }),
        );
        let balances = StateReader::new(gateway)
            .account_balances(&AccountRef::new(ACCOUNT).unwrap())
            .await
            .unwrap();
        assert_eq!(balances.fungible(XRD), Amount::from_units(100));
        assert_eq!(balances.fungible(BADGE).to_string(), "100000000000000000000000000000.000000000000000001");
    }

    #[tokio::test]
    async fn test_legacy_balance_defaults_to_zero() {
        let (gateway, reader) = reader();
        gateway.set_component(
            ACCOUNT,
            json!({
                "state": r#"{"type":"Struct","fields":[]}"#,
                "owned_resources": [{ "resource_address": XRD, "amount": "55" }]
            }),
        );
        assert_eq!(reader.legacy_balance(ACCOUNT, XRD).await.unwrap(), Amount::from_units(55));
        assert!(reader.legacy_balance(ACCOUNT, BADGE).await.unwrap().is_zero());
    }
}
