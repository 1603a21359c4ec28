//! Programmatic SBOR values and the named-schema decoder for component state.
//!
//! The gateway returns component state as a `kind`-tagged JSON tree. Reading a
//! field by position breaks silently when a blueprint adds or reorders
//! fields, so state is decoded against a [`StateSchema`] that names each field
//! and the kind it must have. Any difference is a [`DappError::SchemaMismatch`].

use std::collections::BTreeMap;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::domain::Amount;
use crate::core::errors::DappError;

/// A value together with the metadata the gateway attaches to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SborNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(flatten)]
    pub value: SborValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SborMapEntry {
    pub key: SborNode,
    pub value: SborNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SborValue {
    Bool { value: bool },
    I8 { value: String },
    I16 { value: String },
    I32 { value: String },
    I64 { value: String },
    I128 { value: String },
    U8 { value: String },
    U16 { value: String },
    U32 { value: String },
    U64 { value: String },
    U128 { value: String },
    String { value: String },
    Decimal { value: String },
    PreciseDecimal { value: String },
    Reference { value: String },
    Own { value: String },
    NonFungibleLocalId { value: String },
    Bytes {
        #[serde(default)]
        element_kind: Option<String>,
        hex: String,
    },
    Enum {
        #[serde(deserialize_with = "lenient_u8")]
        variant_id: u8,
        #[serde(default)]
        variant_name: Option<String>,
        #[serde(default)]
        fields: Vec<SborNode>,
    },
    Array {
        #[serde(default)]
        element_kind: Option<String>,
        #[serde(default)]
        elements: Vec<SborNode>,
    },
    Map {
        #[serde(default)]
        key_kind: Option<String>,
        #[serde(default)]
        value_kind: Option<String>,
        #[serde(default)]
        entries: Vec<SborMapEntry>,
    },
    Tuple {
        #[serde(default)]
        fields: Vec<SborNode>,
    },
}

// The gateway has sent variant ids both as numbers and as strings.
fn lenient_u8<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u8),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

impl SborValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            SborValue::Bool { .. } => "Bool",
            SborValue::I8 { .. } => "I8",
            SborValue::I16 { .. } => "I16",
            SborValue::I32 { .. } => "I32",
            SborValue::I64 { .. } => "I64",
            SborValue::I128 { .. } => "I128",
            SborValue::U8 { .. } => "U8",
            SborValue::U16 { .. } => "U16",
            SborValue::U32 { .. } => "U32",
            SborValue::U64 { .. } => "U64",
            SborValue::U128 { .. } => "U128",
            SborValue::String { .. } => "String",
            SborValue::Decimal { .. } => "Decimal",
            SborValue::PreciseDecimal { .. } => "PreciseDecimal",
            SborValue::Reference { .. } => "Reference",
            SborValue::Own { .. } => "Own",
            SborValue::NonFungibleLocalId { .. } => "NonFungibleLocalId",
            SborValue::Bytes { .. } => "Bytes",
            SborValue::Enum { .. } => "Enum",
            SborValue::Array { .. } => "Array",
            SborValue::Map { .. } => "Map",
            SborValue::Tuple { .. } => "Tuple",
        }
    }

    /// Textual payload of scalar values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SborValue::I8 { value }
            | SborValue::I16 { value }
            | SborValue::I32 { value }
            | SborValue::I64 { value }
            | SborValue::I128 { value }
            | SborValue::U8 { value }
            | SborValue::U16 { value }
            | SborValue::U32 { value }
            | SborValue::U64 { value }
            | SborValue::U128 { value }
            | SborValue::String { value }
            | SborValue::Decimal { value }
            | SborValue::PreciseDecimal { value }
            | SborValue::Reference { value }
            | SborValue::Own { value }
            | SborValue::NonFungibleLocalId { value } => Some(value),
            SborValue::Bytes { hex, .. } => Some(hex),
            _ => None,
        }
    }

    fn is_unsigned(&self) -> bool {
        matches!(
            self,
            SborValue::U8 { .. } | SborValue::U16 { .. } | SborValue::U32 { .. } | SborValue::U64 { .. }
        )
    }

    /// `Option<T>` is an enum with `None`/`Some` variants (ids 0 and 1).
    fn as_option(&self) -> Option<Option<&SborNode>> {
        match self {
            SborValue::Enum { variant_id, variant_name, fields } => {
                let name = variant_name.as_deref();
                match (variant_id, name, fields.as_slice()) {
                    (0, None | Some("None"), []) => Some(None),
                    (1, None | Some("Some"), [inner]) => Some(Some(inner)),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl SborNode {
    pub fn new(value: SborValue) -> Self {
        Self { field_name: None, type_name: None, value }
    }

    pub fn named(name: impl Into<String>, value: SborValue) -> Self {
        Self { field_name: Some(name.into()), type_name: None, value }
    }

    /// Parses the gateway's programmatic JSON.
    pub fn from_programmatic_json(json: &Value) -> Result<Self, DappError> {
        serde_json::from_value(json.clone()).map_err(|e| DappError::schema_mismatch("state", "programmatic SBOR", e.to_string()))
    }

    /// Converts a legacy `type`-tagged state document into the same model.
    pub fn from_legacy(json: &Value) -> Result<Self, DappError> {
        let ty = json
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| DappError::schema_mismatch("type", "legacy type tag", json.to_string()))?;
        let text = || legacy_text(json.get("value"));
        let children = |key: &str| -> Result<Vec<SborNode>, DappError> {
            json.get(key)
                .and_then(Value::as_array)
                .map(|items| items.iter().map(SborNode::from_legacy).collect())
                .unwrap_or_else(|| Ok(Vec::new()))
        };

        let value = match ty {
            "Struct" | "Tuple" => SborValue::Tuple { fields: children("fields")? },
            "Enum" => {
                let index = json.get("index").and_then(Value::as_u64).unwrap_or(0);
                let variant_id = u8::try_from(index)
                    .map_err(|_| DappError::schema_mismatch("index", "u8 enum discriminator", index.to_string()))?;
                SborValue::Enum {
                    variant_id,
                    variant_name: json.get("name").and_then(Value::as_str).map(str::to_string),
                    fields: children("fields")?,
                }
            }
            "Option" => match json.get("value") {
                None | Some(Value::Null) => SborValue::Enum { variant_id: 0, variant_name: Some("None".into()), fields: Vec::new() },
                Some(inner) => SborValue::Enum {
                    variant_id: 1,
                    variant_name: Some("Some".into()),
                    fields: vec![SborNode::from_legacy(inner)?],
                },
            },
            "Vec" | "Array" | "List" | "Set" | "HashSet" | "TreeSet" => SborValue::Array {
                element_kind: json.get("element_type").and_then(Value::as_str).map(str::to_string),
                elements: children("elements")?,
            },
            "HashMap" | "TreeMap" | "Map" => {
                let flat = children("elements")?;
                if flat.len() % 2 != 0 {
                    return Err(DappError::schema_mismatch("elements", "key/value pairs", format!("{} items", flat.len())));
                }
                let mut entries = Vec::with_capacity(flat.len() / 2);
                let mut iter = flat.into_iter();
                while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
                    entries.push(SborMapEntry { key, value });
                }
                SborValue::Map { key_kind: None, value_kind: None, entries }
            }
            "Bool" => SborValue::Bool { value: text() == "true" },
            "Decimal" => SborValue::Decimal { value: unwrap_constructor(&text()) },
            "PreciseDecimal" => SborValue::PreciseDecimal { value: unwrap_constructor(&text()) },
            "String" => SborValue::String { value: text() },
            "ResourceAddress" | "ComponentAddress" | "PackageAddress" | "SystemAddress" | "Address" => {
                SborValue::Reference { value: unwrap_constructor(&text()) }
            }
            "Vault" | "Bucket" | "Proof" | "KeyValueStore" | "Component" => SborValue::Own { value: unwrap_constructor(&text()) },
            "NonFungibleId" | "NonFungibleLocalId" => SborValue::NonFungibleLocalId { value: unwrap_constructor(&text()) },
            other => legacy_integer(other, unwrap_integer(&text()))
                .ok_or_else(|| DappError::schema_mismatch("type", "known legacy type", other))?,
        };
        Ok(SborNode::new(value))
    }

    pub fn kind_name(&self) -> &'static str {
        self.value.kind_name()
    }
}

static CONSTRUCTOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[A-Za-z]+\("(.*)"\)$"#).expect("Hardcoded regex should always compile"));
static INTEGER_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?\d+)[ui](8|16|32|64|128)$").expect("Hardcoded regex should always compile"));

fn legacy_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// `Decimal("100")` -> `100`; anything else is returned unchanged.
fn unwrap_constructor(text: &str) -> String {
    CONSTRUCTOR
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| text.to_string())
}

/// `5u64` -> `5`.
fn unwrap_integer(text: &str) -> String {
    INTEGER_SUFFIX
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| text.to_string())
}

fn legacy_integer(ty: &str, value: String) -> Option<SborValue> {
    let v = match ty.to_ascii_lowercase().as_str() {
        "i8" => SborValue::I8 { value },
        "i16" => SborValue::I16 { value },
        "i32" => SborValue::I32 { value },
        "i64" => SborValue::I64 { value },
        "i128" => SborValue::I128 { value },
        "u8" => SborValue::U8 { value },
        "u16" => SborValue::U16 { value },
        "u32" => SborValue::U32 { value },
        "u64" => SborValue::U64 { value },
        "u128" => SborValue::U128 { value },
        _ => return None,
    };
    Some(v)
}

/// Kind a schema field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Decimal,
    PreciseDecimal,
    String,
    Reference,
    Own,
    NonFungibleLocalId,
    /// Any unsigned integer up to `u64`.
    Unsigned,
    U128,
    I64,
    Array,
    Map,
    Tuple,
    Enum,
    Option,
    Any,
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Bool => "Bool",
            FieldKind::Decimal => "Decimal",
            FieldKind::PreciseDecimal => "PreciseDecimal",
            FieldKind::String => "String",
            FieldKind::Reference => "Reference",
            FieldKind::Own => "Own",
            FieldKind::NonFungibleLocalId => "NonFungibleLocalId",
            FieldKind::Unsigned => "unsigned integer",
            FieldKind::U128 => "U128",
            FieldKind::I64 => "I64",
            FieldKind::Array => "Array",
            FieldKind::Map => "Map",
            FieldKind::Tuple => "Tuple",
            FieldKind::Enum => "Enum",
            FieldKind::Option => "Option",
            FieldKind::Any => "any",
        }
    }

    pub fn matches(&self, value: &SborValue) -> bool {
        match self {
            FieldKind::Bool => matches!(value, SborValue::Bool { .. }),
            FieldKind::Decimal => matches!(value, SborValue::Decimal { .. }),
            FieldKind::PreciseDecimal => matches!(value, SborValue::PreciseDecimal { .. }),
            FieldKind::String => matches!(value, SborValue::String { .. }),
            FieldKind::Reference => matches!(value, SborValue::Reference { .. }),
            FieldKind::Own => matches!(value, SborValue::Own { .. }),
            FieldKind::NonFungibleLocalId => matches!(value, SborValue::NonFungibleLocalId { .. }),
            FieldKind::Unsigned => value.is_unsigned(),
            FieldKind::U128 => matches!(value, SborValue::U128 { .. }),
            FieldKind::I64 => matches!(value, SborValue::I64 { .. }),
            FieldKind::Array => matches!(value, SborValue::Array { .. }),
            FieldKind::Map => matches!(value, SborValue::Map { .. }),
            FieldKind::Tuple => matches!(value, SborValue::Tuple { .. }),
            FieldKind::Enum => matches!(value, SborValue::Enum { .. }),
            FieldKind::Option => value.as_option().is_some(),
            FieldKind::Any => true,
        }
    }
}

/// Ordered list of named fields expected at the top of a component's state.
#[derive(Debug, Clone, Default)]
pub struct StateSchema {
    fields: Vec<(String, FieldKind)>,
}

impl StateSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push((name.into(), kind));
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Decodes `root` (a tuple) into named fields.
    ///
    /// Fields are matched by `field_name` when the payload carries names and
    /// by position otherwise.
    pub fn decode(&self, root: &SborNode) -> Result<DecodedState, DappError> {
        let fields = match &root.value {
            SborValue::Tuple { fields } => fields,
            other => return Err(DappError::schema_mismatch("<root>", "Tuple", other.kind_name())),
        };
        let named = fields.iter().any(|f| f.field_name.is_some());

        let mut values = BTreeMap::new();
        for (index, (name, kind)) in self.fields.iter().enumerate() {
            let node = if named {
                fields.iter().find(|f| f.field_name.as_deref() == Some(name.as_str()))
            } else {
                fields.get(index)
            };
            let node = node.ok_or_else(|| DappError::schema_mismatch(name.as_str(), kind.name(), "missing"))?;
            if !kind.matches(&node.value) {
                return Err(DappError::schema_mismatch(name.as_str(), kind.name(), node.kind_name()));
            }
            values.insert(name.clone(), node.clone());
        }
        Ok(DecodedState { values })
    }
}

/// Component state decoded against a [`StateSchema`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedState {
    values: BTreeMap<String, SborNode>,
}

impl DecodedState {
    pub fn get(&self, name: &str) -> Option<&SborNode> {
        self.values.get(name)
    }

    fn require(&self, name: &str, expected: &str) -> Result<&SborValue, DappError> {
        self.values
            .get(name)
            .map(|n| &n.value)
            .ok_or_else(|| DappError::schema_mismatch(name, expected, "missing"))
    }

    pub fn decimal(&self, name: &str) -> Result<Decimal, DappError> {
        match self.require(name, "Decimal")? {
            SborValue::Decimal { value } | SborValue::PreciseDecimal { value } => Decimal::from_str(value)
                .or_else(|_| Decimal::from_scientific(value))
                .map_err(|_| DappError::schema_mismatch(name, "Decimal", value.as_str())),
            other => Err(DappError::schema_mismatch(name, "Decimal", other.kind_name())),
        }
    }

    /// Lossless amount read; unlike [`DecodedState::decimal`] it never rounds.
    pub fn amount(&self, name: &str) -> Result<Amount, DappError> {
        match self.require(name, "Decimal")? {
            SborValue::Decimal { value } | SborValue::PreciseDecimal { value } => {
                Amount::parse(value).map_err(|_| DappError::schema_mismatch(name, "Decimal", value.as_str()))
            }
            other => Err(DappError::schema_mismatch(name, "Decimal", other.kind_name())),
        }
    }

    pub fn string(&self, name: &str) -> Result<&str, DappError> {
        match self.require(name, "String")? {
            SborValue::String { value } => Ok(value),
            other => Err(DappError::schema_mismatch(name, "String", other.kind_name())),
        }
    }

    pub fn reference(&self, name: &str) -> Result<&str, DappError> {
        match self.require(name, "Reference")? {
            SborValue::Reference { value } | SborValue::Own { value } => Ok(value),
            other => Err(DappError::schema_mismatch(name, "Reference", other.kind_name())),
        }
    }

    pub fn u64(&self, name: &str) -> Result<u64, DappError> {
        let value = self.require(name, "unsigned integer")?;
        match value {
            v if v.is_unsigned() => v
                .as_text()
                .and_then(|t| t.parse().ok())
                .ok_or_else(|| DappError::schema_mismatch(name, "unsigned integer", v.as_text().unwrap_or(""))),
            other => Err(DappError::schema_mismatch(name, "unsigned integer", other.kind_name())),
        }
    }

    pub fn bool(&self, name: &str) -> Result<bool, DappError> {
        match self.require(name, "Bool")? {
            SborValue::Bool { value } => Ok(*value),
            other => Err(DappError::schema_mismatch(name, "Bool", other.kind_name())),
        }
    }

    pub fn array(&self, name: &str) -> Result<&[SborNode], DappError> {
        match self.require(name, "Array")? {
            SborValue::Array { elements, .. } => Ok(elements),
            other => Err(DappError::schema_mismatch(name, "Array", other.kind_name())),
        }
    }

    pub fn map(&self, name: &str) -> Result<&[SborMapEntry], DappError> {
        match self.require(name, "Map")? {
            SborValue::Map { entries, .. } => Ok(entries),
            other => Err(DappError::schema_mismatch(name, "Map", other.kind_name())),
        }
    }

    pub fn option(&self, name: &str) -> Result<Option<&SborNode>, DappError> {
        let value = self.require(name, "Option")?;
        value
            .as_option()
            .ok_or_else(|| DappError::schema_mismatch(name, "Option", value.kind_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn staking_state() -> Value {
        json!({
            "kind": "Tuple",
            "type_name": "Validator",
            "fields": [
                { "kind": "Decimal", "field_name": "total_staked", "value": "1500.5" },
                { "kind": "Reference", "field_name": "staker_badge", "value": "resource_tdx_2_1nf" },
                { "kind": "U64", "field_name": "unstake_delay", "value": "500" },
                { "kind": "Enum", "field_name": "owner", "variant_id": "1", "variant_name": "Some",
                  "fields": [{ "kind": "String", "value": "alice" }] },
                { "kind": "Array", "field_name": "stakers", "element_kind": "Reference",
                  "elements": [{ "kind": "Reference", "value": "account_tdx_2_1a" }] }
            ]
        })
    }

    #[test]
    fn test_decode_by_field_name() {
        let root = SborNode::from_programmatic_json(&staking_state()).unwrap();
        let schema = StateSchema::new()
            .field("stakers", FieldKind::Array)
            .field("total_staked", FieldKind::Decimal)
            .field("unstake_delay", FieldKind::Unsigned)
            .field("owner", FieldKind::Option);
        let state = schema.decode(&root).unwrap();
        assert_eq!(state.decimal("total_staked").unwrap(), Decimal::from_str("1500.5").unwrap());
        assert_eq!(state.u64("unstake_delay").unwrap(), 500);
        assert_eq!(state.array("stakers").unwrap().len(), 1);
        let owner = state.option("owner").unwrap().unwrap();
        assert_eq!(owner.value.as_text(), Some("alice"));
    }

    #[test]
    fn test_kind_mismatch_fails_loudly() {
        let root = SborNode::from_programmatic_json(&staking_state()).unwrap();
        let schema = StateSchema::new().field("total_staked", FieldKind::String);
        match schema.decode(&root) {
            Err(DappError::SchemaMismatch { field, expected, found }) => {
                assert_eq!(field, "total_staked");
                assert_eq!(expected, "String");
                assert_eq!(found, "Decimal");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_field_fails_loudly() {
        let root = SborNode::from_programmatic_json(&staking_state()).unwrap();
        let err = StateSchema::new().field("apy", FieldKind::Decimal).decode(&root).unwrap_err();
        assert!(matches!(err, DappError::SchemaMismatch { ref found, .. } if found == "missing"));
    }

    #[test]
    fn test_positional_when_unnamed() {
        let root = SborNode::from_programmatic_json(&json!({
            "kind": "Tuple",
            "fields": [
                { "kind": "String", "value": "NeuRacle" },
                { "kind": "Decimal", "value": "10" }
            ]
        }))
        .unwrap();
        let state = StateSchema::new()
            .field("name", FieldKind::String)
            .field("fee", FieldKind::Decimal)
            .decode(&root)
            .unwrap();
        assert_eq!(state.string("name").unwrap(), "NeuRacle");
        assert_eq!(state.amount("fee").unwrap(), Amount::from_units(10));
    }

    #[test]
    fn test_legacy_conversion() {
        let legacy = json!({
            "type": "Struct",
            "fields": [
                { "type": "Decimal", "value": "Decimal(\"100\")" },
                { "type": "ResourceAddress", "value": "ResourceAddress(\"030000000000000000000000000000000000000000000000000004\")" },
                { "type": "u64", "value": "7u64" },
                { "type": "HashMap", "elements": [
                    { "type": "NonFungibleId", "value": "NonFungibleId(\"0a01\")" },
                    { "type": "Decimal", "value": "Decimal(\"5\")" }
                ]}
            ]
        });
        let root = SborNode::from_legacy(&legacy).unwrap();
        let state = StateSchema::new()
            .field("supply", FieldKind::Decimal)
            .field("token", FieldKind::Reference)
            .field("epoch", FieldKind::Unsigned)
            .field("stakes", FieldKind::Map)
            .decode(&root)
            .unwrap();
        assert_eq!(state.amount("supply").unwrap(), Amount::from_units(100));
        assert_eq!(state.u64("epoch").unwrap(), 7);
        let entries = state.map("stakes").unwrap();
        assert_eq!(entries[0].key.value.as_text(), Some("0a01"));
    }

    #[test]
    fn test_legacy_enum_index_out_of_range() {
        let err = SborNode::from_legacy(&json!({ "type": "Enum", "index": 256, "name": "Wide", "fields": [] })).unwrap_err();
        assert!(matches!(err, DappError::SchemaMismatch { ref field, .. } if field == "index"));

        let ok = SborNode::from_legacy(&json!({ "type": "Enum", "index": 255, "fields": [] })).unwrap();
        assert!(matches!(ok.value, SborValue::Enum { variant_id: 255, .. }));
    }

    #[test]
    fn test_legacy_unknown_type() {
        let err = SborNode::from_legacy(&json!({ "type": "Hologram", "value": "x" })).unwrap_err();
        assert!(matches!(err, DappError::SchemaMismatch { .. }));
    }
}
