use std::fmt::{self, Write as _};

use crate::core::domain::Amount;
use crate::core::errors::DappError;
use crate::core::validation::check_address_shape;

/// Worktop/auth-zone expressions usable as call arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestExpression {
    EntireWorktop,
    EntireAuthZone,
}

impl ManifestExpression {
    fn as_str(&self) -> &'static str {
        match self {
            ManifestExpression::EntireWorktop => "ENTIRE_WORKTOP",
            ManifestExpression::EntireAuthZone => "ENTIRE_AUTH_ZONE",
        }
    }
}

/// A typed manifest argument.
///
/// Values are rendered by [`fmt::Display`]; strings are escaped so user input
/// cannot close a literal and smuggle in extra instructions.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestValue {
    Address(String),
    Decimal(Amount),
    PreciseDecimal(Amount),
    Bucket(String),
    Proof(String),
    Expression(ManifestExpression),
    String(String),
    Bool(bool),
    U8(u8),
    U32(u32),
    U64(u64),
    U128(u128),
    I64(i64),
    NonFungibleLocalId(String),
    Enum { discriminator: u8, fields: Vec<ManifestValue> },
    Array { element_kind: &'static str, elements: Vec<ManifestValue> },
    Tuple(Vec<ManifestValue>),
}

impl ManifestValue {
    /// Address argument; rejects anything that is not shaped like a bech32 address.
    pub fn address(address: &str) -> Result<Self, DappError> {
        check_address_shape(address)?;
        Ok(ManifestValue::Address(address.to_string()))
    }

    pub fn decimal(amount: Amount) -> Self {
        ManifestValue::Decimal(amount)
    }

    pub fn bucket(name: impl Into<String>) -> Self {
        ManifestValue::Bucket(name.into())
    }

    pub fn proof(name: impl Into<String>) -> Self {
        ManifestValue::Proof(name.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        ManifestValue::String(value.into())
    }

    pub fn entire_worktop() -> Self {
        ManifestValue::Expression(ManifestExpression::EntireWorktop)
    }

    /// `Option::None` in manifest form.
    pub fn none() -> Self {
        ManifestValue::Enum { discriminator: 0, fields: Vec::new() }
    }

    pub fn some(value: ManifestValue) -> Self {
        ManifestValue::Enum { discriminator: 1, fields: vec![value] }
    }

    pub fn non_fungible_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ManifestValue::Array {
            element_kind: "NonFungibleLocalId",
            elements: ids.into_iter().map(|id| ManifestValue::NonFungibleLocalId(id.into())).collect(),
        }
    }

    /// Bucket names this value moves into the callee, recursively.
    pub fn buckets(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_buckets(&mut out);
        out
    }

    fn collect_buckets<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            ManifestValue::Bucket(name) => out.push(name),
            ManifestValue::Enum { fields, .. } | ManifestValue::Tuple(fields) => {
                fields.iter().for_each(|f| f.collect_buckets(out))
            }
            ManifestValue::Array { elements, .. } => elements.iter().for_each(|e| e.collect_buckets(out)),
            _ => {}
        }
    }

    /// Whether the value sweeps the whole worktop into the callee.
    pub fn takes_entire_worktop(&self) -> bool {
        match self {
            ManifestValue::Expression(ManifestExpression::EntireWorktop) => true,
            ManifestValue::Enum { fields, .. } | ManifestValue::Tuple(fields) => {
                fields.iter().any(ManifestValue::takes_entire_worktop)
            }
            ManifestValue::Array { elements, .. } => elements.iter().any(ManifestValue::takes_entire_worktop),
            _ => false,
        }
    }
}

pub(crate) fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[ManifestValue]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for ManifestValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestValue::Address(a) => write!(f, "Address({})", escape_string(a)),
            ManifestValue::Decimal(d) => write!(f, "Decimal(\"{}\")", d),
            ManifestValue::PreciseDecimal(d) => write!(f, "PreciseDecimal(\"{}\")", d),
            ManifestValue::Bucket(b) => write!(f, "Bucket({})", escape_string(b)),
            ManifestValue::Proof(p) => write!(f, "Proof({})", escape_string(p)),
            ManifestValue::Expression(e) => write!(f, "Expression(\"{}\")", e.as_str()),
            ManifestValue::String(s) => f.write_str(&escape_string(s)),
            ManifestValue::Bool(b) => write!(f, "{}", b),
            ManifestValue::U8(v) => write!(f, "{}u8", v),
            ManifestValue::U32(v) => write!(f, "{}u32", v),
            ManifestValue::U64(v) => write!(f, "{}u64", v),
            ManifestValue::U128(v) => write!(f, "{}u128", v),
            ManifestValue::I64(v) => write!(f, "{}i64", v),
            ManifestValue::NonFungibleLocalId(id) => write!(f, "NonFungibleLocalId({})", escape_string(id)),
            ManifestValue::Enum { discriminator, fields } => {
                write!(f, "Enum<{}u8>(", discriminator)?;
                write_list(f, fields)?;
                f.write_str(")")
            }
            ManifestValue::Array { element_kind, elements } => {
                write!(f, "Array<{}>(", element_kind)?;
                write_list(f, elements)?;
                f.write_str(")")
            }
            ManifestValue::Tuple(fields) => {
                f.write_str("Tuple(")?;
                write_list(f, fields)?;
                f.write_str(")")
            }
        }
    }
}
