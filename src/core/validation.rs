use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::domain::Amount;
use crate::core::errors::DappError;

// <hrp>1<data>, data restricted to the bech32 alphabet.
static ADDRESS_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][a-z0-9_]*1[qpzry9x8gf2tvdw0s3jn54khce6mua7l]{6,}$")
        .expect("Hardcoded regex should always compile")
});

static EDGE_NON_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\D+|\D+$").expect("Hardcoded regex should always compile"));

/// Entity kinds encoded in the address human readable part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Account,
    Component,
    Resource,
    Validator,
    Package,
    Pool,
}

impl EntityKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            EntityKind::Account => "account",
            EntityKind::Component => "component",
            EntityKind::Resource => "resource",
            EntityKind::Validator => "validator",
            EntityKind::Package => "package",
            EntityKind::Pool => "pool",
        }
    }
}

/// Parses user input for an amount field (the `isNaN` guard, applied everywhere).
pub fn parse_amount(input: &str) -> Result<Amount, DappError> {
    Amount::parse(input)
}

/// Cheap structural check used before an address is interpolated into a manifest.
pub fn check_address_shape(address: &str) -> Result<(), DappError> {
    if ADDRESS_SHAPE.is_match(address) {
        Ok(())
    } else {
        Err(DappError::InvalidAddress(address.to_string()))
    }
}

/// Full validation: bech32m checksum, entity kind and network suffix.
///
/// `hrp_suffix` is the network part of the hrp, e.g. `rdx` on mainnet or
/// `tdx_2_` on stokenet.
pub fn validate_address(address: &str, kind: EntityKind, hrp_suffix: &str) -> Result<(), DappError> {
    check_address_shape(address)?;
    let (hrp, _data, variant) = bech32::decode(address)
        .map_err(|e| DappError::InvalidAddress(format!("{}: {}", address, e)))?;
    if variant != bech32::Variant::Bech32m {
        return Err(DappError::InvalidAddress(format!("{}: not bech32m encoded", address)));
    }
    let expected_hrp = format!("{}_{}", kind.prefix(), hrp_suffix);
    if hrp != expected_hrp {
        return Err(DappError::InvalidAddress(format!(
            "{}: expected prefix '{}', found '{}'",
            address, expected_hrp, hrp
        )));
    }
    Ok(())
}

/// Strips leading and trailing non-digit characters, e.g. `"100 XRD"` -> `"100"`,
/// `Decimal("12.5")` -> `"12.5"`.
pub fn strip_unit_suffix(value: &str) -> String {
    EDGE_NON_DIGITS.replace_all(value, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAINNET_XRD: &str =
        "resource_rdx1tknxxxxxxxxxradxrdxxxxxxxxx009923554798xxxxxxxxxradxrd";

    #[test]
    fn test_shape_accepts_bech32_charset() {
        assert!(check_address_shape(MAINNET_XRD).is_ok());
        assert!(check_address_shape("account_tdx_2_1c8qqqqqqqqqqqqq").is_ok());
    }

    #[test]
    fn test_shape_rejects_injection() {
        assert!(check_address_shape("account_rdx1qqq\") \"withdraw").is_err());
        assert!(check_address_shape("").is_err());
        assert!(check_address_shape("ACCOUNT_RDX1QQQQQQQ").is_err());
        assert!(check_address_shape("account_rdx1qqqqbq").is_err());
    }

    #[test]
    fn test_validate_known_mainnet_address() {
        assert!(validate_address(MAINNET_XRD, EntityKind::Resource, "rdx").is_ok());
    }

    #[test]
    fn test_validate_stokenet_account() {
        let account = "account_tdx_2_12y0nsx972ueel0args3jnapz9qsexyj9vpfqtm6ay9ceymrwrglq0qty";
        assert!(validate_address(account, EntityKind::Account, "tdx_2_").is_ok());
        assert!(validate_address(account, EntityKind::Account, "rdx").is_err());
    }

    #[test]
    fn test_validate_rejects_wrong_network_and_kind() {
        assert!(validate_address(MAINNET_XRD, EntityKind::Resource, "tdx_2_").is_err());
        assert!(validate_address(MAINNET_XRD, EntityKind::Account, "rdx").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_checksum() {
        let tampered = MAINNET_XRD.replace("radxrd", "radxrq");
        assert!(validate_address(&tampered, EntityKind::Resource, "rdx").is_err());
    }

    #[test]
    fn test_strip_unit_suffix() {
        assert_eq!(strip_unit_suffix("100 XRD"), "100");
        assert_eq!(strip_unit_suffix("Decimal(\"12.5\")"), "12.5");
        assert_eq!(strip_unit_suffix("42"), "42");
        assert_eq!(strip_unit_suffix("XRD"), "");
    }
}
