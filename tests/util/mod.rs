#![allow(dead_code)]

use ledger_dapp_kit::core::config::{AddressBook, SubmissionConfig};
use ledger_dapp_kit::core::domain::AccountRef;

pub const ACCOUNT: &str = "account_tdx_2_12y0nsx972ueel0args3jnapz9qsexyj9vpfqtm6ay9ceymrwrglq0qty";
pub const OTHER_ACCOUNT: &str = "account_tdx_2_12xdm5g7xdhh73zkh7xkty0dsxw4rw0jl0sq4lr3erpc3xdf0tj4rs8c";
pub const XRD: &str = "resource_tdx_2_1tknxxxxxxxxxradxrdxxxxxxxxx009923554798xxxxxxxxxtfd2jc";
pub const VALIDATOR: &str = "validator_tdx_2_1sd5368vqdmjk0y2w7ymdts02cz9c52858gpyny56xdvzuhee50rq66";
pub const COMPONENT: &str = "component_tdx_2_1cqwkrkfkvnx7t6x3aaag4hvs2ps3jzp5hq2e6dzwkgyxhhl5q4cvhz";
pub const STAKER_BADGE: &str = "resource_tdx_2_1ngstakerxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";
pub const USER_BADGE: &str = "resource_tdx_2_1nguserxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";
pub const LND: &str = "resource_tdx_2_1tlndxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";
pub const PT: &str = "resource_tdx_2_1tptxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";
pub const FUND: &str = "component_tdx_2_1cfundxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";
pub const SHARE: &str = "resource_tdx_2_1tsharexxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";
pub const INSURANCE: &str = "component_tdx_2_1cnsurancexxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";
pub const INSURER_BADGE: &str = "resource_tdx_2_1ngnsurerxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";
pub const INSURED_BADGE: &str = "resource_tdx_2_1ngnsuredxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";
pub const CLAIM_BADGE: &str = "resource_tdx_2_1ngclamxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";
pub const LENDING: &str = "component_tdx_2_1clendxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";
pub const STABLE: &str = "resource_tdx_2_1tstxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";
pub const LENDER_BADGE: &str = "resource_tdx_2_1nglenderxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";
pub const BORROWER_BADGE: &str = "resource_tdx_2_1ngdetrxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";
pub const CREDIT_BADGE: &str = "resource_tdx_2_1ngcredtxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";

pub fn account() -> AccountRef {
    AccountRef::new(ACCOUNT).unwrap()
}

/// Address book with every slot filled.
pub fn full_book() -> AddressBook {
    AddressBook {
        component: Some(COMPONENT.into()),
        admin_badge: Some(STAKER_BADGE.into()),
        staking_token: Some(XRD.into()),
        staker_badge: Some(STAKER_BADGE.into()),
        validator: Some(VALIDATOR.into()),
        user_badge: Some(USER_BADGE.into()),
        tokenizer_token: Some(LND.into()),
        principal_token: Some(PT.into()),
        underlying_token: Some(XRD.into()),
        fund_component: Some(FUND.into()),
        share_token: Some(SHARE.into()),
        insurance_component: Some(INSURANCE.into()),
        insurer_badge: Some(INSURER_BADGE.into()),
        insured_badge: Some(INSURED_BADGE.into()),
        claim_badge: Some(CLAIM_BADGE.into()),
        fee_resource: Some(XRD.into()),
        lending_component: Some(LENDING.into()),
        lending_token: Some(STABLE.into()),
        lender_badge: Some(LENDER_BADGE.into()),
        borrower_badge: Some(BORROWER_BADGE.into()),
        credit_badge: Some(CREDIT_BADGE.into()),
    }
}

/// Polls without waiting so tests stay fast.
pub fn fast_submission() -> SubmissionConfig {
    SubmissionConfig {
        status_poll_attempts: 3,
        status_poll_interval_ms: 1,
        refresh_delay_ms: 1,
        request_timeout_secs: 5,
    }
}
