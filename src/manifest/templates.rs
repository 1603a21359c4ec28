//! Operation templates: named user actions and the manifests they expand to.

use std::fmt;

use crate::core::config::AddressBook;
use crate::core::domain::{AccountRef, Amount};
use crate::core::errors::DappError;
use crate::core::validation::{check_address_shape, parse_amount};
use crate::manifest::builder::ManifestBuilder;
use crate::manifest::instruction::TransactionManifest;
use crate::manifest::value::ManifestValue;

/// A user action with typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    // validator staking
    Stake { amount: Amount },
    AddStake { amount: Amount },
    Unstake { amount: Amount },
    StopUnstake,
    WithdrawStake { amount: Amount },

    // yield tokenizer
    Register,
    Unregister,
    Supply { amount: Amount },
    TakesBack { amount: Amount },
    TokenizeYield { amount: Amount, maturity: Amount },
    RedeemFromPt { amount: Amount },
    ClaimYield,
    SwapPt { amount: Amount },

    // fund management
    DepositToFund { resource: String, amount: Amount, ratios: Vec<(String, Amount)> },
    WithdrawFromFund { amount: Amount },

    // insurance
    SubscribePolicy { policy_id: u128, amount: Amount, service_fee: Amount },
    InvestAsInsurer { policy_id: u128, amount: Amount, service_fee: Amount },
    WithdrawRewards { policy_id: u128 },
    ReportClaim { policy_id: u128, claim_amount: Amount, report: String },
    ClaimWithdraw { policy_id: u128 },
    ListOnMarketplace { policy_id: u128, amount: Amount, service_fee: Amount },
    BuyOnMarketplace { policy_id: u128, listing_id: String, payment: Amount, service_fee: Amount },

    // lending
    RegisterLender,
    LendMoney { amount: Amount },
    Borrow { amount: Amount },
    Repay { amount: Amount },
    RepayCredit { amount: Amount },

    Transfer { to: String, resource: String, amount: Amount },
}

/// Names accepted by [`Operation::parse`], with their argument lists.
pub const OPERATION_USAGE: &[(&str, &str)] = &[
    ("stake", "<amount>"),
    ("add_stake", "<amount>"),
    ("unstake", "<amount>"),
    ("stop_unstake", ""),
    ("withdraw_stake", "<amount>"),
    ("register", ""),
    ("unregister", ""),
    ("supply", "<amount>"),
    ("takes_back", "<amount>"),
    ("tokenize_yield", "<amount> <maturity>"),
    ("redeem_from_pt", "<amount>"),
    ("claim_yield", ""),
    ("swap_pt", "<amount>"),
    ("deposit_to_fund", "<resource> <amount> [<resource>:<ratio>...]"),
    ("withdraw_from_fund", "<amount>"),
    ("subscribe_policy", "<policy_id> <amount> <service_fee>"),
    ("invest_as_insurer", "<policy_id> <amount> <service_fee>"),
    ("withdraw_rewards", "<policy_id>"),
    ("report_claim", "<policy_id> <claim_amount> <report...>"),
    ("claim_withdraw", "<policy_id>"),
    ("list_on_marketplace", "<policy_id> <amount> <service_fee>"),
    ("buy_on_marketplace", "<policy_id> <listing_id> <payment> <service_fee>"),
    ("register_lender", ""),
    ("lend_money", "<amount>"),
    ("borrow", "<amount>"),
    ("repay", "<amount>"),
    ("repay_credit", "<amount>"),
    ("transfer", "<to> <resource> <amount>"),
];

struct Args<'a> {
    op: &'a str,
    values: &'a [String],
}

impl<'a> Args<'a> {
    fn get(&self, index: usize, name: &str) -> Result<&'a str, DappError> {
        self.values
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| DappError::InvalidManifest(format!("'{}' requires <{}>", self.op, name)))
    }

    fn amount(&self, index: usize, name: &str) -> Result<Amount, DappError> {
        parse_amount(self.get(index, name)?)
    }

    fn address(&self, index: usize, name: &str) -> Result<String, DappError> {
        let value = self.get(index, name)?;
        check_address_shape(value)?;
        Ok(value.to_string())
    }

    /// Non-fungible local id in one of the ledger's forms: `#1#`, `<name>`,
    /// `[hex]` or `{ruid}`.
    fn local_id(&self, index: usize, name: &str) -> Result<String, DappError> {
        let raw = self.get(index, name)?;
        let well_formed = matches!(
            (raw.chars().next(), raw.chars().last()),
            (Some('#'), Some('#')) | (Some('<'), Some('>')) | (Some('['), Some(']')) | (Some('{'), Some('}'))
        ) && raw.len() > 2;
        if well_formed {
            Ok(raw.to_string())
        } else {
            Err(DappError::InvalidManifest(format!("'{}' is not a non-fungible local id", raw)))
        }
    }

    fn policy_id(&self, index: usize) -> Result<u128, DappError> {
        let raw = self.get(index, "policy_id")?;
        raw.trim()
            .parse::<u128>()
            .map_err(|_| DappError::InvalidManifest(format!("'{}' is not a valid policy id", raw)))
    }
}

impl Operation {
    /// Maps an operation name and raw string arguments to a typed operation.
    pub fn parse(name: &str, args: &[String]) -> Result<Self, DappError> {
        let a = Args { op: name, values: args };
        let op = match name {
            "stake" => Operation::Stake { amount: a.amount(0, "amount")? },
            "add_stake" => Operation::AddStake { amount: a.amount(0, "amount")? },
            "unstake" => Operation::Unstake { amount: a.amount(0, "amount")? },
            "stop_unstake" => Operation::StopUnstake,
            "withdraw_stake" => Operation::WithdrawStake { amount: a.amount(0, "amount")? },
            "register" => Operation::Register,
            "unregister" => Operation::Unregister,
            "supply" => Operation::Supply { amount: a.amount(0, "amount")? },
            "takes_back" => Operation::TakesBack { amount: a.amount(0, "amount")? },
            "tokenize_yield" => Operation::TokenizeYield {
                amount: a.amount(0, "amount")?,
                maturity: a.amount(1, "maturity")?,
            },
            "redeem_from_pt" => Operation::RedeemFromPt { amount: a.amount(0, "amount")? },
            "claim_yield" => Operation::ClaimYield,
            "swap_pt" => Operation::SwapPt { amount: a.amount(0, "amount")? },
            "deposit_to_fund" => {
                let resource = a.address(0, "resource")?;
                let amount = a.amount(1, "amount")?;
                let ratios = args
                    .iter()
                    .skip(2)
                    .map(|pair| parse_ratio(pair))
                    .collect::<Result<Vec<_>, _>>()?;
                Operation::DepositToFund { resource, amount, ratios }
            }
            "withdraw_from_fund" => Operation::WithdrawFromFund { amount: a.amount(0, "amount")? },
            "subscribe_policy" => Operation::SubscribePolicy {
                policy_id: a.policy_id(0)?,
                amount: a.amount(1, "amount")?,
                service_fee: a.amount(2, "service_fee")?,
            },
            "invest_as_insurer" => Operation::InvestAsInsurer {
                policy_id: a.policy_id(0)?,
                amount: a.amount(1, "amount")?,
                service_fee: a.amount(2, "service_fee")?,
            },
            "withdraw_rewards" => Operation::WithdrawRewards { policy_id: a.policy_id(0)? },
            "report_claim" => {
                let policy_id = a.policy_id(0)?;
                let claim_amount = a.amount(1, "claim_amount")?;
                a.get(2, "report")?;
                Operation::ReportClaim { policy_id, claim_amount, report: args[2..].join(" ") }
            }
            "claim_withdraw" => Operation::ClaimWithdraw { policy_id: a.policy_id(0)? },
            "list_on_marketplace" => Operation::ListOnMarketplace {
                policy_id: a.policy_id(0)?,
                amount: a.amount(1, "amount")?,
                service_fee: a.amount(2, "service_fee")?,
            },
            "buy_on_marketplace" => Operation::BuyOnMarketplace {
                policy_id: a.policy_id(0)?,
                listing_id: a.local_id(1, "listing_id")?,
                payment: a.amount(2, "payment")?,
                service_fee: a.amount(3, "service_fee")?,
            },
            "register_lender" => Operation::RegisterLender,
            "lend_money" => Operation::LendMoney { amount: a.amount(0, "amount")? },
            "borrow" => Operation::Borrow { amount: a.amount(0, "amount")? },
            "repay" => Operation::Repay { amount: a.amount(0, "amount")? },
            "repay_credit" => Operation::RepayCredit { amount: a.amount(0, "amount")? },
            "transfer" => Operation::Transfer {
                to: a.address(0, "to")?,
                resource: a.address(1, "resource")?,
                amount: a.amount(2, "amount")?,
            },
            other => return Err(DappError::UnknownOperation(other.to_string())),
        };
        Ok(op)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Stake { .. } => "stake",
            Operation::AddStake { .. } => "add_stake",
            Operation::Unstake { .. } => "unstake",
            Operation::StopUnstake => "stop_unstake",
            Operation::WithdrawStake { .. } => "withdraw_stake",
            Operation::Register => "register",
            Operation::Unregister => "unregister",
            Operation::Supply { .. } => "supply",
            Operation::TakesBack { .. } => "takes_back",
            Operation::TokenizeYield { .. } => "tokenize_yield",
            Operation::RedeemFromPt { .. } => "redeem_from_pt",
            Operation::ClaimYield => "claim_yield",
            Operation::SwapPt { .. } => "swap_pt",
            Operation::DepositToFund { .. } => "deposit_to_fund",
            Operation::WithdrawFromFund { .. } => "withdraw_from_fund",
            Operation::SubscribePolicy { .. } => "subscribe_policy",
            Operation::InvestAsInsurer { .. } => "invest_as_insurer",
            Operation::WithdrawRewards { .. } => "withdraw_rewards",
            Operation::ReportClaim { .. } => "report_claim",
            Operation::ClaimWithdraw { .. } => "claim_withdraw",
            Operation::ListOnMarketplace { .. } => "list_on_marketplace",
            Operation::BuyOnMarketplace { .. } => "buy_on_marketplace",
            Operation::RegisterLender => "register_lender",
            Operation::LendMoney { .. } => "lend_money",
            Operation::Borrow { .. } => "borrow",
            Operation::Repay { .. } => "repay",
            Operation::RepayCredit { .. } => "repay_credit",
            Operation::Transfer { .. } => "transfer",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn parse_ratio(pair: &str) -> Result<(String, Amount), DappError> {
    let (address, ratio) = pair
        .rsplit_once(':')
        .ok_or_else(|| DappError::InvalidManifest(format!("expected <resource>:<ratio>, got '{}'", pair)))?;
    check_address_shape(address)?;
    Ok((address.to_string(), parse_amount(ratio)?))
}

/// Who is acting and which on-ledger entities the templates target.
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub account: AccountRef,
    pub addresses: AddressBook,
}

impl OperationContext {
    pub fn new(account: AccountRef, addresses: AddressBook) -> Self {
        Self { account, addresses }
    }
}

fn required<'a>(slot: &'a Option<String>, name: &str) -> Result<&'a str, DappError> {
    slot.as_deref()
        .ok_or_else(|| DappError::Config(format!("address '{}' is not configured", name)))
}

fn one() -> Amount {
    Amount::from_units(1)
}

fn sum(a: Amount, b: Amount) -> Result<Amount, DappError> {
    a.checked_add(b)
        .ok_or_else(|| DappError::InvalidAmount(format!("{} + {} overflows", a, b)))
}

/// Expands an operation into an audited manifest for `ctx.account`.
pub fn build_operation(ctx: &OperationContext, op: &Operation) -> Result<TransactionManifest, DappError> {
    let book = &ctx.addresses;
    let b = ManifestBuilder::new(ctx.account.clone());

    let builder = match op {
        Operation::Stake { amount } => {
            let token = required(&book.staking_token, "staking_token")?;
            let validator = required(&book.validator, "validator")?;
            b.withdraw(token, *amount)
                .take_all_from_worktop(token, "bucket")
                .call_method(validator, "stake", vec![ManifestValue::bucket("bucket")])
                .deposit_remaining()
        }
        Operation::AddStake { amount } => {
            let token = required(&book.staking_token, "staking_token")?;
            let badge = required(&book.staker_badge, "staker_badge")?;
            let validator = required(&book.validator, "validator")?;
            b.withdraw(token, *amount)
                .take_all_from_worktop(token, "bucket")
                .withdraw(badge, one())
                .take_all_from_worktop(badge, "bucket1")
                .call_method(
                    validator,
                    "add_stake",
                    vec![ManifestValue::bucket("bucket"), ManifestValue::bucket("bucket1")],
                )
                .deposit_remaining()
        }
        Operation::Unstake { amount } | Operation::WithdrawStake { amount } => {
            let badge = required(&book.staker_badge, "staker_badge")?;
            let validator = required(&book.validator, "validator")?;
            let method = if matches!(op, Operation::Unstake { .. }) { "unstake" } else { "withdraw" };
            b.withdraw(badge, one())
                .take_all_from_worktop(badge, "bucket1")
                .call_method(
                    validator,
                    method,
                    vec![ManifestValue::decimal(*amount), ManifestValue::bucket("bucket1")],
                )
                .deposit_remaining()
        }
        Operation::StopUnstake => {
            let badge = required(&book.staker_badge, "staker_badge")?;
            let validator = required(&book.validator, "validator")?;
            b.withdraw(badge, one())
                .take_all_from_worktop(badge, "bucket1")
                .call_method(validator, "stop_unstake", vec![ManifestValue::bucket("bucket1")])
                .deposit_remaining()
        }

        Operation::Register => {
            let component = required(&book.component, "component")?;
            b.call_method(component, "register", Vec::new()).deposit_remaining()
        }
        Operation::Unregister => {
            let component = required(&book.component, "component")?;
            let badge = required(&book.user_badge, "user_badge")?;
            b.withdraw(badge, one())
                .take_from_worktop(badge, one(), "nft")
                .call_method(component, "unregister", vec![ManifestValue::bucket("nft")])
                .deposit_remaining()
        }
        Operation::Supply { amount } => {
            let component = required(&book.component, "component")?;
            let badge = required(&book.user_badge, "user_badge")?;
            let token = required(&book.underlying_token, "underlying_token")?;
            b.withdraw(token, *amount)
                .take_all_from_worktop(token, "xrd")
                .withdraw(badge, one())
                .take_all_from_worktop(badge, "nft")
                .call_method(
                    component,
                    "supply",
                    vec![
                        ManifestValue::bucket("xrd"),
                        ManifestValue::bucket("nft"),
                        ManifestValue::address(token)?,
                    ],
                )
                .try_deposit_remaining_or_refund()
        }
        Operation::TakesBack { amount } => {
            let component = required(&book.component, "component")?;
            let badge = required(&book.user_badge, "user_badge")?;
            let lnd = required(&book.tokenizer_token, "tokenizer_token")?;
            let token = required(&book.underlying_token, "underlying_token")?;
            b.withdraw(lnd, *amount)
                .take_from_worktop(lnd, *amount, "loan")
                .withdraw(badge, one())
                .take_from_worktop(badge, one(), "nft")
                .call_method(
                    component,
                    "takes_back",
                    vec![
                        ManifestValue::bucket("loan"),
                        ManifestValue::bucket("nft"),
                        ManifestValue::address(token)?,
                    ],
                )
                .try_deposit_remaining_or_refund()
        }
        Operation::TokenizeYield { amount, maturity } => {
            let component = required(&book.component, "component")?;
            let badge = required(&book.user_badge, "user_badge")?;
            let lnd = required(&book.tokenizer_token, "tokenizer_token")?;
            let token = required(&book.underlying_token, "underlying_token")?;
            b.withdraw(lnd, *amount)
                .take_from_worktop(lnd, *amount, "bucket1")
                .withdraw(badge, one())
                .take_from_worktop(badge, one(), "bucket2")
                .call_method(
                    component,
                    "tokenize_yield",
                    vec![
                        ManifestValue::bucket("bucket1"),
                        ManifestValue::decimal(*maturity),
                        ManifestValue::bucket("bucket2"),
                        ManifestValue::address(token)?,
                    ],
                )
                .try_deposit_remaining_or_refund()
        }
        Operation::RedeemFromPt { amount } | Operation::SwapPt { amount } => {
            let component = required(&book.component, "component")?;
            let badge = required(&book.user_badge, "user_badge")?;
            let pt = required(&book.principal_token, "principal_token")?;
            let token = required(&book.underlying_token, "underlying_token")?;
            let method = if matches!(op, Operation::RedeemFromPt { .. }) { "redeem_from_pt" } else { "redeem" };
            b.withdraw(pt, *amount)
                .take_from_worktop(pt, *amount, "bucket1")
                .withdraw(badge, one())
                .take_from_worktop(badge, one(), "bucket2")
                .call_method(
                    component,
                    method,
                    vec![
                        ManifestValue::bucket("bucket1"),
                        ManifestValue::bucket("bucket2"),
                        ManifestValue::address(token)?,
                    ],
                )
                .try_deposit_remaining_or_refund()
        }
        Operation::ClaimYield => {
            let component = required(&book.component, "component")?;
            let badge = required(&book.user_badge, "user_badge")?;
            let token = required(&book.underlying_token, "underlying_token")?;
            b.withdraw(badge, one())
                .take_from_worktop(badge, one(), "bucket1")
                .call_method(
                    component,
                    "claim_yield",
                    vec![ManifestValue::bucket("bucket1"), ManifestValue::address(token)?],
                )
                .try_deposit_remaining_or_refund()
        }

        Operation::DepositToFund { resource, amount, ratios } => {
            let fund = required(&book.fund_component, "fund_component")?;
            let ratio_tuples = ratios
                .iter()
                .map(|(address, ratio)| -> Result<ManifestValue, DappError> {
                    Ok(ManifestValue::Tuple(vec![ManifestValue::address(address)?, ManifestValue::decimal(*ratio)]))
                })
                .collect::<Result<Vec<_>, _>>()?;
            b.withdraw(resource, *amount)
                .take_from_worktop(resource, *amount, "bucket")
                .call_method(
                    fund,
                    "swap_token_for_tokens",
                    vec![
                        ManifestValue::bucket("bucket"),
                        ManifestValue::Array { element_kind: "Tuple", elements: ratio_tuples },
                    ],
                )
                .call_method(fund, "deposit_tokens_to_fund", vec![ManifestValue::entire_worktop()])
                .deposit_remaining()
        }
        Operation::WithdrawFromFund { amount } => {
            let fund = required(&book.fund_component, "fund_component")?;
            let share = required(&book.share_token, "share_token")?;
            b.withdraw(share, *amount)
                .take_all_from_worktop(share, "bucket")
                .call_method(fund, "withdraw_tokens_from_fund", vec![ManifestValue::bucket("bucket")])
                .deposit_remaining()
        }

        Operation::SubscribePolicy { policy_id, amount, service_fee }
        | Operation::InvestAsInsurer { policy_id, amount, service_fee } => {
            let insurance = required(&book.insurance_component, "insurance_component")?;
            let fee_resource = required(&book.fee_resource, "fee_resource")?;
            let total = sum(*amount, *service_fee)?;
            let (method, bucket, mut args) = match op {
                Operation::SubscribePolicy { .. } => (
                    "subscribe_to_insurance_policy",
                    "deposit_amount",
                    vec![ManifestValue::U128(*policy_id), ManifestValue::decimal(*amount)],
                ),
                _ => ("invest_as_insurer", "invest_amount", vec![ManifestValue::U128(*policy_id)]),
            };
            args.push(ManifestValue::bucket(bucket));
            args.push(ManifestValue::bucket("service_fee"));
            b.withdraw(fee_resource, total)
                .take_from_worktop(fee_resource, *service_fee, "service_fee")
                .take_from_worktop(fee_resource, *amount, bucket)
                .call_method(insurance, method, args)
                .deposit_remaining()
        }
        Operation::WithdrawRewards { policy_id } => {
            let insurance = required(&book.insurance_component, "insurance_component")?;
            let badge = required(&book.insurer_badge, "insurer_badge")?;
            b.create_proof_of_amount(badge, one())
                .pop_from_auth_zone("insurer_proof")
                .call_method(
                    insurance,
                    "rewards_withdrawal",
                    vec![ManifestValue::U128(*policy_id), ManifestValue::proof("insurer_proof")],
                )
                .deposit_remaining()
        }

        Operation::ReportClaim { policy_id, claim_amount, report } => {
            let insurance = required(&book.insurance_component, "insurance_component")?;
            let badge = required(&book.insured_badge, "insured_badge")?;
            b.create_proof_of_amount(badge, one())
                .pop_from_auth_zone("insured_proof")
                .call_method(
                    insurance,
                    "report_a_claim",
                    vec![
                        ManifestValue::proof("insured_proof"),
                        ManifestValue::U128(*policy_id),
                        ManifestValue::string(report.as_str()),
                        ManifestValue::decimal(*claim_amount),
                    ],
                )
                .deposit_remaining()
        }
        Operation::ClaimWithdraw { policy_id } => {
            let insurance = required(&book.insurance_component, "insurance_component")?;
            let badge = required(&book.claim_badge, "claim_badge")?;
            b.create_proof_of_amount(badge, one())
                .pop_from_auth_zone("claim_proof")
                .call_method(
                    insurance,
                    "claim_withdraw",
                    vec![ManifestValue::U128(*policy_id), ManifestValue::proof("claim_proof")],
                )
                .deposit_remaining()
        }
        Operation::ListOnMarketplace { policy_id, amount, service_fee } => {
            let insurance = required(&book.insurance_component, "insurance_component")?;
            let fee_resource = required(&book.fee_resource, "fee_resource")?;
            let badge = required(&book.insurer_badge, "insurer_badge")?;
            b.withdraw(fee_resource, *service_fee)
                .withdraw(badge, *amount)
                .take_from_worktop(fee_resource, *service_fee, "service_fee")
                .take_from_worktop(badge, *amount, "insurer_bucket_to_list")
                .call_method(
                    insurance,
                    "list_on_marketplace",
                    vec![
                        ManifestValue::U128(*policy_id),
                        ManifestValue::bucket("insurer_bucket_to_list"),
                        ManifestValue::bucket("service_fee"),
                        ManifestValue::decimal(*amount),
                    ],
                )
                .deposit_remaining()
        }
        Operation::BuyOnMarketplace { policy_id, listing_id, payment, service_fee } => {
            let insurance = required(&book.insurance_component, "insurance_component")?;
            let fee_resource = required(&book.fee_resource, "fee_resource")?;
            b.withdraw(fee_resource, sum(*payment, *service_fee)?)
                .take_from_worktop(fee_resource, *service_fee, "service_fee")
                .take_from_worktop(fee_resource, *payment, "payment_amount")
                .call_method(
                    insurance,
                    "buy_on_marketplace",
                    vec![
                        ManifestValue::U128(*policy_id),
                        ManifestValue::bucket("payment_amount"),
                        ManifestValue::bucket("service_fee"),
                        ManifestValue::NonFungibleLocalId(listing_id.clone()),
                    ],
                )
                .deposit_remaining()
        }

        Operation::RegisterLender => {
            let lending = required(&book.lending_component, "lending_component")?;
            b.call_method(lending, "register", Vec::new()).deposit_remaining()
        }
        Operation::LendMoney { amount } => {
            let lending = required(&book.lending_component, "lending_component")?;
            let token = required(&book.lending_token, "lending_token")?;
            let badge = required(&book.lender_badge, "lender_badge")?;
            b.withdraw(badge, one())
                .take_from_worktop(badge, one(), "lend_nft")
                .withdraw(token, *amount)
                .take_from_worktop(token, *amount, "loan")
                .call_method(
                    lending,
                    "lend_money",
                    vec![ManifestValue::bucket("loan"), ManifestValue::bucket("lend_nft")],
                )
                .deposit_remaining()
        }
        Operation::Borrow { amount } => {
            let lending = required(&book.lending_component, "lending_component")?;
            let badge = required(&book.borrower_badge, "borrower_badge")?;
            b.create_proof_of_amount(badge, one())
                .pop_from_auth_zone("borrower_proof")
                .call_method(
                    lending,
                    "borrow",
                    vec![ManifestValue::proof("borrower_proof"), ManifestValue::decimal(*amount)],
                )
                .deposit_remaining()
        }
        Operation::Repay { amount } => {
            let lending = required(&book.lending_component, "lending_component")?;
            let token = required(&book.lending_token, "lending_token")?;
            let badge = required(&book.borrower_badge, "borrower_badge")?;
            b.withdraw(token, *amount)
                .take_from_worktop(token, *amount, "repayment")
                .create_proof_of_amount(badge, one())
                .pop_from_auth_zone("borrower_proof")
                .call_method(
                    lending,
                    "repay",
                    vec![ManifestValue::proof("borrower_proof"), ManifestValue::bucket("repayment")],
                )
                .deposit_remaining()
        }
        Operation::RepayCredit { amount } => {
            let lending = required(&book.lending_component, "lending_component")?;
            let token = required(&book.lending_token, "lending_token")?;
            let id_badge = required(&book.borrower_badge, "borrower_badge")?;
            let credit_badge = required(&book.credit_badge, "credit_badge")?;
            b.create_proof_of_amount(id_badge, one())
                .pop_from_auth_zone("id_proof")
                .create_proof_of_amount(credit_badge, one())
                .pop_from_auth_zone("credit_proof")
                .withdraw(token, *amount)
                .take_from_worktop(token, *amount, "repayment")
                .call_method(
                    lending,
                    "repay",
                    vec![
                        ManifestValue::proof("id_proof"),
                        ManifestValue::proof("credit_proof"),
                        ManifestValue::bucket("repayment"),
                    ],
                )
                .deposit_remaining()
        }

        Operation::Transfer { to, resource, amount } => b
            .withdraw(resource, *amount)
            .take_from_worktop(resource, *amount, "transfer")
            .call_method(
                to,
                "try_deposit_or_abort",
                vec![ManifestValue::bucket("transfer"), ManifestValue::none()],
            )
            .deposit_remaining(),
    };

    builder.build()
}
