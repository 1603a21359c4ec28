mod util;

use ledger_dapp_kit::core::errors::DappError;
use ledger_dapp_kit::manifest::{build_operation, render, DepositMode, Instruction, Operation, OperationContext};
use pretty_assertions::assert_eq;
use test_case::test_case;
use util::*;

fn build(name: &str, args: &[&str]) -> Result<ledger_dapp_kit::manifest::TransactionManifest, DappError> {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    let op = Operation::parse(name, &args)?;
    build_operation(&OperationContext::new(account(), full_book()), &op)
}

#[test_case("stake", &["50"], 4, DepositMode::Deposit ; "stake")]
#[test_case("add_stake", &["10"], 6, DepositMode::Deposit ; "add stake")]
#[test_case("unstake", &["5"], 4, DepositMode::Deposit ; "unstake")]
#[test_case("stop_unstake", &[], 4, DepositMode::Deposit ; "stop unstake")]
#[test_case("withdraw_stake", &["5"], 4, DepositMode::Deposit ; "withdraw stake")]
#[test_case("register", &[], 2, DepositMode::Deposit ; "register")]
#[test_case("unregister", &[], 4, DepositMode::Deposit ; "unregister")]
#[test_case("supply", &["100"], 6, DepositMode::TryDepositOrRefund ; "supply")]
#[test_case("takes_back", &["100"], 6, DepositMode::TryDepositOrRefund ; "takes back")]
#[test_case("tokenize_yield", &["100", "3000"], 6, DepositMode::TryDepositOrRefund ; "tokenize yield")]
#[test_case("redeem_from_pt", &["1"], 6, DepositMode::TryDepositOrRefund ; "redeem from pt")]
#[test_case("claim_yield", &[], 4, DepositMode::TryDepositOrRefund ; "claim yield")]
#[test_case("swap_pt", &["1"], 6, DepositMode::TryDepositOrRefund ; "swap pt")]
#[test_case("withdraw_from_fund", &["2"], 4, DepositMode::Deposit ; "withdraw from fund")]
#[test_case("subscribe_policy", &["1", "100", "5"], 5, DepositMode::Deposit ; "subscribe policy")]
#[test_case("invest_as_insurer", &["1", "100", "5"], 5, DepositMode::Deposit ; "invest as insurer")]
#[test_case("withdraw_rewards", &["1"], 4, DepositMode::Deposit ; "withdraw rewards")]
#[test_case("report_claim", &["1", "80", "hail"], 4, DepositMode::Deposit ; "report claim")]
#[test_case("claim_withdraw", &["1"], 4, DepositMode::Deposit ; "claim withdraw")]
#[test_case("list_on_marketplace", &["1", "20", "1"], 6, DepositMode::Deposit ; "list on marketplace")]
#[test_case("buy_on_marketplace", &["1", "#2#", "20", "1"], 5, DepositMode::Deposit ; "buy on marketplace")]
#[test_case("register_lender", &[], 2, DepositMode::Deposit ; "register lender")]
#[test_case("lend_money", &["80"], 6, DepositMode::Deposit ; "lend money")]
#[test_case("borrow", &["1"], 4, DepositMode::Deposit ; "borrow")]
#[test_case("repay", &["100"], 6, DepositMode::Deposit ; "repay")]
#[test_case("repay_credit", &["25"], 8, DepositMode::Deposit ; "repay credit")]
fn template_shape(name: &str, args: &[&str], instructions: usize, mode: DepositMode) {
    let manifest = build(name, args).unwrap();
    assert_eq!(manifest.len(), instructions);
    match manifest.last() {
        Some(Instruction::DepositBatch { account, mode: actual }) => {
            assert_eq!(account, ACCOUNT);
            assert_eq!(*actual, mode);
        }
        other => panic!("{} does not end in a deposit: {:?}", name, other),
    }
}

#[test]
fn stake_renders_expected_text() {
    let text = render(&build("stake", &["50"]).unwrap());
    let expected = format!(
        "CALL_METHOD\n    Address(\"{account}\")\n    \"withdraw\"\n    Address(\"{xrd}\")\n    Decimal(\"50\")\n;\n\
TAKE_ALL_FROM_WORKTOP\n    Address(\"{xrd}\")\n    Bucket(\"bucket\")\n;\n\
CALL_METHOD\n    Address(\"{validator}\")\n    \"stake\"\n    Bucket(\"bucket\")\n;\n\
CALL_METHOD\n    Address(\"{account}\")\n    \"deposit_batch\"\n    Expression(\"ENTIRE_WORKTOP\")\n;",
        account = ACCOUNT,
        xrd = XRD,
        validator = VALIDATOR,
    );
    assert_eq!(text, expected);
}

#[test]
fn subscribe_policy_withdraws_amount_plus_fee() {
    let text = render(&build("subscribe_policy", &["42", "100", "2.5"]).unwrap());
    assert!(text.contains("Decimal(\"102.5\")"));
    assert!(text.contains("42u128"));
    assert!(text.contains("\"subscribe_to_insurance_policy\""));
    assert!(text.contains("Bucket(\"service_fee\")"));
}

#[test]
fn lend_money_passes_loan_and_lender_nft() {
    let text = render(&build("lend_money", &["80"]).unwrap());
    assert!(text.contains(&format!(
        "CALL_METHOD\n    Address(\"{}\")\n    \"lend_money\"\n    Bucket(\"loan\")\n    Bucket(\"lend_nft\")\n;",
        LENDING
    )));
    assert!(text.contains(&format!("Address(\"{}\")\n    Decimal(\"80\")", STABLE)));
}

#[test]
fn repay_credit_presents_both_badges() {
    let text = render(&build("repay_credit", &["25"]).unwrap());
    assert!(text.contains("\"repay\"\n    Proof(\"id_proof\")\n    Proof(\"credit_proof\")\n    Bucket(\"repayment\")\n;"));
    assert!(text.contains(&format!("Address(\"{}\")", CREDIT_BADGE)));
    assert!(text.contains(&format!("Address(\"{}\")", BORROWER_BADGE)));
}

#[test]
fn claim_report_text_is_escaped() {
    let text = render(&build("report_claim", &["9", "80", "roof\";", "CALL_METHOD"]).unwrap());
    assert!(text.contains("\"roof\\\"; CALL_METHOD\""));
    assert_eq!(text.matches("CALL_METHOD\n").count(), 3);
}

#[test]
fn thirty_digit_amount_is_signed_exactly() {
    let amount = "123456789012345678901234567890.123456789012345678";
    let text = render(&build("transfer", &[OTHER_ACCOUNT, XRD, amount]).unwrap());
    assert!(text.contains(&format!("Decimal(\"{}\")", amount)));
}

#[test]
fn deposit_to_fund_passes_ratio_tuples() {
    let ratio = format!("{}:0.5", LND);
    let text = render(&build("deposit_to_fund", &[XRD, "10", &ratio]).unwrap());
    assert!(text.contains("\"swap_token_for_tokens\""));
    assert!(text.contains(&format!("Array<Tuple>(Tuple(Address(\"{}\"), Decimal(\"0.5\")))", LND)));
    assert!(text.contains("\"deposit_tokens_to_fund\"\n    Expression(\"ENTIRE_WORKTOP\")"));
}

#[test]
fn transfer_uses_try_deposit_on_recipient() {
    let text = render(&build("transfer", &[OTHER_ACCOUNT, XRD, "3"]).unwrap());
    assert!(text.contains(&format!("Address(\"{}\")\n    \"try_deposit_or_abort\"", OTHER_ACCOUNT)));
    assert!(text.ends_with("\"deposit_batch\"\n    Expression(\"ENTIRE_WORKTOP\")\n;"));
}

#[test_case("stake", &["abc"] ; "not a number")]
#[test_case("stake", &["-5"] ; "negative")]
#[test_case("stake", &["1e3"] ; "exponent")]
#[test_case("stake", &["1_000"] ; "underscore separator")]
#[test_case("stake", &["0.0000000000000000001"] ; "nineteen decimals")]
#[test_case("transfer", &[OTHER_ACCOUNT, XRD, "9999999999999999999999999999999999999999"] ; "beyond decimal range")]
fn bad_amounts_are_rejected_before_building(name: &str, args: &[&str]) {
    assert!(matches!(build(name, args), Err(DappError::InvalidAmount(_))));
}

#[test]
fn unknown_operation() {
    assert!(matches!(build("fly_to_moon", &[]), Err(DappError::UnknownOperation(_))));
}
