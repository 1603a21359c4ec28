//! Babylon manifest text rendering.
//!
//! One instruction per block: the keyword on its own line, every argument
//! indented on its own line, then a terminating `;` line.

use crate::manifest::instruction::{Instruction, TransactionManifest};
use crate::manifest::value::{escape_string, ManifestValue};

const INDENT: &str = "    ";

/// Renders the manifest text. Pure and deterministic.
pub fn render(manifest: &TransactionManifest) -> String {
    manifest
        .instructions
        .iter()
        .map(render_instruction)
        .collect::<Vec<_>>()
        .join("\n")
}

fn address(a: &str) -> String {
    format!("Address({})", escape_string(a))
}

fn bucket(b: &str) -> String {
    format!("Bucket({})", escape_string(b))
}

fn proof(p: &str) -> String {
    format!("Proof({})", escape_string(p))
}

fn decimal(d: &impl std::fmt::Display) -> String {
    format!("Decimal(\"{}\")", d)
}

fn method(m: &str) -> String {
    escape_string(m)
}

fn ids(ids: &[String]) -> String {
    ManifestValue::non_fungible_ids(ids.iter().cloned()).to_string()
}

pub fn render_instruction(instruction: &Instruction) -> String {
    let args: Vec<String> = match instruction {
        Instruction::LockFee { account, amount } => vec![address(account), method("lock_fee"), decimal(amount)],
        Instruction::Withdraw { account, resource, amount } => {
            vec![address(account), method("withdraw"), address(resource), decimal(amount)]
        }
        Instruction::WithdrawNonFungibles { account, resource, ids: nf } => {
            vec![address(account), method("withdraw_non_fungibles"), address(resource), ids(nf)]
        }
        Instruction::CreateProofOfAmount { account, resource, amount } => {
            vec![address(account), method("create_proof_of_amount"), address(resource), decimal(amount)]
        }
        Instruction::TakeAllFromWorktop { resource, bucket: b } => vec![address(resource), bucket(b)],
        Instruction::TakeFromWorktop { resource, amount, bucket: b } => {
            vec![address(resource), decimal(amount), bucket(b)]
        }
        Instruction::TakeNonFungiblesFromWorktop { resource, ids: nf, bucket: b } => {
            vec![address(resource), ids(nf), bucket(b)]
        }
        Instruction::ReturnToWorktop { bucket: b } | Instruction::BurnResource { bucket: b } => vec![bucket(b)],
        Instruction::AssertWorktopContains { resource, amount } => vec![address(resource), decimal(amount)],
        Instruction::PopFromAuthZone { proof: p }
        | Instruction::PushToAuthZone { proof: p }
        | Instruction::DropProof { proof: p } => vec![proof(p)],
        Instruction::CreateProofFromBucketOfAll { bucket: b, proof: p } => vec![bucket(b), proof(p)],
        Instruction::DropAllProofs => Vec::new(),
        Instruction::CallMethod { address: a, method: m, args } => {
            let mut out = vec![address(a), method(m)];
            out.extend(args.iter().map(ToString::to_string));
            out
        }
        Instruction::CallFunction { package, blueprint, function, args } => {
            let mut out = vec![address(package), escape_string(blueprint), method(function)];
            out.extend(args.iter().map(ToString::to_string));
            out
        }
        Instruction::DepositBatch { account, mode } => {
            let mut out = vec![
                address(account),
                method(mode.method_name()),
                ManifestValue::entire_worktop().to_string(),
            ];
            if mode.takes_depositor_badge() {
                out.push(ManifestValue::none().to_string());
            }
            out
        }
    };

    let mut text = String::from(instruction.keyword());
    for arg in args {
        text.push('\n');
        text.push_str(INDENT);
        text.push_str(&arg);
    }
    text.push_str("\n;");
    text
}
