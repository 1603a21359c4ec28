//! Resource-consumption audit.
//!
//! A manifest passes when every bucket it creates is consumed exactly once and,
//! whenever anything can land on the worktop, the final instruction sweeps the
//! worktop back into the initiating account.

use std::collections::{HashMap, HashSet};

use crate::core::domain::AccountRef;
use crate::core::errors::DappError;
use crate::manifest::instruction::{Instruction, TransactionManifest};
use crate::manifest::value::ManifestValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BucketState {
    Open,
    Consumed,
}

pub fn audit(manifest: &TransactionManifest, initiator: &AccountRef) -> Result<(), DappError> {
    let mut buckets: HashMap<&str, BucketState> = HashMap::new();
    let mut proofs: HashSet<&str> = HashSet::new();
    let mut worktop_touched = false;

    for (index, instruction) in manifest.instructions.iter().enumerate() {
        for name in instruction.consumed_buckets() {
            match buckets.get_mut(name) {
                None => {
                    return Err(DappError::InvalidManifest(format!(
                        "instruction {} uses unknown bucket '{}'",
                        index, name
                    )))
                }
                Some(state) if *state == BucketState::Open => *state = BucketState::Consumed,
                Some(_) => {
                    return Err(DappError::StrandedResource(format!(
                        "bucket '{}' consumed more than once (instruction {})",
                        name, index
                    )))
                }
            }
        }

        check_proofs(instruction, &mut proofs, index)?;

        if let Instruction::CreateProofFromBucketOfAll { bucket, .. } = instruction {
            if buckets.get(bucket.as_str()) != Some(&BucketState::Open) {
                return Err(DappError::InvalidManifest(format!(
                    "instruction {} proves unknown or consumed bucket '{}'",
                    index, bucket
                )));
            }
        }

        if let Some(name) = instruction.created_bucket() {
            if buckets.insert(name, BucketState::Open).is_some() {
                return Err(DappError::InvalidManifest(format!("bucket name '{}' reused", name)));
            }
        }

        worktop_touched |= instruction.fills_worktop();
    }

    let mut stranded: Vec<&str> = buckets
        .iter()
        .filter(|(_, state)| **state == BucketState::Open)
        .map(|(name, _)| *name)
        .collect();
    if !stranded.is_empty() {
        stranded.sort_unstable();
        return Err(DappError::StrandedResource(format!(
            "bucket(s) never consumed: {}",
            stranded.join(", ")
        )));
    }

    if worktop_touched {
        match manifest.last() {
            Some(Instruction::DepositBatch { account, .. }) if account == initiator.as_str() => {}
            // Hand-written sweep: `CALL_METHOD <initiator> "deposit_batch" Expression("ENTIRE_WORKTOP")`.
            Some(Instruction::CallMethod { address, args, .. })
                if address == initiator.as_str() && args.iter().any(ManifestValue::takes_entire_worktop) => {}
            Some(Instruction::DepositBatch { account, .. }) => {
                return Err(DappError::StrandedResource(format!(
                    "final deposit goes to {} instead of the initiating account {}",
                    account, initiator
                )))
            }
            _ => {
                return Err(DappError::StrandedResource(
                    "manifest does not end by depositing the worktop to the initiating account".to_string(),
                ))
            }
        }
    }

    Ok(())
}

fn check_proofs<'a>(
    instruction: &'a Instruction,
    proofs: &mut HashSet<&'a str>,
    index: usize,
) -> Result<(), DappError> {
    let unknown = |name: &str| {
        DappError::InvalidManifest(format!("instruction {} uses unknown proof '{}'", index, name))
    };
    match instruction {
        Instruction::PopFromAuthZone { proof } | Instruction::CreateProofFromBucketOfAll { proof, .. } => {
            if !proofs.insert(proof.as_str()) {
                return Err(DappError::InvalidManifest(format!("proof name '{}' reused", proof)));
            }
        }
        Instruction::PushToAuthZone { proof } | Instruction::DropProof { proof } => {
            if !proofs.remove(proof.as_str()) {
                return Err(unknown(proof));
            }
        }
        Instruction::DropAllProofs => proofs.clear(),
        Instruction::CallMethod { args, .. } | Instruction::CallFunction { args, .. } => {
            for arg in args {
                for name in proof_names(arg) {
                    if !proofs.remove(name) {
                        return Err(unknown(name));
                    }
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn proof_names(value: &ManifestValue) -> Vec<&str> {
    match value {
        ManifestValue::Proof(name) => vec![name.as_str()],
        ManifestValue::Enum { fields, .. } | ManifestValue::Tuple(fields) => {
            fields.iter().flat_map(proof_names).collect()
        }
        ManifestValue::Array { elements, .. } => elements.iter().flat_map(proof_names).collect(),
        _ => Vec::new(),
    }
}
