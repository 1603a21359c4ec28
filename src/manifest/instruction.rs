use serde::{Deserialize, Serialize};

use crate::core::domain::{AccountRef, Amount};
use crate::manifest::value::ManifestValue;

/// How leftover worktop resources are returned to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepositMode {
    /// `deposit_batch`; fails if the account refuses the deposit.
    Deposit,
    /// `try_deposit_batch_or_refund`; refused resources go back to the worktop.
    TryDepositOrRefund,
    /// `try_deposit_batch_or_abort`; refused resources abort the transaction.
    TryDepositOrAbort,
}

impl DepositMode {
    pub fn method_name(&self) -> &'static str {
        match self {
            DepositMode::Deposit => "deposit_batch",
            DepositMode::TryDepositOrRefund => "try_deposit_batch_or_refund",
            DepositMode::TryDepositOrAbort => "try_deposit_batch_or_abort",
        }
    }

    /// The try-variants take an optional authorized depositor badge.
    pub fn takes_depositor_badge(&self) -> bool {
        !matches!(self, DepositMode::Deposit)
    }
}

/// One manifest instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    LockFee { account: String, amount: Amount },
    Withdraw { account: String, resource: String, amount: Amount },
    WithdrawNonFungibles { account: String, resource: String, ids: Vec<String> },
    CreateProofOfAmount { account: String, resource: String, amount: Amount },
    TakeAllFromWorktop { resource: String, bucket: String },
    TakeFromWorktop { resource: String, amount: Amount, bucket: String },
    TakeNonFungiblesFromWorktop { resource: String, ids: Vec<String>, bucket: String },
    ReturnToWorktop { bucket: String },
    AssertWorktopContains { resource: String, amount: Amount },
    PopFromAuthZone { proof: String },
    PushToAuthZone { proof: String },
    CreateProofFromBucketOfAll { bucket: String, proof: String },
    DropProof { proof: String },
    DropAllProofs,
    BurnResource { bucket: String },
    CallMethod { address: String, method: String, args: Vec<ManifestValue> },
    CallFunction { package: String, blueprint: String, function: String, args: Vec<ManifestValue> },
    DepositBatch { account: String, mode: DepositMode },
}

impl Instruction {
    pub fn deposit_batch(account: &AccountRef, mode: DepositMode) -> Self {
        Instruction::DepositBatch { account: account.as_str().to_string(), mode }
    }

    /// Bucket created by this instruction, if any.
    pub fn created_bucket(&self) -> Option<&str> {
        match self {
            Instruction::TakeAllFromWorktop { bucket, .. }
            | Instruction::TakeFromWorktop { bucket, .. }
            | Instruction::TakeNonFungiblesFromWorktop { bucket, .. } => Some(bucket),
            _ => None,
        }
    }

    /// Buckets this instruction consumes.
    pub fn consumed_buckets(&self) -> Vec<&str> {
        match self {
            Instruction::ReturnToWorktop { bucket } | Instruction::BurnResource { bucket } => vec![bucket],
            Instruction::CallMethod { args, .. } | Instruction::CallFunction { args, .. } => {
                args.iter().flat_map(ManifestValue::buckets).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Whether the instruction may leave resources on the worktop.
    pub fn fills_worktop(&self) -> bool {
        matches!(
            self,
            Instruction::Withdraw { .. }
                | Instruction::WithdrawNonFungibles { .. }
                | Instruction::ReturnToWorktop { .. }
                | Instruction::CallMethod { .. }
                | Instruction::CallFunction { .. }
        )
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Instruction::LockFee { .. }
            | Instruction::Withdraw { .. }
            | Instruction::WithdrawNonFungibles { .. }
            | Instruction::CreateProofOfAmount { .. }
            | Instruction::CallMethod { .. }
            | Instruction::DepositBatch { .. } => "CALL_METHOD",
            Instruction::TakeAllFromWorktop { .. } => "TAKE_ALL_FROM_WORKTOP",
            Instruction::TakeFromWorktop { .. } => "TAKE_FROM_WORKTOP",
            Instruction::TakeNonFungiblesFromWorktop { .. } => "TAKE_NON_FUNGIBLES_FROM_WORKTOP",
            Instruction::ReturnToWorktop { .. } => "RETURN_TO_WORKTOP",
            Instruction::AssertWorktopContains { .. } => "ASSERT_WORKTOP_CONTAINS",
            Instruction::PopFromAuthZone { .. } => "POP_FROM_AUTH_ZONE",
            Instruction::PushToAuthZone { .. } => "PUSH_TO_AUTH_ZONE",
            Instruction::CreateProofFromBucketOfAll { .. } => "CREATE_PROOF_FROM_BUCKET_OF_ALL",
            Instruction::DropProof { .. } => "DROP_PROOF",
            Instruction::DropAllProofs => "DROP_ALL_PROOFS",
            Instruction::BurnResource { .. } => "BURN_RESOURCE",
            Instruction::CallFunction { .. } => "CALL_FUNCTION",
        }
    }
}

/// Ordered list of instructions; the unit handed to the wallet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionManifest {
    pub instructions: Vec<Instruction>,
}

impl TransactionManifest {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn last(&self) -> Option<&Instruction> {
        self.instructions.last()
    }

    pub fn render(&self) -> String {
        crate::manifest::render::render(self)
    }
}
