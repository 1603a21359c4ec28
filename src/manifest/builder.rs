use std::collections::HashSet;

use tracing::debug;

use crate::core::domain::{AccountRef, Amount};
use crate::core::errors::DappError;
use crate::core::validation::check_address_shape;
use crate::manifest::audit::audit;
use crate::manifest::instruction::{DepositMode, Instruction, TransactionManifest};
use crate::manifest::value::ManifestValue;

/// Fluent manifest builder bound to the initiating account.
///
/// Every call validates its inputs; the first failure is remembered and
/// returned by [`ManifestBuilder::build`], so chains never need `?` midway.
#[derive(Debug)]
pub struct ManifestBuilder {
    initiator: AccountRef,
    instructions: Vec<Instruction>,
    names: HashSet<String>,
    error: Option<DappError>,
}

impl ManifestBuilder {
    pub fn new(initiator: AccountRef) -> Self {
        let mut builder = Self {
            initiator,
            instructions: Vec::new(),
            names: HashSet::new(),
            error: None,
        };
        let account = builder.initiator.as_str().to_string();
        builder.check_address(&account);
        builder
    }

    pub fn initiator(&self) -> &AccountRef {
        &self.initiator
    }

    fn fail(&mut self, err: DappError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn check_address(&mut self, address: &str) {
        if let Err(e) = check_address_shape(address) {
            self.fail(e);
        }
    }

    fn claim_name(&mut self, name: &str) {
        if name.is_empty() {
            self.fail(DappError::InvalidManifest("empty bucket/proof name".to_string()));
        } else if !self.names.insert(name.to_string()) {
            self.fail(DappError::InvalidManifest(format!("name '{}' already used", name)));
        }
    }

    fn require_name(&mut self, name: &str) {
        if !self.names.contains(name) {
            self.fail(DappError::InvalidManifest(format!("unknown bucket/proof '{}'", name)));
        }
    }

    fn check_args(&mut self, args: &[ManifestValue]) {
        for arg in args {
            self.check_value(arg);
        }
    }

    fn check_value(&mut self, value: &ManifestValue) {
        match value {
            ManifestValue::Address(a) => self.check_address(a),
            ManifestValue::Bucket(n) | ManifestValue::Proof(n) => self.require_name(n),
            ManifestValue::Enum { fields, .. } | ManifestValue::Tuple(fields) => self.check_args(fields),
            ManifestValue::Array { elements, .. } => self.check_args(elements),
            _ => {}
        }
    }

    fn push(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    fn account(&self) -> String {
        self.initiator.as_str().to_string()
    }

    pub fn lock_fee(self, amount: Amount) -> Self {
        let account = self.account();
        self.push(Instruction::LockFee { account, amount })
    }

    pub fn withdraw(mut self, resource: &str, amount: Amount) -> Self {
        self.check_address(resource);
        let account = self.account();
        self.push(Instruction::Withdraw { account, resource: resource.to_string(), amount })
    }

    pub fn withdraw_non_fungibles(mut self, resource: &str, ids: Vec<String>) -> Self {
        self.check_address(resource);
        let account = self.account();
        self.push(Instruction::WithdrawNonFungibles { account, resource: resource.to_string(), ids })
    }

    /// Proof of holding `amount` of `resource`, placed in the auth zone.
    pub fn create_proof_of_amount(mut self, resource: &str, amount: Amount) -> Self {
        self.check_address(resource);
        let account = self.account();
        self.push(Instruction::CreateProofOfAmount { account, resource: resource.to_string(), amount })
    }

    pub fn take_all_from_worktop(mut self, resource: &str, bucket: &str) -> Self {
        self.check_address(resource);
        self.claim_name(bucket);
        self.push(Instruction::TakeAllFromWorktop { resource: resource.to_string(), bucket: bucket.to_string() })
    }

    pub fn take_from_worktop(mut self, resource: &str, amount: Amount, bucket: &str) -> Self {
        self.check_address(resource);
        self.claim_name(bucket);
        self.push(Instruction::TakeFromWorktop {
            resource: resource.to_string(),
            amount,
            bucket: bucket.to_string(),
        })
    }

    pub fn take_non_fungibles_from_worktop(mut self, resource: &str, ids: Vec<String>, bucket: &str) -> Self {
        self.check_address(resource);
        self.claim_name(bucket);
        self.push(Instruction::TakeNonFungiblesFromWorktop {
            resource: resource.to_string(),
            ids,
            bucket: bucket.to_string(),
        })
    }

    pub fn return_to_worktop(mut self, bucket: &str) -> Self {
        self.require_name(bucket);
        self.push(Instruction::ReturnToWorktop { bucket: bucket.to_string() })
    }

    pub fn assert_worktop_contains(mut self, resource: &str, amount: Amount) -> Self {
        self.check_address(resource);
        self.push(Instruction::AssertWorktopContains { resource: resource.to_string(), amount })
    }

    pub fn pop_from_auth_zone(mut self, proof: &str) -> Self {
        self.claim_name(proof);
        self.push(Instruction::PopFromAuthZone { proof: proof.to_string() })
    }

    pub fn push_to_auth_zone(mut self, proof: &str) -> Self {
        self.require_name(proof);
        self.push(Instruction::PushToAuthZone { proof: proof.to_string() })
    }

    pub fn create_proof_from_bucket_of_all(mut self, bucket: &str, proof: &str) -> Self {
        self.require_name(bucket);
        self.claim_name(proof);
        self.push(Instruction::CreateProofFromBucketOfAll { bucket: bucket.to_string(), proof: proof.to_string() })
    }

    pub fn drop_proof(mut self, proof: &str) -> Self {
        self.require_name(proof);
        self.push(Instruction::DropProof { proof: proof.to_string() })
    }

    pub fn drop_all_proofs(self) -> Self {
        self.push(Instruction::DropAllProofs)
    }

    pub fn burn_resource(mut self, bucket: &str) -> Self {
        self.require_name(bucket);
        self.push(Instruction::BurnResource { bucket: bucket.to_string() })
    }

    pub fn call_method(mut self, address: &str, method: &str, args: Vec<ManifestValue>) -> Self {
        self.check_address(address);
        self.check_args(&args);
        self.push(Instruction::CallMethod { address: address.to_string(), method: method.to_string(), args })
    }

    pub fn call_function(mut self, package: &str, blueprint: &str, function: &str, args: Vec<ManifestValue>) -> Self {
        self.check_address(package);
        self.check_args(&args);
        self.push(Instruction::CallFunction {
            package: package.to_string(),
            blueprint: blueprint.to_string(),
            function: function.to_string(),
            args,
        })
    }

    /// Sweeps the worktop into the initiating account.
    pub fn deposit_remaining(self) -> Self {
        self.deposit_with(DepositMode::Deposit)
    }

    pub fn try_deposit_remaining_or_refund(self) -> Self {
        self.deposit_with(DepositMode::TryDepositOrRefund)
    }

    pub fn try_deposit_remaining_or_abort(self) -> Self {
        self.deposit_with(DepositMode::TryDepositOrAbort)
    }

    fn deposit_with(self, mode: DepositMode) -> Self {
        let deposit = Instruction::deposit_batch(&self.initiator, mode);
        self.push(deposit)
    }

    /// Returns the manifest once it passes the consumption audit.
    pub fn build(self) -> Result<TransactionManifest, DappError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let manifest = TransactionManifest::new(self.instructions);
        audit(&manifest, &self.initiator)?;
        debug!(instructions = manifest.len(), account = %self.initiator, "Built transaction manifest");
        Ok(manifest)
    }
}
