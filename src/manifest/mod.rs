//! Transaction manifests: typed values and instructions, a fluent builder
//! that audits resource consumption, the text renderer and the catalogue of
//! operation templates.

pub mod audit;
pub mod builder;
pub mod instruction;
pub mod render;
pub mod templates;
pub mod value;

pub use audit::audit;
pub use builder::ManifestBuilder;
pub use instruction::{DepositMode, Instruction, TransactionManifest};
pub use render::render;
pub use templates::{build_operation, Operation, OperationContext, OPERATION_USAGE};
pub use value::{ManifestExpression, ManifestValue};
