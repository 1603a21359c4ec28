pub mod config;
pub mod domain;
pub mod errors;
pub mod validation;

pub use domain::{AccountRef, Amount, ReceiptStatus, ResourceBalance, TransactionReceipt};
pub use errors::DappError;
