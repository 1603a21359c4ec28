//! Application services: who acts, how a manifest reaches the ledger and what
//! the user is told afterwards.

pub mod account;
pub mod flow;
pub mod presenter;
pub mod submitter;

pub use account::{AccountResolver, AddressStore, FileAddressStore, MemoryAddressStore};
pub use flow::{FlowOutcome, TransactionFlow};
pub use presenter::{
    notification_for, FlowPhase, Notification, NotificationLevel, Notifier, Presented, ResultPresenter,
    StateRefresher, TracingNotifier,
};
pub use submitter::{receipt_from_details, TransactionSubmitter};
