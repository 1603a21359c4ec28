use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

use crate::blockchain::wallet::extract_error_message;
use crate::core::domain::TransactionReceipt;
use crate::core::errors::DappError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotificationLevel {
    Success,
    Failure,
}

/// What the user gets told after a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Success, title: "Transaction succeeded".to_string(), message: message.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Failure, title: "Transaction failed".to_string(), message: message.into() }
    }

    pub fn is_success(&self) -> bool {
        self.level == NotificationLevel::Success
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Sink for user-facing notifications (toast, terminal, ...).
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: &Notification) {
        match notification.level {
            NotificationLevel::Success => info!(title = %notification.title, "{}", notification.message),
            NotificationLevel::Failure => warn!(title = %notification.title, "{}", notification.message),
        }
    }
}

/// Re-reads whatever ledger state the screen shows.
#[async_trait]
pub trait StateRefresher: Send + Sync {
    async fn refresh(&self) -> Result<(), DappError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlowPhase {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// Result of presenting one outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presented {
    pub notification: Notification,
    /// Terminal phase reached before returning to `Idle`.
    pub phase: FlowPhase,
    pub refreshed: bool,
}

/// Turns submission outcomes into notifications and triggers the refresh.
pub struct ResultPresenter {
    notifier: Arc<dyn Notifier>,
    refresh_delay: Duration,
    phase: Mutex<FlowPhase>,
}

impl ResultPresenter {
    pub fn new(notifier: Arc<dyn Notifier>, refresh_delay: Duration) -> Self {
        Self { notifier, refresh_delay, phase: Mutex::new(FlowPhase::Idle) }
    }

    pub fn phase(&self) -> FlowPhase {
        *self.phase.lock()
    }

    /// `Idle -> Submitting`.
    pub fn begin(&self) {
        *self.phase.lock() = FlowPhase::Submitting;
    }

    /// Notifies the user about `outcome`; on success refreshes state exactly once.
    pub async fn present(
        &self,
        outcome: &Result<TransactionReceipt, DappError>,
        refresher: Option<&dyn StateRefresher>,
    ) -> Presented {
        let notification = notification_for(outcome);
        let phase = if notification.is_success() { FlowPhase::Succeeded } else { FlowPhase::Failed };
        *self.phase.lock() = phase;
        self.notifier.notify(&notification);

        let mut refreshed = false;
        if phase == FlowPhase::Succeeded {
            if let Some(refresher) = refresher {
                tokio::time::sleep(self.refresh_delay).await;
                match refresher.refresh().await {
                    Ok(()) => refreshed = true,
                    Err(e) => warn!(error = %e, "State refresh after success failed"),
                }
            }
        }

        *self.phase.lock() = FlowPhase::Idle;
        Presented { notification, phase, refreshed }
    }
}

/// Builds the notification for an outcome without side effects.
pub fn notification_for(outcome: &Result<TransactionReceipt, DappError>) -> Notification {
    match outcome {
        Ok(receipt) if receipt.status.is_success() => {
            if receipt.logs.is_empty() {
                Notification::success(format!("Transaction {} committed", receipt.intent_hash))
            } else {
                Notification::success(receipt.logs.join("\n"))
            }
        }
        Ok(receipt) => {
            let reason = receipt
                .error_message
                .as_deref()
                .map(|raw| extract_error_message(raw).unwrap_or_else(|| raw.to_string()))
                .or_else(|| (!receipt.logs.is_empty()).then(|| receipt.logs.join("\n")))
                .unwrap_or_else(|| format!("Transaction {} ended as {}", receipt.intent_hash, receipt.status));
            Notification::failure(reason)
        }
        Err(e) => Notification::failure(e.user_message()),
    }
}
