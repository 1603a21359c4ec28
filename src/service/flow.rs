use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{info, instrument};

use crate::blockchain::state::{AccountBalances, StateReader};
use crate::blockchain::traits::{GatewayApi, WalletConnector};
use crate::core::config::{AddressBook, SubmissionConfig};
use crate::core::domain::{AccountRef, TransactionReceipt};
use crate::core::errors::DappError;
use crate::manifest::{build_operation, Operation, OperationContext, TransactionManifest};
use crate::monitoring::DappMetrics;
use crate::service::account::AccountResolver;
use crate::service::presenter::{FlowPhase, Notification, Notifier, ResultPresenter, StateRefresher};
use crate::service::submitter::TransactionSubmitter;

/// Everything a caller learns from one run.
#[derive(Debug)]
pub struct FlowOutcome {
    pub operation: &'static str,
    pub result: Result<TransactionReceipt, DappError>,
    pub notification: Notification,
    pub phase: FlowPhase,
    pub refreshed: bool,
}

impl FlowOutcome {
    pub fn is_success(&self) -> bool {
        matches!(&self.result, Ok(receipt) if receipt.status.is_success())
    }
}

/// Clears the in-flight flag when a run ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Re-reads the acting account's balances into the flow's snapshot.
struct BalanceRefresh<'a, G: GatewayApi + ?Sized> {
    reader: &'a StateReader<G>,
    account: Option<AccountRef>,
    sink: &'a RwLock<Option<AccountBalances>>,
}

#[async_trait]
impl<'a, G: GatewayApi + ?Sized> StateRefresher for BalanceRefresh<'a, G> {
    async fn refresh(&self) -> Result<(), DappError> {
        let Some(account) = &self.account else {
            return Ok(());
        };
        let balances = self.reader.account_balances(account).await?;
        *self.sink.write() = Some(balances);
        Ok(())
    }
}

/// Resolve account → build manifest → submit → present, one run at a time.
pub struct TransactionFlow<W: WalletConnector + ?Sized, G: GatewayApi + ?Sized> {
    resolver: AccountResolver<W>,
    reader: StateReader<G>,
    submitter: TransactionSubmitter<W, G>,
    presenter: ResultPresenter,
    addresses: AddressBook,
    refresher: Option<Arc<dyn StateRefresher>>,
    metrics: Option<Arc<DappMetrics>>,
    balances: RwLock<Option<AccountBalances>>,
    in_flight: AtomicBool,
}

impl<W: WalletConnector + ?Sized, G: GatewayApi + ?Sized> TransactionFlow<W, G> {
    pub fn new(
        wallet: Arc<W>,
        gateway: Arc<G>,
        addresses: AddressBook,
        submission: SubmissionConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let presenter = ResultPresenter::new(notifier, submission.refresh_delay());
        Self {
            resolver: AccountResolver::new(wallet.clone()),
            reader: StateReader::new(gateway.clone()),
            submitter: TransactionSubmitter::new(wallet, gateway, submission),
            presenter,
            addresses,
            refresher: None,
            metrics: None,
            balances: RwLock::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Replaces the resolver, e.g. to attach an address store.
    pub fn with_resolver(mut self, resolver: AccountResolver<W>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Refresh run after a success instead of the built-in balance refresh.
    pub fn with_refresher(mut self, refresher: Arc<dyn StateRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.submitter = self.submitter.with_message(message);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<DappMetrics>) -> Self {
        self.submitter = self.submitter.with_metrics(metrics.clone());
        self.metrics = Some(metrics);
        self
    }

    pub fn resolver(&self) -> &AccountResolver<W> {
        &self.resolver
    }

    pub fn reader(&self) -> &StateReader<G> {
        &self.reader
    }

    pub fn phase(&self) -> FlowPhase {
        self.presenter.phase()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Balances fetched by the last post-success refresh.
    pub fn latest_balances(&self) -> Option<AccountBalances> {
        self.balances.read().clone()
    }

    /// Builds the manifest `operation` would submit for the current account.
    pub async fn prepare(&self, operation: &Operation) -> Result<(AccountRef, TransactionManifest), DappError> {
        let account = self.resolver.resolve().await?;
        let ctx = OperationContext::new(account.clone(), self.addresses.clone());
        let manifest = build_operation(&ctx, operation)?;
        if let Some(metrics) = &self.metrics {
            metrics.record_manifest_built();
        }
        Ok((account, manifest))
    }

    /// Runs `operation` end to end.
    ///
    /// Only the concurrency guard produces an `Err`; every other failure is
    /// reported through the returned outcome and its notification.
    #[instrument(skip(self, operation), fields(operation = operation.name()))]
    pub async fn run(&self, operation: &Operation) -> Result<FlowOutcome, DappError> {
        if self.in_flight.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            return Err(DappError::SubmissionInFlight);
        }
        let _guard = InFlight(&self.in_flight);
        self.presenter.begin();

        let mut account = None;
        let result = match self.prepare(operation).await {
            Ok((acting, manifest)) => {
                account = Some(acting);
                self.submitter.submit(&manifest).await
            }
            Err(e) => Err(e),
        };

        let builtin = BalanceRefresh { reader: &self.reader, account, sink: &self.balances };
        let refresher: &dyn StateRefresher = match &self.refresher {
            Some(custom) => custom.as_ref(),
            None => &builtin,
        };
        let presented = self.presenter.present(&result, Some(refresher)).await;
        info!(phase = ?presented.phase, refreshed = presented.refreshed, "Flow finished");

        Ok(FlowOutcome {
            operation: operation.name(),
            result,
            notification: presented.notification,
            phase: presented.phase,
            refreshed: presented.refreshed,
        })
    }
}
