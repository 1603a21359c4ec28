use anyhow::Result;
use prometheus::{Counter, Encoder, Histogram, HistogramOpts, Registry, TextEncoder};
use tracing::{info, warn};

/// Prometheus counters for the manifest → wallet → gateway pipeline.
pub struct DappMetrics {
    registry: Registry,

    pub manifests_built: Counter,

    // Transaction metrics
    pub transactions_submitted: Counter,
    pub transactions_succeeded: Counter,
    pub transactions_failed: Counter,
    pub submission_latency: Histogram,

    // Gateway metrics
    pub gateway_calls: Counter,
    pub gateway_errors: Counter,
    pub gateway_latency: Histogram,
}

impl DappMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let manifests_built = Counter::new("manifests_built_total", "Total number of manifests built")?;

        let transactions_submitted =
            Counter::new("transactions_submitted_total", "Total number of transactions sent to the wallet")?;
        let transactions_succeeded =
            Counter::new("transactions_succeeded_total", "Total number of committed successful transactions")?;
        let transactions_failed =
            Counter::new("transactions_failed_total", "Total number of failed or rejected transactions")?;
        let submission_latency = Histogram::with_opts(HistogramOpts::new(
            "submission_latency_seconds",
            "Time from wallet request to final status in seconds",
        ))?;

        let gateway_calls = Counter::new("gateway_calls_total", "Total number of gateway API calls")?;
        let gateway_errors = Counter::new("gateway_errors_total", "Total number of gateway API errors")?;
        let gateway_latency = Histogram::with_opts(HistogramOpts::new(
            "gateway_latency_seconds",
            "Gateway request latency in seconds",
        ))?;

        registry.register(Box::new(manifests_built.clone()))?;
        registry.register(Box::new(transactions_submitted.clone()))?;
        registry.register(Box::new(transactions_succeeded.clone()))?;
        registry.register(Box::new(transactions_failed.clone()))?;
        registry.register(Box::new(submission_latency.clone()))?;
        registry.register(Box::new(gateway_calls.clone()))?;
        registry.register(Box::new(gateway_errors.clone()))?;
        registry.register(Box::new(gateway_latency.clone()))?;

        info!("dApp metrics initialized");

        Ok(Self {
            registry,
            manifests_built,
            transactions_submitted,
            transactions_succeeded,
            transactions_failed,
            submission_latency,
            gateway_calls,
            gateway_errors,
            gateway_latency,
        })
    }

    /// Text exposition format.
    pub fn export(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn record_manifest_built(&self) {
        self.manifests_built.inc();
    }

    pub fn record_submission(&self) {
        self.transactions_submitted.inc();
    }

    pub fn record_outcome(&self, success: bool, latency: f64) {
        self.submission_latency.observe(latency);
        if success {
            self.transactions_succeeded.inc();
        } else {
            self.transactions_failed.inc();
            warn!("Recorded failed transaction");
        }
    }

    pub fn record_gateway_call(&self, success: bool, latency: f64) {
        self.gateway_calls.inc();
        self.gateway_latency.observe(latency);
        if !success {
            self.gateway_errors.inc();
        }
    }
}
