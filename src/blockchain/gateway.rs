use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::blockchain::models::{
    CommittedDetailsRequest, CommittedDetailsResponse, EntityDetailsItem, EntityDetailsRequest,
    EntityDetailsResponse, GatewayErrorResponse, LegacyComponentResponse, LegacyNonFungibleResponse,
    TransactionStatusRequest, TransactionStatusResponse,
};
use crate::blockchain::traits::GatewayApi;
use crate::core::config::DappConfig;
use crate::core::errors::DappError;
use crate::monitoring::DappMetrics;

/// Gateway HTTP client.
#[derive(Clone)]
pub struct GatewayClient {
    base_url: String,
    client: Client,
    metrics: Option<Arc<DappMetrics>>,
}

impl GatewayClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DappError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DappError::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), client, metrics: None })
    }

    pub fn from_config(config: &DappConfig) -> Result<Self, DappError> {
        Self::new(&config.network.gateway_url, config.submission.request_timeout())
    }

    pub fn with_metrics(mut self, metrics: Arc<DappMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, DappError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        self.execute(path, self.client.post(&url).json(body)).await
    }

    /// GET on `base_url/<segments...>`, each segment percent-encoded so that
    /// ids like `#1#` stay in the path instead of becoming a fragment.
    async fn get_segments<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, DappError> {
        let url = self.segment_url(segments)?;
        self.execute(url.path(), self.client.get(url.clone())).await
    }

    fn segment_url(&self, segments: &[&str]) -> Result<Url, DappError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| DappError::Config(format!("invalid gateway url '{}': {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| DappError::Config(format!("gateway url '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> Result<T, DappError> {
        debug!(path, "Gateway request");
        let started = Instant::now();
        let result = self.send_and_decode(path, request).await;
        if let Some(metrics) = &self.metrics {
            metrics.record_gateway_call(result.is_ok(), started.elapsed().as_secs_f64());
        }
        if let Err(e) = &result {
            warn!(path, error = %e, "Gateway request failed");
        }
        result
    }

    async fn send_and_decode<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> Result<T, DappError> {
        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<GatewayErrorResponse>(&text)
                .map(|e| e.message)
                .unwrap_or(text);
            return Err(DappError::NetworkFailure(format!("{} {}: {}", status.as_u16(), path, message)));
        }

        serde_json::from_str(&text).map_err(|e| DappError::schema_mismatch(path, "gateway response", e.to_string()))
    }
}

#[async_trait]
impl GatewayApi for GatewayClient {
    async fn entity_details(&self, addresses: &[String]) -> Result<Vec<EntityDetailsItem>, DappError> {
        let request = EntityDetailsRequest::vault_level(addresses.to_vec());
        let response: EntityDetailsResponse = self.post("/state/entity/details", &request).await?;
        Ok(response.items)
    }

    async fn component(&self, address: &str) -> Result<LegacyComponentResponse, DappError> {
        self.get_segments(&["component", address]).await
    }

    async fn non_fungible(&self, resource: &str, id: &str) -> Result<LegacyNonFungibleResponse, DappError> {
        let key = format!("{}{}", resource, id);
        self.get_segments(&["non-fungible", &key]).await
    }

    async fn transaction_status(&self, intent_hash: &str) -> Result<TransactionStatusResponse, DappError> {
        let request = TransactionStatusRequest { intent_hash: intent_hash.to_string() };
        self.post("/transaction/status", &request).await
    }

    async fn committed_details(&self, intent_hash: &str) -> Result<CommittedDetailsResponse, DappError> {
        self.post("/transaction/committed-details", &CommittedDetailsRequest::new(intent_hash)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = GatewayClient::new("https://stokenet.radixdlt.com/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "https://stokenet.radixdlt.com");
    }

    #[test]
    fn test_legacy_segments_are_percent_encoded() {
        let client = GatewayClient::new("http://localhost:3000/api/", Duration::from_secs(5)).unwrap();
        let url = client.segment_url(&["non-fungible", "resource_tdx_2_1nf#1#"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/non-fungible/resource_tdx_2_1nf%231%23");
        assert_eq!(url.fragment(), None);

        let url = client.segment_url(&["component", "component_x/../admin"]).unwrap();
        assert_eq!(url.path(), "/api/component/component_x%2F..%2Fadmin");
    }

    #[test]
    fn test_from_config_uses_network_url() {
        let config = DappConfig::default();
        let client = GatewayClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "https://stokenet.radixdlt.com");
    }
}
