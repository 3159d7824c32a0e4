use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    config::GatewayConfig,
    data_objects::{CreatedOrder, GatewayOrder, GatewayPayment, NewGatewayOrder},
    GatewayApiError,
};

#[derive(Clone)]
pub struct GatewayApi {
    config: GatewayConfig,
    client: Arc<Client>,
}

impl std::fmt::Debug for GatewayApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GatewayApi ({}, key {})", self.config.api_url, self.config.key_id)
    }
}

impl GatewayApi {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayApiError> {
        if !config.has_credentials() {
            return Err(GatewayApiError::MissingCredentials);
        }
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, GatewayApiError> {
        let url = self.url(path);
        trace!("💳️ Sending REST query: {method} {url}");
        let mut req = self
            .client
            .request(method, url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.reveal()));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| GatewayApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("💳️ REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| GatewayApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| GatewayApiError::RestResponseError(e.to_string()))?;
            Err(GatewayApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/v1{path}", self.config.api_url)
    }

    /// Opens an order on the gateway. The checkout widget on the client is initialised with the returned order id.
    pub async fn create_order(&self, order: &NewGatewayOrder) -> Result<CreatedOrder, GatewayApiError> {
        if !order.amount.is_positive() {
            return Err(GatewayApiError::InvalidCurrencyAmount(format!("{} is not a payable amount", order.amount)));
        }
        debug!("💳️ Creating gateway order for receipt {} ({} {})", order.receipt, order.amount, order.currency);
        let raw = self.rest_query::<Value, _>(Method::POST, "/orders", Some(order)).await?;
        let parsed = serde_json::from_value::<GatewayOrder>(raw.clone())
            .map_err(|e| GatewayApiError::JsonError(format!("Unexpected order response. {e}")))?;
        info!("💳️ Gateway order {} created for receipt {}", parsed.id, order.receipt);
        Ok(CreatedOrder { order: parsed, raw })
    }

    /// Looks up a payment. Used to audit settled orders against the gateway's own record.
    pub async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayApiError> {
        let path = format!("/payments/{payment_id}");
        debug!("💳️ Fetching gateway payment {payment_id}");
        self.rest_query::<GatewayPayment, ()>(Method::GET, &path, None).await
    }
}
