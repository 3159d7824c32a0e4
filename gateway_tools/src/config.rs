use log::*;
use lp_common::{helpers::non_blank, Secret};

pub const DEFAULT_GATEWAY_API_URL: &str = "https://api.razorpay.com";

#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    /// Base URL of the gateway REST API, without a trailing slash.
    pub api_url: String,
    pub key_id: String,
    /// Used for HTTP basic auth against the API, and as the HMAC key for checkout signatures.
    pub key_secret: Secret<String>,
    /// HMAC key for webhook deliveries. This is configured separately in the gateway dashboard and is NOT the same as
    /// `key_secret`.
    pub webhook_secret: Secret<String>,
}

impl GatewayConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("LPS_GATEWAY_API_URL").unwrap_or_else(|_| {
            info!("💳️ LPS_GATEWAY_API_URL not set, using {DEFAULT_GATEWAY_API_URL} as default");
            DEFAULT_GATEWAY_API_URL.to_string()
        });
        let key_id = non_blank(std::env::var("LPS_GATEWAY_KEY_ID").ok()).unwrap_or_else(|| {
            warn!("💳️ LPS_GATEWAY_KEY_ID not set. Live payments are unavailable.");
            String::default()
        });
        let key_secret = Secret::new(non_blank(std::env::var("LPS_GATEWAY_KEY_SECRET").ok()).unwrap_or_else(|| {
            warn!("💳️ LPS_GATEWAY_KEY_SECRET not set. Live payments are unavailable.");
            String::default()
        }));
        let webhook_secret =
            Secret::new(non_blank(std::env::var("LPS_GATEWAY_WEBHOOK_SECRET").ok()).unwrap_or_else(|| {
                warn!("💳️ LPS_GATEWAY_WEBHOOK_SECRET not set. Webhook deliveries will be refused.");
                String::default()
            }));
        Self { api_url: api_url.trim_end_matches('/').to_string(), key_id, key_secret, webhook_secret }
    }

    /// Live credentials are present, i.e. both the key id and key secret have been set.
    pub fn has_credentials(&self) -> bool {
        !self.key_id.trim().is_empty() && !self.key_secret.is_blank()
    }
}
