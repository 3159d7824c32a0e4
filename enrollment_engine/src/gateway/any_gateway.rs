use gateway_tools::{GatewayApi, GatewayConfig};
use log::*;
use lp_common::MinorUnits;
use serde_json::Value;

use crate::gateway::{GatewayError, MockGateway, PaymentGateway, RemoteOrder};

/// The gateway chosen at start-up: the live client when credentials are available, otherwise the mock.
#[derive(Debug, Clone)]
pub enum AnyGateway {
    Live(GatewayApi),
    Mock(MockGateway),
}

impl AnyGateway {
    /// Selects the live gateway if the configuration carries credentials and mock mode is not forced. Any problem
    /// building the live client falls back to mock mode with a warning.
    pub fn from_config(config: &GatewayConfig, force_mock: bool) -> Self {
        if force_mock {
            warn!("💳️ Mock mode has been forced. No orders will be opened with the payment gateway.");
            return Self::Mock(MockGateway);
        }
        if !config.has_credentials() {
            warn!("💳️ No gateway credentials are configured. Running in mock mode.");
            return Self::Mock(MockGateway);
        }
        match GatewayApi::new(config.clone()) {
            Ok(api) => {
                info!("💳️ Using the live payment gateway at {}", config.api_url);
                Self::Live(api)
            },
            Err(e) => {
                warn!("💳️ Could not create the gateway client ({e}). Running in mock mode.");
                Self::Mock(MockGateway)
            },
        }
    }
}

impl PaymentGateway for AnyGateway {
    fn is_mock(&self) -> bool {
        match self {
            AnyGateway::Live(g) => g.is_mock(),
            AnyGateway::Mock(g) => g.is_mock(),
        }
    }

    async fn create_remote_order(
        &self,
        amount: MinorUnits,
        currency: &str,
        receipt: &str,
    ) -> Result<RemoteOrder, GatewayError> {
        match self {
            AnyGateway::Live(g) => g.create_remote_order(amount, currency, receipt).await,
            AnyGateway::Mock(g) => g.create_remote_order(amount, currency, receipt).await,
        }
    }

    async fn fetch_remote_payment(&self, payment_id: &str) -> Result<Value, GatewayError> {
        match self {
            AnyGateway::Live(g) => g.fetch_remote_payment(payment_id).await,
            AnyGateway::Mock(g) => g.fetch_remote_payment(payment_id).await,
        }
    }
}
