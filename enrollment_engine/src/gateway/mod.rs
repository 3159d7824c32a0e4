//! The engine's view of the payment gateway.
//!
//! Only one call is needed on the checkout path: opening a remote order for a given amount. Everything else the
//! gateway tells us arrives as signed evidence (checkout signatures and webhooks) and is handled by the reconciler.
//!
//! Three implementations are provided:
//! * [`GatewayApi`](gateway_tools::GatewayApi), the live REST client,
//! * [`MockGateway`], which fabricates orders locally when no credentials are configured,
//! * [`AnyGateway`], which picks one of the two at start-up.
mod any_gateway;
mod live;
mod mock;

pub use any_gateway::AnyGateway;
use lp_common::MinorUnits;
pub use mock::MockGateway;
use serde_json::Value;
use thiserror::Error;

use crate::db_types::GatewayOrderId;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The payment gateway could not be reached. {0}")]
    Unavailable(String),
    #[error("The payment gateway rejected the request. {0}")]
    Rejected(String),
    #[error("The payment gateway is not configured. {0}")]
    Configuration(String),
}

impl GatewayError {
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Unavailable(_))
    }
}

/// An order opened on the gateway, ready for the client's checkout widget.
#[derive(Debug, Clone)]
pub struct RemoteOrder {
    pub gateway_order_id: GatewayOrderId,
    pub amount: MinorUnits,
    pub currency: String,
    /// The gateway's response, verbatim
    pub raw: Value,
}

#[allow(async_fn_in_trait)]
pub trait PaymentGateway: Clone {
    /// True if orders are fabricated locally rather than opened with a real gateway.
    fn is_mock(&self) -> bool;

    /// Opens an order for `amount` with the gateway. `receipt` is our own reference, echoed back by the gateway.
    async fn create_remote_order(
        &self,
        amount: MinorUnits,
        currency: &str,
        receipt: &str,
    ) -> Result<RemoteOrder, GatewayError>;

    /// Fetches the gateway's own record of a payment, for auditing.
    async fn fetch_remote_payment(&self, payment_id: &str) -> Result<Value, GatewayError>;
}
