use log::*;
use lp_common::MinorUnits;
use serde_json::{json, Value};

use crate::{
    db_types::GatewayOrderId,
    gateway::{GatewayError, PaymentGateway, RemoteOrder},
    helpers::new_mock_order_id,
};

/// Stands in for the gateway when no credentials are configured. Orders get a synthetic `order_mock_` reference and
/// never leave the process.
#[derive(Debug, Clone, Default)]
pub struct MockGateway;

impl PaymentGateway for MockGateway {
    fn is_mock(&self) -> bool {
        true
    }

    async fn create_remote_order(
        &self,
        amount: MinorUnits,
        currency: &str,
        receipt: &str,
    ) -> Result<RemoteOrder, GatewayError> {
        if !amount.is_positive() {
            return Err(GatewayError::Rejected(format!("{amount} is not a payable amount")));
        }
        let id = new_mock_order_id();
        info!("💳️ Mock gateway order {id} created for receipt {receipt}");
        let raw = json!({
            "id": id,
            "entity": "order",
            "amount": amount.value(),
            "amount_paid": 0,
            "amount_due": amount.value(),
            "currency": currency,
            "receipt": receipt,
            "status": "created",
            "mock": true,
        });
        Ok(RemoteOrder { gateway_order_id: GatewayOrderId::new(id), amount, currency: currency.to_string(), raw })
    }

    async fn fetch_remote_payment(&self, payment_id: &str) -> Result<Value, GatewayError> {
        Ok(json!({ "id": payment_id, "status": "captured", "mock": true }))
    }
}
