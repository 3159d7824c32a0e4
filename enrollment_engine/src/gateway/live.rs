use gateway_tools::{GatewayApi, GatewayApiError, NewGatewayOrder};
use lp_common::MinorUnits;
use serde_json::Value;

use crate::{
    db_types::GatewayOrderId,
    gateway::{GatewayError, PaymentGateway, RemoteOrder},
};

impl From<GatewayApiError> for GatewayError {
    fn from(e: GatewayApiError) -> Self {
        match e {
            GatewayApiError::MissingCredentials | GatewayApiError::Initialization(_) => {
                GatewayError::Configuration(e.to_string())
            },
            e if e.is_transient() => GatewayError::Unavailable(e.to_string()),
            e => GatewayError::Rejected(e.to_string()),
        }
    }
}

impl PaymentGateway for GatewayApi {
    fn is_mock(&self) -> bool {
        false
    }

    async fn create_remote_order(
        &self,
        amount: MinorUnits,
        currency: &str,
        receipt: &str,
    ) -> Result<RemoteOrder, GatewayError> {
        let request = NewGatewayOrder::new(amount, currency, receipt);
        let created = self.create_order(&request).await?;
        Ok(RemoteOrder {
            gateway_order_id: GatewayOrderId::new(created.order.id),
            amount: created.order.amount,
            currency: created.order.currency,
            raw: created.raw,
        })
    }

    async fn fetch_remote_payment(&self, payment_id: &str) -> Result<Value, GatewayError> {
        let payment = self.fetch_payment(payment_id).await?;
        serde_json::to_value(payment).map_err(|e| GatewayError::Rejected(e.to_string()))
    }
}
