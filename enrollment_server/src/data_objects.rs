use std::fmt::Display;

use enrollment_engine::db_types::{GatewayOrderId, ItemType, Order, PurchasedItem};
use lp_common::MinorUnits;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub item_id: String,
    pub item_type: ItemType,
}

impl CreateOrderRequest {
    pub fn item(&self) -> PurchasedItem {
        PurchasedItem::new(self.item_type, self.item_id.trim())
    }
}

/// Everything the browser needs to open the gateway's checkout widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub gateway_order_id: GatewayOrderId,
    pub amount: MinorUnits,
    pub currency: String,
    pub is_mock: bool,
    pub internal_order_id: i64,
}

impl From<Order> for CreateOrderResponse {
    fn from(order: Order) -> Self {
        Self {
            gateway_order_id: order.gateway_order_id,
            amount: order.amount,
            currency: order.currency,
            is_mock: order.is_mock,
            internal_order_id: order.id,
        }
    }
}

/// The browser's report of a completed checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub internal_order_id: Option<i64>,
}
