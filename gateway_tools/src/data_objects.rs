use std::collections::HashMap;

use lp_common::MinorUnits;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const EVENT_PAYMENT_CAPTURED: &str = "payment.captured";
pub const EVENT_ORDER_PAID: &str = "order.paid";

/// Request body for `POST /v1/orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGatewayOrder {
    pub amount: MinorUnits,
    pub currency: String,
    pub receipt: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub notes: HashMap<String, String>,
}

impl NewGatewayOrder {
    pub fn new<S: Into<String>>(amount: MinorUnits, currency: S, receipt: S) -> Self {
        Self { amount, currency: currency.into(), receipt: receipt.into(), notes: HashMap::new() }
    }

    pub fn with_note<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.notes.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: MinorUnits,
    #[serde(default)]
    pub amount_paid: MinorUnits,
    #[serde(default)]
    pub amount_due: MinorUnits,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    pub status: String,
    #[serde(default)]
    pub attempts: u32,
    /// Unix timestamp (seconds)
    #[serde(default)]
    pub created_at: i64,
}

/// The parsed order, together with the raw JSON the gateway returned. The raw response is kept for the audit trail.
#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub order: GatewayOrder,
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayPayment {
    pub id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    pub amount: MinorUnits,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub captured: bool,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityWrapper<T> {
    pub entity: T,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub payment: Option<EntityWrapper<GatewayPayment>>,
    #[serde(default)]
    pub order: Option<EntityWrapper<GatewayOrder>>,
}

/// The envelope of every webhook delivery.
///
/// ```json
/// {
///   "entity": "event",
///   "event": "payment.captured",
///   "payload": { "payment": { "entity": { "id": "pay_1", "order_id": "ord_abc123", ... } } },
///   "created_at": 1718000000
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub payload: WebhookPayload,
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl WebhookEvent {
    pub fn payment(&self) -> Option<&GatewayPayment> {
        self.payload.payment.as_ref().map(|p| &p.entity)
    }

    pub fn order(&self) -> Option<&GatewayOrder> {
        self.payload.order.as_ref().map(|o| &o.entity)
    }

    /// Only captured payments and paid orders settle a purchase. Everything else (authorized, failed, refunds ...) is
    /// acknowledged and ignored.
    pub fn is_settlement(&self) -> bool {
        matches!(self.event.as_str(), EVENT_PAYMENT_CAPTURED | EVENT_ORDER_PAID)
    }

    /// The gateway order id this event refers to. Prefers the order entity, and falls back to the payment's
    /// `order_id`. Check [`Self::conflicting_order_ids`] first: when the two disagree, neither can be trusted.
    pub fn gateway_order_id(&self) -> Option<&str> {
        self.order().map(|o| o.id.as_str()).or_else(|| self.payment().and_then(|p| p.order_id.as_deref()))
    }

    /// `(order entity id, payment order_id)` if the event carries both and they name different orders.
    pub fn conflicting_order_ids(&self) -> Option<(&str, &str)> {
        let order_id = self.order()?.id.as_str();
        let paid_for = self.payment()?.order_id.as_deref()?;
        (order_id != paid_for).then_some((order_id, paid_for))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const CAPTURED: &str = r#"{
      "entity": "event",
      "account_id": "acc_BFQ7uQEaa7j2z7",
      "event": "payment.captured",
      "contains": ["payment"],
      "payload": {
        "payment": {
          "entity": {
            "id": "pay_1",
            "entity": "payment",
            "amount": 49900,
            "currency": "INR",
            "status": "captured",
            "order_id": "ord_abc123",
            "method": "upi",
            "captured": true,
            "email": "u1@example.com"
          }
        }
      },
      "created_at": 1718000000
    }"#;

    #[test]
    fn deserialize_payment_captured() {
        let event = serde_json::from_str::<WebhookEvent>(CAPTURED).expect("Failed to deserialize webhook");
        assert!(event.is_settlement());
        assert_eq!(event.gateway_order_id(), Some("ord_abc123"));
        let payment = event.payment().unwrap();
        assert_eq!(payment.id, "pay_1");
        assert_eq!(payment.amount, MinorUnits::from(49900));
        assert!(payment.captured);
        assert!(event.order().is_none());
    }

    #[test]
    fn non_settlement_events() {
        let json = r#"{"event": "payment.failed", "payload": {}}"#;
        let event = serde_json::from_str::<WebhookEvent>(json).unwrap();
        assert!(!event.is_settlement());
        assert_eq!(event.gateway_order_id(), None);
    }

    fn order_paid(payment_order_id: Option<&str>) -> WebhookEvent {
        let json = serde_json::json!({
          "event": "order.paid",
          "payload": {
            "order": { "entity": { "id": "ord_A", "amount": 100, "currency": "INR", "status": "paid" } },
            "payment": { "entity": { "id": "pay_B", "order_id": payment_order_id, "amount": 100, "currency": "INR",
                                     "status": "captured" } }
          }
        });
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn order_ids_must_agree() {
        let event = order_paid(Some("ord_A"));
        assert_eq!(event.conflicting_order_ids(), None);
        assert_eq!(event.gateway_order_id(), Some("ord_A"));

        let event = order_paid(None);
        assert_eq!(event.conflicting_order_ids(), None);
        assert_eq!(event.gateway_order_id(), Some("ord_A"));

        let event = order_paid(Some("ord_other"));
        assert_eq!(event.conflicting_order_ids(), Some(("ord_A", "ord_other")));
    }

    #[test]
    fn new_order_body() {
        let order = NewGatewayOrder::new(MinorUnits::from(49900), "INR", "rcpt_u1_c9").with_note("user_id", "u1");
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["amount"], 49900);
        assert_eq!(json["receipt"], "rcpt_u1_c9");
        assert_eq!(json["notes"]["user_id"], "u1");
    }
}
