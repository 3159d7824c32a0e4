//! The payment type states.
//!
//! Evidence of a payment enters as an [`UnverifiedPayment`], tagged by the path it came in on. Only the reconciler can
//! turn it into a [`VerifiedPayment`] (there is no public constructor), and only a verified payment can be settled
//! into a [`Settlement`].
use lp_common::MinorUnits;
use serde::Serialize;
use serde_json::Value;

use crate::db_types::{Enrollment, GatewayOrderId, Order, PaymentSource};

/// What the browser posts back after the checkout widget completes.
#[derive(Debug, Clone)]
pub struct CheckoutConfirmation {
    /// The authenticated user making the claim
    pub user_id: String,
    pub gateway_order_id: GatewayOrderId,
    pub gateway_payment_id: String,
    pub signature: String,
    /// Our own order id, if the client sent it. It must agree with the gateway order id.
    pub internal_order_id: Option<i64>,
}

/// A webhook delivery, exactly as received. The body must not be re-serialised before its signature is checked.
#[derive(Debug, Clone)]
pub struct WebhookDelivery {
    pub body: Vec<u8>,
    pub signature: String,
}

#[derive(Debug, Clone)]
pub enum UnverifiedPayment {
    Checkout(CheckoutConfirmation),
    Webhook(WebhookDelivery),
}

/// Payment evidence whose signature has been checked.
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    gateway_order_id: GatewayOrderId,
    payment_id: String,
    source: PaymentSource,
    expected_user: Option<String>,
    internal_order_id: Option<i64>,
    reported_amount: Option<(MinorUnits, String)>,
    raw: Value,
}

impl VerifiedPayment {
    pub(crate) fn from_checkout(confirmation: CheckoutConfirmation, source: PaymentSource) -> Self {
        let raw = serde_json::json!({
            "gateway_order_id": confirmation.gateway_order_id,
            "gateway_payment_id": confirmation.gateway_payment_id,
            "signature": confirmation.signature,
        });
        Self {
            gateway_order_id: confirmation.gateway_order_id,
            payment_id: confirmation.gateway_payment_id,
            source,
            expected_user: Some(confirmation.user_id),
            internal_order_id: confirmation.internal_order_id,
            reported_amount: None,
            raw,
        }
    }

    pub(crate) fn from_webhook(
        gateway_order_id: GatewayOrderId,
        payment_id: String,
        reported_amount: Option<(MinorUnits, String)>,
        raw: Value,
    ) -> Self {
        Self {
            gateway_order_id,
            payment_id,
            source: PaymentSource::Webhook,
            expected_user: None,
            internal_order_id: None,
            reported_amount,
            raw,
        }
    }

    pub fn gateway_order_id(&self) -> &GatewayOrderId {
        &self.gateway_order_id
    }

    pub fn payment_id(&self) -> &str {
        self.payment_id.as_str()
    }

    pub fn source(&self) -> PaymentSource {
        self.source
    }

    pub fn expected_user(&self) -> Option<&str> {
        self.expected_user.as_deref()
    }

    pub fn internal_order_id(&self) -> Option<i64> {
        self.internal_order_id
    }

    pub fn reported_amount(&self) -> Option<(MinorUnits, &str)> {
        self.reported_amount.as_ref().map(|(a, c)| (*a, c.as_str()))
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

#[derive(Debug, Clone)]
pub enum Verification {
    Verified(VerifiedPayment),
    /// An authentic webhook for an event that doesn't settle anything. Holds the event name.
    Ignored(String),
}

/// The terminal state: the order is paid and its owner is enrolled.
#[derive(Debug, Clone, Serialize)]
pub struct Settlement {
    pub order: Order,
    pub enrollment: Enrollment,
    pub source: PaymentSource,
    /// False if the order had already been paid, i.e. this was a replay or the other path got there first
    pub newly_paid: bool,
    pub newly_enrolled: bool,
}

impl Settlement {
    pub fn message(&self) -> String {
        match (self.newly_paid, self.newly_enrolled) {
            (_, true) => format!("Payment verified. You are now enrolled in {}.", self.enrollment.item),
            (true, false) => format!("Payment verified. You were already enrolled in {}.", self.enrollment.item),
            (false, _) => format!("This payment has already been processed. You are enrolled in {}.", self.enrollment.item),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    Settled(Settlement),
    Ignored(String),
}

/// An order, alongside the gateway's own record of the payment that settled it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAudit {
    pub order: Order,
    pub remote_payment: Option<Value>,
}
