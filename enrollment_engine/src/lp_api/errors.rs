use thiserror::Error;

use crate::{
    db_types::{GatewayOrderId, PurchasedItem},
    gateway::GatewayError,
    traits::{CatalogError, PaymentGatewayError},
};

/// Everything that can stop a payment from being reconciled.
///
/// Already-paid orders and existing enrollments are *not* errors: replays succeed.
#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    #[error("Payment verification is not configured. {0}")]
    Configuration(String),
    #[error("The payment signature for {0} is invalid")]
    InvalidSignature(String),
    #[error("The payment notification could not be understood. {0}")]
    MalformedPayload(String),
    #[error("No order exists for gateway order {0}")]
    UnknownOrder(GatewayOrderId),
    #[error("The payment does not belong to order {order}. {reason}")]
    OrderMismatch { order: GatewayOrderId, reason: String },
    #[error("The payment of {paid} does not match the {expected} due for order {order}")]
    AmountMismatch { order: GatewayOrderId, expected: String, paid: String },
    #[error("{0}")]
    Database(#[from] PaymentGatewayError),
}

impl ReconcileError {
    /// Whether the same request might succeed later. The webhook endpoint uses this to decide between asking the
    /// gateway to redeliver, and rejecting the delivery for good.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReconcileError::Configuration(_) => true,
            ReconcileError::Database(e) => e.is_transient(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("User {0} is not known to the platform")]
    UnknownUser(String),
    #[error("{0} is not in the catalog")]
    ItemNotFound(PurchasedItem),
    #[error("{0} cannot be bought. {1}")]
    NotPayable(PurchasedItem, String),
    #[error("The user is already enrolled in {0}")]
    AlreadyEnrolled(PurchasedItem),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("{0}")]
    Gateway(#[from] GatewayError),
    #[error("{0}")]
    Database(#[from] PaymentGatewayError),
}

impl From<CatalogError> for CheckoutError {
    fn from(e: CatalogError) -> Self {
        CheckoutError::Database(PaymentGatewayError::CatalogError(e))
    }
}
