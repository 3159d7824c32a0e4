use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{GatewayOrderId, NewOrder, Order, PaymentDetails},
    traits::{
        data_objects::{ExpiryResult, MarkPaidResult, SettlementRecord},
        CatalogError,
        CatalogLookup,
        EnrollmentManagement,
        OrderManagement,
    },
};

/// This trait defines the highest level of behaviour for backends supporting the enrollment engine.
///
/// This behaviour includes:
/// * Storing new orders
/// * Settling paid orders, which also enrolls the buyer
/// * Expiring orders that were never paid
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone + OrderManagement + EnrollmentManagement + CatalogLookup {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new order with status `Created`.
    ///
    /// The gateway order id must be unique. If an order with the same gateway id already exists,
    /// [`PaymentGatewayError::OrderAlreadyExists`] is returned and nothing is written.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError>;

    /// Marks the order as `Paid`, recording the payment details.
    ///
    /// This call is idempotent. If the order is already paid, nothing is changed (in particular, the payment id and
    /// details recorded by the first settlement are never overwritten) and `newly_paid` is false.
    ///
    /// `Created` and `Expired` orders can both be marked as paid.
    async fn mark_order_paid(&self, id: i64, payment: &PaymentDetails) -> Result<MarkPaidResult, PaymentGatewayError>;

    /// In a single atomic transaction,
    /// * calls [`mark_order_paid`](Self::mark_order_paid) for the order,
    /// * enrolls the order's owner in the purchased item, unless they are already enrolled.
    ///
    /// Either both changes are committed or neither is. The call is idempotent and safe to race: any number of
    /// concurrent or repeated calls for the same order leave exactly one paid order and one enrollment behind.
    async fn settle_order(&self, id: i64, payment: &PaymentDetails) -> Result<SettlementRecord, PaymentGatewayError>;

    /// Marks orders that have been sitting in `Created` status for longer than `older_than` as `Expired`.
    ///
    /// The result lists the orders that were expired in this call.
    async fn expire_stale_orders(&self, older_than: Duration) -> Result<ExpiryResult, PaymentGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since one already exists for gateway order {0}")]
    OrderAlreadyExists(GatewayOrderId),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderIdNotFound(i64),
    #[error("The order is not valid. {0}")]
    InvalidOrder(String),
    #[error("{0}")]
    CatalogError(#[from] CatalogError),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}

impl PaymentGatewayError {
    /// True if the failure is (probably) temporary, e.g. the database was busy or unreachable, so retrying the same
    /// call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, PaymentGatewayError::DatabaseError(_) | PaymentGatewayError::CatalogError(_))
    }
}
