use crate::{
    db_types::{GatewayOrderId, Order},
    traits::PaymentGatewayError,
};

#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Fetches the order with the given internal id. If no order exists, `None` is returned.
    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, PaymentGatewayError>;

    async fn fetch_order_by_gateway_id(&self, id: &GatewayOrderId) -> Result<Option<Order>, PaymentGatewayError>;

    /// All orders placed by the user, most recent first.
    async fn fetch_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, PaymentGatewayError>;
}
