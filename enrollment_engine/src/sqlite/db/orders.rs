use chrono::Duration;
use log::{debug, trace, warn};
use sqlx::SqliteConnection;

use crate::{
    db_types::{GatewayOrderId, NewOrder, Order, PaymentDetails},
    traits::{MarkPaidResult, PaymentGatewayError},
};

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
///
/// A duplicate gateway order id is reported as [`PaymentGatewayError::OrderAlreadyExists`].
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, PaymentGatewayError> {
    if !order.amount.is_positive() {
        return Err(PaymentGatewayError::InvalidOrder(format!("{} is not a payable amount", order.amount)));
    }
    let gateway_order_id = order.gateway_order_id.clone();
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (
                user_id,
                item_type,
                item_id,
                gateway_order_id,
                amount,
                currency,
                is_mock
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(order.user_id)
    .bind(order.item.item_type().to_string())
    .bind(order.item.id())
    .bind(order.gateway_order_id.as_str())
    .bind(order.amount.value())
    .bind(order.currency)
    .bind(order.is_mock)
    .fetch_all(conn)
    .await;
    match result {
        Ok(rows) => rows.into_iter().next().ok_or_else(|| {
            PaymentGatewayError::DatabaseError(format!("Order {gateway_order_id} was inserted, but no row came back"))
        }),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(PaymentGatewayError::OrderAlreadyExists(gateway_order_id))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_gateway_id(
    id: &GatewayOrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE gateway_order_id = $1")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_orders_for_user(user_id: &str, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Moves the order to `Paid` unless it already is.
///
/// The update is guarded by the current status, so exactly one caller wins the transition. The update is also the
/// first statement issued, which means that inside a transaction the write lock is taken up front and concurrent
/// settlements of the same order wait for each other rather than deadlocking.
///
/// A paid order is never overwritten. If it was settled by a different payment, a warning is logged and the original
/// record is returned unchanged.
pub async fn mark_paid(
    id: i64,
    payment: &PaymentDetails,
    conn: &mut SqliteConnection,
) -> Result<MarkPaidResult, PaymentGatewayError> {
    // RETURNING rows are drained with fetch_all. A statement left half-stepped keeps its write uncommitted.
    let updated: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                status = 'Paid',
                payment_id = $1,
                payment_details = $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND status <> 'Paid'
            RETURNING *;
        "#,
    )
    .bind(payment.payment_id.as_str())
    .bind(payment.to_json())
    .bind(id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .next();
    if let Some(order) = updated {
        debug!("🗃️ Order #{id} [{}] marked as paid by {}", order.gateway_order_id, payment.payment_id);
        return Ok(MarkPaidResult { order, newly_paid: true });
    }
    let order = fetch_order_by_id(id, conn).await?.ok_or(PaymentGatewayError::OrderIdNotFound(id))?;
    match order.payment_id.as_deref() {
        Some(paid_by) if paid_by != payment.payment_id => warn!(
            "🗃️ Order #{id} [{}] was already paid by {paid_by}. Ignoring a second payment {} ({}).",
            order.gateway_order_id, payment.payment_id, payment.source
        ),
        _ => trace!("🗃️ Order #{id} was already paid. Nothing to do."),
    }
    Ok(MarkPaidResult { order, newly_paid: false })
}

/// Expires orders that have sat in `Created` status for longer than `limit`. Only `Created` orders are touched.
pub async fn expire_orders(limit: Duration, conn: &mut SqliteConnection) -> Result<Vec<Order>, PaymentGatewayError> {
    let rows = sqlx::query_as(
        r#"
            UPDATE orders SET updated_at = CURRENT_TIMESTAMP, status = 'Expired'
            WHERE status = 'Created' AND (unixepoch(CURRENT_TIMESTAMP) - unixepoch(updated_at)) > $1
            RETURNING *;
        "#,
    )
    .bind(limit.num_seconds())
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
