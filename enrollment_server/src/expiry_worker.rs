use chrono::Duration;
use enrollment_engine::{db_types::Order, gateway::AnyGateway, CheckoutApi, SqliteDatabase};
use log::*;
use tokio::task::JoinHandle;

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every minute, orders that have waited longer than `unpaid_expiry` for payment are marked as expired. A payment that
/// arrives later still settles them.
pub fn start_expiry_worker(db: SqliteDatabase, gateway: AnyGateway, unpaid_expiry: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(60));
        let api = CheckoutApi::new(db, gateway);
        info!("🕰️ Unpaid order expiry worker started. Orders expire after {} hrs.", unpaid_expiry.num_hours());
        loop {
            timer.tick().await;
            trace!("🕰️ Running unpaid order expiry job");
            match api.expire_stale_orders(unpaid_expiry).await {
                Ok(result) if result.count() > 0 => {
                    info!("🕰️ {} orders expired", result.count());
                    debug!("🕰️ Expired orders: {}", order_list(&result.expired));
                },
                Ok(_) => trace!("🕰️ No orders expired"),
                Err(e) => {
                    error!("🕰️ Error running unpaid order expiry job: {e}");
                },
            }
        }
    })
}

fn order_list(orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| format!("[{}] {} user: {} item: {}", o.id, o.gateway_order_id, o.user_id, o.item))
        .collect::<Vec<String>>()
        .join(", ")
}
