use chrono::Utc;
use rand::Rng;

/// Every order reference synthesised in mock mode starts with this prefix. Live gateway ids never do.
pub const MOCK_ORDER_PREFIX: &str = "order_mock_";

pub fn is_mock_order(gateway_order_id: &str) -> bool {
    gateway_order_id.starts_with(MOCK_ORDER_PREFIX)
}

/// Generates a fresh mock order reference, e.g. `order_mock_1717171717000_3fa94c1e`.
pub fn new_mock_order_id() -> String {
    let nonce = rand::thread_rng().gen::<u32>();
    format!("{MOCK_ORDER_PREFIX}{}_{nonce:08x}", Utc::now().timestamp_millis())
}
