#![allow(dead_code)]
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use enrollment_engine::{
    db_types::{GatewayOrderId, Order, PurchasedItem},
    events::EventProducers,
    traits::PaymentGatewayDatabase,
    gateway::{GatewayError, PaymentGateway, RemoteOrder},
    helpers::{CheckoutSignatureVerifier, PaymentVerifiers, WebhookSignatureVerifier},
    payment_objects::{CheckoutConfirmation, UnverifiedPayment, WebhookDelivery},
    test_utils::prepare_env::{prepare_test_env, random_db_path, seed_item, seed_user},
    CheckoutApi,
    EnrollmentFlowApi,
    SqliteDatabase,
};
use lp_common::{MinorUnits, Secret};
use serde_json::{json, Value};

pub const CHECKOUT_SECRET: &str = "checkout-secret";
pub const WEBHOOK_SECRET: &str = "webhook-secret";

/// A stand-in for the live gateway that hands out pre-arranged order ids, or fails on demand.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    ids: Arc<Mutex<VecDeque<String>>>,
    fail: bool,
}

impl ScriptedGateway {
    pub fn with_ids(ids: &[&str]) -> Self {
        let ids = ids.iter().map(|s| s.to_string()).collect();
        Self { ids: Arc::new(Mutex::new(ids)), fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }
}

impl PaymentGateway for ScriptedGateway {
    fn is_mock(&self) -> bool {
        false
    }

    async fn create_remote_order(
        &self,
        amount: MinorUnits,
        currency: &str,
        receipt: &str,
    ) -> Result<RemoteOrder, GatewayError> {
        if self.fail {
            return Err(GatewayError::Unavailable("connection reset by peer".into()));
        }
        let id = self.ids.lock().unwrap().pop_front().expect("The test ran out of scripted gateway order ids");
        let raw = json!({"id": id, "amount": amount.value(), "currency": currency, "receipt": receipt});
        Ok(RemoteOrder { gateway_order_id: GatewayOrderId::new(id), amount, currency: currency.to_string(), raw })
    }

    async fn fetch_remote_payment(&self, payment_id: &str) -> Result<Value, GatewayError> {
        Ok(json!({"id": payment_id, "status": "captured"}))
    }
}

pub fn course() -> PurchasedItem {
    PurchasedItem::Course("c9".into())
}

pub fn checkout_signer() -> CheckoutSignatureVerifier {
    CheckoutSignatureVerifier::new(&Secret::new(CHECKOUT_SECRET.to_string())).unwrap()
}

pub fn webhook_signer() -> WebhookSignatureVerifier {
    WebhookSignatureVerifier::new(&Secret::new(WEBHOOK_SECRET.to_string())).unwrap()
}

pub fn verifiers() -> PaymentVerifiers {
    PaymentVerifiers::new(checkout_signer(), webhook_signer())
}

/// A migrated database with users `u1` and `u2`, course `c9` (₹499.00) and project `p1` (₹1,999.00).
pub async fn seeded_db() -> SqliteDatabase {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    seed_user(&db, "u1", "Asha", "asha@example.com").await;
    seed_user(&db, "u2", "Ravi", "ravi@example.com").await;
    seed_item(&db, &course(), "Rust for the Web", MinorUnits::from(49900), "INR").await;
    seed_item(&db, &PurchasedItem::Project("p1".into()), "Build a Payment Server", MinorUnits::from(199900), "INR")
        .await;
    db
}

pub fn flow_api(db: &SqliteDatabase) -> EnrollmentFlowApi<SqliteDatabase> {
    EnrollmentFlowApi::new(db.clone(), verifiers(), EventProducers::default())
}

pub fn flow_api_with_producers(db: &SqliteDatabase, producers: EventProducers) -> EnrollmentFlowApi<SqliteDatabase> {
    EnrollmentFlowApi::new(db.clone(), verifiers(), producers)
}

/// Opens order `ord_abc123` for `u1` on course `c9`.
pub async fn open_order(db: &SqliteDatabase) -> Order {
    open_order_with_id(db, "u1", course(), "ord_abc123").await
}

/// Opens an order over a pool of its own, which is closed before returning. Whatever the order's creator did not commit
/// is rolled back, so the tests only ever see orders that were durably stored.
pub async fn open_order_with_id(db: &SqliteDatabase, user: &str, item: PurchasedItem, id: &str) -> Order {
    let mut writer = separate_pool(db).await;
    let api = CheckoutApi::new(writer.clone(), ScriptedGateway::with_ids(&[id]));
    let order = api.create_order(user, item).await.expect("Error opening order");
    drop(api);
    writer.close().await.expect("Error closing the checkout pool");
    order
}

/// A second connection pool onto the same database file. Nothing is shared with `db` except what has been committed.
pub async fn separate_pool(db: &SqliteDatabase) -> SqliteDatabase {
    SqliteDatabase::new_with_url(db.url(), 2).await.expect("Error opening a second pool")
}

/// The confirmation the browser would send after a successful checkout.
pub fn signed_confirmation(user: &str, order: &Order, payment_id: &str) -> UnverifiedPayment {
    let signature = checkout_signer().sign(order.gateway_order_id.as_str(), payment_id);
    UnverifiedPayment::Checkout(CheckoutConfirmation {
        user_id: user.into(),
        gateway_order_id: order.gateway_order_id.clone(),
        gateway_payment_id: payment_id.into(),
        signature,
        internal_order_id: Some(order.id),
    })
}

pub fn webhook_body(event: &str, gateway_order_id: &str, payment_id: &str, amount: i64, currency: &str) -> Vec<u8> {
    json!({
        "entity": "event",
        "account_id": "acc_test",
        "event": event,
        "contains": ["payment"],
        "payload": {
            "payment": {
                "entity": {
                    "id": payment_id,
                    "entity": "payment",
                    "amount": amount,
                    "currency": currency,
                    "status": "captured",
                    "order_id": gateway_order_id,
                    "method": "upi",
                    "captured": true,
                    "email": "asha@example.com"
                }
            }
        },
        "created_at": 1718000000
    })
    .to_string()
    .into_bytes()
}

/// A correctly signed `payment.captured` delivery for the order.
pub fn signed_webhook(order: &Order, payment_id: &str) -> UnverifiedPayment {
    let body = webhook_body(
        "payment.captured",
        order.gateway_order_id.as_str(),
        payment_id,
        order.amount.value(),
        &order.currency,
    );
    UnverifiedPayment::Webhook(WebhookDelivery { signature: webhook_signer().sign(&body), body })
}
