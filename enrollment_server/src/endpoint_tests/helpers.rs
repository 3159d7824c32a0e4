use actix_web::{
    body::MessageBody,
    http::{header, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use enrollment_engine::{
    db_types::{Order, PurchasedItem},
    events::EventProducers,
    gateway::RemoteOrder,
    helpers::{CheckoutSignatureVerifier, PaymentVerifiers, WebhookSignatureVerifier},
    test_utils::prepare_env::{prepare_test_env, random_db_path, seed_item, seed_user},
    traits::PaymentGatewayDatabase,
    CheckoutApi,
    EnrollmentFlowApi,
    SqliteDatabase,
};
use log::debug;
use lp_common::{MinorUnits, Secret};
use serde_json::{json, Value};

use super::mocks::MockFlakyGateway;
use crate::{
    auth::{TokenIssuer, TokenVerifier},
    config::AuthConfig,
};

pub const CHECKOUT_SECRET: &str = "checkout-secret";
pub const WEBHOOK_SECRET: &str = "webhook-secret";

// Signs the access tokens in these tests. DO NOT re-use this key anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new("endpoint-tests-only-3f9c1a7e5b2d4c6a8e0f1b3d5a7c9e1f")
}

pub fn issue_token(user_id: &str) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(user_id, None).expect("Failed to sign token")
}

pub fn checkout_signer() -> CheckoutSignatureVerifier {
    CheckoutSignatureVerifier::new(&Secret::new(CHECKOUT_SECRET.to_string())).unwrap()
}

pub fn webhook_signer() -> WebhookSignatureVerifier {
    WebhookSignatureVerifier::new(&Secret::new(WEBHOOK_SECRET.to_string())).unwrap()
}

pub fn course() -> PurchasedItem {
    PurchasedItem::Course("c9".into())
}

/// A migrated database with users `u1` and `u2` and course `c9` (₹499.00).
pub async fn seeded_db() -> SqliteDatabase {
    let db = prepare_test_env(&random_db_path()).await;
    seed_user(&db, "u1", "Asha", "asha@example.com").await;
    seed_user(&db, "u2", "Ravi", "ravi@example.com").await;
    seed_item(&db, &course(), "Rust for the Web", MinorUnits::from(49900), "INR").await;
    db
}

/// Order `ord_abc123` for `u1` on course `c9`, opened through checkout exactly as the order endpoint would.
///
/// Checkout runs over a pool of its own that is closed before returning, so the requests under test only ever see an
/// order that was committed.
pub async fn open_order(db: &SqliteDatabase) -> Order {
    let mut gateway = MockFlakyGateway::new();
    gateway.expect_is_mock().return_const(false);
    gateway.expect_create_remote_order().times(1).returning(|amount, currency, receipt| {
        let raw = json!({ "id": "ord_abc123", "amount": amount.value(), "currency": currency, "receipt": receipt });
        Ok(RemoteOrder { gateway_order_id: "ord_abc123".into(), amount, currency: currency.to_string(), raw })
    });
    let mut writer = SqliteDatabase::new_with_url(db.url(), 1).await.expect("Error opening the checkout pool");
    let api = CheckoutApi::new(writer.clone(), gateway);
    let order = api.create_order("u1", course()).await.expect("Error opening order");
    drop(api);
    writer.close().await.expect("Error closing the checkout pool");
    order
}

pub fn flow_api(db: &SqliteDatabase) -> EnrollmentFlowApi<SqliteDatabase> {
    let verifiers = PaymentVerifiers::new(checkout_signer(), webhook_signer());
    EnrollmentFlowApi::new(db.clone(), verifiers, EventProducers::default())
}

pub fn flow_api_data(db: &SqliteDatabase) -> web::Data<EnrollmentFlowApi<SqliteDatabase>> {
    web::Data::new(flow_api(db))
}

pub async fn get_request<F>(auth_token: &str, path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let mut req = TestRequest::get().uri(path);
    if !auth_token.is_empty() {
        req = req.insert_header((header::AUTHORIZATION, format!("Bearer {auth_token}")));
    }
    send(req, configure).await
}

pub async fn post_request<F>(auth_token: &str, path: &str, body: Value, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let mut req = TestRequest::post().uri(path).set_json(body);
    if !auth_token.is_empty() {
        req = req.insert_header((header::AUTHORIZATION, format!("Bearer {auth_token}")));
    }
    send(req, configure).await
}

/// Posts a webhook delivery exactly as given, with `signature` in the signature header (if any).
pub async fn post_webhook<F>(body: Vec<u8>, signature: Option<&str>, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let mut req = TestRequest::post().uri("/webhook").insert_header(header::ContentType::json()).set_payload(body);
    if let Some(sig) = signature {
        req = req.insert_header(("X-Gateway-Signature", sig.to_string()));
    }
    send(req, configure).await
}

async fn send<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let verifier = TokenVerifier::new(&get_auth_config());
    let app = App::new().app_data(web::Data::new(verifier)).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}
