use actix_web::{http::StatusCode, web};
use enrollment_engine::{
    gateway::{GatewayError, MockGateway},
    test_utils::prepare_env::{count_enrollments, count_orders},
    CheckoutApi,
    EnrollmentsApi,
    SqliteDatabase,
};
use serde_json::{json, Value};

use super::{
    helpers::{
        checkout_signer,
        course,
        flow_api_data,
        get_request,
        issue_token,
        open_order,
        post_request,
        seeded_db,
    },
    mocks::MockFlakyGateway,
};
use crate::{
    data_objects::JsonResponse,
    routes::{CreateOrderRoute, MyEnrollmentsRoute, MyOrderRoute, VerifyPaymentRoute},
};

fn mock_checkout(db: &SqliteDatabase) -> web::Data<CheckoutApi<SqliteDatabase, MockGateway>> {
    web::Data::new(CheckoutApi::new(db.clone(), MockGateway))
}

fn buy_c9() -> Value {
    json!({ "itemId": "c9", "itemType": "course" })
}

#[actix_web::test]
async fn create_order_requires_a_token() {
    let db = seeded_db().await;
    let api = mock_checkout(&db);
    let (status, _) = post_request("", "/checkout/order", buy_c9(), |cfg| {
        cfg.app_data(api).service(CreateOrderRoute::<SqliteDatabase, MockGateway>::new());
    })
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let api = mock_checkout(&db);
    let (status, body) = post_request("not.a.token", "/checkout/order", buy_c9(), |cfg| {
        cfg.app_data(api).service(CreateOrderRoute::<SqliteDatabase, MockGateway>::new());
    })
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Access token"));
    assert_eq!(count_orders(&db).await, 0);
}

#[actix_web::test]
async fn create_order_in_mock_mode() {
    let db = seeded_db().await;
    let api = mock_checkout(&db);
    let token = issue_token("u1");
    let (status, body) = post_request(&token, "/checkout/order", buy_c9(), |cfg| {
        cfg.app_data(api).service(CreateOrderRoute::<SqliteDatabase, MockGateway>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let res: Value = serde_json::from_str(&body).unwrap();
    assert!(res["gatewayOrderId"].as_str().unwrap().starts_with("order_mock_"));
    assert_eq!(res["amount"], 49900);
    assert_eq!(res["currency"], "INR");
    assert_eq!(res["isMock"], true);
    assert!(res["internalOrderId"].as_i64().unwrap() > 0);
    assert_eq!(count_orders(&db).await, 1);
}

#[actix_web::test]
async fn gateway_outages_are_reported_as_unavailable() {
    let db = seeded_db().await;
    let mut gateway = MockFlakyGateway::new();
    gateway.expect_is_mock().return_const(false);
    gateway
        .expect_create_remote_order()
        .times(1)
        .returning(|_, _, _| Err(GatewayError::Unavailable("connection reset".into())));
    let api = web::Data::new(CheckoutApi::new(db.clone(), gateway));
    let token = issue_token("u1");
    let (status, body) = post_request(&token, "/checkout/order", buy_c9(), |cfg| {
        cfg.app_data(api).service(CreateOrderRoute::<SqliteDatabase, MockFlakyGateway>::new());
    })
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.contains("connection reset"));
    assert_eq!(count_orders(&db).await, 0);
}

#[actix_web::test]
async fn create_order_for_bad_items() {
    let db = seeded_db().await;
    let token = issue_token("u1");
    let api = mock_checkout(&db);
    let body = json!({ "itemId": "c404", "itemType": "course" });
    let (status, _) = post_request(&token, "/checkout/order", body, |cfg| {
        cfg.app_data(api).service(CreateOrderRoute::<SqliteDatabase, MockGateway>::new());
    })
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let api = mock_checkout(&db);
    let body = json!({ "itemId": "c9", "itemType": "book" });
    let (status, _) = post_request(&token, "/checkout/order", body, |cfg| {
        cfg.app_data(api).service(CreateOrderRoute::<SqliteDatabase, MockGateway>::new());
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(count_orders(&db).await, 0);
}

#[actix_web::test]
async fn verify_payment_enrolls_the_buyer() {
    let db = seeded_db().await;
    let order = open_order(&db).await;
    let token = issue_token("u1");
    let signature = checkout_signer().sign("ord_abc123", "pay_1");
    let body = json!({
        "gatewayOrderId": "ord_abc123",
        "gatewayPaymentId": "pay_1",
        "signature": signature,
        "internalOrderId": order.id,
    });
    let api = flow_api_data(&db);
    let (status, res) = post_request(&token, "/checkout/verify", body.clone(), |cfg| {
        cfg.app_data(api).service(VerifyPaymentRoute::<SqliteDatabase>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let res: JsonResponse = serde_json::from_str(&res).unwrap();
    assert!(res.success);
    assert_eq!(count_enrollments(&db, "u1", &course()).await, 1);

    // The browser retries. Nothing changes, and it is still a success.
    let api = flow_api_data(&db);
    let (status, res) = post_request(&token, "/checkout/verify", body, |cfg| {
        cfg.app_data(api).service(VerifyPaymentRoute::<SqliteDatabase>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let res: JsonResponse = serde_json::from_str(&res).unwrap();
    assert!(res.success);
    assert_eq!(count_enrollments(&db, "u1", &course()).await, 1);
}

#[actix_web::test]
async fn verify_payment_failures() {
    let db = seeded_db().await;
    let _order = open_order(&db).await;
    let u1 = issue_token("u1");
    let signature = checkout_signer().sign("ord_abc123", "pay_1");

    let mut tampered = signature.clone();
    tampered.replace_range(0..1, if tampered.starts_with('0') { "1" } else { "0" });
    let cases = [
        (&u1, json!({ "gatewayOrderId": "ord_abc123", "gatewayPaymentId": "pay_1", "signature": tampered }), 400),
        (&u1, json!({ "gatewayOrderId": "ord_abc123", "gatewayPaymentId": "pay_1" }), 400),
        (&u1, json!({ "gatewayOrderId": "ord_abc123", "gatewayPaymentId": "pay_2", "signature": signature }), 400),
        (
            &u1,
            json!({ "gatewayOrderId": "ord_zzz", "gatewayPaymentId": "pay_1",
                    "signature": checkout_signer().sign("ord_zzz", "pay_1") }),
            404,
        ),
    ];
    for (token, body, expected) in cases {
        let api = flow_api_data(&db);
        let (status, res) = post_request(token, "/checkout/verify", body, |cfg| {
            cfg.app_data(api).service(VerifyPaymentRoute::<SqliteDatabase>::new());
        })
        .await;
        assert_eq!(status.as_u16(), expected, "{res}");
        let res: JsonResponse = serde_json::from_str(&res).unwrap();
        assert!(!res.success);
    }

    // A valid signature, presented by somebody else
    let u2 = issue_token("u2");
    let api = flow_api_data(&db);
    let body = json!({ "gatewayOrderId": "ord_abc123", "gatewayPaymentId": "pay_1", "signature": signature });
    let (status, _) = post_request(&u2, "/checkout/verify", body, |cfg| {
        cfg.app_data(api).service(VerifyPaymentRoute::<SqliteDatabase>::new());
    })
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(count_enrollments(&db, "u1", &course()).await, 0);
    assert_eq!(count_enrollments(&db, "u2", &course()).await, 0);
}

#[actix_web::test]
async fn order_audit_and_enrollments() {
    let db = seeded_db().await;
    let order = open_order(&db).await;
    let flow = flow_api_data(&db);
    let token = issue_token("u1");
    let body = json!({
        "gatewayOrderId": "ord_abc123",
        "gatewayPaymentId": "pay_1",
        "signature": checkout_signer().sign("ord_abc123", "pay_1"),
    });
    let (status, _) = post_request(&token, "/checkout/verify", body, |cfg| {
        cfg.app_data(flow).service(VerifyPaymentRoute::<SqliteDatabase>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);

    let mut gateway = MockFlakyGateway::new();
    gateway.expect_is_mock().return_const(false);
    gateway
        .expect_fetch_remote_payment()
        .withf(|id| id == "pay_1")
        .times(1)
        .returning(|id| Ok(json!({ "id": id, "status": "captured", "amount": 49900 })));
    let api = web::Data::new(CheckoutApi::new(db.clone(), gateway));
    let path = format!("/checkout/order/{}", order.id);
    let (status, res) = get_request(&token, &path, |cfg| {
        cfg.app_data(api).service(MyOrderRoute::<SqliteDatabase, MockFlakyGateway>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let audit: Value = serde_json::from_str(&res).unwrap();
    assert_eq!(audit["order"]["status"], "Paid");
    assert_eq!(audit["order"]["paymentId"], "pay_1");
    assert_eq!(audit["remotePayment"]["status"], "captured");

    // Somebody else's order is just not there
    let api = mock_checkout(&db);
    let (status, _) = get_request(&issue_token("u2"), &path, |cfg| {
        cfg.app_data(api).service(MyOrderRoute::<SqliteDatabase, MockGateway>::new());
    })
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let api = web::Data::new(EnrollmentsApi::new(db.clone()));
    let (status, res) = get_request(&token, "/enrollments", |cfg| {
        cfg.app_data(api).service(MyEnrollmentsRoute::<SqliteDatabase>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let enrollments: Vec<Value> = serde_json::from_str(&res).unwrap();
    assert_eq!(enrollments.len(), 1);
    assert_eq!(enrollments[0]["itemType"], "course");
    assert_eq!(enrollments[0]["itemId"], "c9");

    let api = web::Data::new(EnrollmentsApi::new(db.clone()));
    let (status, res) = get_request(&issue_token("u2"), "/enrollments", |cfg| {
        cfg.app_data(api).service(MyEnrollmentsRoute::<SqliteDatabase>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res, "[]");
}
