use actix_web::{http::StatusCode, web};
use enrollment_engine::{
    db_types::OrderStatusType,
    events::EventProducers,
    helpers::PaymentVerifiers,
    test_utils::prepare_env::count_enrollments,
    traits::OrderManagement,
    EnrollmentFlowApi,
    SqliteDatabase,
};
use serde_json::json;

use super::helpers::{course, flow_api_data, open_order, post_webhook, seeded_db, webhook_signer};
use crate::{data_objects::JsonResponse, routes::GatewayWebhookRoute};

fn captured(order_id: &str, amount: i64) -> Vec<u8> {
    json!({
        "entity": "event",
        "event": "payment.captured",
        "payload": { "payment": { "entity": {
            "id": "pay_1", "order_id": order_id, "amount": amount, "currency": "INR", "status": "captured",
            "captured": true
        }}},
        "created_at": 1718000000
    })
    .to_string()
    .into_bytes()
}

fn parse(body: &str) -> JsonResponse {
    serde_json::from_str(body).expect("Webhook responses are always {success, message}")
}

#[actix_web::test]
async fn valid_delivery_settles_the_order() {
    let db = seeded_db().await;
    let order = open_order(&db).await;
    let body = captured("ord_abc123", 49900);
    let signature = webhook_signer().sign(&body);
    let api = flow_api_data(&db);
    let (status, res) = post_webhook(body.clone(), Some(&signature), |cfg| {
        cfg.app_data(api).service(GatewayWebhookRoute::<SqliteDatabase>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let res = parse(&res);
    assert!(res.success);
    assert_eq!(res.message, "Order ord_abc123 settled");
    let order = db.fetch_order_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Paid);
    assert_eq!(count_enrollments(&db, "u1", &course()).await, 1);

    // Redelivery
    let api = flow_api_data(&db);
    let (status, _) = post_webhook(body, Some(&signature), |cfg| {
        cfg.app_data(api).service(GatewayWebhookRoute::<SqliteDatabase>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(count_enrollments(&db, "u1", &course()).await, 1);
}

#[actix_web::test]
async fn unsigned_or_forged_deliveries_are_rejected() {
    let db = seeded_db().await;
    let order = open_order(&db).await;
    let body = captured("ord_abc123", 49900);
    let forged = webhook_signer().sign(&captured("ord_abc123", 100));
    for signature in [None, Some(""), Some("not-hex"), Some(forged.as_str())] {
        let api = flow_api_data(&db);
        let (status, res) = post_webhook(body.clone(), signature, |cfg| {
            cfg.app_data(api).service(GatewayWebhookRoute::<SqliteDatabase>::new());
        })
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{signature:?}");
        assert!(!parse(&res).success);
    }
    let order = db.fetch_order_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Created);
    assert_eq!(count_enrollments(&db, "u1", &course()).await, 0);
}

#[actix_web::test]
async fn other_events_are_acknowledged() {
    let db = seeded_db().await;
    let _order = open_order(&db).await;
    let body = json!({ "event": "payment.failed", "payload": { "payment": { "entity": {
        "id": "pay_9", "order_id": "ord_abc123", "amount": 49900, "currency": "INR", "status": "failed"
    }}}})
    .to_string()
    .into_bytes();
    let signature = webhook_signer().sign(&body);
    let api = flow_api_data(&db);
    let (status, res) = post_webhook(body, Some(&signature), |cfg| {
        cfg.app_data(api).service(GatewayWebhookRoute::<SqliteDatabase>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let res = parse(&res);
    assert!(res.success);
    assert_eq!(res.message, "Event 'payment.failed' ignored");
    assert_eq!(count_enrollments(&db, "u1", &course()).await, 0);
}

#[actix_web::test]
async fn deliveries_that_will_never_succeed() {
    let db = seeded_db().await;
    let _order = open_order(&db).await;

    let orphan = captured("ord_nobody", 49900);
    let garbage = b"{\"event\": \"payment.captured\", \"payload\": ".to_vec();
    for (body, expected) in [(orphan, StatusCode::NOT_FOUND), (garbage, StatusCode::BAD_REQUEST)] {
        let signature = webhook_signer().sign(&body);
        let api = flow_api_data(&db);
        let (status, res) = post_webhook(body, Some(&signature), |cfg| {
            cfg.app_data(api).service(GatewayWebhookRoute::<SqliteDatabase>::new());
        })
        .await;
        assert_eq!(status, expected, "{res}");
        assert!(!parse(&res).success);
    }
    assert_eq!(count_enrollments(&db, "u1", &course()).await, 0);
}

#[actix_web::test]
async fn missing_webhook_secret_asks_for_redelivery() {
    let db = seeded_db().await;
    let _order = open_order(&db).await;
    let body = captured("ord_abc123", 49900);
    let signature = webhook_signer().sign(&body);
    let api = web::Data::new(EnrollmentFlowApi::new(db.clone(), PaymentVerifiers::default(), EventProducers::default()));
    let (status, res) = post_webhook(body, Some(&signature), |cfg| {
        cfg.app_data(api).service(GatewayWebhookRoute::<SqliteDatabase>::new());
    })
    .await;
    assert!(status.is_server_error());
    assert!(!parse(&res).success);
    assert_eq!(count_enrollments(&db, "u1", &course()).await, 0);
}
