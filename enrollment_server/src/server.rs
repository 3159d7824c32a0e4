use std::{path::Path, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use enrollment_engine::{
    events::{EnrollmentCreatedEvent, EventHandlers, EventHooks, EventProducers, OrderPaidEvent},
    gateway::{AnyGateway, PaymentGateway},
    helpers::PaymentVerifiers,
    notifier::{AnyMailer, EnrollmentNotifier},
    CheckoutApi,
    EnrollmentFlowApi,
    EnrollmentsApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    auth::TokenVerifier,
    config::ServerConfig,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    routes::{health, CreateOrderRoute, GatewayWebhookRoute, MyEnrollmentsRoute, MyOrderRoute, VerifyPaymentRoute},
};

const EVENT_BUFFER_SIZE: usize = 128;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    ensure_database_dir(&config.database_url)?;
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Database migration failed. {e}")))?;
    let gateway = AnyGateway::from_config(&config.gateway, config.force_mock_mode);
    if gateway.is_mock() {
        warn!("🚨️ The server is running in MOCK MODE. Payments are simulated and nobody is charged. 🚨️");
    }
    let verifiers = PaymentVerifiers::from_secrets(&config.gateway.key_secret, &config.gateway.webhook_secret);
    let mailer = AnyMailer::from_settings(config.mail.relay_url.as_deref(), &config.mail.from);
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, create_hooks(EnrollmentNotifier::new(db.clone(), mailer)));
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let _expiry_worker = start_expiry_worker(db.clone(), gateway.clone(), config.unpaid_order_timeout);
    let srv = create_server_instance(config, db, gateway, verifiers, producers)?;
    srv.await.map_err(|e| ServerError::InitializeError(e.to_string()))
}

/// Enrollment confirmations are sent from an event hook, off the request path. Whatever happens to the email, the
/// enrollment stands.
pub fn create_hooks(notifier: EnrollmentNotifier<SqliteDatabase, AnyMailer>) -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_paid(|ev: OrderPaidEvent| {
            Box::pin(async move {
                info!(
                    "📬️ Order #{} [{}] paid via {}: {} {} by {}",
                    ev.order.id, ev.order.gateway_order_id, ev.source, ev.order.amount, ev.order.currency, ev.order.user_id
                );
            })
        })
        .on_enrollment_created(move |ev: EnrollmentCreatedEvent| {
            let notifier = notifier.clone();
            Box::pin(async move {
                notifier.notify_enrollment(&ev.enrollment.user_id, &ev.enrollment.item).await;
            })
        });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: AnyGateway,
    verifiers: PaymentVerifiers,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let accept_mock_payments = gateway.is_mock();
    let srv = HttpServer::new(move || {
        let checkout_api = CheckoutApi::new(db.clone(), gateway.clone()).with_currency(config.currency.as_str());
        let flow_api = EnrollmentFlowApi::new(db.clone(), verifiers.clone(), producers.clone())
            .with_mock_payments(accept_mock_payments);
        let enrollments_api = EnrollmentsApi::new(db.clone());
        let token_verifier = TokenVerifier::new(&config.auth);
        let json_config = web::JsonConfig::default()
            .error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into());
        let api_scope = web::scope("/api")
            .service(CreateOrderRoute::<SqliteDatabase, AnyGateway>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase>::new())
            .service(MyOrderRoute::<SqliteDatabase, AnyGateway>::new())
            .service(MyEnrollmentsRoute::<SqliteDatabase>::new());
        let gateway_scope = web::scope("/gateway").service(GatewayWebhookRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("lps::access_log"))
            .app_data(json_config)
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(enrollments_api))
            .app_data(web::Data::new(token_verifier))
            .service(health)
            .service(api_scope)
            .service(gateway_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// SQLite creates the database file, but not the directory it lives in.
fn ensure_database_dir(url: &str) -> Result<(), ServerError> {
    let path = url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }
    match Path::new(path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            info!("🪛️ Creating database directory {}", dir.display());
            std::fs::create_dir_all(dir)?;
            Ok(())
        },
        _ => Ok(()),
    }
}
