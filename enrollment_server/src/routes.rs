//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every database and gateway call below is async for this reason.
//!
//! A note about the payment routes:
//! `/checkout/verify` and `/webhook` always answer with a `{success, message}` body, including on failure, because the
//! browser and the gateway both look for it. The status code tells the gateway whether to redeliver: 5xx means
//! "try again later", 4xx means "this delivery will never succeed".
use actix_web::{get, web, HttpRequest, HttpResponse, Responder, ResponseError};
use enrollment_engine::{
    gateway::PaymentGateway,
    payment_objects::{CheckoutConfirmation, ReconcileOutcome, UnverifiedPayment, WebhookDelivery},
    traits::{EnrollmentManagement, PaymentGatewayDatabase},
    CheckoutApi,
    EnrollmentFlowApi,
    EnrollmentsApi,
    ReconcileError,
};
use log::*;

use crate::{
    auth::AuthenticatedUser,
    data_objects::{CreateOrderRequest, CreateOrderResponse, JsonResponse, VerifyPaymentRequest},
    errors::ServerError,
};

/// The header carrying the hex HMAC-SHA256 of a webhook body.
pub const GATEWAY_SIGNATURE_HEADER: &str = "X-Gateway-Signature";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(create_order => Post "/checkout/order" impl PaymentGatewayDatabase, PaymentGateway);
/// Opens an order for a course or project on behalf of the signed-in user.
///
/// The price is taken from the catalog; the client only names the item. The response carries the gateway order id
/// that the browser hands to the checkout widget.
pub async fn create_order<B, G>(
    user: AuthenticatedUser,
    body: web::Json<CreateOrderRequest>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    let item = body.item();
    debug!("💻️ {} wants to buy {item}", user.user_id);
    let order = api.create_order(&user.user_id, item).await?;
    Ok(HttpResponse::Ok().json(CreateOrderResponse::from(order)))
}

route!(verify_payment => Post "/checkout/verify" impl PaymentGatewayDatabase);
/// The browser's confirmation that checkout completed. Replays of a confirmation that already went through are
/// reported as successful.
pub async fn verify_payment<B: PaymentGatewayDatabase>(
    user: AuthenticatedUser,
    body: web::Json<VerifyPaymentRequest>,
    api: web::Data<EnrollmentFlowApi<B>>,
) -> HttpResponse {
    let req = body.into_inner();
    debug!("💻️ Payment confirmation from {} for {}", user.user_id, req.gateway_order_id);
    let confirmation = CheckoutConfirmation {
        user_id: user.user_id,
        gateway_order_id: req.gateway_order_id.into(),
        gateway_payment_id: req.gateway_payment_id,
        signature: req.signature,
        internal_order_id: req.internal_order_id,
    };
    match api.reconcile(UnverifiedPayment::Checkout(confirmation)).await {
        Ok(ReconcileOutcome::Settled(settlement)) => HttpResponse::Ok().json(JsonResponse::success(settlement.message())),
        Ok(ReconcileOutcome::Ignored(event)) => HttpResponse::Ok().json(JsonResponse::success(event)),
        Err(e) => failure_response(e),
    }
}

route!(my_order => Get "/checkout/order/{order_id}" impl PaymentGatewayDatabase, PaymentGateway);
/// One of the caller's own orders, with the gateway's record of the payment if it has been paid.
pub async fn my_order<B, G>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    let order_id = path.into_inner();
    let audit = api.audit_order(&user.user_id, order_id).await?;
    Ok(HttpResponse::Ok().json(audit))
}

//----------------------------------------------   Enrollments  ----------------------------------------------------
route!(my_enrollments => Get "/enrollments" impl EnrollmentManagement);
pub async fn my_enrollments<B: EnrollmentManagement>(
    user: AuthenticatedUser,
    api: web::Data<EnrollmentsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let enrollments = api.enrollments_for_user(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(enrollments))
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(gateway_webhook => Post "/webhook" impl PaymentGatewayDatabase);
/// Webhook deliveries from the payment gateway.
///
/// The body is taken as raw bytes, since the signature covers the exact bytes sent. It is only parsed once the
/// signature checks out.
pub async fn gateway_webhook<B: PaymentGatewayDatabase>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<EnrollmentFlowApi<B>>,
) -> HttpResponse {
    let signature = req
        .headers()
        .get(GATEWAY_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .unwrap_or_else(|| {
            warn!("💻️ Webhook delivery without a {GATEWAY_SIGNATURE_HEADER} header");
            String::default()
        });
    trace!("💻️ Received a {} byte webhook delivery", body.len());
    let delivery = WebhookDelivery { body: body.to_vec(), signature };
    match api.reconcile(UnverifiedPayment::Webhook(delivery)).await {
        Ok(ReconcileOutcome::Settled(settlement)) => {
            let message = format!("Order {} settled", settlement.order.gateway_order_id);
            HttpResponse::Ok().json(JsonResponse::success(message))
        },
        Ok(ReconcileOutcome::Ignored(event)) => {
            HttpResponse::Ok().json(JsonResponse::success(format!("Event '{event}' ignored")))
        },
        Err(e) => {
            if e.is_retryable() {
                error!("💻️ Webhook delivery could not be processed and should be redelivered. {e}");
            } else {
                warn!("💻️ Webhook delivery rejected. {e}");
            }
            failure_response(e)
        },
    }
}

fn failure_response(e: ReconcileError) -> HttpResponse {
    let e = ServerError::from(e);
    HttpResponse::build(e.status_code()).json(JsonResponse::failure(e))
}
