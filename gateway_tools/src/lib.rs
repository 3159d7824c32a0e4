//! A thin REST client for the payment gateway's Orders and Payments APIs, plus the wire types for the gateway's
//! webhook payloads.
//!
//! Only the calls the checkout flow needs are implemented: opening an order before checkout and looking up a
//! payment after the fact for auditing.
mod api;
mod config;
mod error;

mod data_objects;

pub use api::GatewayApi;
pub use config::GatewayConfig;
pub use data_objects::{
    CreatedOrder,
    EntityWrapper,
    GatewayOrder,
    GatewayPayment,
    NewGatewayOrder,
    WebhookEvent,
    WebhookPayload,
    EVENT_ORDER_PAID,
    EVENT_PAYMENT_CAPTURED,
};
pub use error::GatewayApiError;
