mod mock_gate;
mod payment_signature;

pub use mock_gate::{is_mock_order, new_mock_order_id, MOCK_ORDER_PREFIX};
pub use payment_signature::{
    CheckoutSignatureVerifier,
    PaymentVerifiers,
    SignatureError,
    WebhookSignatureVerifier,
};
