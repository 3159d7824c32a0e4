//! # Payment signatures
//!
//! The gateway proves that a payment happened by signing it with a secret we share with it. There are two signatures
//! in play, and each has its own secret:
//!
//! * The **checkout signature** is handed to the browser when the checkout widget completes, and the browser posts it
//!   back to us. It is an HMAC-SHA256 over
//!
//!   ```text
//!      {gateway_order_id}|{gateway_payment_id}
//!   ```
//!
//!   keyed with the API key secret.
//! * The **webhook signature** arrives in the `X-Gateway-Signature` header of a webhook delivery. It is an
//!   HMAC-SHA256 over the raw request body, keyed with the webhook secret.
//!
//! Both are hex encoded. The two verifiers are distinct types so that one secret can't be used where the other is
//! expected. Comparison is constant-time, and anything that isn't a well-formed signature is simply invalid.
use hmac::{Hmac, Mac};
use log::*;
use lp_common::Secret;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("The {0} secret has not been configured")]
    MissingSecret(&'static str),
}

#[derive(Clone)]
pub struct CheckoutSignatureVerifier {
    secret: Secret<String>,
}

impl CheckoutSignatureVerifier {
    pub fn new(secret: &Secret<String>) -> Result<Self, SignatureError> {
        if secret.is_blank() {
            return Err(SignatureError::MissingSecret("checkout"));
        }
        Ok(Self { secret: secret.clone() })
    }

    pub fn message(gateway_order_id: &str, gateway_payment_id: &str) -> String {
        format!("{gateway_order_id}|{gateway_payment_id}")
    }

    pub fn verify(&self, gateway_order_id: &str, gateway_payment_id: &str, signature: &str) -> bool {
        let message = Self::message(gateway_order_id, gateway_payment_id);
        verify_hmac(self.secret.reveal().as_bytes(), message.as_bytes(), signature)
    }

    /// Produces the signature the gateway would hand the browser. Mostly useful for tests and local tooling.
    pub fn sign(&self, gateway_order_id: &str, gateway_payment_id: &str) -> String {
        let message = Self::message(gateway_order_id, gateway_payment_id);
        sign_hmac(self.secret.reveal().as_bytes(), message.as_bytes())
    }
}

impl std::fmt::Debug for CheckoutSignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutSignatureVerifier({})", self.secret)
    }
}

#[derive(Clone)]
pub struct WebhookSignatureVerifier {
    secret: Secret<String>,
}

impl WebhookSignatureVerifier {
    pub fn new(secret: &Secret<String>) -> Result<Self, SignatureError> {
        if secret.is_blank() {
            return Err(SignatureError::MissingSecret("webhook"));
        }
        Ok(Self { secret: secret.clone() })
    }

    pub fn verify(&self, body: &[u8], signature: &str) -> bool {
        verify_hmac(self.secret.reveal().as_bytes(), body, signature)
    }

    pub fn sign(&self, body: &[u8]) -> String {
        sign_hmac(self.secret.reveal().as_bytes(), body)
    }
}

impl std::fmt::Debug for WebhookSignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WebhookSignatureVerifier({})", self.secret)
    }
}

/// The pair of verifiers used by the reconciler. Either may be absent, in which case payments arriving through the
/// corresponding path are refused with a configuration error rather than accepted unchecked.
#[derive(Debug, Clone, Default)]
pub struct PaymentVerifiers {
    pub checkout: Option<CheckoutSignatureVerifier>,
    pub webhook: Option<WebhookSignatureVerifier>,
}

impl PaymentVerifiers {
    pub fn new(checkout: CheckoutSignatureVerifier, webhook: WebhookSignatureVerifier) -> Self {
        Self { checkout: Some(checkout), webhook: Some(webhook) }
    }

    /// Builds whichever verifiers the secrets allow, warning about the ones that are missing.
    pub fn from_secrets(key_secret: &Secret<String>, webhook_secret: &Secret<String>) -> Self {
        let checkout = CheckoutSignatureVerifier::new(key_secret)
            .map_err(|e| warn!("🔐️ {e}. Live checkout confirmations will be refused."))
            .ok();
        let webhook = WebhookSignatureVerifier::new(webhook_secret)
            .map_err(|e| warn!("🔐️ {e}. Webhook deliveries will be refused."))
            .ok();
        Self { checkout, webhook }
    }
}

fn verify_hmac(key: &[u8], message: &[u8], signature: &str) -> bool {
    let signature = signature.trim();
    if signature.is_empty() {
        return false;
    }
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(message);
    mac.verify_slice(&expected).is_ok()
}

fn sign_hmac(key: &[u8], message: &[u8]) -> String {
    // HMAC accepts keys of any length, so a failure here means an empty signature, which never verifies.
    match HmacSha256::new_from_slice(key) {
        Ok(mut mac) => {
            mac.update(message);
            hex::encode(mac.finalize().into_bytes())
        },
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn checkout() -> CheckoutSignatureVerifier {
        CheckoutSignatureVerifier::new(&Secret::new("checkout-secret".to_string())).unwrap()
    }

    fn webhook() -> WebhookSignatureVerifier {
        WebhookSignatureVerifier::new(&Secret::new("webhook-secret".to_string())).unwrap()
    }

    fn flip_bit(sig: &str, bit: usize) -> String {
        let mut bytes = hex::decode(sig).unwrap();
        bytes[bit / 8] ^= 1 << (bit % 8);
        hex::encode(bytes)
    }

    #[test]
    fn known_vector() {
        // echo -n "ord_abc123|pay_1" | openssl dgst -sha256 -hmac "checkout-secret"
        let v = checkout();
        let sig = v.sign("ord_abc123", "pay_1");
        assert_eq!(sig, "55bc2e7984ab9d15350602eb0c891d799fbbad3c9d114e4bc0a4c075372fca7c");
        assert!(v.verify("ord_abc123", "pay_1", &sig));
        assert!(v.verify("ord_abc123", "pay_1", &sig.to_uppercase()));
        assert!(!v.verify("ord_abc123", "pay_2", &sig));
        assert!(!v.verify("ord_abc124", "pay_1", &sig));
    }

    #[test]
    fn any_flipped_bit_is_rejected() {
        let v = checkout();
        let sig = v.sign("ord_abc123", "pay_1");
        for bit in 0..256 {
            assert!(!v.verify("ord_abc123", "pay_1", &flip_bit(&sig, bit)), "bit {bit} was not detected");
        }
        let w = webhook();
        let body = br#"{"event":"payment.captured"}"#;
        let sig = w.sign(body);
        for bit in 0..256 {
            assert!(!w.verify(body, &flip_bit(&sig, bit)), "bit {bit} was not detected");
        }
    }

    #[test]
    fn malformed_signatures() {
        let v = checkout();
        let sig = v.sign("ord_abc123", "pay_1");
        assert!(!v.verify("ord_abc123", "pay_1", ""));
        assert!(!v.verify("ord_abc123", "pay_1", "   "));
        assert!(!v.verify("ord_abc123", "pay_1", "not-hex"));
        assert!(!v.verify("ord_abc123", "pay_1", &sig[..62]));
        assert!(!v.verify("ord_abc123", "pay_1", &format!("{sig}00")));
    }

    #[test]
    fn secrets_are_not_interchangeable() {
        let shared = Secret::new("same-secret".to_string());
        let c = CheckoutSignatureVerifier::new(&Secret::new("checkout-secret".to_string())).unwrap();
        let w = WebhookSignatureVerifier::new(&Secret::new("webhook-secret".to_string())).unwrap();
        let message = CheckoutSignatureVerifier::message("ord_abc123", "pay_1");
        let client_sig = c.sign("ord_abc123", "pay_1");
        assert!(!w.verify(message.as_bytes(), &client_sig));
        let hook_sig = w.sign(message.as_bytes());
        assert!(!c.verify("ord_abc123", "pay_1", &hook_sig));
        // Same secret, same message: the constructions agree, which is why deployments must use distinct secrets
        let c = CheckoutSignatureVerifier::new(&shared).unwrap();
        let w = WebhookSignatureVerifier::new(&shared).unwrap();
        assert_eq!(c.sign("a", "b"), w.sign(b"a|b"));
    }

    #[test]
    fn missing_secrets() {
        let blank = Secret::new(String::new());
        assert_eq!(CheckoutSignatureVerifier::new(&blank).unwrap_err(), SignatureError::MissingSecret("checkout"));
        let blank = Secret::new("  ".to_string());
        assert_eq!(WebhookSignatureVerifier::new(&blank).unwrap_err(), SignatureError::MissingSecret("webhook"));
    }

    #[test]
    fn verifiers_from_secrets() {
        let v = PaymentVerifiers::from_secrets(&Secret::new("k".to_string()), &Secret::default());
        assert!(v.checkout.is_some());
        assert!(v.webhook.is_none());
    }

    #[test]
    fn debug_hides_secret() {
        assert!(!format!("{:?}", checkout()).contains("checkout-secret"));
    }
}
