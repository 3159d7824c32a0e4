//! The enrollment reconciler.
//!
//! Payment evidence reaches us twice for every purchase: once from the browser when the checkout widget completes,
//! and once from the gateway as a webhook. Either can arrive first, both can arrive at the same time, and the gateway
//! redelivers webhooks at will. Both paths funnel through [`EnrollmentFlowApi`], which
//!
//! 1. verifies the evidence (`Unverified → Verified`), mutating nothing if it is not authentic;
//! 2. finds the order and checks that the evidence really is for it;
//! 3. settles the order (`Verified → Finalized`): marks it paid and enrolls its owner in one atomic store call.
//!
//! The reconciler holds no locks of its own. Step 3 relies on the store's conditional update and on the unique
//! enrollment key, so any interleaving of the two paths, and any number of replays, leaves exactly one paid order and
//! one enrollment.
use std::fmt::Debug;

use gateway_tools::WebhookEvent;
use log::*;
use lp_common::MinorUnits;

use crate::{
    db_types::{GatewayOrderId, Order, PaymentDetails, PaymentSource},
    events::{EnrollmentCreatedEvent, EventProducers, OrderPaidEvent},
    helpers::PaymentVerifiers,
    lp_api::{
        errors::ReconcileError,
        payment_objects::{
            CheckoutConfirmation,
            ReconcileOutcome,
            Settlement,
            UnverifiedPayment,
            Verification,
            VerifiedPayment,
            WebhookDelivery,
        },
    },
    traits::{PaymentGatewayDatabase, SettlementRecord},
};

pub struct EnrollmentFlowApi<B> {
    db: B,
    verifiers: PaymentVerifiers,
    producers: EventProducers,
    accept_mock_payments: bool,
}

impl<B> Debug for EnrollmentFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EnrollmentFlowApi (mock payments accepted: {})", self.accept_mock_payments)
    }
}

impl<B> EnrollmentFlowApi<B> {
    pub fn new(db: B, verifiers: PaymentVerifiers, producers: EventProducers) -> Self {
        Self { db, verifiers, producers, accept_mock_payments: false }
    }

    /// In mock mode, confirmations for `order_mock_` orders are accepted without a signature. Outside mock mode they
    /// are refused, so that mock orders left over in the database can't be settled for free.
    pub fn with_mock_payments(mut self, accept: bool) -> Self {
        self.accept_mock_payments = accept;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Checks the signature on the payment evidence. No state is read or written.
    pub fn verify(&self, payment: UnverifiedPayment) -> Result<Verification, ReconcileError> {
        match payment {
            UnverifiedPayment::Checkout(confirmation) => self.verify_checkout(confirmation).map(Verification::Verified),
            UnverifiedPayment::Webhook(delivery) => self.verify_webhook(delivery),
        }
    }

    fn verify_checkout(&self, confirmation: CheckoutConfirmation) -> Result<VerifiedPayment, ReconcileError> {
        let order_id = confirmation.gateway_order_id.clone();
        if confirmation.gateway_payment_id.trim().is_empty() {
            return Err(ReconcileError::MalformedPayload("The gateway payment id is missing".into()));
        }
        if order_id.is_mock() {
            if !self.accept_mock_payments {
                warn!("🔐️ A mock payment confirmation for {order_id} was received, but mock mode is off. Rejecting it.");
                return Err(ReconcileError::InvalidSignature(order_id.to_string()));
            }
            debug!("🔐️ {order_id} is a mock order. Skipping signature verification.");
            return Ok(VerifiedPayment::from_checkout(confirmation, PaymentSource::Mock));
        }
        let verifier = self
            .verifiers
            .checkout
            .as_ref()
            .ok_or_else(|| ReconcileError::Configuration("The checkout signature secret is not set".into()))?;
        if !verifier.verify(order_id.as_str(), &confirmation.gateway_payment_id, &confirmation.signature) {
            warn!(
                "🔐️ Invalid checkout signature for order {order_id}, payment {} (user {})",
                confirmation.gateway_payment_id, confirmation.user_id
            );
            return Err(ReconcileError::InvalidSignature(order_id.to_string()));
        }
        trace!("🔐️ Checkout signature for {order_id} is valid");
        Ok(VerifiedPayment::from_checkout(confirmation, PaymentSource::Checkout))
    }

    fn verify_webhook(&self, delivery: WebhookDelivery) -> Result<Verification, ReconcileError> {
        let verifier = self
            .verifiers
            .webhook
            .as_ref()
            .ok_or_else(|| ReconcileError::Configuration("The webhook signature secret is not set".into()))?;
        if !verifier.verify(&delivery.body, &delivery.signature) {
            // Only for the log. Nothing in an unauthenticated body is trusted.
            let claimed = serde_json::from_slice::<WebhookEvent>(&delivery.body)
                .ok()
                .and_then(|ev| ev.gateway_order_id().map(String::from))
                .unwrap_or_else(|| "an unknown order".into());
            warn!("🔐️ Invalid webhook signature on a {} byte delivery claiming to be for {claimed}", delivery.body.len());
            return Err(ReconcileError::InvalidSignature(format!("webhook delivery for {claimed}")));
        }
        let raw = serde_json::from_slice::<serde_json::Value>(&delivery.body)
            .map_err(|e| ReconcileError::MalformedPayload(e.to_string()))?;
        let event = serde_json::from_value::<WebhookEvent>(raw.clone())
            .map_err(|e| ReconcileError::MalformedPayload(e.to_string()))?;
        if !event.is_settlement() {
            debug!("🔐️ Ignoring webhook event '{}'", event.event);
            return Ok(Verification::Ignored(event.event));
        }
        if let Some((order_id, paid_for)) = event.conflicting_order_ids() {
            warn!("🔐️ Webhook '{}' is for order {order_id}, but its payment is for {paid_for}", event.event);
            return Err(ReconcileError::MalformedPayload(format!(
                "'{}' names order {order_id}, but its payment belongs to {paid_for}",
                event.event
            )));
        }
        let order_id = event
            .gateway_order_id()
            .map(GatewayOrderId::from)
            .ok_or_else(|| ReconcileError::MalformedPayload(format!("'{}' carries no order reference", event.event)))?;
        let payment = event
            .payment()
            .ok_or_else(|| ReconcileError::MalformedPayload(format!("'{}' carries no payment entity", event.event)))?;
        trace!("🔐️ Webhook '{}' for {order_id} is authentic", event.event);
        let reported = Some((payment.amount, payment.currency.clone()));
        Ok(Verification::Verified(VerifiedPayment::from_webhook(order_id, payment.id.clone(), reported, raw)))
    }
}

impl<B> EnrollmentFlowApi<B>
where B: PaymentGatewayDatabase
{
    /// Verifies and, if the evidence is authentic, settles the payment.
    pub async fn reconcile(&self, payment: UnverifiedPayment) -> Result<ReconcileOutcome, ReconcileError> {
        match self.verify(payment)? {
            Verification::Verified(payment) => {
                let settlement = self.finalize(payment).await?;
                Ok(ReconcileOutcome::Settled(settlement))
            },
            Verification::Ignored(event) => Ok(ReconcileOutcome::Ignored(event)),
        }
    }

    /// Settles a verified payment against its order.
    ///
    /// Replays are not errors. If the order was already paid (by this payment or the other trigger path) the current
    /// state is returned with `newly_paid` and `newly_enrolled` both false.
    pub async fn finalize(&self, payment: VerifiedPayment) -> Result<Settlement, ReconcileError> {
        let order_id = payment.gateway_order_id().clone();
        let order = self.db.fetch_order_by_gateway_id(&order_id).await?.ok_or_else(|| {
            warn!("🔄️ A verified {} payment arrived for {order_id}, but no such order exists.", payment.source());
            ReconcileError::UnknownOrder(order_id.clone())
        })?;
        check_consistency(&order, &payment)?;
        let details = PaymentDetails::new(payment.payment_id(), payment.source(), payment.raw().clone());
        let SettlementRecord { order, newly_paid, enrollment } = self.db.settle_order(order.id, &details).await?;
        let newly_enrolled = enrollment.is_new();
        let enrollment = enrollment.enrollment().clone();
        info!(
            "🔄️ Order #{} [{order_id}] settled via {}. Newly paid: {newly_paid}. Enrollment #{} ({}).",
            order.id,
            payment.source(),
            enrollment.id,
            if newly_enrolled { "new" } else { "existing" }
        );
        if newly_paid {
            self.producers.publish_order_paid(OrderPaidEvent::new(order.clone(), payment.source())).await;
        }
        if newly_enrolled {
            let event = EnrollmentCreatedEvent::new(enrollment.clone(), order.clone());
            self.producers.publish_enrollment_created(event).await;
        }
        Ok(Settlement { order, enrollment, source: payment.source(), newly_paid, newly_enrolled })
    }
}

fn check_consistency(order: &Order, payment: &VerifiedPayment) -> Result<(), ReconcileError> {
    let mismatch = |reason: String| {
        warn!("🔄️ Rejecting {} payment {} for order #{}: {reason}", payment.source(), payment.payment_id(), order.id);
        ReconcileError::OrderMismatch { order: order.gateway_order_id.clone(), reason }
    };
    if let Some(internal_id) = payment.internal_order_id() {
        if internal_id != order.id {
            return Err(mismatch(format!("The confirmation names order #{internal_id}, not #{}", order.id)));
        }
    }
    if let Some(user) = payment.expected_user() {
        if user != order.user_id {
            return Err(mismatch(format!("User {user} does not own the order")));
        }
    }
    if let Some((amount, currency)) = payment.reported_amount() {
        if amount != order.amount || !currency.eq_ignore_ascii_case(&order.currency) {
            let expected = format!("{} {}", order.amount, order.currency);
            let paid = format!("{amount} {currency}");
            warn!("🔄️ Order #{} is for {expected}, but the gateway reports a payment of {paid}", order.id);
            return Err(ReconcileError::AmountMismatch { order: order.gateway_order_id.clone(), expected, paid });
        }
    }
    Ok(())
}
