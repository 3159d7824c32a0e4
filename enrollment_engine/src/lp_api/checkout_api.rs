use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;
use lp_common::DEFAULT_CURRENCY_CODE;

use crate::{
    db_types::{NewOrder, Order, PurchasedItem},
    gateway::{GatewayError, PaymentGateway},
    lp_api::{errors::CheckoutError, payment_objects::OrderAudit},
    traits::{ExpiryResult, PaymentGatewayDatabase, PaymentGatewayError},
};

/// `CheckoutApi` starts purchases. It prices the item from the catalog, opens an order with the gateway, and
/// persists the order so that the reconciler can settle it later.
pub struct CheckoutApi<B, G> {
    db: B,
    gateway: G,
    currency: String,
}

impl<B, G> Debug for CheckoutApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi ({})", self.currency)
    }
}

impl<B, G> CheckoutApi<B, G> {
    pub fn new(db: B, gateway: G) -> Self {
        Self { db, gateway, currency: DEFAULT_CURRENCY_CODE.to_string() }
    }

    /// Sets the currency orders are placed in. Items priced in any other currency cannot be bought.
    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn currency(&self) -> &str {
        self.currency.as_str()
    }
}

impl<B, G> CheckoutApi<B, G>
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    pub fn is_mock(&self) -> bool {
        self.gateway.is_mock()
    }

    /// Opens an order for `item` on behalf of `user_id`.
    ///
    /// The price always comes from the catalog. If the gateway call fails, nothing is stored.
    pub async fn create_order(&self, user_id: &str, item: PurchasedItem) -> Result<Order, CheckoutError> {
        if self.db.fetch_user(user_id).await?.is_none() {
            return Err(CheckoutError::UnknownUser(user_id.to_string()));
        }
        let details = self.db.fetch_catalog_item(&item).await?.ok_or_else(|| CheckoutError::ItemNotFound(item.clone()))?;
        if !details.price.is_positive() {
            return Err(CheckoutError::NotPayable(item, format!("The price is {}", details.price)));
        }
        if !details.currency.eq_ignore_ascii_case(&self.currency) {
            let reason = format!("It is priced in {}, but checkout is in {}", details.currency, self.currency);
            return Err(CheckoutError::NotPayable(item, reason));
        }
        if let Some(enrollment) = self.db.fetch_enrollment(user_id, &item).await? {
            debug!("🔄️ {user_id} tried to buy {item}, but is already enrolled (#{})", enrollment.id);
            return Err(CheckoutError::AlreadyEnrolled(item));
        }
        let receipt = new_receipt();
        let remote = self.gateway.create_remote_order(details.price, &self.currency, &receipt).await.map_err(|e| {
            warn!("🔄️ Could not open a gateway order for {user_id} / {item}. {e}");
            e
        })?;
        if remote.amount != details.price {
            let msg = format!("Asked for an order of {} but the gateway opened one for {}", details.price, remote.amount);
            warn!("🔄️ {msg}");
            return Err(GatewayError::Rejected(msg).into());
        }
        let order =
            NewOrder::new(user_id, item, remote.gateway_order_id, details.price, self.currency.as_str());
        let order = self.db.insert_order(order).await?;
        info!(
            "🔄️ Order #{} [{}] opened for {} ({}, {} {}{})",
            order.id,
            order.gateway_order_id,
            order.user_id,
            order.item,
            order.amount,
            order.currency,
            if order.is_mock { ", mock" } else { "" }
        );
        Ok(order)
    }

    /// Fetches one of the user's orders. Other users' orders are reported as not found.
    pub async fn order_for_user(&self, user_id: &str, order_id: i64) -> Result<Order, CheckoutError> {
        match self.db.fetch_order_by_id(order_id).await? {
            Some(order) if order.user_id == user_id => Ok(order),
            _ => Err(CheckoutError::OrderNotFound(order_id)),
        }
    }

    /// Fetches one of the user's orders, together with the gateway's record of the payment that settled it.
    ///
    /// The gateway lookup is best-effort: if it fails, the order is returned without it.
    pub async fn audit_order(&self, user_id: &str, order_id: i64) -> Result<OrderAudit, CheckoutError> {
        let order = self.order_for_user(user_id, order_id).await?;
        let remote_payment = match order.payment_id.as_deref() {
            Some(payment_id) if order.is_paid() && !order.is_mock => match self.gateway.fetch_remote_payment(payment_id).await {
                Ok(payment) => Some(payment),
                Err(e) => {
                    warn!("🔄️ Could not fetch payment {payment_id} for order #{order_id} from the gateway. {e}");
                    None
                },
            },
            _ => None,
        };
        Ok(OrderAudit { order, remote_payment })
    }

    /// Marks orders that have been waiting for payment for longer than `older_than` as expired.
    ///
    /// Expiry is advisory. An expired order can still be settled by a verified payment.
    pub async fn expire_stale_orders(&self, older_than: Duration) -> Result<ExpiryResult, PaymentGatewayError> {
        let result = self.db.expire_stale_orders(older_than).await?;
        for order in &result.expired {
            info!("🔄️ Order #{} [{}] for {} has expired unpaid", order.id, order.gateway_order_id, order.user_id);
        }
        Ok(result)
    }
}

/// Our reference for the gateway order. Gateways cap receipts at 40 characters.
fn new_receipt() -> String {
    format!("rcpt_{}_{:06x}", Utc::now().timestamp_millis(), rand::random::<u32>() & 0xff_ffff)
}
