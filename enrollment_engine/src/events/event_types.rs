use serde::Serialize;

use crate::db_types::{Enrollment, Order, PaymentSource};

/// Raised the first time an order is marked as paid. Replays of the same payment do not raise it again.
#[derive(Debug, Clone, Serialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub source: PaymentSource,
}

impl OrderPaidEvent {
    pub fn new(order: Order, source: PaymentSource) -> Self {
        Self { order, source }
    }
}

/// Raised when a settlement created a brand-new enrollment. The email notifier listens for this.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentCreatedEvent {
    pub enrollment: Enrollment,
    pub order: Order,
}

impl EnrollmentCreatedEvent {
    pub fn new(enrollment: Enrollment, order: Order) -> Self {
        Self { enrollment, order }
    }
}
