use serde::Serialize;

use crate::db_types::{Enrollment, Order};

#[derive(Debug, Clone, Serialize)]
pub struct MarkPaidResult {
    pub order: Order,
    /// False when the order had already been paid and nothing was changed.
    pub newly_paid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "enrollment", rename_all = "snake_case")]
pub enum EnrollOutcome {
    Created(Enrollment),
    AlreadyEnrolled(Enrollment),
}

impl EnrollOutcome {
    pub fn enrollment(&self) -> &Enrollment {
        match self {
            EnrollOutcome::Created(e) | EnrollOutcome::AlreadyEnrolled(e) => e,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, EnrollOutcome::Created(_))
    }
}

/// The result of settling an order: the order as it now stands, and the enrollment it grants.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementRecord {
    pub order: Order,
    pub newly_paid: bool,
    pub enrollment: EnrollOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExpiryResult {
    pub expired: Vec<Order>,
}

impl ExpiryResult {
    pub fn new(expired: Vec<Order>) -> Self {
        Self { expired }
    }

    pub fn count(&self) -> usize {
        self.expired.len()
    }
}
