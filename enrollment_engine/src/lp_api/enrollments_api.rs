use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Enrollment, NewEnrollment, PurchasedItem},
    traits::{EnrollOutcome, EnrollmentManagement, PaymentGatewayError},
};

/// Read access to enrollments, plus the direct enrollment path used for grants that don't go through checkout.
pub struct EnrollmentsApi<B> {
    db: B,
}

impl<B> Debug for EnrollmentsApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EnrollmentsApi")
    }
}

impl<B> EnrollmentsApi<B>
where B: EnrollmentManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn enrollments_for_user(&self, user_id: &str) -> Result<Vec<Enrollment>, PaymentGatewayError> {
        self.db.fetch_enrollments_for_user(user_id).await
    }

    pub async fn is_enrolled(&self, user_id: &str, item: &PurchasedItem) -> Result<bool, PaymentGatewayError> {
        Ok(self.db.fetch_enrollment(user_id, item).await?.is_some())
    }

    /// Enrolls the user without an order, e.g. for a free course or a manual grant. Idempotent.
    pub async fn grant(&self, user_id: &str, item: PurchasedItem) -> Result<EnrollOutcome, PaymentGatewayError> {
        let outcome = self.db.enroll(NewEnrollment::new(user_id, item)).await?;
        if outcome.is_new() {
            info!("🔄️ {user_id} has been granted {}", outcome.enrollment().item);
        }
        Ok(outcome)
    }
}
