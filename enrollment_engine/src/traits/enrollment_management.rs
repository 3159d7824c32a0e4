use crate::{
    db_types::{Enrollment, NewEnrollment, PurchasedItem},
    traits::{EnrollOutcome, PaymentGatewayError},
};

#[allow(async_fn_in_trait)]
pub trait EnrollmentManagement {
    async fn fetch_enrollment(
        &self,
        user_id: &str,
        item: &PurchasedItem,
    ) -> Result<Option<Enrollment>, PaymentGatewayError>;

    async fn fetch_enrollments_for_user(&self, user_id: &str) -> Result<Vec<Enrollment>, PaymentGatewayError>;

    /// Enrolls the user in the item unless they already are.
    ///
    /// This is safe to call concurrently for the same `(user, item)` pair: exactly one caller sees
    /// [`EnrollOutcome::Created`], and everyone else gets the existing record back. An existing enrollment is never
    /// modified.
    async fn enroll(&self, enrollment: NewEnrollment) -> Result<EnrollOutcome, PaymentGatewayError>;
}
