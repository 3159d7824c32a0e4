use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Enrollment, NewEnrollment, PurchasedItem},
    traits::{EnrollOutcome, PaymentGatewayError},
};

/// Inserts the enrollment, unless the user is already enrolled in the item, in which case the existing record is
/// returned untouched.
///
/// The check and the insert are a single statement (`ON CONFLICT DO NOTHING`), so concurrent callers can't both
/// create a record.
pub async fn insert_if_absent(
    enrollment: NewEnrollment,
    conn: &mut SqliteConnection,
) -> Result<EnrollOutcome, PaymentGatewayError> {
    let inserted: Option<Enrollment> = sqlx::query_as(
        r#"
            INSERT INTO enrollments (user_id, course_id, project_id, order_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(enrollment.user_id.as_str())
    .bind(enrollment.item.course_id())
    .bind(enrollment.item.project_id())
    .bind(enrollment.order_id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .next();
    if let Some(e) = inserted {
        debug!("🗃️ Enrollment #{} created for {} in {}", e.id, e.user_id, e.item);
        return Ok(EnrollOutcome::Created(e));
    }
    let existing = fetch_enrollment(&enrollment.user_id, &enrollment.item, conn).await?.ok_or_else(|| {
        PaymentGatewayError::DatabaseError(format!(
            "Enrollment for {} in {} was neither created nor found",
            enrollment.user_id, enrollment.item
        ))
    })?;
    debug!("🗃️ {} is already enrolled in {} (enrollment #{})", existing.user_id, existing.item, existing.id);
    Ok(EnrollOutcome::AlreadyEnrolled(existing))
}

pub async fn fetch_enrollment(
    user_id: &str,
    item: &PurchasedItem,
    conn: &mut SqliteConnection,
) -> Result<Option<Enrollment>, sqlx::Error> {
    let q = match item {
        PurchasedItem::Course(_) => "SELECT * FROM enrollments WHERE user_id = $1 AND course_id = $2",
        PurchasedItem::Project(_) => "SELECT * FROM enrollments WHERE user_id = $1 AND project_id = $2",
    };
    let enrollment = sqlx::query_as(q).bind(user_id).bind(item.id()).fetch_optional(conn).await?;
    Ok(enrollment)
}

pub async fn fetch_enrollments_for_user(
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Enrollment>, sqlx::Error> {
    let enrollments = sqlx::query_as("SELECT * FROM enrollments WHERE user_id = $1 ORDER BY enrollment_date, id")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(enrollments)
}
