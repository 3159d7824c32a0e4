//! # Enrollment engine public API
//!
//! The `lp_api` module exposes the programmatic API of the enrollment engine. Each API is created by supplying the
//! backends it needs, so callers pick only what they use.
//!
//! * [`checkout_api`] opens orders with the payment gateway and persists them. It also runs the unpaid-order expiry
//!   sweep.
//! * [`enrollment_flow_api`] is the reconciler. It turns payment evidence (from the client or from a webhook) into a
//!   paid order and an enrollment, exactly once.
//! * [`enrollments_api`] answers questions about a user's enrollments.
//!
//! ```rust,ignore
//! use enrollment_engine::{EnrollmentFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = EnrollmentFlowApi::new(db, verifiers, producers);
//! let outcome = api.reconcile(UnverifiedPayment::Checkout(confirmation)).await?;
//! ```
pub mod checkout_api;
pub mod enrollment_flow_api;
pub mod enrollments_api;
pub mod errors;
pub mod payment_objects;
