//! Enrollment Engine
//!
//! The enrollment engine turns payment-gateway transactions into durable course (and project) enrollments. It is
//! provider-agnostic: the gateway is reached through the [`gateway::PaymentGateway`] trait, and the store through the
//! traits in [`traits`].
//!
//! The library is divided into these sections:
//! 1. Database management and control ([`traits`] and the SQLite backend). The store owns the two invariants the
//!    whole engine relies on: an order's gateway id is unique, and a user has at most one enrollment per item.
//! 2. The public API ([`lp_api`]).
//!    * [`CheckoutApi`] opens orders with the gateway (or the mock gateway) and persists them.
//!    * [`EnrollmentFlowApi`] is the reconciler. Both the client verification call and the gateway webhook funnel
//!      through it, and it is the only thing that marks orders paid and creates enrollments.
//! 3. Signature verification and the mock-mode gate ([`helpers`]).
//! 4. Events and notification ([`events`], [`notifier`]). A newly created enrollment emits an event. The email
//!    notifier subscribes to it and runs off the request path, and its failures never reach the caller.
pub mod db_types;
pub mod events;
pub mod gateway;
pub mod helpers;
pub mod lp_api;
pub mod notifier;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(all(feature = "sqlite", any(feature = "test_utils", test)))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use lp_api::{
    checkout_api::CheckoutApi,
    enrollment_flow_api::EnrollmentFlowApi,
    enrollments_api::EnrollmentsApi,
    errors::{CheckoutError, ReconcileError},
    payment_objects,
};
