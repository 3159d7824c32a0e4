//! #  Database management and control.
//!
//! This module provides the interfaces that define the contracts of the enrollment engine database *backends*.
//!
//! ## Orders and enrollments
//! An order records a user's intent to buy a course or project, tied to one gateway order. An enrollment is the
//! durable grant of access that results once the order is paid.
//!
//! The store is where the correctness of the payment flow lives. Two invariants hold whatever the interleaving of
//! requests:
//! * a gateway order id refers to exactly one order, and never changes;
//! * a user has at most one enrollment per course (or project).
//!
//! ## Traits
//! * [`PaymentGatewayDatabase`] defines the highest level of behaviour: creating orders, and the atomic settlement
//!   that marks an order paid and enrolls its owner.
//! * [`OrderManagement`] provides read-only queries over orders.
//! * [`EnrollmentManagement`] provides enrollment queries and the idempotent "enroll if absent" primitive.
//! * [`CatalogLookup`] is the read-only view of users, courses and projects owned by the rest of the platform.
mod catalog;
mod data_objects;
mod enrollment_management;
mod order_management;
mod payment_gateway_database;

pub use catalog::{CatalogError, CatalogLookup};
pub use data_objects::{EnrollOutcome, ExpiryResult, MarkPaidResult, SettlementRecord};
pub use enrollment_management::EnrollmentManagement;
pub use order_management::OrderManagement;
pub use payment_gateway_database::{PaymentGatewayDatabase, PaymentGatewayError};
