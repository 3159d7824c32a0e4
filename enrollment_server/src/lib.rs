//! # Learning platform payment server
//!
//! The HTTP face of the enrollment engine. It is responsible for:
//! * Opening gateway orders when a signed-in user starts a checkout.
//! * Accepting the browser's payment confirmation and the gateway's webhook, and handing both to the reconciler.
//! * Periodically expiring orders that were never paid.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/checkout/order` (POST): Opens an order for a course or project.
//! * `/api/checkout/verify` (POST): The browser's payment confirmation.
//! * `/api/checkout/order/{id}` (GET): One of the caller's orders, with the gateway's payment record.
//! * `/api/enrollments` (GET): The caller's enrollments.
//! * `/gateway/webhook` (POST): Payment gateway webhook deliveries.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
