//! Best-effort enrollment confirmation emails.
//!
//! Nothing in here can fail an enrollment. The notifier runs off the request path (as an `EnrollmentCreatedEvent`
//! hook) and every error it meets is logged and dropped.
mod enrollment_notifier;
mod mail;

pub use enrollment_notifier::{EnrollmentNotifier, NotifierError};
pub use mail::{AnyMailer, HttpMailer, LogMailer, MailError, MailSender};
