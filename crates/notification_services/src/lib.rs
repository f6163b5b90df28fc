//! # Notification Services
//!
//! This crate provides the transports used to deliver vacancy alerts.
//! It includes an AWS SES email service, an ntfy.sh push service, and mock
//! transports that only log what they would have sent.

/// Email and push transports backed by real providers.
pub mod service;
/// Logging transports for dry runs and local development.
pub mod mock;

pub use mock::{MockEmailService, MockPushService};
pub use service::{NtfyPushService, SesEmailService};
