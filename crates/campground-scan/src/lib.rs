//! # Campground Scan
//!
//! This crate tracks campsite vacancies across polling runs. It turns raw
//! availability observations into durable per-(site, date range) vacancies,
//! decides which of them are new or due for a repeat announcement, and
//! delivers merged alerts over email and push.

/// Types for campground scan operations
mod scan_types;
pub use scan_types::*;

/// Durable identity of a vacancy
mod vacancy_key;
pub use vacancy_key::*;

/// Persisted vacancy state and its pure transitions
mod state_store;
pub use state_store::*;

/// Availability source trait and the dry-run fixture source
mod source;
pub use source::*;

/// Reconciliation of observations against state
mod reconciler;
pub use reconciler::*;

/// Push quiet-hours gate
mod quiet_hours;
pub use quiet_hours::*;

/// Email and push message bodies
mod alert_formatter;
pub use alert_formatter::*;

/// Notification transports and alert dispatch
mod notifier;
pub use notifier::*;

/// Configuration file types
mod config;
pub use config::*;

/// A single scheduled invocation
mod runner;
pub use runner::*;
