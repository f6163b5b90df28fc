//! # RecGov
//!
//! This crate provides a client for the Rec.gov APIs: park name lookup against
//! RIDB and per-month campsite availability from the reservation site.

/// Monthly availability payloads and their conversion into site observations.
mod availability;
pub use availability::*;

/// On-disk cache of park name to campground ids.
mod park_cache;
pub use park_cache::*;

/// HTTP client implementing the availability source.
mod client;
pub use client::*;
