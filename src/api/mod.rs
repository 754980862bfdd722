//! Tracker REST API client.
//!
//! This module owns everything that crosses the wire: the HTTP client,
//! the tolerant DTO types, and the API error taxonomy.

pub mod client;
pub mod error;
pub mod types;

pub use client::TrackerClient;
pub use error::ApiError;
