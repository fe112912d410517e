//! tvp-core: shared error type and configuration.
//!
//! This crate is the foundational dependency for the other tvp-* crates,
//! providing a unified error type that maps onto HTTP status codes and the
//! application configuration loaded at startup.

pub mod config;
pub mod error;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
