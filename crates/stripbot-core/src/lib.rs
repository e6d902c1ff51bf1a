//! stripbot-core: shared configuration, errors, and typed identifiers.
//!
//! This crate is the foundational dependency for the other stripbot crates,
//! providing the unified error type, application configuration, and the
//! type-safe post identifier.

pub mod config;
pub mod error;
pub mod ids;

// Re-export the most commonly used items at the crate root.
pub use config::Config;
pub use error::{Error, Result};
pub use ids::PostId;
