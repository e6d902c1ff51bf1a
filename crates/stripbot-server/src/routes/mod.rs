//! Route handler modules.

pub mod admin;
pub mod comics;
pub mod health;
pub mod posts;
