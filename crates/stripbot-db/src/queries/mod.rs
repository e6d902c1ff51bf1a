//! Query modules, one per table.

pub mod comics;
pub mod posts;
