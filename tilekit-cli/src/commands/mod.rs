//! CLI command implementations.

pub mod check;
pub mod delegates;
pub mod fetch;
pub mod transform;
