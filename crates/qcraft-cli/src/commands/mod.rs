//! CLI command implementations.

pub mod common;
pub mod compile;
pub mod discover;
pub mod estimate;
pub mod families;
pub mod version;
