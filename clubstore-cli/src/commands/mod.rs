//! CLI command implementations.

pub mod doctor;
pub mod drivers;
pub mod query;
pub mod tables;
pub mod version;
