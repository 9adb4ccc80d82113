//! CLI command implementations

pub mod completions;
pub mod config;
pub mod order;
pub mod resolve;
pub mod segment;
