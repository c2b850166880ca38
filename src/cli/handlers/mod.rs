//! Command handlers for CLI operations
//!
//! This module contains handlers for different CLI commands,
//! separating command execution logic from parsing and validation.

pub mod check_config;
pub mod serve;

pub use check_config::CheckConfigCommandHandler;
pub use serve::ServeCommandHandler;
