//! Shared utilities

pub mod config;
pub mod diagnostic;
pub mod fs;

pub use config::RulesConfig;
pub use diagnostic::Diagnostic;
