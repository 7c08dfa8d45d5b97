//! Utility Functions
//!
//! User-friendly error formatting for the command line tool.
//!
//! ```rust
//! use lamco_display_manager::utils::format_user_error;
//!
//! let error = anyhow::anyhow!("Failed to read config file: missing.toml");
//! eprintln!("{}", format_user_error(&error));
//! ```
//!
//! Error categories with context-aware help:
//! - Display spec errors → expected format and examples
//! - Rotation errors → supported angles
//! - Config errors → file location, syntax, value rules

pub mod errors;

pub use errors::format_user_error;
