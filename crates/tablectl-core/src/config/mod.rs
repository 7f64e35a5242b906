//! Configuration and profile management for tablectl
//!
//! Profiles name a project to work in, the API endpoint, an access token
//! and default polling behaviour.
//!
//! # Features
//!
//! - Multiple named profiles
//! - Secure credential storage using OS keyring (optional)
//! - Environment variable expansion in config files
//! - Platform-specific config file locations

#![allow(clippy::module_inception)]

pub mod config;
pub mod credential;
pub mod error;
pub mod poll;

// Re-export main types for convenience
pub use config::{ACCESS_TOKEN_ENV, Config, Profile};
pub use credential::{CredentialStorage, CredentialStore};
pub use error::{ConfigError, Result};
pub use poll::PollConfig;
