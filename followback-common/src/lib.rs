//! Common types and utilities shared across followback crates.
//!
//! This crate defines the shared error type, the account identifier alias and
//! the observability helpers used by every binary in the workspace. It stays
//! dependency-light so that all crates can depend on it.
//!
//! # Overview
//!
//! - [`Identifier`]: the string naming an account in the remote graph
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`FollowbackError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use followback_common::FollowbackError;
//!
//! let err = FollowbackError::missing("github.token");
//! assert_eq!(
//!     err.to_string(),
//!     "Configuration error: missing required setting `github.token`"
//! );
//! ```

pub mod observability;

/// Unique string naming an account in the remote social graph (a GitHub login).
pub type Identifier = String;

/// Error types used at the edges of the followback system.
#[derive(thiserror::Error, Debug)]
pub enum FollowbackError {
    /// Configuration was incomplete or invalid. Raised before any network call.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FollowbackError {
    /// Shorthand for a required setting that was never supplied.
    pub fn missing(setting: &str) -> Self {
        Self::Config(format!("missing required setting `{setting}`"))
    }
}

/// Convenient alias for results that use [`FollowbackError`].
pub type Result<T> = std::result::Result<T, FollowbackError>;
