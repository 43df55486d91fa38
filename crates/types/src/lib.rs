//! Core types for the hubauth workspace.
//!
//! This crate defines the shared error type and the OAuth token
//! representation used by the configuration and authentication crates.

pub mod error;
pub mod token;

pub use error::{AuthError, Result};
pub use token::OAuthToken;
