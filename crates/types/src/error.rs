//! Unified error type for the hubauth workspace.

use thiserror::Error;
use url::Url;

/// Enumerates all error kinds that can occur across hubauth crates.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Neither an authorization code nor a refresh token is available.
    ///
    /// The caller should send the end user to `redirect_uri` to grant consent.
    #[error("consent required: {message} (redirect to {redirect_uri})")]
    ConsentRequired { redirect_uri: Url, message: String },

    /// A mandatory configuration property is absent.
    #[error("missing configuration property: {0}")]
    MissingConfiguration(String),

    /// The token endpoint answered with a non-success status.
    #[error("token exchange failed: status={status}, body={body}")]
    ExchangeFailed { status: u16, body: String },

    /// A configured or derived URI could not be parsed.
    #[error("invalid uri: {0}")]
    InvalidUri(String),

    /// HTTP transport error.
    #[error("http error: {0}")]
    Http(String),

    /// JSON serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or wiring error.
    #[error("configuration error: {0}")]
    Config(String),
}

// ── Feature-gated From impls ──────────────────────────────────────────────────

#[cfg(feature = "rquest")]
impl From<rquest::Error> for AuthError {
    fn from(e: rquest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

impl From<url::ParseError> for AuthError {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUri(e.to_string())
    }
}

impl AuthError {
    /// Returns `true` if the error is likely transient and worth retrying.
    ///
    /// This crate never retries on its own; the flag is a hint for the host.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ExchangeFailed { status, .. } => {
                matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
            }
            Self::Http(_) => true,
            _ => false,
        }
    }

    /// The consent page the end user should be redirected to, if any.
    #[must_use]
    pub fn redirect_uri(&self) -> Option<&Url> {
        match self {
            Self::ConsentRequired { redirect_uri, .. } => Some(redirect_uri),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, AuthError>;
