//! Configurable OAuth base URIs.

use crate::property::AUTH_BASE_URI;
use hubauth_config::LayeredConfig;
use hubauth_types::{AuthError, Result};
use url::Url;

/// Default base of the token endpoint (`<base>/token`).
pub const TOKEN_BASE_URI: &str = "https://api.hubapi.com/oauth/v1";

/// Default base of the consent page (`<base>/authorize`).
pub const AUTHORIZE_BASE_URI: &str = "https://app.hubspot.com/oauth";

/// A base URI read from a configuration property, with a fallback default.
///
/// Resolution is lazy: the property is read each time a URI is built, so a
/// malformed value only fails the operation that needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OAuthEndpoint {
    property: &'static str,
    default: &'static str,
}

impl OAuthEndpoint {
    #[must_use]
    pub const fn new(property: &'static str, default: &'static str) -> Self {
        Self { property, default }
    }

    /// The consent page base.
    #[must_use]
    pub const fn authorize() -> Self {
        Self::new(AUTH_BASE_URI, AUTHORIZE_BASE_URI)
    }

    /// The token endpoint base.
    #[must_use]
    pub const fn token() -> Self {
        Self::new(AUTH_BASE_URI, TOKEN_BASE_URI)
    }

    /// Resolves the base URI.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidUri`] if the configured value does not parse.
    pub fn base(&self, config: &LayeredConfig) -> Result<Url> {
        let raw = config.resolve(self.property);
        let raw = raw.as_deref().unwrap_or(self.default);
        Url::parse(raw).map_err(|e| AuthError::InvalidUri(format!("{raw}: {e}")))
    }

    /// Resolves the base URI and appends one path segment.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidUri`] if the base does not parse or cannot
    /// carry a path (e.g. `mailto:`).
    pub fn uri(&self, config: &LayeredConfig, segment: &str) -> Result<Url> {
        let mut url = self.base(config)?;
        if url.cannot_be_a_base() {
            return Err(AuthError::InvalidUri(format!(
                "{url} cannot be used as a base uri"
            )));
        }
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(segment);
        }
        Ok(url)
    }
}
