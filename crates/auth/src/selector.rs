//! One-time choice between API-key and OAuth2 authentication.

use crate::{api_key::ApiKeyDecorator, property::API_KEY};
use hubauth_config::LayeredConfig;
use std::fmt;

/// The active authentication strategy of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMode {
    ApiKey,
    OAuth2,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey => write!(f, "api-key"),
            Self::OAuth2 => write!(f, "oauth2"),
        }
    }
}

/// Outcome of [`select`].
#[derive(Debug, Clone)]
pub enum Strategy {
    ApiKey(ApiKeyDecorator),
    OAuth2,
}

impl Strategy {
    #[must_use]
    pub fn mode(&self) -> AuthMode {
        match self {
            Self::ApiKey(_) => AuthMode::ApiKey,
            Self::OAuth2 => AuthMode::OAuth2,
        }
    }
}

/// A non-empty `Auth.apikey` selects API-key mode; anything else is OAuth2.
///
/// OAuth2 properties are not checked here. Missing ones surface on the first
/// token exchange.
#[must_use]
pub fn select(config: &LayeredConfig) -> Strategy {
    match config.resolve(API_KEY) {
        Some(key) => Strategy::ApiKey(ApiKeyDecorator::new(key)),
        None => Strategy::OAuth2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{CLIENT_ID, CLIENT_SECRET, layered};
    use hubauth_config::PropertyMap;

    #[test]
    fn test_api_key_selected() {
        let cfg = layered(PropertyMap::new().with(API_KEY, "ABC"), PropertyMap::new());
        assert_eq!(select(&cfg).mode(), AuthMode::ApiKey);
    }

    #[test]
    fn test_api_key_from_variables() {
        let cfg = layered(
            PropertyMap::new(),
            PropertyMap::new().with("Hubspot.Auth.apikey", "ABC"),
        );
        assert_eq!(select(&cfg).mode(), AuthMode::ApiKey);
    }

    #[test]
    fn test_api_key_wins_over_oauth() {
        let cfg = layered(
            PropertyMap::new()
                .with(API_KEY, "ABC")
                .with(CLIENT_ID, "cid")
                .with(CLIENT_SECRET, "secret"),
            PropertyMap::new(),
        );
        assert_eq!(select(&cfg).mode(), AuthMode::ApiKey);
    }

    #[test]
    fn test_empty_api_key_selects_oauth() {
        let cfg = layered(
            PropertyMap::new().with(API_KEY, "").with(CLIENT_ID, "cid"),
            PropertyMap::new(),
        );
        assert_eq!(select(&cfg).mode(), AuthMode::OAuth2);
    }

    #[test]
    fn test_nothing_configured_selects_oauth() {
        let cfg = layered(PropertyMap::new(), PropertyMap::new());
        assert!(matches!(select(&cfg), Strategy::OAuth2));
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(AuthMode::ApiKey.to_string(), "api-key");
        assert_eq!(AuthMode::OAuth2.to_string(), "oauth2");
    }
}
