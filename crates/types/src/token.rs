//! OAuth token representation and token endpoint response parsing.

use crate::{AuthError, Result};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// An OAuth token as returned by the token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl OAuthToken {
    /// Create a new token with the given access token and `Bearer` type.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            token_type: Some("Bearer".to_string()),
        }
    }

    /// Set the expiry to `expires_in_secs` seconds from now.
    #[must_use]
    pub fn with_expiry(mut self, expires_in_secs: u64) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs();
        self.expires_at = Some(now.saturating_add(expires_in_secs));
        self
    }

    /// Attach a refresh token.
    #[must_use]
    pub fn with_refresh(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Parse the token endpoint JSON response.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ExchangeFailed`] if the response has no
    /// `access_token` field.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let access_token = json
            .get("access_token")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| AuthError::ExchangeFailed {
                status: 200,
                body: format!("missing access_token in response: {json}"),
            })?;

        let mut token = Self::new(access_token);
        if let Some(refresh) = json
            .get("refresh_token")
            .and_then(serde_json::Value::as_str)
        {
            token = token.with_refresh(refresh);
        }
        if let Some(expires_in) = json.get("expires_in").and_then(serde_json::Value::as_u64) {
            token = token.with_expiry(expires_in);
        }
        if let Some(kind) = json.get("token_type").and_then(serde_json::Value::as_str) {
            token.token_type = Some(kind.to_string());
        }
        Ok(token)
    }
}
