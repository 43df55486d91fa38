//! Bearer-token handler seam.
//!
//! Token caching and refresh scheduling belong to the host; it plugs in
//! through [`BearerTokenHandler`]. [`GrantBearer`] is a minimal handler that
//! performs one exchange per call.

use crate::{client::RequestDecorator, exchange::TokenExchanger};
use async_trait::async_trait;
use http::header::{AUTHORIZATION, HeaderValue};
use hubauth_types::{AuthError, OAuthToken, Result};
use std::sync::Arc;

/// Supplies access tokens for outgoing requests in OAuth2 mode.
#[async_trait]
pub trait BearerTokenHandler: Send + Sync {
    /// Returns the access token for the next request, asking `exchanger`
    /// for a new one when needed.
    async fn access_token(&self, exchanger: &TokenExchanger) -> Result<String>;
}

/// Exchanges a fixed authorization code or refresh token on every call.
///
/// No caching: each call is an independent attempt.
#[derive(Default, Clone)]
pub struct GrantBearer {
    auth_code: Option<String>,
    refresh_token: Option<String>,
}

impl GrantBearer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.auth_code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    /// Runs one exchange and parses the token response.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ConsentRequired`] without any HTTP call when no
    /// credential is set, [`AuthError::ExchangeFailed`] on a non-success
    /// status, and [`AuthError::Serialization`] if the body is not JSON.
    pub async fn exchange(&self, exchanger: &TokenExchanger) -> Result<OAuthToken> {
        let mut ctx = exchanger.context()?;
        ctx.auth_code.clone_from(&self.auth_code);
        ctx.refresh_token.clone_from(&self.refresh_token);

        let resp = exchanger.request_token(&ctx).await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "token exchange failed");
            return Err(AuthError::ExchangeFailed {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = serde_json::from_str(&body)?;
        OAuthToken::from_json(&json)
    }
}

impl std::fmt::Debug for GrantBearer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrantBearer")
            .field("auth_code", &self.auth_code.is_some())
            .field("refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

#[async_trait]
impl BearerTokenHandler for GrantBearer {
    async fn access_token(&self, exchanger: &TokenExchanger) -> Result<String> {
        Ok(self.exchange(exchanger).await?.access_token)
    }
}

/// Sets `Authorization: Bearer <token>` from a [`BearerTokenHandler`].
pub struct BearerDecorator {
    exchanger: Arc<TokenExchanger>,
    handler: Arc<dyn BearerTokenHandler>,
}

impl BearerDecorator {
    #[must_use]
    pub fn new(exchanger: Arc<TokenExchanger>, handler: Arc<dyn BearerTokenHandler>) -> Self {
        Self { exchanger, handler }
    }
}

#[async_trait]
impl RequestDecorator for BearerDecorator {
    async fn decorate(&self, request: &mut rquest::Request) -> Result<()> {
        let token = self.handler.access_token(&self.exchanger).await?;
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| AuthError::Http(format!("access token is not a valid header value: {e}")))?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{AUTH_BASE_URI, CLIENT_ID, CLIENT_SECRET, SCOPE};
    use hubauth_config::{LayeredConfig, PropertyMap};
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn exchanger(server: &MockServer) -> TokenExchanger {
        let props = PropertyMap::new()
            .with(CLIENT_ID, "cid")
            .with(SCOPE, "contacts")
            .with(CLIENT_SECRET, "s3cret")
            .with(AUTH_BASE_URI, format!("{}/oauth/v1", server.uri()));
        TokenExchanger::new(
            Arc::new(LayeredConfig::new().with_layer(props)),
            Url::parse("https://workflow.example.com/oauth2/callback").unwrap(),
            rquest::Client::new(),
        )
    }

    #[tokio::test]
    async fn test_exchange_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v1/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=rt-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "at-1",
                "refresh_token": "rt-2",
                "expires_in": 1800
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = GrantBearer::new()
            .with_refresh_token("rt-1")
            .exchange(&exchanger(&server))
            .await
            .unwrap();
        assert_eq!(token.access_token, "at-1");
        assert_eq!(token.refresh_token.as_deref(), Some("rt-2"));
    }

    #[tokio::test]
    async fn test_exchange_failed_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("{\"status\":\"BAD_AUTH_CODE\"}"))
            .mount(&server)
            .await;

        let err = GrantBearer::new()
            .with_code("expired")
            .exchange(&exchanger(&server))
            .await
            .unwrap_err();
        match err {
            AuthError::ExchangeFailed { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("BAD_AUTH_CODE"));
            }
            other => panic!("expected ExchangeFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exchange_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = GrantBearer::new()
            .with_code("xyz")
            .exchange(&exchanger(&server))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_no_credentials_requires_consent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = GrantBearer::new()
            .access_token(&exchanger(&server))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ConsentRequired { .. }));
    }

    #[test]
    fn test_debug_hides_credentials() {
        let s = format!("{:?}", GrantBearer::new().with_code("secret-code"));
        assert!(!s.contains("secret-code"));
    }
}
