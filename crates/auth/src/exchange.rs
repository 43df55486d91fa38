//! OAuth2 token exchange: grant selection, form construction, and the
//! token endpoint call.
//!
//! The exchanger never interprets the token response; it hands the raw
//! response back to the bearer-token handler that asked for it.

use crate::{
    authorize,
    endpoint::OAuthEndpoint,
    property::{CLIENT_ID, CLIENT_SECRET, SCOPE},
};
use hubauth_config::LayeredConfig;
use hubauth_types::{AuthError, Result};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use url::Url;

/// Message attached to [`AuthError::ConsentRequired`].
pub const CONSENT_MESSAGE: &str = "missing permission from user to act in his name.";

/// The credential used for one token exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    AuthorizationCode(String),
    RefreshToken(String),
}

impl Grant {
    /// Value of the `grant_type` form field.
    #[must_use]
    pub fn grant_type(&self) -> &'static str {
        match self {
            Self::AuthorizationCode(_) => "authorization_code",
            Self::RefreshToken(_) => "refresh_token",
        }
    }

    fn field(&self) -> (&'static str, &str) {
        match self {
            Self::AuthorizationCode(code) => ("code", code),
            Self::RefreshToken(token) => ("refresh_token", token),
        }
    }
}

/// Inputs of a single exchange attempt, created by the bearer-token handler.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub auth_code: Option<String>,
    pub refresh_token: Option<String>,
    /// Token endpoint the form is posted to.
    pub target: Url,
}

impl AuthContext {
    #[must_use]
    pub fn new(target: Url) -> Self {
        Self {
            auth_code: None,
            refresh_token: None,
            target,
        }
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

    /// The authorization code, ignoring empty strings.
    #[must_use]
    pub fn auth_code(&self) -> Option<&str> {
        self.auth_code.as_deref().filter(|s| !s.is_empty())
    }

    /// The refresh token, ignoring empty strings.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|s| !s.is_empty())
    }

    /// Picks the single grant for this attempt.
    ///
    /// A fresh authorization code wins over a stored refresh token.
    #[must_use]
    pub fn grant(&self) -> Option<Grant> {
        match (self.auth_code(), self.refresh_token()) {
            (Some(code), refresh) => {
                if refresh.is_some() {
                    tracing::debug!("authorization code present, ignoring refresh token");
                }
                Some(Grant::AuthorizationCode(code.to_string()))
            }
            (None, Some(token)) => Some(Grant::RefreshToken(token.to_string())),
            (None, None) => None,
        }
    }
}

/// Ordered `application/x-www-form-urlencoded` body of a token request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequestForm {
    fields: Vec<(&'static str, String)>,
}

impl TokenRequestForm {
    /// Builds `client_id`, `scope`, the grant pair, `redirect_uri`, `client_secret`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingConfiguration`] if no scope is configured.
    pub fn build(config: &LayeredConfig, grant: &Grant, callback: &Url) -> Result<Self> {
        let (credential, value) = grant.field();
        let fields = vec![
            ("client_id", config.read(CLIENT_ID)),
            ("scope", config.require(SCOPE)?),
            (credential, value.to_string()),
            ("grant_type", grant.grant_type().to_string()),
            ("redirect_uri", callback.as_str().to_string()),
            ("client_secret", config.read(CLIENT_SECRET)),
        ];
        Ok(Self { fields })
    }

    /// Value of the first field named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }
}

impl Serialize for TokenRequestForm {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.fields)
    }
}

/// Issues token requests on behalf of the host's bearer-token handler.
pub struct TokenExchanger {
    config: Arc<LayeredConfig>,
    callback: Url,
    http: rquest::Client,
}

impl TokenExchanger {
    /// `callback` is the redirect URI registered with the OAuth app.
    #[must_use]
    pub fn new(config: Arc<LayeredConfig>, callback: Url, http: rquest::Client) -> Self {
        Self {
            config,
            callback,
            http,
        }
    }

    /// `<token base>/token`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidUri`] for a malformed base URI.
    pub fn token_endpoint(&self) -> Result<Url> {
        OAuthEndpoint::token().uri(&self.config, "token")
    }

    /// An empty context targeting the token endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidUri`] for a malformed base URI.
    pub fn context(&self) -> Result<AuthContext> {
        Ok(AuthContext::new(self.token_endpoint()?))
    }

    /// The consent page URL for this client.
    ///
    /// # Errors
    ///
    /// See [`authorize::authorization_uri`].
    pub fn authorization_uri(&self) -> Result<Url> {
        authorize::authorization_uri(&self.config, &self.callback)
    }

    /// Builds the token request body for `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ConsentRequired`] when `ctx` holds neither an
    /// authorization code nor a refresh token, and
    /// [`AuthError::MissingConfiguration`] when the scope is unset.
    pub fn token_form(&self, ctx: &AuthContext) -> Result<TokenRequestForm> {
        let Some(grant) = ctx.grant() else {
            return Err(self.consent_required());
        };
        TokenRequestForm::build(&self.config, &grant, &self.callback)
    }

    /// Posts the token request and returns the endpoint's raw response,
    /// whatever its status.
    ///
    /// # Errors
    ///
    /// Everything [`token_form`](Self::token_form) returns, plus
    /// [`AuthError::Http`] on transport failure. No request is sent when the
    /// form cannot be built.
    pub async fn request_token(&self, ctx: &AuthContext) -> Result<rquest::Response> {
        let form = self.token_form(ctx)?;
        tracing::debug!(
            endpoint = %ctx.target,
            grant_type = form.get("grant_type").unwrap_or_default(),
            "requesting access token"
        );
        let resp = self
            .http
            .post(ctx.target.clone())
            .header("Accept", "*/*")
            .form(&form)
            .send()
            .await?;
        tracing::debug!(status = %resp.status(), "token endpoint responded");
        Ok(resp)
    }

    fn consent_required(&self) -> AuthError {
        match self.authorization_uri() {
            Ok(redirect_uri) => {
                tracing::warn!(
                    redirect = %redirect_uri,
                    "no authorization code or refresh token, user consent required"
                );
                AuthError::ConsentRequired {
                    redirect_uri,
                    message: CONSENT_MESSAGE.to_string(),
                }
            }
            Err(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::AUTH_BASE_URI;
    use hubauth_config::PropertyMap;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CALLBACK: &str = "https://workflow.example.com/oauth2/callback";

    fn props() -> PropertyMap {
        PropertyMap::new()
            .with(CLIENT_ID, "cid")
            .with(SCOPE, "contacts")
            .with(CLIENT_SECRET, "s3cret")
    }

    fn exchanger(props: PropertyMap) -> TokenExchanger {
        TokenExchanger::new(
            Arc::new(LayeredConfig::new().with_layer(props)),
            Url::parse(CALLBACK).unwrap(),
            rquest::Client::new(),
        )
    }

    fn target() -> Url {
        Url::parse("https://api.hubapi.com/oauth/v1/token").unwrap()
    }

    #[test]
    fn test_grant_code_only() {
        let ctx = AuthContext::new(target()).with_code("xyz");
        assert_eq!(ctx.grant(), Some(Grant::AuthorizationCode("xyz".into())));
    }

    #[test]
    fn test_grant_refresh_only() {
        let ctx = AuthContext::new(target()).with_refresh_token("rt");
        assert_eq!(ctx.grant(), Some(Grant::RefreshToken("rt".into())));
    }

    #[test]
    fn test_grant_prefers_code() {
        let ctx = AuthContext::new(target())
            .with_code("xyz")
            .with_refresh_token("rt");
        assert_eq!(ctx.grant(), Some(Grant::AuthorizationCode("xyz".into())));
    }

    #[test]
    fn test_grant_empty_strings_are_absent() {
        let ctx = AuthContext::new(target())
            .with_code("")
            .with_refresh_token("");
        assert!(ctx.grant().is_none());
    }

    #[test]
    fn test_form_authorization_code() {
        let ctx = AuthContext::new(target()).with_code("xyz");
        let form = exchanger(props()).token_form(&ctx).unwrap();
        let names: Vec<_> = form.fields().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            names,
            vec![
                "client_id",
                "scope",
                "code",
                "grant_type",
                "redirect_uri",
                "client_secret"
            ]
        );
        assert_eq!(form.get("client_id"), Some("cid"));
        assert_eq!(form.get("scope"), Some("contacts"));
        assert_eq!(form.get("code"), Some("xyz"));
        assert_eq!(form.get("grant_type"), Some("authorization_code"));
        assert_eq!(form.get("redirect_uri"), Some(CALLBACK));
        assert_eq!(form.get("client_secret"), Some("s3cret"));
        assert!(form.get("refresh_token").is_none());
    }

    #[test]
    fn test_form_refresh_token() {
        let ctx = AuthContext::new(target()).with_refresh_token("rt-1");
        let form = exchanger(props()).token_form(&ctx).unwrap();
        assert_eq!(form.get("refresh_token"), Some("rt-1"));
        assert_eq!(form.get("grant_type"), Some("refresh_token"));
        assert_eq!(form.get("client_id"), Some("cid"));
        assert_eq!(form.get("scope"), Some("contacts"));
        assert_eq!(form.get("redirect_uri"), Some(CALLBACK));
        assert_eq!(form.get("client_secret"), Some("s3cret"));
        assert!(form.get("code").is_none());
    }

    #[test]
    fn test_form_has_single_grant_type() {
        let ctx = AuthContext::new(target())
            .with_code("xyz")
            .with_refresh_token("rt");
        let form = exchanger(props()).token_form(&ctx).unwrap();
        let grant_types = form
            .fields()
            .iter()
            .filter(|(k, _)| *k == "grant_type")
            .count();
        assert_eq!(grant_types, 1);
    }

    #[test]
    fn test_form_missing_scope() {
        let ex = exchanger(PropertyMap::new().with(CLIENT_ID, "cid"));
        let err = ex
            .token_form(&AuthContext::new(target()).with_code("xyz"))
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingConfiguration(ref k) if k == SCOPE));
    }

    #[test]
    fn test_consent_required_without_credentials() {
        let err = exchanger(props())
            .token_form(&AuthContext::new(target()))
            .unwrap_err();
        match err {
            AuthError::ConsentRequired {
                redirect_uri,
                message,
            } => {
                assert_eq!(message, CONSENT_MESSAGE);
                let query = redirect_uri.query().unwrap();
                assert!(query.starts_with("client_id=cid&scope=contacts&"));
                assert!(query.ends_with("response_type=code&response_mode=query"));
            }
            other => panic!("expected ConsentRequired, got {other:?}"),
        }
    }

    #[test]
    fn test_form_serializes_as_ordered_pairs() {
        let ctx = AuthContext::new(target()).with_code("a b");
        let form = exchanger(props()).token_form(&ctx).unwrap();
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json[2], serde_json::json!(["code", "a b"]));
    }

    #[test]
    fn test_token_endpoint_default() {
        assert_eq!(
            exchanger(props()).context().unwrap().target.as_str(),
            "https://api.hubapi.com/oauth/v1/token"
        );
    }

    #[tokio::test]
    async fn test_request_token_posts_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v1/token"))
            .and(header("accept", "*/*"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("client_id=cid"))
            .and(body_string_contains("code=xyz"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("client_secret=s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"access_token\":\"at\"}"))
            .expect(1)
            .mount(&server)
            .await;

        let ex = exchanger(props().with(AUTH_BASE_URI, format!("{}/oauth/v1", server.uri())));
        let ctx = ex.context().unwrap().with_code("xyz");
        let resp = ex.request_token(&ctx).await.unwrap();
        assert_eq!(resp.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn test_request_token_returns_error_response_unmodified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("BAD_REFRESH_TOKEN"))
            .mount(&server)
            .await;

        let ex = exchanger(props().with(AUTH_BASE_URI, format!("{}/oauth/v1", server.uri())));
        let ctx = ex.context().unwrap().with_refresh_token("stale");
        let resp = ex.request_token(&ctx).await.unwrap();
        assert_eq!(resp.status().as_u16(), 400);
        assert_eq!(resp.text().await.unwrap(), "BAD_REFRESH_TOKEN");
    }

    #[tokio::test]
    async fn test_request_token_consent_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let ex = exchanger(props().with(AUTH_BASE_URI, format!("{}/oauth/v1", server.uri())));
        let ctx = ex.context().unwrap();
        let err = ex.request_token(&ctx).await.unwrap_err();
        assert!(err.redirect_uri().is_some());
    }
}
