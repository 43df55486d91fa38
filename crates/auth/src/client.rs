//! HTTP client with the credential filter composed in at construction.
//!
//! [`AuthClientBuilder::build`] runs the selector once and keeps a single
//! [`RequestDecorator`]; every request sent through [`AuthClient`] passes
//! through it.

use crate::{
    bearer::{BearerDecorator, BearerTokenHandler},
    exchange::TokenExchanger,
    selector::{self, AuthMode, Strategy},
};
use async_trait::async_trait;
use http::Method;
use hubauth_config::LayeredConfig;
use hubauth_types::{AuthError, Result};
use std::sync::Arc;
use url::Url;

/// Mutates an outgoing request before it is sent.
#[async_trait]
pub trait RequestDecorator: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the request cannot be authenticated; it is then
    /// not sent.
    async fn decorate(&self, request: &mut rquest::Request) -> Result<()>;
}

/// Builder for [`AuthClient`].
#[derive(Default)]
pub struct AuthClientBuilder {
    http: Option<rquest::Client>,
    config: Option<Arc<LayeredConfig>>,
    callback: Option<Url>,
    bearer: Option<Arc<dyn BearerTokenHandler>>,
}

impl AuthClientBuilder {
    /// Underlying transport (defaults to `rquest::Client::new()`).
    #[must_use]
    pub fn http(mut self, http: rquest::Client) -> Self {
        self.http = Some(http);
        self
    }

    #[must_use]
    pub fn config(self, config: LayeredConfig) -> Self {
        self.shared_config(Arc::new(config))
    }

    #[must_use]
    pub fn shared_config(mut self, config: Arc<LayeredConfig>) -> Self {
        self.config = Some(config);
        self
    }

    /// Redirect URI registered with the OAuth app. Required in OAuth2 mode.
    #[must_use]
    pub fn callback(mut self, callback: Url) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Host token handler. Required in OAuth2 mode.
    #[must_use]
    pub fn bearer_handler(mut self, handler: impl BearerTokenHandler + 'static) -> Self {
        self.bearer = Some(Arc::new(handler));
        self
    }

    /// Selects the strategy and composes the client.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if no configuration was given, or if
    /// OAuth2 mode is selected without a callback or bearer handler.
    pub fn build(self) -> Result<AuthClient> {
        let config = self
            .config
            .ok_or_else(|| AuthError::Config("no configuration given".into()))?;
        let http = self.http.unwrap_or_else(rquest::Client::new);
        let strategy = selector::select(&config);
        let mode = strategy.mode();
        tracing::info!(%mode, "selected authentication strategy");

        let mut exchanger = None;
        let decorator: Arc<dyn RequestDecorator> = match strategy {
            Strategy::ApiKey(decorator) => Arc::new(decorator),
            Strategy::OAuth2 => {
                let callback = self.callback.ok_or_else(|| {
                    AuthError::Config("oauth2 mode requires a callback uri".into())
                })?;
                let handler = self.bearer.ok_or_else(|| {
                    AuthError::Config("oauth2 mode requires a bearer token handler".into())
                })?;
                let shared = Arc::new(TokenExchanger::new(config, callback, http.clone()));
                exchanger = Some(Arc::clone(&shared));
                Arc::new(BearerDecorator::new(shared, handler))
            }
        };

        Ok(AuthClient {
            http,
            decorator,
            mode,
            exchanger,
        })
    }
}

/// An HTTP client that authenticates every request it sends.
pub struct AuthClient {
    http: rquest::Client,
    decorator: Arc<dyn RequestDecorator>,
    mode: AuthMode,
    exchanger: Option<Arc<TokenExchanger>>,
}

impl AuthClient {
    #[must_use]
    pub fn builder() -> AuthClientBuilder {
        AuthClientBuilder::default()
    }

    /// The strategy chosen at build time.
    #[must_use]
    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// The token exchanger, present in OAuth2 mode only.
    #[must_use]
    pub fn exchanger(&self) -> Option<&TokenExchanger> {
        self.exchanger.as_deref()
    }

    /// Starts an undecorated request; send it with [`send`](Self::send).
    pub fn request(&self, method: Method, url: Url) -> rquest::RequestBuilder {
        self.http.request(method, url)
    }

    /// Builds, decorates, and sends a request.
    ///
    /// # Errors
    ///
    /// Returns the decorator's error (e.g. [`AuthError::ConsentRequired`]) or
    /// [`AuthError::Http`] on transport failure.
    pub async fn send(&self, builder: rquest::RequestBuilder) -> Result<rquest::Response> {
        self.execute(builder.build()?).await
    }

    /// Decorates and sends a prepared request.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn execute(&self, mut request: rquest::Request) -> Result<rquest::Response> {
        self.decorator.decorate(&mut request).await?;
        tracing::debug!(method = %request.method(), path = request.url().path(), "sending request");
        Ok(self.http.execute(request).await?)
    }

    /// Convenience `GET`.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn get(&self, url: Url) -> Result<rquest::Response> {
        self.send(self.request(Method::GET, url)).await
    }
}
