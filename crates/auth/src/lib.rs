//! API-key or OAuth2 authentication for outgoing HubSpot API requests.
//!
//! The selector inspects the layered configuration once: a non-empty
//! `Auth.apikey` appends `hapikey` to every request, otherwise requests carry
//! a bearer token obtained through the [`TokenExchanger`]. [`AuthClient`]
//! composes the chosen decorator with an `rquest` client.

pub mod api_key;
pub mod authorize;
pub mod bearer;
pub mod client;
pub mod endpoint;
pub mod exchange;
pub mod property;
pub mod selector;

pub use api_key::ApiKeyDecorator;
pub use bearer::{BearerTokenHandler, GrantBearer};
pub use client::{AuthClient, AuthClientBuilder, RequestDecorator};
pub use exchange::{AuthContext, Grant, TokenExchanger, TokenRequestForm};
pub use selector::AuthMode;
