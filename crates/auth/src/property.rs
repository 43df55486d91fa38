//! Configuration property names read by the credential filter.

use hubauth_config::{ConfigProvider, LayeredConfig};

/// Namespace of the process-wide variables (`Hubspot.Auth.apikey`).
pub const VARIABLE_NAMESPACE: &str = "Hubspot";

pub const API_KEY: &str = "Auth.apikey";
pub const CLIENT_ID: &str = "Auth.clientId";
pub const CLIENT_SECRET: &str = "Auth.clientSecret";
/// Mandatory in OAuth2 mode.
pub const SCOPE: &str = "Auth.scope";
/// Overrides both the authorize and the token base URI.
pub const AUTH_BASE_URI: &str = "Auth.baseUri";

/// Builds the standard two-tier lookup: per-client overrides first, then the
/// process-wide variables under [`VARIABLE_NAMESPACE`].
#[must_use]
pub fn layered(
    client: impl ConfigProvider + 'static,
    variables: impl ConfigProvider + 'static,
) -> LayeredConfig {
    LayeredConfig::new()
        .with_layer(client)
        .with_namespaced_layer(VARIABLE_NAMESPACE, variables)
}
