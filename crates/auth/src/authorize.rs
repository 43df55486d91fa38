//! Consent page URL construction.

use crate::{
    endpoint::OAuthEndpoint,
    property::{CLIENT_ID, SCOPE},
};
use hubauth_config::LayeredConfig;
use hubauth_types::Result;
use url::Url;

/// Build the authorization URL the end user must visit to grant consent.
///
/// `<authorize base>/authorize?client_id=..&scope=..&redirect_uri=..&response_type=code&response_mode=query`
///
/// # Errors
///
/// Returns [`MissingConfiguration`](hubauth_types::AuthError::MissingConfiguration)
/// if no scope is configured, or
/// [`InvalidUri`](hubauth_types::AuthError::InvalidUri) for a malformed base.
pub fn authorization_uri(config: &LayeredConfig, callback: &Url) -> Result<Url> {
    let mut uri = OAuthEndpoint::authorize().uri(config, "authorize")?;
    let client_id = config.read(CLIENT_ID);
    let scope = config.require(SCOPE)?;
    uri.query_pairs_mut()
        .append_pair("client_id", &client_id)
        .append_pair("scope", &scope)
        .append_pair("redirect_uri", callback.as_str())
        .append_pair("response_type", "code")
        .append_pair("response_mode", "query");
    Ok(uri)
}
