//! Static API key authentication via the `hapikey` query parameter.

use crate::client::RequestDecorator;
use async_trait::async_trait;
use hubauth_types::Result;
use url::Url;

/// Query parameter carrying the API key.
pub const API_KEY_PARAM: &str = "hapikey";

/// Appends `hapikey=<key>` to every outgoing request URL.
#[derive(Clone)]
pub struct ApiKeyDecorator {
    key: String,
}

impl ApiKeyDecorator {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Adds the key to `url`, keeping path and every other query parameter.
    ///
    /// An existing `hapikey` parameter is replaced, so the result always
    /// carries exactly one.
    pub fn decorate_url(&self, url: &mut Url) {
        if url.query_pairs().any(|(k, _)| k == API_KEY_PARAM) {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(k, _)| &**k != API_KEY_PARAM)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            url.set_query(None);
            url.query_pairs_mut()
                .extend_pairs(kept)
                .append_pair(API_KEY_PARAM, &self.key);
        } else {
            url.query_pairs_mut().append_pair(API_KEY_PARAM, &self.key);
        }
    }
}

impl std::fmt::Debug for ApiKeyDecorator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyDecorator")
            .field("key", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl RequestDecorator for ApiKeyDecorator {
    async fn decorate(&self, request: &mut rquest::Request) -> Result<()> {
        self.decorate_url(request.url_mut());
        Ok(())
    }
}
