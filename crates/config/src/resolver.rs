//! Layered property resolution: the first non-empty value wins.

use hubauth_types::{AuthError, Result};
use std::sync::Arc;

/// A source of named string properties.
pub trait ConfigProvider: Send + Sync {
    /// Returns the raw value stored under `name`, if any.
    fn get(&self, name: &str) -> Option<String>;
}

impl<T: ConfigProvider + ?Sized> ConfigProvider for Arc<T> {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }
}

struct Layer {
    provider: Arc<dyn ConfigProvider>,
    namespace: Option<String>,
}

impl Layer {
    fn lookup(&self, key: &str) -> Option<String> {
        match &self.namespace {
            Some(ns) => self.provider.get(&format!("{ns}.{key}")),
            None => self.provider.get(key),
        }
    }
}

/// Ordered list of configuration providers.
///
/// A per-client override layer is typically added first, followed by the
/// process-wide variable store under its namespace, so
/// `resolve("Auth.scope")` checks `Auth.scope` on the client and then
/// `Hubspot.Auth.scope` in the variables.
#[derive(Default)]
pub struct LayeredConfig {
    layers: Vec<Layer>,
}

impl LayeredConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a layer that is queried with the bare key.
    #[must_use]
    pub fn with_layer(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.layers.push(Layer {
            provider: Arc::new(provider),
            namespace: None,
        });
        self
    }

    /// Appends a layer that is queried with `<namespace>.<key>`.
    #[must_use]
    pub fn with_namespaced_layer(
        mut self,
        namespace: impl Into<String>,
        provider: impl ConfigProvider + 'static,
    ) -> Self {
        self.layers.push(Layer {
            provider: Arc::new(provider),
            namespace: Some(namespace.into()),
        });
        self
    }

    /// Returns the first non-empty value for `key` across all layers.
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<String> {
        self.layers.iter().enumerate().find_map(|(idx, layer)| {
            let value = layer.lookup(key).filter(|v| !v.is_empty())?;
            tracing::trace!(key, layer = idx, "resolved configuration property");
            Some(value)
        })
    }

    /// Returns the value for `key`, or an empty string when unset.
    #[must_use]
    pub fn read(&self, key: &str) -> String {
        self.resolve(key).unwrap_or_default()
    }

    /// Returns the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingConfiguration`] if no layer has a
    /// non-empty value.
    pub fn require(&self, key: &str) -> Result<String> {
        self.resolve(key)
            .ok_or_else(|| AuthError::MissingConfiguration(key.to_string()))
    }
}

impl std::fmt::Debug for LayeredConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let namespaces: Vec<_> = self
            .layers
            .iter()
            .map(|l| l.namespace.as_deref().unwrap_or("<client>"))
            .collect();
        f.debug_struct("LayeredConfig")
            .field("layers", &namespaces)
            .finish()
    }
}
