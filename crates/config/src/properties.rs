//! Flat, case-insensitive property maps loaded with figment.

use crate::resolver::ConfigProvider;
use figment::{
    Figment,
    providers::{Env, Format as _, Yaml},
};
use serde_json::Value;
use std::{collections::HashMap, path::Path};

/// Environment variable prefix for the process-wide variable store.
pub const ENV_PREFIX: &str = "HUBAUTH_";

/// Named string properties keyed by dotted path (`Auth.apikey`).
///
/// Nested YAML mappings are flattened, so `Auth: { apikey: X }` and
/// `Auth.apikey: X` produce the same entry. Keys compare case-insensitively
/// because figment lowercases environment-sourced keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMap {
    values: HashMap<String, String>,
}

impl PropertyMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a property.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.values
            .insert(key.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Looks up a property by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Extracts and flattens every value of a figment.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if a provider fails to load.
    #[allow(clippy::result_large_err)]
    pub fn from_figment(figment: &Figment) -> Result<Self, figment::Error> {
        let root: Value = figment.extract()?;
        let mut map = Self::new();
        flatten("", &root, &mut map);
        Ok(map)
    }

    /// Parses properties from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the YAML is invalid.
    #[allow(clippy::result_large_err)]
    pub fn from_yaml(yaml: &str) -> Result<Self, figment::Error> {
        Self::from_figment(&Figment::from(Yaml::string(yaml)))
    }

    /// Loads properties from a YAML file. A missing file yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the file cannot be parsed.
    #[allow(clippy::result_large_err)]
    pub fn from_file(path: &Path) -> Result<Self, figment::Error> {
        Self::from_figment(&Figment::from(Yaml::file(path)))
    }

    /// Loads the process-wide variable store: the optional YAML file, then
    /// `HUBAUTH_*` environment variables (`__` separates nesting levels).
    ///
    /// `HUBAUTH_HUBSPOT__AUTH__APIKEY=x` becomes `Hubspot.Auth.apikey`.
    /// Environment values are kept verbatim (`00123` stays `00123`) and always
    /// win over the file, whatever key spelling the file uses.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the file cannot be parsed.
    #[allow(clippy::result_large_err)]
    pub fn load_variables(path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut map = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::new(),
        };
        for (key, value) in Env::prefixed(ENV_PREFIX).split("__").iter() {
            map.insert(key.as_str(), value);
        }
        Ok(map)
    }
}

impl ConfigProvider for PropertyMap {
    fn get(&self, name: &str) -> Option<String> {
        PropertyMap::get(self, name).map(str::to_owned)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut PropertyMap) {
    let leaf = match value {
        Value::Object(entries) => {
            for (k, v) in entries {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten(&key, v, out);
            }
            return;
        }
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) => return,
    };
    if !prefix.is_empty() {
        out.insert(prefix, leaf);
    }
}
