//! Configuration parameters visible to extensions through their context.

use crate::config::EngineConfig;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Read-only key/value parameters plus the store settings every context
/// inherits from the engine configuration.
#[derive(Debug, Clone)]
pub struct ConfigurationParameters {
    values: BTreeMap<String, String>,
    close_store_resources: bool,
}

impl Default for ConfigurationParameters {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
            close_store_resources: true,
        }
    }
}

impl ConfigurationParameters {
    pub fn new<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            values: config
                .parameters
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            close_store_resources: config.store.close_resources,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Boolean parameter; only `true` and `false` (any case) are recognized
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)?.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    /// Parse a parameter; `None` if absent, `Some(Err(_))` if unparsable
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<Result<T, T::Err>> {
        self.get(key).map(|raw| raw.trim().parse())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn close_store_resources(&self) -> bool {
        self.close_store_resources
    }
}
