use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};

use brightpearl_core::utils::Redact;
use brightpearl_core::Context;

use crate::constants::*;

/// Client settings: option name to value.
///
/// Recognized keys are `api_domain`, `account_code`, `account_token`,
/// `dev_reference`, `dev_secret`, `dev_token`, `app_reference` and
/// `staff_token`. Other keys are kept and offered to operations as
/// parameters of the same name.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Debug for Settings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut m = f.debug_map();
        for (k, v) in &self.values {
            if k.contains("token") || k.contains("secret") {
                m.entry(k, &Redact::from(v));
            } else {
                m.entry(k, v);
            }
        }
        m.finish()
    }
}

impl Settings {
    /// Create empty settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from `BRIGHTPEARL_*` environment variables.
    ///
    /// Unset and empty variables are skipped.
    pub fn from_env(ctx: &Context) -> Self {
        [
            (DEV_REFERENCE, BRIGHTPEARL_DEV_REFERENCE),
            (DEV_SECRET, BRIGHTPEARL_DEV_SECRET),
            (APP_REFERENCE, BRIGHTPEARL_APP_REFERENCE),
            (ACCOUNT_CODE, BRIGHTPEARL_ACCOUNT_CODE),
            (ACCOUNT_TOKEN, BRIGHTPEARL_ACCOUNT_TOKEN),
            (API_DOMAIN, BRIGHTPEARL_API_DOMAIN),
            (STAFF_TOKEN, BRIGHTPEARL_STAFF_TOKEN),
        ]
        .into_iter()
        .filter_map(|(key, env)| {
            ctx.env_var(env)
                .filter(|v| !v.is_empty())
                .map(|v| (key, v))
        })
        .collect()
    }

    /// Set `key` and return self.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set `key`, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    /// Get the value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Whether `key` is set.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Merge `patch` into these settings; patch values override.
    ///
    /// Returns the keys whose value actually changed.
    pub fn merge(&mut self, patch: Settings) -> Vec<String> {
        let mut changed = Vec::new();
        for (k, v) in patch.values {
            if self.values.get(&k) != Some(&v) {
                changed.push(k.clone());
                self.values.insert(k, v);
            }
        }
        changed
    }

    /// Iterate over all settings in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of settings.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no settings are present.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Settings {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
