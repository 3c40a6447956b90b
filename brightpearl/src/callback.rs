//! Validation of inbound callback notifications.
//!
//! Callbacks carry a `signature` computed as the hex SHA-256 digest of the
//! developer secret followed by every signed field as `key=value`, in
//! ascending key order and without separators.

use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};

use brightpearl_core::hash::hex_sha256;
use brightpearl_core::time::{from_timestamp_millis_floor, DateTime};
use brightpearl_core::utils::{constant_time_eq, Redact};
use brightpearl_core::{Error, Result};
use log::{debug, warn};

use crate::constants::*;
use crate::settings::Settings;

/// Fields of an inbound callback plus the signature it claims.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CallbackQuery {
    fields: BTreeMap<String, String>,
    signature: Option<String>,
}

impl Debug for CallbackQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut fields = f.debug_map();
        for (k, v) in &self.fields {
            if k == CALLBACK_TOKEN {
                fields.entry(k, &Redact::from(v));
            } else {
                fields.entry(k, v);
            }
        }
        fields.finish()
    }
}

impl CallbackQuery {
    /// Create an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string such as `accountCode=abc&timestamp=1&signature=...`.
    ///
    /// A leading `?` is ignored. When a key repeats, the last value wins.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);

        let mut query = Self::new();
        for (k, v) in form_urlencoded::parse(raw.as_bytes()) {
            if k == CALLBACK_SIGNATURE {
                query.signature = Some(v.into_owned());
            } else {
                query.fields.insert(k.into_owned(), v.into_owned());
            }
        }
        query
    }

    /// Set a field and return self.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Set the claimed signature and return self.
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Get a field value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// The claimed signature, if present.
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| Error::request_invalid(format!("callback is missing field {key}")))
    }
}

/// Payload of a validated installation callback.
#[derive(Clone, PartialEq, Eq)]
pub struct InstallCallback {
    /// Account that installed the app.
    pub account_code: String,
    /// Account token issued for the installation.
    pub account_token: String,
    /// When the callback was issued, seconds precision.
    pub timestamp: DateTime,
}

impl Debug for InstallCallback {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallCallback")
            .field("account_code", &self.account_code)
            .field("account_token", &Redact::from(&self.account_token))
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

impl InstallCallback {
    /// Settings carrying the installed account's code and token.
    pub fn into_settings(self) -> Settings {
        Settings::new()
            .with(ACCOUNT_CODE, self.account_code)
            .with(ACCOUNT_TOKEN, self.account_token)
    }
}

/// Payload of a validated ongoing callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OngoingCallback {
    /// Account the callback is about.
    pub account_code: String,
    /// When the callback was issued, seconds precision.
    pub timestamp: DateTime,
}

/// Validates callback signatures with the developer secret.
#[derive(Clone)]
pub struct CallbackValidator {
    secret: String,
}

impl Debug for CallbackValidator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackValidator")
            .field("secret", &Redact::from(&self.secret))
            .finish()
    }
}

impl CallbackValidator {
    /// Create a validator for `secret`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Check `signature` against exactly the given `fields`.
    ///
    /// Fails with [`ErrorKind::Unauthorized`](brightpearl_core::ErrorKind::Unauthorized)
    /// on mismatch. The error never contains either signature.
    pub fn validate(&self, fields: &BTreeMap<&str, &str>, signature: &str) -> Result<()> {
        let mut canonical = self.secret.clone();
        for (k, v) in fields {
            canonical.push_str(k);
            canonical.push('=');
            canonical.push_str(v);
        }

        let expected = hex_sha256(canonical.as_bytes());
        if constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            Ok(())
        } else {
            warn!("callback signature mismatch");
            Err(Error::unauthorized("callback signature does not match"))
        }
    }

    /// Check the query's signature over whichever of `keys` it carries.
    ///
    /// Absent fields are left out of the canonical string.
    fn validate_query(&self, query: &CallbackQuery, keys: &[&'static str]) -> Result<()> {
        let fields: BTreeMap<&str, &str> = keys
            .iter()
            .filter_map(|k| query.get(k).map(|v| (*k, v)))
            .collect();
        self.validate(&fields, query.signature().unwrap_or_default())
    }

    /// Validate an installation callback and extract its payload.
    ///
    /// Signed fields are `accountCode`, `timestamp` and `token`.
    pub fn install_callback(&self, query: &CallbackQuery) -> Result<InstallCallback> {
        self.validate_query(
            query,
            &[CALLBACK_ACCOUNT_CODE, CALLBACK_TIMESTAMP, CALLBACK_TOKEN],
        )?;

        let account_code = query.require(CALLBACK_ACCOUNT_CODE)?;
        let timestamp = query.require(CALLBACK_TIMESTAMP)?;
        let token = query.require(CALLBACK_TOKEN)?;
        debug!("accepted install callback for account {account_code}");

        Ok(InstallCallback {
            account_code: account_code.to_string(),
            account_token: token.to_string(),
            timestamp: parse_timestamp(timestamp)?,
        })
    }

    /// Validate an ongoing callback and extract its payload.
    ///
    /// Signed fields are `accountCode` and `timestamp`.
    pub fn ongoing_callback(&self, query: &CallbackQuery) -> Result<OngoingCallback> {
        self.validate_query(query, &[CALLBACK_ACCOUNT_CODE, CALLBACK_TIMESTAMP])?;

        let account_code = query.require(CALLBACK_ACCOUNT_CODE)?;
        let timestamp = query.require(CALLBACK_TIMESTAMP)?;
        debug!("accepted ongoing callback for account {account_code}");

        Ok(OngoingCallback {
            account_code: account_code.to_string(),
            timestamp: parse_timestamp(timestamp)?,
        })
    }
}

/// Parse a millisecond epoch timestamp into a UTC datetime.
fn parse_timestamp(millis: &str) -> Result<DateTime> {
    let millis: i64 = millis.trim().parse().map_err(|e| {
        Error::request_invalid(format!("callback timestamp {millis:?} is not a number"))
            .with_source(e)
    })?;
    from_timestamp_millis_floor(millis)
}
