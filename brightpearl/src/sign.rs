//! Signing of outbound credential tokens.

use brightpearl_core::hash::base64_hmac_sha256;
use log::debug;
use serde_json::{Map, Value};

use crate::constants::*;
use crate::settings::Settings;

/// Sign `token` with `secret`: base64 of HMAC-SHA256 over the token, keyed
/// by the secret.
pub fn sign_token(token: &str, secret: &str) -> String {
    base64_hmac_sha256(secret.as_bytes(), token.as_bytes())
}

/// Write signed copies of `account_token` and `dev_token` into `bag`.
///
/// Values are always signed from the raw settings, never from `bag`, so
/// signing twice can't happen. Without a `dev_secret` nothing is touched.
pub(crate) fn sign_tokens(settings: &Settings, bag: &mut Map<String, Value>) {
    let Some(secret) = settings.get(DEV_SECRET) else {
        return;
    };

    for key in [ACCOUNT_TOKEN, DEV_TOKEN] {
        if let Some(token) = settings.get(key) {
            debug!("signing {key} with dev secret");
            bag.insert(key.to_string(), Value::String(sign_token(token, secret)));
        }
    }
}
