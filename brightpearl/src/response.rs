//! Normalization of API responses.

use brightpearl_core::{Error, Result};
use bytes::Bytes;
use log::debug;
use serde_json::{Map, Value};

/// Unwrap the `{response, reference}` envelope.
///
/// Returns the `response` payload when it is set and `reference` is not;
/// anything else is returned unchanged so paginated results keep their
/// reference metadata. A `null` member counts as unset.
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut envelope)
            if is_set(&envelope, "response") && !is_set(&envelope, "reference") =>
        {
            debug!("unwrapping response envelope");
            envelope.remove("response").unwrap_or(Value::Null)
        }
        value => value,
    }
}

fn is_set(envelope: &Map<String, Value>, key: &str) -> bool {
    envelope.get(key).is_some_and(|v| !v.is_null())
}

/// Turn an HTTP response into the operation result.
///
/// Non-success statuses fail with a transport error carrying status and body.
/// An empty body yields `null`.
pub fn parse_response(resp: http::Response<Bytes>) -> Result<Value> {
    let status = resp.status();
    let body = resp.into_body();

    if !status.is_success() {
        return Err(Error::transport(format!(
            "HTTP {status}: {}",
            String::from_utf8_lossy(&body)
        )));
    }

    if body.is_empty() {
        return Ok(Value::Null);
    }

    let value = serde_json::from_slice(&body).map_err(|e| {
        Error::unexpected(format!("response with status {status} is not valid JSON"))
            .with_source(e)
    })?;
    Ok(unwrap_envelope(value))
}
