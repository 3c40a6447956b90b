//! Shaping of outgoing requests from operation definitions.

use std::collections::HashMap;

use brightpearl_core::{Error, Result};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::Method;
use log::debug;
use percent_encoding::utf8_percent_encode;
use serde_json::{Map, Value};

use crate::constants::{URI_ENCODE_SET, URI_RESERVED_ENCODE_SET};
use crate::description::{Location, OperationDef};

/// Build the HTTP request for `op` from the parameter bag.
///
/// Every declared parameter takes its value from `bag` by logical name,
/// falling back to its default; `null` counts as absent. Values are placed
/// at the parameter's location under its wire name.
pub fn build_request(
    base_url: &str,
    op: &OperationDef,
    bag: &Map<String, Value>,
) -> Result<http::Request<Bytes>> {
    let method = Method::from_bytes(op.http_method.to_uppercase().as_bytes())?;

    let mut vars = HashMap::new();
    let mut headers = Vec::new();
    let mut query = form_urlencoded::Serializer::new(String::new());
    let mut has_query = false;
    let mut body = Map::new();

    for (name, def) in &op.parameters {
        let value = bag
            .get(name)
            .filter(|v| !v.is_null())
            .or_else(|| def.default.as_ref().filter(|v| !v.is_null()));
        let Some(value) = value else {
            if def.required {
                return Err(Error::parameter_missing(format!(
                    "operation {} requires parameter {name}",
                    op.name
                )));
            }
            continue;
        };

        let wire_name = def.wire_name_or(name);
        match def.location {
            Location::Uri => {
                vars.insert(wire_name, to_param_items(value));
            }
            Location::Header => {
                let header_name = HeaderName::from_bytes(wire_name.as_bytes())?;
                let mut header_value =
                    HeaderValue::from_str(&to_param_string(value)).map_err(|e| {
                        Error::request_invalid(format!(
                            "value of parameter {name} is not a valid header value"
                        ))
                        .with_source(e)
                    })?;
                if wire_name.contains("token") {
                    header_value.set_sensitive(true);
                }
                headers.push((header_name, header_value));
            }
            Location::Query => {
                query.append_pair(wire_name, &to_param_string(value));
                has_query = true;
            }
            Location::Json => {
                body.insert(wire_name.to_string(), value.clone());
            }
        }
    }

    let mut url = join_url(base_url, &expand_template(&op.uri_template, &vars)?);
    if has_query {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&query.finish());
    }

    let mut req = http::Request::builder().method(method).uri(&url);
    for (name, value) in headers {
        req = req.header(name, value);
    }
    let body = if body.is_empty() {
        Bytes::new()
    } else {
        req = req.header(CONTENT_TYPE, "application/json");
        Bytes::from(serde_json::to_vec(&Value::Object(body))?)
    };

    let req = req.body(body)?;
    debug!("prepared {} {} for operation {}", req.method(), req.uri(), op.name);
    Ok(req)
}

/// Render a parameter value the way it appears in a URI, query or header.
///
/// Arrays become comma separated lists.
fn to_param_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) | Value::Object(_) => value.to_string(),
        Value::Array(items) => items
            .iter()
            .map(to_param_string)
            .collect::<Vec<_>>()
            .join(","),
    }
}

/// Split a URI value into list items; scalars are a single item.
fn to_param_items(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(to_param_string).collect(),
        value => vec![to_param_string(value)],
    }
}

/// Expand `{name}` and `{+name}` expressions of a URI template.
///
/// `{name}` percent-encodes everything but unreserved characters, `{+name}`
/// leaves reserved characters intact. Each list item is encoded on its own
/// and items are joined by a literal `,`. Unknown names expand to nothing.
fn expand_template(template: &str, vars: &HashMap<&str, Vec<String>>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let Some(len) = rest[start..].find('}') else {
            return Err(Error::description_invalid(format!(
                "uri template {template} has an unclosed expression"
            )));
        };

        let expr = &rest[start + 1..start + len];
        let (name, set) = match expr.strip_prefix('+') {
            Some(name) => (name, &URI_RESERVED_ENCODE_SET),
            None => (expr, &URI_ENCODE_SET),
        };
        if let Some(items) = vars.get(name) {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.extend(utf8_percent_encode(item, set));
            }
        }

        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);

    Ok(out)
}

fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    let base_url = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base_url}{path}")
    } else {
        format!("{base_url}/{path}")
    }
}
