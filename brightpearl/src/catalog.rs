//! Global parameters accepted by every operation.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::constants::*;
use crate::description::{Location, ParameterDef};

/// (name, location, required, wire name)
const GLOBALS: [(&str, Location, bool, Option<&str>); 6] = [
    (API_VERSION_PARAM, Location::Uri, true, None),
    (ACCOUNT_CODE, Location::Uri, true, None),
    (DEV_REFERENCE, Location::Header, false, Some(HEADER_DEV_REF)),
    (APP_REFERENCE, Location::Header, false, Some(HEADER_APP_REF)),
    (ACCOUNT_TOKEN, Location::Header, false, Some(HEADER_ACCOUNT_TOKEN)),
    (STAFF_TOKEN, Location::Header, false, Some(HEADER_STAFF_TOKEN)),
];

static GLOBAL_PARAMETERS: Lazy<BTreeMap<String, ParameterDef>> = Lazy::new(|| {
    GLOBALS
        .iter()
        .map(|(name, location, required, wire_name)| {
            (
                name.to_string(),
                ParameterDef {
                    kind: Some("string".to_string()),
                    location: *location,
                    required: *required,
                    wire_name: wire_name.map(str::to_string),
                    default: None,
                },
            )
        })
        .collect()
});

/// The parameters injected into every operation: API version and account
/// code in the URI, developer/app references and auth tokens as headers.
pub fn global_parameters() -> &'static BTreeMap<String, ParameterDef> {
    &GLOBAL_PARAMETERS
}

/// Add the global parameters to an operation's own parameters.
///
/// Parameters the operation already declares are kept as they are.
pub fn merge_global_parameters(parameters: &mut BTreeMap<String, ParameterDef>) {
    for (name, def) in global_parameters() {
        parameters
            .entry(name.clone())
            .or_insert_with(|| def.clone());
    }
}
