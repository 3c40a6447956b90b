//! Service description: the merged catalog of operations and models.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use brightpearl_core::{Context, Error, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::merge_global_parameters;
use crate::constants::ROOT_RESOURCE;
use crate::resource::LoadResource;

/// Where a parameter is placed in the outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    /// A `{name}` slot in the URI template.
    Uri,
    /// An HTTP header.
    Header,
    /// A query string pair.
    Query,
    /// A field of the JSON request body.
    Json,
}

/// Definition of a single operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    /// Declared type, informational only.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Where the value goes in the request.
    pub location: Location,
    /// Whether the operation fails without a value.
    #[serde(default)]
    pub required: bool,
    /// Name used on the wire when it differs from the logical name.
    #[serde(
        rename = "sentAs",
        alias = "wireName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub wire_name: Option<String>,
    /// Value used when the parameter bag has none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParameterDef {
    /// Wire name of this parameter, falling back to its logical `name`.
    pub fn wire_name_or<'a>(&'a self, name: &'a str) -> &'a str {
        self.wire_name.as_deref().unwrap_or(name)
    }
}

/// Definition of a remote operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDef {
    /// Operation name, the key it is registered under.
    #[serde(skip)]
    pub name: String,
    /// HTTP method, e.g. `GET`.
    #[serde(rename = "httpMethod")]
    pub http_method: String,
    /// URI template relative to the description base URL.
    #[serde(rename = "uri", alias = "uriTemplate")]
    pub uri_template: String,
    /// Own parameters merged with the global parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterDef>,
    /// Anything else declared on the operation (summary, responseModel, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The fully merged operation registry for one API base URL.
///
/// Descriptions are never mutated after [`Description::build`] returns;
/// a change of API domain always produces a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    base_url: String,
    operations: BTreeMap<String, OperationDef>,
    models: BTreeMap<String, Value>,
    extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct RootResource {
    #[serde(default)]
    services: Vec<String>,
    #[serde(rename = "baseUrl", default)]
    base_url: Option<Value>,
    #[serde(flatten)]
    sections: Map<String, Value>,
}

impl Description {
    /// Build a description from the root resource and every sub-service it lists.
    ///
    /// Sub-services are merged in listed order; the first definition of an
    /// operation or model name wins.
    pub async fn build(
        ctx: &Context,
        loader: &dyn LoadResource,
        api_domain: &str,
    ) -> Result<Description> {
        let root = loader.load(ctx, ROOT_RESOURCE).await?;
        let root: RootResource =
            serde_json::from_value(Value::Object(expect_mapping(ROOT_RESOURCE, root)?)).map_err(
                |e| {
                    Error::description_invalid(format!("resource {ROOT_RESOURCE} is malformed"))
                        .with_source(e)
                },
            )?;
        if root.base_url.is_some() {
            warn!("ignoring baseUrl in {ROOT_RESOURCE}, base url follows the api domain");
        }

        let mut description = Description {
            base_url: format!("https://{api_domain}"),
            operations: BTreeMap::new(),
            models: BTreeMap::new(),
            extra: Map::new(),
        };
        description.merge_resource(ROOT_RESOURCE, root.sections)?;

        for name in &root.services {
            let service = loader.load(ctx, name).await?;
            let service = expect_mapping(name, service)?;
            description.merge_resource(name, service)?;
        }

        debug!(
            "built description for {} with {} operations and {} models",
            description.base_url,
            description.operations.len(),
            description.models.len()
        );
        Ok(description)
    }

    /// Merge one resource's sections into this description.
    fn merge_resource(&mut self, resource: &str, sections: Map<String, Value>) -> Result<()> {
        for (section, set) in sections {
            match section.as_str() {
                "operations" => {
                    let operations: BTreeMap<String, OperationDef> = serde_json::from_value(set)
                        .map_err(|e| {
                            Error::description_invalid(format!(
                                "operations in resource {resource} are malformed"
                            ))
                            .with_source(e)
                        })?;

                    for (name, mut op) in operations {
                        http::Method::from_bytes(op.http_method.to_uppercase().as_bytes())
                            .map_err(|e| {
                                Error::description_invalid(format!(
                                    "operation {name} in resource {resource} has invalid http method {}",
                                    op.http_method
                                ))
                                .with_source(e)
                            })?;
                        op.name = name.clone();
                        merge_global_parameters(&mut op.parameters);

                        match self.operations.entry(name) {
                            Entry::Vacant(v) => {
                                v.insert(op);
                            }
                            Entry::Occupied(o) => {
                                debug!(
                                    "operation {} from {resource} shadowed by earlier definition",
                                    o.key()
                                );
                            }
                        }
                    }
                }
                "models" => {
                    let Value::Object(models) = set else {
                        return Err(Error::description_invalid(format!(
                            "models in resource {resource} is not a mapping"
                        )));
                    };
                    for (name, model) in models {
                        self.models.entry(name).or_insert(model);
                    }
                }
                _ => {
                    if let Some(existing) = self.extra.get_mut(&section) {
                        match (existing, set) {
                            (Value::Object(existing), Value::Object(incoming)) => {
                                for (k, v) in incoming {
                                    existing.entry(k).or_insert(v);
                                }
                            }
                            _ => debug!(
                                "section {section} from {resource} shadowed by earlier definition"
                            ),
                        }
                    } else {
                        self.extra.insert(section, set);
                    }
                }
            }
        }

        Ok(())
    }

    /// Base URL every operation URI is resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Look up an operation by name.
    pub fn operation(&self, name: &str) -> Result<&OperationDef> {
        self.operations
            .get(name)
            .ok_or_else(|| Error::operation_unknown(format!("operation {name} is not defined")))
    }

    /// All operations by name.
    pub fn operations(&self) -> &BTreeMap<String, OperationDef> {
        &self.operations
    }

    /// Names of all operations, sorted.
    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    /// All models by name, passed through unchanged.
    pub fn models(&self) -> &BTreeMap<String, Value> {
        &self.models
    }

    /// Top-level sections other than operations and models.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

fn expect_mapping(resource: &str, value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(Error::description_invalid(format!(
            "resource {resource} is not a mapping"
        ))),
    }
}
