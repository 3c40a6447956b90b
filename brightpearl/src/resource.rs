//! Loading of service description resources.

use std::collections::HashMap;
use std::fmt::Debug;
use std::path::PathBuf;

use async_trait::async_trait;
use brightpearl_core::{Context, Error, Result};
use log::debug;
use serde_json::Value;

/// LoadResource resolves a resource name to its parsed content.
///
/// The root resource is named `service-config`; every other name comes from
/// its `services` list.
#[async_trait]
pub trait LoadResource: Debug + Send + Sync + 'static {
    /// Load the named resource.
    ///
    /// Returns [`ErrorKind::ResourceNotFound`](brightpearl_core::ErrorKind::ResourceNotFound)
    /// when no resource with that name exists.
    async fn load(&self, ctx: &Context, name: &str) -> Result<Value>;
}

/// Loads `<dir>/<name>.json` through the context's file reader.
#[derive(Debug, Clone)]
pub struct FileResourceLoader {
    dir: PathBuf,
}

impl FileResourceLoader {
    /// Create a loader reading resources from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl LoadResource for FileResourceLoader {
    async fn load(&self, ctx: &Context, name: &str) -> Result<Value> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(Error::resource_not_found(format!(
                "resource name {name:?} is not a valid file name"
            )));
        }

        let path = self.dir.join(format!("{name}.json"));
        let path = path.to_string_lossy();
        debug!("loading resource {name} from {path}");

        let content = ctx.file_read(&path).await?;
        serde_json::from_slice(&content).map_err(|e| {
            Error::description_invalid(format!("resource {name} is not valid JSON"))
                .with_source(e)
        })
    }
}

/// In-memory resources keyed by name.
#[derive(Debug, Clone, Default)]
pub struct StaticResourceLoader {
    resources: HashMap<String, Value>,
}

impl StaticResourceLoader {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a resource.
    pub fn with_resource(mut self, name: impl Into<String>, content: Value) -> Self {
        self.resources.insert(name.into(), content);
        self
    }

    /// The description resources shipped with this crate.
    pub fn bundled() -> Result<Self> {
        let files = [
            ("service-config", include_str!("../resources/service-config.json")),
            ("contact-service", include_str!("../resources/contact-service.json")),
            ("order-service", include_str!("../resources/order-service.json")),
            ("product-service", include_str!("../resources/product-service.json")),
        ];

        let mut loader = Self::new();
        for (name, content) in files {
            let content = serde_json::from_str(content).map_err(|e| {
                Error::description_invalid(format!("bundled resource {name} is not valid JSON"))
                    .with_source(e)
            })?;
            loader = loader.with_resource(name, content);
        }
        Ok(loader)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for StaticResourceLoader {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Self {
            resources: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[async_trait]
impl LoadResource for StaticResourceLoader {
    async fn load(&self, _: &Context, name: &str) -> Result<Value> {
        self.resources
            .get(name)
            .cloned()
            .ok_or_else(|| Error::resource_not_found(format!("resource {name} not found")))
    }
}
