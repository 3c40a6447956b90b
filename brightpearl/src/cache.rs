use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use brightpearl_core::{Context, Result};
use log::debug;
use once_cell::sync::Lazy;

use crate::description::Description;
use crate::resource::LoadResource;

static SHARED: Lazy<Arc<DescriptionCache>> = Lazy::new(|| Arc::new(DescriptionCache::new()));

/// Holds at most one live [`Description`] together with the API domain it was
/// built for.
///
/// Builds are serialized: concurrent callers missing the cache wait for the
/// build in progress instead of starting their own. Readers only ever see a
/// complete `Arc<Description>`.
#[derive(Debug, Default)]
pub struct DescriptionCache {
    current: RwLock<Option<Cached>>,
    build_lock: tokio::sync::Mutex<()>,
    builds: AtomicUsize,
}

#[derive(Debug, Clone)]
struct Cached {
    api_domain: String,
    description: Arc<Description>,
}

impl DescriptionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache used by clients that were not given their own.
    pub fn shared() -> Arc<DescriptionCache> {
        SHARED.clone()
    }

    /// Return the description for `api_domain`, building it if the cache is
    /// empty or holds a description for another domain.
    pub async fn get(
        &self,
        ctx: &Context,
        loader: &dyn LoadResource,
        api_domain: &str,
    ) -> Result<Arc<Description>> {
        if let Some(description) = self.lookup(api_domain) {
            debug!("description cache hit for {api_domain}");
            return Ok(description);
        }

        let _guard = self.build_lock.lock().await;
        // Another caller may have finished the build while we were waiting.
        if let Some(description) = self.lookup(api_domain) {
            return Ok(description);
        }

        debug!("building description for {api_domain}");
        let description = Arc::new(Description::build(ctx, loader, api_domain).await?);
        *self.current.write().expect("lock poisoned") = Some(Cached {
            api_domain: api_domain.to_string(),
            description: description.clone(),
        });
        self.builds.fetch_add(1, Ordering::Relaxed);

        Ok(description)
    }

    fn lookup(&self, api_domain: &str) -> Option<Arc<Description>> {
        self.current
            .read()
            .expect("lock poisoned")
            .as_ref()
            .filter(|cached| cached.api_domain == api_domain)
            .map(|cached| cached.description.clone())
    }

    /// Drop the cached description so the next `get` rebuilds it.
    pub fn invalidate(&self, api_domain: &str) {
        debug!("invalidating description cache for new api domain {api_domain}");
        self.current.write().expect("lock poisoned").take();
    }

    /// Clear the cache and its build counter.
    pub fn reset(&self) {
        self.current.write().expect("lock poisoned").take();
        self.builds.store(0, Ordering::Relaxed);
    }

    /// The currently cached description, if any.
    pub fn current(&self) -> Option<Arc<Description>> {
        self.current
            .read()
            .expect("lock poisoned")
            .as_ref()
            .map(|cached| cached.description.clone())
    }

    /// How many descriptions this cache has built since creation or the last reset.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}
