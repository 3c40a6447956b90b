use std::sync::Arc;

use brightpearl_core::{Context, Error, Result};
use bytes::Bytes;
use log::debug;
use serde_json::{Map, Value};

use crate::cache::DescriptionCache;
use crate::callback::{CallbackQuery, CallbackValidator, InstallCallback, OngoingCallback};
use crate::constants::*;
use crate::description::Description;
use crate::request::build_request;
use crate::resource::LoadResource;
use crate::response::parse_response;
use crate::settings::Settings;
use crate::sign::sign_tokens;

/// Client invokes operations of the service description by name.
///
/// The description is bound lazily on first use and rebound whenever
/// `api_domain` changes. Clients share the process-wide
/// [`DescriptionCache`] unless given their own.
#[derive(Clone, Debug)]
pub struct Client {
    ctx: Context,
    loader: Arc<dyn LoadResource>,
    cache: Arc<DescriptionCache>,
    settings: Settings,
    description: Option<Arc<Description>>,
}

impl Client {
    /// Create a new client loading its description through `loader`.
    pub fn new(ctx: Context, loader: impl LoadResource) -> Self {
        Self {
            ctx,
            loader: Arc::new(loader),
            cache: DescriptionCache::shared(),
            settings: Settings::new(),
            description: None,
        }
    }

    /// Replace the settings of an unbound client.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Use `cache` instead of the process-wide cache.
    pub fn with_cache(mut self, cache: Arc<DescriptionCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Current settings, tokens unsigned.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The API domain requests go to.
    pub fn api_domain(&self) -> &str {
        self.settings.get(API_DOMAIN).unwrap_or(DEFAULT_API_DOMAIN)
    }

    /// The bound description, if any.
    pub fn description(&self) -> Option<&Arc<Description>> {
        self.description.as_ref()
    }

    /// Whether a description is bound.
    pub fn is_bound(&self) -> bool {
        self.description.is_some()
    }

    /// Merge `patch` into the settings.
    ///
    /// A bound client whose `api_domain` changed is rebound to a description
    /// for the new domain; other changes keep the current binding.
    pub async fn update_settings(&mut self, patch: Settings) -> Result<()> {
        let changed = self.settings.merge(patch);
        if changed.is_empty() {
            return Ok(());
        }
        debug!("settings changed: {changed:?}");

        if self.is_bound() && changed.iter().any(|k| k == API_DOMAIN) {
            self.description = None;
            self.cache.invalidate(self.api_domain());
            self.bind().await?;
        }
        Ok(())
    }

    /// Bind the description for the current API domain, building it if needed.
    pub async fn bind(&mut self) -> Result<Arc<Description>> {
        let description = self
            .cache
            .get(&self.ctx, self.loader.as_ref(), self.api_domain())
            .await?;
        self.description = Some(description.clone());
        Ok(description)
    }

    async fn bound(&mut self) -> Result<Arc<Description>> {
        if let Some(description) = &self.description {
            return Ok(description.clone());
        }
        self.bind().await
    }

    /// The parameter bag an invocation with `params` would use.
    ///
    /// Starts from the settings with `apiVersion` set, replaces
    /// `account_token` and `dev_token` with signed copies when `dev_secret`
    /// is configured, then applies `params` on top. The developer secret
    /// itself is never part of the bag.
    pub fn compose_parameters(&self, params: Map<String, Value>) -> Map<String, Value> {
        let mut bag: Map<String, Value> = self
            .settings
            .iter()
            .filter(|(k, _)| *k != DEV_SECRET)
            .map(|(k, v)| (k.to_string(), Value::from(v)))
            .collect();
        bag.insert(API_VERSION_PARAM.to_string(), Value::from(API_VERSION));
        sign_tokens(&self.settings, &mut bag);
        bag.extend(params);
        bag
    }

    /// Build the request `invoke` would send, without sending it.
    pub async fn prepare(
        &mut self,
        operation: &str,
        params: Map<String, Value>,
    ) -> Result<http::Request<Bytes>> {
        let description = self.bound().await?;
        let op = description.operation(operation)?;

        build_request(description.base_url(), op, &self.compose_parameters(params))
    }

    /// Invoke `operation` with `params` and return the unwrapped response.
    ///
    /// Unknown operations and missing required parameters fail before
    /// anything is sent.
    pub async fn invoke(&mut self, operation: &str, params: Map<String, Value>) -> Result<Value> {
        let req = self.prepare(operation, params).await?;
        debug!("invoking {operation}: {} {}", req.method(), req.uri());

        let resp = self.ctx.http_send(req).await?;
        parse_response(resp)
    }

    fn callback_validator(&self) -> Result<CallbackValidator> {
        self.settings
            .get(DEV_SECRET)
            .map(CallbackValidator::new)
            .ok_or_else(|| Error::config_invalid("dev_secret is required to validate callbacks"))
    }

    /// Validate an installation callback with the configured `dev_secret`.
    pub fn install_callback(&self, query: &CallbackQuery) -> Result<InstallCallback> {
        self.callback_validator()?.install_callback(query)
    }

    /// Validate an ongoing callback with the configured `dev_secret`.
    pub fn ongoing_callback(&self, query: &CallbackQuery) -> Result<OngoingCallback> {
        self.callback_validator()?.ongoing_callback(query)
    }
}
