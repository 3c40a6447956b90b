#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub use brightpearl_core::*;

pub mod constants;

mod cache;
pub use cache::DescriptionCache;
mod callback;
pub use callback::{CallbackQuery, CallbackValidator, InstallCallback, OngoingCallback};
mod catalog;
pub use catalog::{global_parameters, merge_global_parameters};
mod client;
pub use client::Client;
mod description;
pub use description::{Description, Location, OperationDef, ParameterDef};
mod request;
pub use request::build_request;
mod resource;
pub use resource::{FileResourceLoader, LoadResource, StaticResourceLoader};
mod response;
pub use response::{parse_response, unwrap_envelope};
mod settings;
pub use settings::Settings;
mod sign;
pub use sign::sign_token;

#[cfg(feature = "default-context")]
mod context;
#[cfg(feature = "default-context")]
pub use context::{default_context, default_context_with_client};
