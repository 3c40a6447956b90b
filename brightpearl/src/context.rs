use brightpearl_core::{Context, OsEnv};
use brightpearl_file_read_tokio::TokioFileRead;
use brightpearl_http_send_reqwest::ReqwestHttpSend;

/// A [`Context`] reading files with tokio, sending requests with reqwest and
/// reading the process environment.
pub fn default_context() -> Context {
    Context::new()
        .with_file_read(TokioFileRead)
        .with_http_send(ReqwestHttpSend::default())
        .with_env(OsEnv)
}

/// Like [`default_context`], sending requests through `client`.
pub fn default_context_with_client(client: reqwest::Client) -> Context {
    default_context().with_http_send(ReqwestHttpSend::new(client))
}
