//! tokengate-http - HTTP transport and authentication backend.

mod backend;
mod client;
mod endpoints;

use std::sync::Arc;

use tokengate_core::traits::{CredentialStore, Navigator};
use tokengate_core::{AuthSession, ClientConfig, Result};

pub use backend::HttpAuthBackend;
pub use client::HttpTransport;

/// Build an [`AuthSession`] that talks to `config.api_url` over HTTP.
///
/// The transport is shared between the request pipeline and the
/// authentication backend, so cookies set on login reach the refresh call.
pub fn connect(
    config: ClientConfig,
    store: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
) -> Result<AuthSession> {
    let transport = Arc::new(HttpTransport::new(&config)?);
    let backend = Arc::new(HttpAuthBackend::new(transport.clone()));
    Ok(AuthSession::new(config, transport, backend, store, navigator))
}
