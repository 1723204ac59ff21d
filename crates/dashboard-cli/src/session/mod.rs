//! Session wiring for CLI commands.

pub mod storage;

use std::sync::Arc;

use anyhow::{Context, Result};

use tokengate_core::traits::Navigator;
use tokengate_core::{ApiUrl, AuthSession, ClientConfig};

use crate::cli::SessionArgs;
use crate::output;

/// The CLI's sign-in redirect: tell the user to log in again.
struct SignInNotice;

impl Navigator for SignInNotice {
    fn navigate_to(&self, _route: &str) {
        output::notice("Session ended.", "Run 'dashboard login' to sign in again.");
    }
}

/// Open an HTTP session over the persisted credentials.
pub fn open(args: &SessionArgs) -> Result<AuthSession> {
    let api_url = ApiUrl::new(&args.api_url).context("Invalid API URL")?;
    let store = storage::open_store(args)?;

    tokengate_http::connect(
        ClientConfig::new(api_url),
        Arc::new(store),
        Arc::new(SignInNotice),
    )
    .context("Failed to create HTTP client")
}

/// Open a session that must already be authenticated.
pub fn open_authenticated(args: &SessionArgs) -> Result<AuthSession> {
    let session = open(args)?;
    anyhow::ensure!(
        session.is_authenticated(),
        "No active session. Run 'dashboard login' first."
    );
    Ok(session)
}
