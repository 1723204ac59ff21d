//! Refresh command implementation.

use anyhow::{Context, Result};
use colored::Colorize;

use crate::cli::SessionArgs;
use crate::output;
use crate::session;

pub async fn run(session_args: &SessionArgs) -> Result<()> {
    let session = session::open_authenticated(session_args)?;

    eprintln!("{}", "Refreshing credentials...".dimmed());

    session
        .refresh()
        .await
        .context("Failed to refresh credentials")?;

    output::success("Credentials refreshed successfully");

    Ok(())
}
