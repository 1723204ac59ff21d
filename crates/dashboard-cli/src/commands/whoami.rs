//! Whoami command implementation.

use anyhow::Result;

use crate::cli::SessionArgs;
use crate::output;
use crate::session::{self, storage};

pub fn run(session_args: &SessionArgs) -> Result<()> {
    let session = session::open_authenticated(session_args)?;

    output::success("Logged in");
    output::field("API", session.config().api_url.as_str());
    output::field(
        "Credentials",
        &storage::credentials_path(session_args)?.display().to_string(),
    );

    Ok(())
}
