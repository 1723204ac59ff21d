//! Logout command implementation.

use anyhow::Result;

use crate::cli::SessionArgs;
use crate::output;
use crate::session;

pub async fn run(session_args: &SessionArgs) -> Result<()> {
    let session = session::open(session_args)?;

    if !session.is_authenticated() {
        output::success("Already logged out");
        return Ok(());
    }

    session.logout().await;
    output::success("Logged out");

    Ok(())
}
