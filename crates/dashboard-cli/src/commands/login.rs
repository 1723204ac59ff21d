//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use tokengate_core::Credentials;

use crate::cli::SessionArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Email address or username
    #[arg(long)]
    pub identifier: String,

    /// Account password
    #[arg(long)]
    pub password: String,
}

pub async fn run(session_args: &SessionArgs, args: LoginArgs) -> Result<()> {
    let session = session::open(session_args)?;
    let credentials = Credentials::new(&args.identifier, &args.password);

    eprintln!("{}", "Logging in...".dimmed());

    let user = session
        .login(&credentials)
        .await
        .context("Failed to login")?;

    output::success("Logged in successfully");
    println!();
    output::field("User", user.display_name());
    if let Some(email) = &user.email {
        output::field("Email", email);
    }
    if let Some(role) = &user.role {
        output::field("Role", role);
    }
    output::field("API", session.config().api_url.as_str());

    Ok(())
}
