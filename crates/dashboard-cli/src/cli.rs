//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::{login::LoginArgs, request::RequestArgs};

/// Command-line client for the store admin API.
#[derive(Parser, Debug)]
#[command(name = "dashboard")]
#[command(author, version = env!("DASHBOARD_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub session: SessionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the API lives and where credentials are kept.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// API base URL (requests go to <URL>/api)
    #[arg(
        long,
        env = "DASHBOARD_API_URL",
        default_value = "http://localhost:3000",
        global = true
    )]
    pub api_url: String,

    /// Credential file (defaults to the user data directory)
    #[arg(long, env = "DASHBOARD_CREDENTIALS", global = true)]
    pub credentials_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the issued tokens
    Login(LoginArgs),

    /// Sign out and forget the stored tokens
    Logout,

    /// Show whether a session is active
    Whoami,

    /// Force a credential refresh
    Refresh,

    /// Send an authenticated request and print the response
    Request(RequestArgs),
}
