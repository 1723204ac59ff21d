//! Request command implementation.

use anyhow::{Context, Result};
use clap::Args;

use tokengate_core::{ApiRequest, Method};

use crate::cli::SessionArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    pub method: String,

    /// Path relative to the API root (e.g. /orders)
    pub path: String,

    /// JSON request body
    #[arg(long)]
    pub data: Option<String>,

    /// Print compact JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,
}

pub async fn run(session_args: &SessionArgs, args: RequestArgs) -> Result<()> {
    let method: Method = args.method.parse().context("Invalid method")?;
    let mut request = ApiRequest::new(method, &args.path);

    if let Some(data) = &args.data {
        let body: serde_json::Value =
            serde_json::from_str(data).context("--data must be valid JSON")?;
        request = request.json(&body)?;
    }

    let session = session::open_authenticated(session_args)?;
    let response = session
        .send(request)
        .await
        .with_context(|| format!("{} {} failed", method, args.path))?;

    if response.body.is_empty() {
        output::success(&format!("HTTP {}", response.status));
        return Ok(());
    }

    match response.json::<serde_json::Value>() {
        Ok(body) if args.compact => output::json(&body),
        Ok(body) => output::json_pretty(&body),
        Err(_) => {
            println!("{}", response.text());
            Ok(())
        }
    }
}
