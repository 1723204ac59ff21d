//! Location of the persisted credential file.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use tokengate_file::FileCredentialStore;

use crate::cli::SessionArgs;

/// Get the credential file path, honouring `--credentials-file`.
pub fn credentials_path(args: &SessionArgs) -> Result<PathBuf> {
    if let Some(path) = &args.credentials_file {
        return Ok(path.clone());
    }

    let dirs =
        ProjectDirs::from("", "", "dashboard").context("Could not determine data directory")?;

    let data_dir = dirs.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data directory")?;

    Ok(data_dir.join("credentials.json"))
}

/// Open the credential store.
pub fn open_store(args: &SessionArgs) -> Result<FileCredentialStore> {
    let path = credentials_path(args)?;
    tracing::debug!(path = %path.display(), "Opening credential store");
    FileCredentialStore::open(&path)
        .with_context(|| format!("Failed to open credential file {}", path.display()))
}
