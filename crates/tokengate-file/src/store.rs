//! Filesystem storage for the credential pair.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use tokengate_core::error::StorageError;
use tokengate_core::traits::CredentialStore;
use tokengate_core::{AccessToken, CredentialPair, RefreshToken, Result};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// On-disk representation of the pair.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCredentials {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// A [`CredentialStore`] persisted as a JSON document.
///
/// The file is read once when the store is opened; afterwards the in-memory
/// pair is authoritative and every write goes through to disk. Writes are
/// serialized with an exclusive lock on a sibling `.lock` file and land via
/// rename, so the document on disk always holds a complete pair.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    credentials: RwLock<Option<CredentialPair>>,
}

impl FileCredentialStore {
    /// Open the store at `path`, loading any persisted pair.
    ///
    /// A missing file is an empty store. A file holding only one of the two
    /// tokens is treated as unauthenticated.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let credentials = load(&path)?;
        debug!(authenticated = credentials.is_some(), "Opened credential store");

        Ok(Self {
            path,
            credentials: RwLock::new(credentials),
        })
    }

    /// Path of the credential document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Run `f` while holding the exclusive file lock.
    fn with_lock<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }

        let lock_path = self.lock_path();
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| io_error(&lock_path, e))?;

        lock_file
            .lock_exclusive()
            .map_err(|e| io_error(&lock_path, e))?;
        let result = f();
        lock_file.unlock().map_err(|e| io_error(&lock_path, e))?;

        result
    }

    fn persist(&self, credentials: &CredentialPair) -> Result<()> {
        let stored = StoredCredentials {
            access_token: Some(credentials.access_token().as_str().to_string()),
            refresh_token: Some(credentials.refresh_token().as_str().to_string()),
        };
        let json = serde_json::to_string_pretty(&stored)?;

        self.with_lock(|| {
            let tmp = self
                .path
                .with_extension(format!("{}.tmp", Uuid::new_v4().simple()));

            let mut file = OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&tmp)
                .map_err(|e| io_error(&tmp, e))?;

            // Restrict permissions before the tokens hit the disk.
            #[cfg(unix)]
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| io_error(&tmp, e))?;

            file.write_all(json.as_bytes())
                .and_then(|()| file.sync_all())
                .map_err(|e| io_error(&tmp, e))?;

            fs::rename(&tmp, &self.path).map_err(|e| {
                let _ = fs::remove_file(&tmp);
                io_error(&self.path, e)
            })
        })
    }

    fn remove(&self) -> Result<()> {
        self.with_lock(|| match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&self.path, e)),
        })
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    fn credentials(&self) -> Option<CredentialPair> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    async fn set(&self, credentials: CredentialPair) -> Result<()> {
        self.persist(&credentials)?;
        *self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(credentials);
        debug!("Credentials saved");
        Ok(())
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    async fn clear(&self) -> Result<()> {
        // Forget the pair first so nothing reads it while the file goes.
        self.credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.remove()?;
        debug!("Credentials cleared");
        Ok(())
    }
}

fn load(path: &Path) -> Result<Option<CredentialPair>> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(path, e)),
    };

    let stored: StoredCredentials =
        serde_json::from_str(&json).map_err(|e| StorageError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    let has_access = stored.access_token.is_some();
    let has_refresh = stored.refresh_token.is_some();
    let pair = CredentialPair::from_parts(
        stored.access_token.map(AccessToken::new),
        stored.refresh_token.map(RefreshToken::new),
    );

    if pair.is_none() && (has_access || has_refresh) {
        warn!(
            path = %path.display(),
            "Credential file holds only one token, treating as signed out"
        );
    }

    Ok(pair)
}

fn io_error(path: &Path, err: io::Error) -> tokengate_core::Error {
    StorageError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
    .into()
}
