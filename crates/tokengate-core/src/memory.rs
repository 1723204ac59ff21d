//! In-memory credential store.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::Result;
use crate::tokens::CredentialPair;
use crate::traits::CredentialStore;

/// A [`CredentialStore`] that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: RwLock<Option<CredentialPair>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with a pair.
    pub fn with_credentials(credentials: CredentialPair) -> Self {
        Self {
            credentials: RwLock::new(Some(credentials)),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    fn credentials(&self) -> Option<CredentialPair> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn set(&self, credentials: CredentialPair) -> Result<()> {
        *self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(credentials);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
