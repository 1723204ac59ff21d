//! Credential store trait.

use async_trait::async_trait;

use crate::Result;
use crate::tokens::{AccessToken, CredentialPair};

/// Holds the current credential pair.
///
/// Reads are synchronous snapshots so the pipeline can attach a token
/// without suspending. Writes replace the whole pair at once, which keeps
/// the "both halves or neither" invariant intact for every reader.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the current pair, if any.
    fn credentials(&self) -> Option<CredentialPair>;

    /// Replace the stored pair.
    async fn set(&self, credentials: CredentialPair) -> Result<()>;

    /// Remove both tokens.
    async fn clear(&self) -> Result<()>;

    /// Returns the current access token, if any.
    fn access_token(&self) -> Option<AccessToken> {
        self.credentials().map(|pair| pair.access_token().clone())
    }

    /// True when a complete pair is stored.
    fn is_authenticated(&self) -> bool {
        self.credentials().is_some()
    }
}
