//! Session termination.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, instrument, warn};

use crate::traits::{AuthBackend, CredentialStore, Navigator};

/// Ends the session: clears stored credentials and signals the navigator.
///
/// Termination is idempotent. Once it has run, further calls do nothing
/// until [`SessionTerminator::rearm`] is called by a new login.
pub struct SessionTerminator {
    store: Arc<dyn CredentialStore>,
    backend: Arc<dyn AuthBackend>,
    navigator: Arc<dyn Navigator>,
    sign_in_route: String,
    terminated: AtomicBool,
}

impl SessionTerminator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        backend: Arc<dyn AuthBackend>,
        navigator: Arc<dyn Navigator>,
        sign_in_route: impl Into<String>,
    ) -> Self {
        Self {
            store,
            backend,
            navigator,
            sign_in_route: sign_in_route.into(),
            terminated: AtomicBool::new(false),
        }
    }

    /// Terminate the session.
    ///
    /// Local credentials are cleared and the navigator is signalled before
    /// the best-effort remote logout starts, so dropping this future while
    /// the logout is in flight still leaves the session signed out. Returns
    /// `false` if the session had already been terminated.
    #[instrument(skip(self))]
    pub async fn terminate(&self) -> bool {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return false;
        }

        info!("Terminating session");

        // The remote logout still needs the token after the store is empty.
        let access_token = self.store.access_token();

        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "Failed to clear persisted credentials");
        }
        self.navigator.navigate_to(&self.sign_in_route);

        if let Err(e) = self.backend.terminate(access_token.as_ref()).await {
            warn!(error = %e, "Remote logout failed, local session already cleared");
        }
        true
    }

    /// Allow the next [`terminate`](Self::terminate) call to run again.
    pub fn rearm(&self) {
        self.terminated.store(false, Ordering::Release);
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    pub fn sign_in_route(&self) -> &str {
        &self.sign_in_route
    }
}

impl std::fmt::Debug for SessionTerminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTerminator")
            .field("sign_in_route", &self.sign_in_route)
            .field("terminated", &self.is_terminated())
            .finish()
    }
}
