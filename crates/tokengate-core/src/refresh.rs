//! Single-flight credential refresh.
//!
//! The [`RefreshCoordinator`] owns the refresh state machine. The first
//! request to observe an expired credential while the coordinator is
//! [`Phase::Idle`] becomes the leader: it flips the phase to
//! [`Phase::Refreshing`] and performs the one refresh call. Every other
//! request that fails while the refresh is in flight is parked in a FIFO
//! queue as a oneshot channel and is woken, in arrival order, with the
//! refresh outcome once the leader settles it.
//!
//! The state lives behind a synchronous mutex that is never held across an
//! await point, so transitions are atomic with respect to each other.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{AuthError, Error};
use crate::terminate::SessionTerminator;
use crate::tokens::AccessToken;
use crate::traits::{AuthBackend, CredentialStore};
use crate::types::{RequestId, TrackedRequest};
use crate::Result;

/// Refresh outcome delivered to queued requests.
type RefreshOutcome = std::result::Result<(), AuthError>;

/// Phase of the refresh state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Refreshing,
}

/// A request suspended until the in-flight refresh settles.
struct QueuedRequest {
    id: RequestId,
    notify: oneshot::Sender<RefreshOutcome>,
}

struct RefreshState {
    phase: Phase,
    pending: VecDeque<QueuedRequest>,
    refresh_calls: u64,
}

/// What a caller has to do after enlisting with the coordinator.
enum Role {
    /// Perform the refresh and settle the queue.
    Lead,
    /// Wait for the in-flight refresh.
    Follow(oneshot::Receiver<RefreshOutcome>),
    /// Newer credentials are already stored; just resend.
    Replay,
}

/// Coordinates credential refreshes across concurrently failing requests.
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
    store: Arc<dyn CredentialStore>,
    backend: Arc<dyn AuthBackend>,
    terminator: Arc<SessionTerminator>,
    refresh_timeout: Duration,
    queue_timeout: Duration,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        backend: Arc<dyn AuthBackend>,
        terminator: Arc<SessionTerminator>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            state: Mutex::new(RefreshState {
                phase: Phase::Idle,
                pending: VecDeque::new(),
                refresh_calls: 0,
            }),
            store,
            backend,
            terminator,
            refresh_timeout: config.refresh_timeout,
            queue_timeout: config.queue_timeout,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    /// Number of requests waiting on the in-flight refresh.
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Number of refresh calls made so far.
    pub fn refresh_calls(&self) -> u64 {
        self.lock().refresh_calls
    }

    /// Recover from a credential-expired response to `request`.
    ///
    /// `sent_with` is the access token the failed attempt carried. On `Ok`
    /// the request's retry marker is set and the caller should resend it
    /// with the credentials now in the store.
    ///
    /// # Errors
    ///
    /// - [`AuthError::DoubleFailure`] if the request was already retried.
    /// - [`AuthError::RefreshFailed`] if the refresh failed; the session has
    ///   been terminated by then.
    /// - [`AuthError::RefreshTimedOut`] if the request gave up waiting.
    #[instrument(skip_all, fields(request_id = %request.id))]
    pub async fn recover(
        &self,
        request: &mut TrackedRequest,
        sent_with: Option<&AccessToken>,
    ) -> Result<()> {
        if request.retried {
            debug!("Request already retried, not refreshing again");
            return Err(AuthError::DoubleFailure.into());
        }

        let role = self.enlist(request.id, Some(sent_with));
        request.mark_retried();
        self.play(role).await
    }

    /// Refresh the credentials now, or join the refresh already in flight.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        let role = self.enlist(RequestId::new(), None);
        self.play(role).await
    }

    /// Decide the caller's role in one critical section.
    ///
    /// `rejected_token` is `Some(token)` when the caller saw a request fail
    /// with `token`; a stale token while idle means another refresh already
    /// finished and the request only needs replaying.
    fn enlist(&self, id: RequestId, rejected_token: Option<Option<&AccessToken>>) -> Role {
        let mut state = self.lock();
        match state.phase {
            Phase::Refreshing => {
                let (notify, wait) = oneshot::channel();
                state.pending.push_back(QueuedRequest { id, notify });
                debug!(queued = state.pending.len(), "Refresh in flight, queueing request");
                Role::Follow(wait)
            }
            Phase::Idle => {
                if let Some(sent_with) = rejected_token
                    && self.has_newer_token(sent_with)
                {
                    return Role::Replay;
                }
                state.phase = Phase::Refreshing;
                state.refresh_calls += 1;
                Role::Lead
            }
        }
    }

    async fn play(&self, role: Role) -> Result<()> {
        match role {
            Role::Lead => self.lead().await,
            Role::Follow(wait) => self.follow(wait).await,
            Role::Replay => {
                debug!("Newer credentials already stored, replaying");
                Ok(())
            }
        }
    }

    async fn lead(&self) -> Result<()> {
        let guard = SettleGuard {
            coordinator: self,
            settled: false,
        };

        info!("Refreshing credentials");
        let outcome = self.refresh_credentials().await;

        match &outcome {
            Ok(()) => info!("Credentials refreshed"),
            Err(e) => warn!(error = %e, "Credential refresh failed"),
        }

        guard.settle(outcome.clone());

        if outcome.is_err() {
            self.terminator.terminate().await;
        }

        outcome.map_err(Error::from)
    }

    async fn follow(&self, wait: oneshot::Receiver<RefreshOutcome>) -> Result<()> {
        match tokio::time::timeout(self.queue_timeout, wait).await {
            Ok(Ok(outcome)) => outcome.map_err(Error::from),
            Ok(Err(_)) => Err(AuthError::RefreshAbandoned.into()),
            Err(_) => {
                let waited_ms = u64::try_from(self.queue_timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(waited_ms, "Gave up waiting for credential refresh");
                Err(AuthError::RefreshTimedOut { waited_ms }.into())
            }
        }
    }

    /// Call the backend and store the renewed pair.
    async fn refresh_credentials(&self) -> RefreshOutcome {
        let current = self.store.credentials().ok_or_else(|| AuthError::RefreshFailed {
            reason: "no refresh token stored".to_string(),
        })?;

        let refreshed = match tokio::time::timeout(
            self.refresh_timeout,
            self.backend.refresh(current.refresh_token()),
        )
        .await
        {
            Ok(Ok(refreshed)) => refreshed,
            Ok(Err(e)) => return Err(refresh_failure(e)),
            Err(_) => {
                return Err(AuthError::RefreshFailed {
                    reason: format!(
                        "refresh timed out after {}ms",
                        self.refresh_timeout.as_millis()
                    ),
                });
            }
        };

        self.store
            .set(current.renewed(refreshed))
            .await
            .map_err(|e| AuthError::RefreshFailed {
                reason: format!("failed to store refreshed credentials: {}", e),
            })
    }

    fn has_newer_token(&self, sent_with: Option<&AccessToken>) -> bool {
        match (sent_with, self.store.access_token()) {
            (Some(sent), Some(current)) => *sent != current,
            (None, Some(_)) => true,
            (_, None) => false,
        }
    }

    /// Return to idle and wake every queued request, oldest first.
    fn settle(&self, outcome: RefreshOutcome) {
        let pending: Vec<QueuedRequest> = {
            let mut state = self.lock();
            state.phase = Phase::Idle;
            state.pending.drain(..).collect()
        };

        debug!(woken = pending.len(), ok = outcome.is_ok(), "Settling refresh");
        for queued in pending {
            // The receiver is gone if that request already timed out.
            if queued.notify.send(outcome.clone()).is_err() {
                debug!(request_id = %queued.id, "Queued request no longer waiting");
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("RefreshCoordinator")
            .field("phase", &state.phase)
            .field("pending", &state.pending.len())
            .field("refresh_calls", &state.refresh_calls)
            .finish()
    }
}

/// Settles the refresh even if the leading future is dropped mid-flight.
struct SettleGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl SettleGuard<'_> {
    fn settle(mut self, outcome: RefreshOutcome) {
        self.settled = true;
        self.coordinator.settle(outcome);
    }
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Refresh abandoned before it settled");
            self.coordinator.settle(Err(AuthError::RefreshAbandoned));
        }
    }
}

fn refresh_failure(err: Error) -> AuthError {
    match err {
        Error::Auth(AuthError::RefreshFailed { reason }) => AuthError::RefreshFailed { reason },
        other => AuthError::RefreshFailed {
            reason: other.to_string(),
        },
    }
}
