//! The authenticated client handle applications hold on to.

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, instrument};

use crate::Result;
use crate::config::ClientConfig;
use crate::credentials::{Credentials, User};
use crate::error::AuthError;
use crate::pipeline::RequestPipeline;
use crate::refresh::RefreshCoordinator;
use crate::terminate::SessionTerminator;
use crate::tokens::CredentialPair;
use crate::traits::{AuthBackend, CredentialStore, Navigator, Transport};
use crate::types::{ApiRequest, ApiResponse};

/// An authenticated API session.
///
/// Cloning is cheap; every clone shares the same credentials, refresh
/// coordinator and terminator, so concurrent requests from any clone take
/// part in the same single-flight refresh.
#[derive(Clone)]
pub struct AuthSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: ClientConfig,
    store: Arc<dyn CredentialStore>,
    backend: Arc<dyn AuthBackend>,
    terminator: Arc<SessionTerminator>,
    coordinator: Arc<RefreshCoordinator>,
    pipeline: RequestPipeline,
    user: RwLock<Option<User>>,
}

impl AuthSession {
    /// Wire a session from its collaborators.
    ///
    /// Credentials already present in `store` are used as-is, so a session
    /// restored from a persistent store is authenticated straight away.
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        backend: Arc<dyn AuthBackend>,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let terminator = Arc::new(SessionTerminator::new(
            store.clone(),
            backend.clone(),
            navigator,
            config.sign_in_route.clone(),
        ));
        let coordinator = Arc::new(RefreshCoordinator::new(
            store.clone(),
            backend.clone(),
            terminator.clone(),
            &config,
        ));
        let pipeline = RequestPipeline::new(transport, store.clone(), coordinator.clone());

        Self {
            inner: Arc::new(SessionInner {
                config,
                store,
                backend,
                terminator,
                coordinator,
                pipeline,
                user: RwLock::new(None),
            }),
        }
    }

    /// Log in and store the issued credentials.
    #[instrument(skip_all, fields(identifier = %credentials.identifier()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<User> {
        let output = self.inner.backend.authenticate(credentials).await?;
        self.inner.store.set(output.credentials).await?;
        self.inner.terminator.rearm();

        *self.inner.user.write().unwrap_or_else(PoisonError::into_inner) =
            Some(output.user.clone());

        info!(user = %output.user.display_name(), "Logged in");
        Ok(output.user)
    }

    /// End the session: local clear and the sign-in redirect, then a
    /// best-effort remote logout.
    pub async fn logout(&self) {
        self.inner.terminator.terminate().await;
        self.inner
            .user
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Refresh the credentials now, joining a refresh already in flight.
    pub async fn refresh(&self) -> Result<()> {
        if !self.is_authenticated() {
            return Err(AuthError::NotAuthenticated.into());
        }
        self.inner.coordinator.refresh().await
    }

    /// Send a request through the authenticated pipeline.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.inner.pipeline.send(request).await
    }

    /// `GET` `path` and decode the JSON answer.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    /// `POST` `body` as JSON to `path` and decode the JSON answer.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).json(body)?).await?.json()
    }

    /// True while both tokens are stored. Protected routes should only be
    /// entered when this holds.
    pub fn is_authenticated(&self) -> bool {
        self.inner.store.is_authenticated()
    }

    /// The user returned by the last login, while still authenticated.
    pub fn user(&self) -> Option<User> {
        if !self.is_authenticated() {
            return None;
        }
        self.inner
            .user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the stored credentials.
    pub fn credentials(&self) -> Option<CredentialPair> {
        self.inner.store.credentials()
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.inner.coordinator
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("api_url", &self.inner.config.api_url.as_str())
            .field("authenticated", &self.is_authenticated())
            .field("coordinator", &self.inner.coordinator)
            .finish()
    }
}
