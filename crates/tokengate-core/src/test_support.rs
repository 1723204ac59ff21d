//! Scripted collaborators for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::watch;

use crate::config::ClientConfig;
use crate::credentials::{Credentials, LoginOutput, User};
use crate::error::{AuthError, Error, TransportError};
use crate::memory::MemoryCredentialStore;
use crate::pipeline::RequestPipeline;
use crate::refresh::RefreshCoordinator;
use crate::terminate::SessionTerminator;
use crate::tokens::{AccessToken, CredentialPair, RefreshToken, RefreshedTokens};
use crate::traits::{AuthBackend, Navigator, Transport};
use crate::types::{ApiRequest, ApiResponse};
use crate::Result;

/// How the scripted backend answers refresh calls.
#[derive(Debug, Clone, Copy)]
pub enum RefreshBehavior {
    Succeed(&'static str),
    Fail(&'static str),
}

pub struct ScriptedBackend {
    behavior: RefreshBehavior,
    gate: watch::Sender<bool>,
    refresh_calls: AtomicUsize,
    terminate_calls: AtomicUsize,
    terminated_with: Mutex<Vec<Option<String>>>,
    fail_terminate: AtomicBool,
    stall_terminate: AtomicBool,
}

impl ScriptedBackend {
    fn new(behavior: RefreshBehavior, gated: bool) -> Self {
        let (gate, _) = watch::channel(!gated);
        Self {
            behavior,
            gate,
            refresh_calls: AtomicUsize::new(0),
            terminate_calls: AtomicUsize::new(0),
            terminated_with: Mutex::new(Vec::new()),
            fail_terminate: AtomicBool::new(false),
            stall_terminate: AtomicBool::new(false),
        }
    }

    /// Let blocked and future refresh calls through.
    pub fn open_gate(&self) {
        self.gate.send_replace(true);
    }

    pub fn fail_terminate(&self) {
        self.fail_terminate.store(true, Ordering::SeqCst);
    }

    /// Remote logouts never answer.
    pub fn stall_terminate(&self) {
        self.stall_terminate.store(true, Ordering::SeqCst);
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn terminate_calls(&self) -> usize {
        self.terminate_calls.load(Ordering::SeqCst)
    }

    pub fn terminated_with(&self) -> Vec<Option<String>> {
        self.terminated_with.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthBackend for ScriptedBackend {
    async fn authenticate(&self, credentials: &Credentials) -> Result<LoginOutput> {
        if credentials.password() != "secret" {
            return Err(AuthError::InvalidCredentials.into());
        }
        Ok(LoginOutput {
            user: User {
                id: "u1".into(),
                username: credentials.username().map(str::to_string),
                fullname: Some("Store Admin".into()),
                email: credentials.email().map(str::to_string),
                role: Some("admin".into()),
                extra: Default::default(),
            },
            credentials: CredentialPair::new(AccessToken::new("L1"), RefreshToken::new("LR1")),
        })
    }

    async fn refresh(&self, _refresh_token: &RefreshToken) -> Result<RefreshedTokens> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let mut gate = self.gate.subscribe();
        gate.wait_for(|open| *open).await.expect("gate dropped");
        tokio::task::yield_now().await;

        match self.behavior {
            RefreshBehavior::Succeed(token) => Ok(RefreshedTokens {
                access_token: AccessToken::new(token),
                refresh_token: None,
            }),
            RefreshBehavior::Fail(reason) => Err(AuthError::RefreshFailed {
                reason: reason.to_string(),
            }
            .into()),
        }
    }

    async fn terminate(&self, access_token: Option<&AccessToken>) -> Result<()> {
        self.terminate_calls.fetch_add(1, Ordering::SeqCst);
        self.terminated_with
            .lock()
            .unwrap()
            .push(access_token.map(|t| t.as_str().to_string()));

        if self.stall_terminate.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        if self.fail_terminate.load(Ordering::SeqCst) {
            return Err(TransportError::Connection {
                message: "connection reset".into(),
            }
            .into());
        }
        Ok(())
    }
}

/// A request as it reached the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Sent {
    pub path: String,
    pub authorization: Option<String>,
}

/// Answers 200 to requests carrying the accepted token and 401 otherwise.
///
/// `/offline` fails at the transport level and `/missing` answers 404.
pub struct ScriptedTransport {
    accepted: Mutex<Option<String>>,
    sent: Mutex<Vec<Sent>>,
}

impl ScriptedTransport {
    fn new(accepted: Option<&str>) -> Self {
        Self {
            accepted: Mutex::new(accepted.map(str::to_string)),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn accept(&self, token: Option<&str>) {
        *self.accepted.lock().unwrap() = token.map(str::to_string);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let authorization = request.header_value("Authorization").map(str::to_string);
        self.sent.lock().unwrap().push(Sent {
            path: request.path.clone(),
            authorization: authorization.clone(),
        });

        // Give other in-flight requests a chance to run, like a network hop.
        tokio::task::yield_now().await;

        if request.path == "/offline" {
            return Err(Error::Transport(TransportError::Connection {
                message: "connection refused".into(),
            }));
        }
        if request.path.starts_with("/missing") {
            return Ok(ApiResponse::with_json(
                404,
                &json!({"error": "Not Found", "message": "no such order"}),
            ));
        }

        let accepted = self.accepted.lock().unwrap().clone();
        let authorized = matches!(
            (&accepted, &authorization),
            (Some(token), Some(header)) if *header == format!("Bearer {}", token)
        );

        if authorized || request.is_refresh() {
            Ok(ApiResponse::with_json(
                200,
                &json!({"path": request.path, "authorization": authorization}),
            ))
        } else {
            Ok(ApiResponse::with_json(
                401,
                &json!({"error": "Unauthorized", "message": "jwt expired"}),
            ))
        }
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_to(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

/// A fully wired pipeline whose store starts with `T1`/`R1`.
///
/// The transport initially rejects `T1` and accepts the token the backend
/// hands out on refresh.
pub struct Fixture {
    pub config: ClientConfig,
    pub store: Arc<MemoryCredentialStore>,
    pub backend: Arc<ScriptedBackend>,
    pub transport: Arc<ScriptedTransport>,
    pub navigator: Arc<RecordingNavigator>,
    pub terminator: Arc<SessionTerminator>,
    pub coordinator: Arc<RefreshCoordinator>,
    pub pipeline: Arc<RequestPipeline>,
}

impl Fixture {
    pub fn new(behavior: RefreshBehavior) -> Self {
        Self::build(behavior, false, ClientConfig::default())
    }

    /// Refresh calls block until [`ScriptedBackend::open_gate`].
    pub fn gated(behavior: RefreshBehavior) -> Self {
        Self::build(behavior, true, ClientConfig::default())
    }

    pub fn gated_with_timeouts(
        behavior: RefreshBehavior,
        refresh_timeout: Duration,
        queue_timeout: Duration,
    ) -> Self {
        let config = ClientConfig {
            refresh_timeout,
            queue_timeout,
            ..ClientConfig::default()
        };
        Self::build(behavior, true, config)
    }

    fn build(behavior: RefreshBehavior, gated: bool, config: ClientConfig) -> Self {
        let store = Arc::new(MemoryCredentialStore::with_credentials(CredentialPair::new(
            AccessToken::new("T1"),
            RefreshToken::new("R1"),
        )));
        let backend = Arc::new(ScriptedBackend::new(behavior, gated));
        let accepted = match behavior {
            RefreshBehavior::Succeed(token) => Some(token),
            RefreshBehavior::Fail(_) => None,
        };
        let transport = Arc::new(ScriptedTransport::new(accepted));
        let navigator = Arc::new(RecordingNavigator::default());

        let terminator = Arc::new(SessionTerminator::new(
            store.clone(),
            backend.clone(),
            navigator.clone(),
            config.sign_in_route.clone(),
        ));
        let coordinator = Arc::new(RefreshCoordinator::new(
            store.clone(),
            backend.clone(),
            terminator.clone(),
            &config,
        ));
        let pipeline = Arc::new(RequestPipeline::new(
            transport.clone(),
            store.clone(),
            coordinator.clone(),
        ));

        Self {
            config,
            store,
            backend,
            transport,
            navigator,
            terminator,
            coordinator,
            pipeline,
        }
    }
}
