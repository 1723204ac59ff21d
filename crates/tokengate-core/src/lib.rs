//! tokengate-core - Authenticated request pipeline with single-flight
//! credential refresh.
//!
//! Every outbound request goes through a [`RequestPipeline`] that attaches
//! the current access token. When the server answers 401, the request is
//! handed to the [`RefreshCoordinator`]: the first such request performs the
//! one refresh call, later ones queue behind it and are replayed in arrival
//! order once it settles. A failed refresh ends the session through the
//! [`SessionTerminator`].
//!
//! The crate is transport agnostic. `tokengate-http` provides the reqwest
//! transport and backend; `tokengate-file` a persistent credential store.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokengate_core::{ApiRequest, AuthSession, ClientConfig, Credentials};
//! use tokengate_core::memory::MemoryCredentialStore;
//! # use tokengate_core::traits::{AuthBackend, Transport};
//!
//! # async fn example(
//! #     transport: Arc<dyn Transport>,
//! #     backend: Arc<dyn AuthBackend>,
//! # ) -> tokengate_core::Result<()> {
//! let session = AuthSession::new(
//!     ClientConfig::default(),
//!     transport,
//!     backend,
//!     Arc::new(MemoryCredentialStore::new()),
//!     Arc::new(|route: &str| println!("session ended, go to {route}")),
//! );
//!
//! session.login(&Credentials::new("admin@example.com", "hunter2")).await?;
//! let orders = session.send(ApiRequest::get("/orders")).await?;
//! println!("{}", orders.text());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod credentials;
pub mod endpoints;
pub mod error;
pub mod memory;
pub mod pipeline;
pub mod refresh;
pub mod session;
pub mod terminate;
pub mod tokens;
pub mod traits;
pub mod types;

#[cfg(test)]
mod test_support;

pub use config::ClientConfig;
pub use credentials::{Credentials, LoginOutput, User};
pub use error::{AuthError, Error};
pub use pipeline::RequestPipeline;
pub use refresh::{Phase, RefreshCoordinator};
pub use session::AuthSession;
pub use terminate::SessionTerminator;
pub use tokens::{AccessToken, CredentialPair, RefreshToken, RefreshedTokens};
pub use types::{ApiRequest, ApiResponse, ApiUrl, Method, TrackedRequest};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
