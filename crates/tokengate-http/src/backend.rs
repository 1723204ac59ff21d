//! HTTP authentication backend.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use tokengate_core::endpoints::{LOGIN, LOGOUT, REFRESH};
use tokengate_core::error::AuthError;
use tokengate_core::traits::{AuthBackend, Transport};
use tokengate_core::{
    AccessToken, ApiRequest, CredentialPair, Credentials, Error, LoginOutput, RefreshToken,
    RefreshedTokens, Result,
};

use crate::endpoints::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse};

/// Talks to the `/auth` operations directly over a [`Transport`].
///
/// These calls bypass the request pipeline: no access token is attached
/// automatically and a 401 is interpreted here rather than coordinated.
#[derive(Clone)]
pub struct HttpAuthBackend {
    transport: Arc<dyn Transport>,
}

impl HttpAuthBackend {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    #[instrument(skip_all, fields(identifier = %credentials.identifier()))]
    async fn authenticate(&self, credentials: &Credentials) -> Result<LoginOutput> {
        let body = LoginRequest {
            username: credentials.username(),
            email: credentials.email(),
            password: credentials.password(),
        };
        let response = self
            .transport
            .execute(&ApiRequest::post(LOGIN).json(&body)?)
            .await?;

        if response.status == 401 {
            return Err(AuthError::InvalidCredentials.into());
        }
        if !response.is_success() {
            return Err(Error::Protocol(response.protocol_error()));
        }

        let login: LoginResponse = response.json()?;
        debug!(user_id = %login.user.id, "Login accepted");

        Ok(LoginOutput {
            user: login.user,
            credentials: CredentialPair::new(
                AccessToken::new(login.access_token),
                RefreshToken::new(login.refresh_token),
            ),
        })
    }

    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<RefreshedTokens> {
        let body = RefreshRequest {
            refresh_token: refresh_token.as_str(),
        };
        let response = self
            .transport
            .execute(&ApiRequest::post(REFRESH).json(&body)?)
            .await?;

        if !response.is_success() {
            return Err(AuthError::RefreshFailed {
                reason: response.protocol_error().reason(),
            }
            .into());
        }

        let refreshed: RefreshResponse =
            response.json().map_err(|e| AuthError::RefreshFailed {
                reason: format!("malformed refresh response: {}", e),
            })?;

        Ok(RefreshedTokens {
            access_token: AccessToken::new(refreshed.access_token),
            refresh_token: refreshed.refresh_token.map(RefreshToken::new),
        })
    }

    #[instrument(skip_all)]
    async fn terminate(&self, access_token: Option<&AccessToken>) -> Result<()> {
        let mut request = ApiRequest::post(LOGOUT);
        if let Some(token) = access_token {
            request.set_header("Authorization", token.bearer());
        }

        let response = self.transport.execute(&request).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(Error::Protocol(response.protocol_error()))
        }
    }
}

impl std::fmt::Debug for HttpAuthBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAuthBackend").finish_non_exhaustive()
    }
}
