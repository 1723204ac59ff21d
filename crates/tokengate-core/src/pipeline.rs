//! The request pipeline every outbound call goes through.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::error::{AuthError, Error};
use crate::refresh::RefreshCoordinator;
use crate::tokens::AccessToken;
use crate::traits::{CredentialStore, Transport};
use crate::types::{ApiRequest, ApiResponse, TrackedRequest};
use crate::Result;

/// Attaches the current access token to outbound requests and hands
/// credential-expired responses to the [`RefreshCoordinator`].
///
/// Requests addressed to the refresh operation are sent exactly as given:
/// no token is attached and a 401 answer is returned as an error instead of
/// being coordinated.
pub struct RequestPipeline {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
}

impl RequestPipeline {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        coordinator: Arc<RefreshCoordinator>,
    ) -> Self {
        Self {
            transport,
            store,
            coordinator,
        }
    }

    /// Send a request, refreshing credentials and replaying it once if the
    /// server reports them expired.
    ///
    /// # Errors
    ///
    /// - Transport failures are returned untouched.
    /// - Non-success statuses other than 401 become [`Error::Protocol`].
    /// - A 401 after the request was already replayed is
    ///   [`AuthError::DoubleFailure`].
    /// - Refresh failures are returned as produced by the coordinator.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.send_tracked(TrackedRequest::new(request)).await
    }

    #[instrument(
        skip_all,
        fields(
            request_id = %tracked.id,
            method = %tracked.request.method,
            path = %tracked.request.path,
        )
    )]
    pub async fn send_tracked(&self, mut tracked: TrackedRequest) -> Result<ApiResponse> {
        loop {
            let (response, sent_with) = self.dispatch(&tracked.request).await?;

            if !response.is_credential_expired() || tracked.request.is_refresh() {
                return into_result(response);
            }

            if tracked.retried {
                warn!("Credentials rejected again after refresh");
                return Err(AuthError::DoubleFailure.into());
            }

            debug!("Credentials expired, recovering");
            self.coordinator
                .recover(&mut tracked, sent_with.as_ref())
                .await?;
            debug!("Replaying request");
        }
    }

    /// Send one attempt. Returns the response and the token it carried.
    async fn dispatch(&self, request: &ApiRequest) -> Result<(ApiResponse, Option<AccessToken>)> {
        if request.is_refresh() {
            let response = self.transport.execute(request).await?;
            return Ok((response, None));
        }

        let access_token = self.store.access_token();
        let response = match &access_token {
            Some(token) => {
                let mut outgoing = request.clone();
                outgoing.set_header("Authorization", token.bearer());
                self.transport.execute(&outgoing).await?
            }
            None => self.transport.execute(request).await?,
        };

        Ok((response, access_token))
    }
}

impl std::fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

fn into_result(response: ApiResponse) -> Result<ApiResponse> {
    if response.is_success() {
        Ok(response)
    } else if response.is_credential_expired() {
        Err(AuthError::CredentialExpired.into())
    } else {
        Err(Error::Protocol(response.protocol_error()))
    }
}
