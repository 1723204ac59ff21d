//! Authentication backend trait.

use async_trait::async_trait;

use crate::credentials::{Credentials, LoginOutput};
use crate::tokens::{AccessToken, RefreshToken, RefreshedTokens};
use crate::Result;

/// The remote authentication service.
///
/// Implementations talk to the transport directly; none of these calls go
/// through the refresh coordinator, so a rejected refresh can never queue
/// behind itself.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange login credentials for a user and a token pair.
    async fn authenticate(&self, credentials: &Credentials) -> Result<LoginOutput>;

    /// Obtain a new access token.
    ///
    /// The refresh token is offered to the backend; backends that track it
    /// in a cookie may ignore it.
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<RefreshedTokens>;

    /// End the session remotely.
    async fn terminate(&self, access_token: Option<&AccessToken>) -> Result<()>;
}
