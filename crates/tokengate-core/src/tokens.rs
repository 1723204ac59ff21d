//! Token types for bearer authentication.

use std::fmt;

/// An access token for authenticated requests.
///
/// Access tokens are short-lived and attached to every request as
/// `Authorization: Bearer <token>`.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Create a new access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value.
    ///
    /// # Security
    ///
    /// Use only when constructing authorization headers or persisting the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the `Authorization` header value for this token.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

// Hide token value in Debug output
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

/// A refresh token for obtaining new access tokens.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Create a new refresh token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value.
    ///
    /// # Security
    ///
    /// Use only when constructing refresh requests or persisting the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Hide token value in Debug output
impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefreshToken").field(&"[REDACTED]").finish()
    }
}

/// An access token together with the refresh token that can renew it.
///
/// The pair is the unit of storage: a store holds either a complete pair or
/// nothing, so an access token can never be observed without its refresh
/// token (or the other way round).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPair {
    access_token: AccessToken,
    refresh_token: RefreshToken,
}

impl CredentialPair {
    /// Create a new credential pair.
    pub fn new(access_token: AccessToken, refresh_token: RefreshToken) -> Self {
        Self {
            access_token,
            refresh_token,
        }
    }

    /// Build a pair from optional halves.
    ///
    /// Returns `None` unless both halves are present.
    pub fn from_parts(
        access_token: Option<AccessToken>,
        refresh_token: Option<RefreshToken>,
    ) -> Option<Self> {
        match (access_token, refresh_token) {
            (Some(access_token), Some(refresh_token)) => {
                Some(Self::new(access_token, refresh_token))
            }
            _ => None,
        }
    }

    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &RefreshToken {
        &self.refresh_token
    }

    /// Replace the pair after a refresh, keeping the current refresh token
    /// when the backend did not rotate it.
    pub fn renewed(&self, refreshed: RefreshedTokens) -> Self {
        Self {
            access_token: refreshed.access_token,
            refresh_token: refreshed
                .refresh_token
                .unwrap_or_else(|| self.refresh_token.clone()),
        }
    }
}

/// Tokens returned by a successful refresh.
#[derive(Debug, Clone)]
pub struct RefreshedTokens {
    /// The new access token.
    pub access_token: AccessToken,
    /// A rotated refresh token, if the backend issued one.
    pub refresh_token: Option<RefreshToken>,
}
