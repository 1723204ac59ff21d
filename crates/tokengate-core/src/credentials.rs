//! Login credentials and the signed-in user.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tokens::CredentialPair;

/// Login credentials for the authentication backend.
///
/// The identifier is either an email address or a username; [`Credentials::email`]
/// and [`Credentials::username`] split it the way the login endpoint expects.
///
/// # Security
///
/// The password is never exposed in Debug output to prevent accidental logging.
///
/// # Example
///
/// ```
/// use tokengate_core::Credentials;
///
/// let creds = Credentials::new("admin@example.com", "hunter2");
/// assert_eq!(creds.email(), Some("admin@example.com"));
/// assert_eq!(creds.username(), None);
/// ```
#[derive(Clone)]
pub struct Credentials {
    identifier: String,
    password: String,
}

impl Credentials {
    /// Create new credentials.
    ///
    /// # Arguments
    ///
    /// * `identifier` - An email address or a username
    /// * `password` - The account password
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
        }
    }

    /// Returns the identifier as given.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the identifier if it looks like an email address.
    pub fn email(&self) -> Option<&str> {
        self.identifier
            .contains('@')
            .then_some(self.identifier.as_str())
    }

    /// Returns the identifier if it is a plain username.
    pub fn username(&self) -> Option<&str> {
        (!self.identifier.contains('@')).then_some(self.identifier.as_str())
    }

    /// Returns the password.
    ///
    /// # Security
    ///
    /// Use this only when constructing authentication requests.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// The account returned by a successful login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Any additional profile fields the backend returns.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    /// Best display name available for the user.
    pub fn display_name(&self) -> &str {
        self.fullname
            .as_deref()
            .or(self.username.as_deref())
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Output of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutput {
    pub user: User,
    pub credentials: CredentialPair,
}
