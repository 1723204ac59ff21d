//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::ApiUrl;

/// Default redirect target after the session is terminated.
pub const DEFAULT_SIGN_IN_ROUTE: &str = "/sign-in";

/// Configuration shared by the pipeline, the coordinator and the transports.
///
/// Durations are expressed in whole seconds when (de)serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API base URL; operations live under `<api_url>/api`.
    pub api_url: ApiUrl,

    /// Route signalled to the navigator when the session ends.
    pub sign_in_route: String,

    /// Per-request transport timeout.
    #[serde(with = "secs")]
    pub request_timeout: Duration,

    /// Upper bound on a single refresh call. Exceeding it fails the refresh.
    #[serde(with = "secs")]
    pub refresh_timeout: Duration,

    /// How long a queued request waits for the in-flight refresh.
    #[serde(with = "secs")]
    pub queue_timeout: Duration,

    /// User agent sent by HTTP transports.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: ApiUrl::default(),
            sign_in_route: DEFAULT_SIGN_IN_ROUTE.to_string(),
            request_timeout: Duration::from_secs(30),
            refresh_timeout: Duration::from_secs(15),
            queue_timeout: Duration::from_secs(30),
            user_agent: concat!("tokengate/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(api_url: ApiUrl) -> Self {
        Self {
            api_url,
            ..Self::default()
        }
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
