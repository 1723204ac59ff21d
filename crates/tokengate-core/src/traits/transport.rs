//! Transport trait.

use async_trait::async_trait;

use crate::Result;
use crate::types::{ApiRequest, ApiResponse};

/// Sends a request and returns the response for any HTTP status.
///
/// Only failures to obtain a response at all (connection, timeout) are
/// errors; interpreting the status is left to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse>;
}
