//! Core request types.
//!
//! These types enforce their invariants at construction time.

mod api_url;
mod request;

pub use api_url::ApiUrl;
pub use request::{ApiRequest, ApiResponse, Method, RequestId, TrackedRequest};
