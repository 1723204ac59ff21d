//! reqwest-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, instrument, trace};

use tokengate_core::error::{InvalidInputError, TransportError};
use tokengate_core::traits::Transport;
use tokengate_core::types::{ApiRequest, ApiResponse, ApiUrl, Method};
use tokengate_core::{ClientConfig, Error, Result};

/// HTTP transport for API requests.
///
/// Resolves request paths against `<api_url>/api` and keeps a cookie jar,
/// so cookie-based refresh tokens set by the login answer are sent back on
/// the refresh call.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    api_url: ApiUrl,
    request_timeout: Duration,
}

impl HttpTransport {
    /// Create a transport from the client configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| transport_error(e, config.request_timeout))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            request_timeout: config.request_timeout,
        })
    }

    /// Returns the API URL this transport is configured for.
    pub fn api_url(&self) -> &ApiUrl {
        &self.api_url
    }

    fn build(&self, request: &ApiRequest) -> Result<reqwest::RequestBuilder> {
        let url = self.api_url.endpoint(&request.path);
        let mut builder = self
            .client
            .request(reqwest_method(request.method), &url)
            .headers(header_map(&request.headers)?);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        Ok(builder)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip_all, fields(method = %request.method, path = %request.path))]
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
        debug!("HTTP request");

        let response = self
            .build(request)?
            .send()
            .await
            .map_err(|e| transport_error(e, self.request_timeout))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, self.request_timeout))?;

        trace!(status, bytes = body.len(), "HTTP response");

        Ok(ApiResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| InvalidInputError::Header {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| InvalidInputError::Header {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// Map a reqwest failure onto the transport error variants.
pub(crate) fn transport_error(err: reqwest::Error, timeout: Duration) -> Error {
    let err = if err.is_timeout() {
        TransportError::Timeout {
            duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    Error::Transport(err)
}
