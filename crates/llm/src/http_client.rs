//! HTTP Client Factory

use std::time::Duration;

use crate::types::{LlmError, LlmResult};

/// Connect timeout applied to every client.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build a `reqwest::Client` with an overall request timeout.
///
/// Proxy settings from the environment are ignored; outbound calls go
/// directly to the configured endpoint.
pub fn build_http_client(request_timeout: Duration) -> LlmResult<reqwest::Client> {
    reqwest::Client::builder()
        .no_proxy()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(request_timeout)
        .build()
        .map_err(|e| LlmError::Other {
            message: format!("failed to build HTTP client: {}", e),
        })
}
