//! Shared helpers for HTTP providers

use ccx_domain::{Error, Result};
use reqwest::Response;

/// Check response status and parse the JSON body
///
/// 401/403 map to the distinct authentication error so callers can surface
/// credential problems separately from transport failures.
pub async fn check_and_parse(response: Response, provider: &str) -> Result<serde_json::Value> {
    let status = response.status();

    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        let code = status.as_u16();

        return Err(match code {
            401 | 403 => Error::embedding_auth(format!("{provider}: {body}")),
            429 => Error::embedding(format!("{provider} rate limit exceeded: {body}")),
            500..=599 => Error::embedding(format!("{provider} server error ({code}): {body}")),
            _ => Error::embedding(format!("{provider} request failed ({code}): {body}")),
        });
    }

    response
        .json()
        .await
        .map_err(|e| Error::embedding(format!("{provider} response parse failed: {e}")))
}

/// Whether a reqwest error is a transport problem worth one retry
pub fn is_transport_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}
