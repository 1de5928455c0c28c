//! @ai:module:intent Shared HTTP plumbing for provider adapters
//! @ai:module:layer infrastructure
//! @ai:module:stateless true

use crate::error::GatewayError;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// @ai:intent Build the reqwest client used by every adapter
/// @ai:effects pure
pub(crate) fn build_client() -> Result<reqwest::Client, GatewayError> {
    Ok(reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

/// @ai:intent Read an API key from the environment
/// @ai:effects env
pub(crate) fn api_key_from_env(var: &str) -> Result<String, GatewayError> {
    std::env::var(var)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| GatewayError::MissingApiKey(var.to_string()))
}

/// @ai:intent Pass successful responses through; classify failures by status
/// @ai:effects network
pub(crate) async fn check_status(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let code = status.as_u16();
    match code {
        401 | 403 => Err(GatewayError::Auth {
            provider,
            status: code,
        }),
        429 => {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_RETRY_AFTER);
            Err(GatewayError::RateLimited {
                provider,
                retry_after,
            })
        }
        _ => {
            let message = response.text().await.unwrap_or_default();
            Err(GatewayError::Api {
                provider,
                status: code,
                message,
            })
        }
    }
}

/// @ai:intent Join a base URL and a path without doubling slashes
/// @ai:effects pure
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
