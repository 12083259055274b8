//! HTTP implementations of the Kiln collaborator traits.
//!
//! The engine's file, inference, and execution collaborators are
//! served by a sidecar backend speaking JSON over HTTP. Each adapter
//! wraps one `reqwest` client; transport failures are classified into
//! the shared error taxonomy at this boundary so nothing above it ever
//! sees a raw `reqwest` error. No retry policy is built in.

mod execution;
mod files;
mod inference;

pub use execution::HttpExecutionService;
pub use files::HttpFileStore;
pub use inference::HttpInferenceService;

use kiln_core::KilnError;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

/// Client-level request deadline. The engine applies its own tighter
/// per-operation deadlines on top of this backstop.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(150);

/// Error body shape the backend returns for failed requests.
#[derive(Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: String,
}

/// Builds the shared HTTP client used by all adapters.
pub(crate) fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_default()
}

/// Classifies a transport-level failure.
pub(crate) fn map_transport_error(err: reqwest::Error) -> KilnError {
    if err.is_timeout() {
        KilnError::timeout(REQUEST_TIMEOUT.as_secs())
    } else if err.is_connect() {
        KilnError::unavailable(format!("backend unreachable: {err}"))
    } else {
        KilnError::io(format!("request failed: {err}"))
    }
}

/// Classifies a non-success HTTP status.
pub(crate) fn map_status(status: StatusCode, subject: &str, detail: Option<String>) -> KilnError {
    let message = detail.unwrap_or_else(|| format!("HTTP {status}"));
    match status {
        StatusCode::NOT_FOUND => KilnError::not_found("resource", subject),
        StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
            KilnError::PermissionDenied(message)
        }
        StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::BAD_GATEWAY
        | StatusCode::GATEWAY_TIMEOUT
        | StatusCode::INTERNAL_SERVER_ERROR => KilnError::unavailable(message),
        _ => KilnError::io(message),
    }
}

/// Drains a failed response into a typed error.
pub(crate) async fn error_from_response(
    subject: &str,
    response: reqwest::Response,
) -> KilnError {
    let status = response.status();
    let detail = response
        .json::<ErrorBody>()
        .await
        .ok()
        .map(|body| body.detail);
    map_status(status, subject, detail)
}
