//! Remote error taxonomy.

use serde::Deserialize;
use thiserror::Error;

/// Any non-2xx response or network failure from the remote store.
///
/// No variant is retried anywhere: the at-most-once policy means a failed
/// schema step triggers a refetch-to-resync and a failed row delete
/// triggers an optimistic-state restore, never a replay.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemoteError {
    /// 401 - distinguished so the shell can log the user out instead of
    /// showing a generic error
    #[error("Session expired. Please log in again.")]
    SessionExpired,

    /// Any other non-2xx, with the server's message when it sent one
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Network failure or timeout; the request may or may not have reached
    /// the server
    #[error("Network error: {0}")]
    Transport(String),

    /// The server answered 2xx but the body was not what we expected
    #[error("Malformed response: {0}")]
    Decode(String),
}

/// Error body shape the backend uses: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}

impl RemoteError {
    /// Classify a non-2xx response, pulling the server-provided message out
    /// of the body when present.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        if status == 401 {
            return RemoteError::SessionExpired;
        }
        let message = match response.text().await {
            Ok(body) => serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| format!("Request failed with status {}", status)),
            Err(_) => format!("Request failed with status {}", status),
        };
        RemoteError::Api { status, message }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else {
            RemoteError::Transport(err.to_string())
        }
    }
}
