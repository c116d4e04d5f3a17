//! Error types for the A2A client

use reqwest::StatusCode;
use serde_json::Value;

use crate::protocol::error_codes;

pub type Result<T> = std::result::Result<T, A2aError>;

/// Everything that can go wrong between the OAuth endpoint and the agent.
#[derive(Debug, thiserror::Error)]
pub enum A2aError {
    /// Token exchange failed: non-2xx status, or a body without `access_token`.
    #[error("failed to refresh token: {status} - {body}")]
    Auth { status: StatusCode, body: String },

    /// The remote agent answered with a JSON-RPC error. Code and message are
    /// kept exactly as received.
    #[error("remote JSON-RPC error {code}: {message}")]
    RemoteProtocol {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    /// Non-2xx response that did not carry a JSON-RPC error body.
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: StatusCode,
        url: String,
        body: String,
    },

    /// 2xx reply that parsed as JSON-RPC but is not a usable response.
    #[error("invalid JSON-RPC response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl A2aError {
    /// Short description of a remote error code, if it is one the A2A
    /// protocol defines. The original message is never replaced by this.
    pub fn remote_kind(&self) -> Option<&'static str> {
        match self {
            Self::RemoteProtocol { code, .. } => error_codes::describe(*code),
            _ => None,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}
