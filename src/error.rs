//! Error type shared by the engine, the platform client and configuration.

use thiserror::Error;

/// Everything that can stop the gate from reaching a decision.
///
/// None of these are retried. The binary logs the error and exits non-zero.
#[derive(Debug, Error)]
pub enum GateError {
    /// A required input is missing or does not parse.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A resource the run depends on does not exist (e.g. no PR for a branch).
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// No CODEOWNERS file exists at any of the searched paths.
    #[error("no CODEOWNERS file found (searched: {})", searched.join(", "))]
    NoOwnershipData { searched: Vec<String> },

    /// The platform returned an error, or data that fails validation.
    #[error("upstream fetch failed: {message}")]
    UpstreamFetch {
        message: String,
        status: Option<u16>,
        endpoint: Option<String>,
    },
}

impl GateError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamFetch {
            message: message.into(),
            status: None,
            endpoint: None,
        }
    }

    /// Upstream failure with the HTTP status and endpoint that produced it.
    pub fn upstream_status(message: impl Into<String>, status: u16, endpoint: &str) -> Self {
        Self::UpstreamFetch {
            message: message.into(),
            status: Some(status),
            endpoint: Some(endpoint.to_string()),
        }
    }

    /// True for the "missing data" family: `NotFound` and `NoOwnershipData`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NoOwnershipData { .. })
    }
}

impl From<reqwest::Error> for GateError {
    fn from(err: reqwest::Error) -> Self {
        Self::UpstreamFetch {
            message: err.to_string(),
            status: err.status().map(|s| s.as_u16()),
            endpoint: err.url().map(|u| u.path().to_string()),
        }
    }
}

impl From<serde_json::Error> for GateError {
    fn from(err: serde_json::Error) -> Self {
        Self::upstream(format!("malformed response body: {err}"))
    }
}

impl From<base64::DecodeError> for GateError {
    fn from(err: base64::DecodeError) -> Self {
        Self::upstream(format!("file content is not valid base64: {err}"))
    }
}
