// Error type shared by the HTTP clients and the upload workflow.

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("{field} cannot be empty")]
    EmptyInput { field: &'static str },

    #[error("Could not {action}: {source}")]
    Network {
        action: &'static str, // Short description of the call, e.g. "fetch image"
        #[source]
        source: reqwest::Error,
    },

    #[error("Could not {action}: server answered {status}")]
    Status {
        action: &'static str,
        status: StatusCode,
    },

    #[error("Could not {action}: unexpected response body ({source})")]
    InvalidResponse {
        action: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Base url '{url}' cannot be extended with a path")]
    InvalidBaseUrl { url: String },

    #[error("'{segment}' cannot be sent as a url path segment")]
    DotSegment { segment: String },

    #[error("The auth token contains characters that are not allowed in a header")]
    InvalidToken,

    #[error("Could not serialize the metadata document: {0}")]
    Metadata(#[from] serde_json::Error),
}

impl UploadError {
    /// Status code carried by the error, if the remote side answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            UploadError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
