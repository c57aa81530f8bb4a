use portal::{PortalError, UpstreamService};
use thiserror::Error;

/// Failures talking to the DMS.
#[derive(Debug, Error)]
pub enum DmsError {
    /// The request never produced a response.
    #[error("DMS transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// CKAN reported `Not Found Error` (or HTTP 404).
    #[error("DMS object not found: {what}")]
    NotFound { what: String },

    /// CKAN answered with `success: false`.
    #[error("DMS action '{action}' failed: {message}")]
    Api { action: String, message: String },

    /// CKAN answered with a non-success status and no usable envelope.
    #[error("DMS action '{action}' returned HTTP {status}")]
    Status { action: String, status: u16 },

    /// The response body was not the JSON we expected.
    #[error("DMS response to '{action}' could not be decoded: {source}")]
    Decode {
        action: String,
        #[source]
        source: serde_json::Error,
    },

    /// The action name could not be joined onto the API URL.
    #[error("invalid DMS action URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<DmsError> for PortalError {
    fn from(err: DmsError) -> Self {
        match err {
            DmsError::NotFound { what } => PortalError::NotFound { what },
            decode @ DmsError::Decode { .. } => PortalError::InvalidUpstreamData {
                service: UpstreamService::Dms,
                message: decode.to_string(),
            },
            other => PortalError::Upstream {
                service: UpstreamService::Dms,
                message: other.to_string(),
            },
        }
    }
}
