use portal::{PortalError, UpstreamService};
use thiserror::Error;

/// Failures talking to the CMS.
#[derive(Debug, Error)]
pub enum CmsError {
    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("CMS transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The CMS has no such post.
    #[error("CMS post not found: {what}")]
    NotFound { what: String },

    /// The CMS answered with a non-success status.
    #[error("CMS returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body was not the JSON we expected.
    #[error("CMS response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured API URL cannot address a site.
    #[error("CMS API URL '{url}' cannot be used as a base URL")]
    BaseUrl { url: String },
}

impl From<CmsError> for PortalError {
    fn from(err: CmsError) -> Self {
        match err {
            CmsError::NotFound { what } => PortalError::NotFound { what },
            CmsError::Decode(e) => PortalError::InvalidUpstreamData {
                service: UpstreamService::Cms,
                message: e.to_string(),
            },
            CmsError::BaseUrl { url } => PortalError::Configuration {
                message: format!("CMS API URL '{url}' cannot be used as a base URL"),
            },
            other => PortalError::Upstream {
                service: UpstreamService::Cms,
                message: other.to_string(),
            },
        }
    }
}
