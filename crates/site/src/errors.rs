use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use portal::PortalError;
use thiserror::Error;
use tracing::{debug, error};

use crate::{templates, view::PageMeta};

/// Failures while handling a request.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error(transparent)]
    Portal(#[from] PortalError),

    /// `/{owner}` for an organization the DMS does not know.
    #[error("Halaman Tidak Ditemukan: {owner}")]
    OwnerNotFound { owner: String },

    /// A route-level miss: unknown resource, unconfigured proxy, no CMS.
    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("template rendering failed: {0}")]
    Render(#[from] std::io::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SiteError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            SiteError::Portal(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            SiteError::OwnerNotFound { .. } | SiteError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn page_message(&self) -> String {
        match self {
            SiteError::OwnerNotFound { .. } => self.to_string(),
            _ if self.status() == StatusCode::NOT_FOUND => "Halaman Tidak Ditemukan".to_string(),
            _ => "Terjadi kesalahan pada server".to_string(),
        }
    }
}

impl IntoResponse for SiteError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::NOT_FOUND {
            debug!(error = %self, "not found");
        } else {
            error!(error = %self, "request failed");
        }

        let message = self.page_message();
        let meta = PageMeta::error(status);
        let mut body = Vec::new();
        let rendered = if status == StatusCode::NOT_FOUND {
            templates::not_found_html(&mut body, &meta, &message)
        } else {
            templates::server_error_html(&mut body, &meta, &message)
        };
        match rendered {
            Ok(()) => (status, Html(body)).into_response(),
            Err(e) => {
                error!(error = %e, "error page rendering failed");
                (status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], message).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(
            SiteError::from(PortalError::not_found("x")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            SiteError::OwnerNotFound { owner: "x".into() }.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            SiteError::from(PortalError::Configuration { message: "x".into() }).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn owner_message_names_the_owner() {
        let err = SiteError::OwnerNotFound { owner: "siapa".into() };
        assert_eq!(err.page_message(), "Halaman Tidak Ditemukan: siapa");
        assert_eq!(SiteError::not_found("x").page_message(), "Halaman Tidak Ditemukan");
    }
}
