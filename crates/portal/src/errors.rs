//! Top-level error type for the portal domain.
//!
//! [`PortalError`] is what every port trait returns. Adapter crates define their
//! own, richer error enums (transport failures, decode failures) and convert them
//! into [`PortalError`] at the trait boundary, so route handlers only ever have to
//! distinguish "not found" from "something upstream went wrong".

use thiserror::Error;

/// The upstream system an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamService {
    /// The WordPress-like content management system.
    Cms,
    /// The CKAN-like data management system.
    Dms,
}

impl std::fmt::Display for UpstreamService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamService::Cms => write!(f, "CMS"),
            UpstreamService::Dms => write!(f, "DMS"),
        }
    }
}

/// Errors surfaced to route handlers.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The requested post, dataset, collection, or resource does not exist.
    ///
    /// Rendered as a 404 page. Static-page lookups use this variant to fall
    /// through to the dataset showcase.
    #[error("Not found: {what}")]
    NotFound {
        /// Human-readable description of what was looked up.
        what: String,
    },

    /// The upstream call failed (transport error, non-success status, or an
    /// API-level failure envelope).
    #[error("{service} request failed: {message}")]
    Upstream {
        /// Which upstream produced the failure.
        service: UpstreamService,
        /// Description of the failure.
        message: String,
    },

    /// The upstream answered, but the payload is missing something the portal
    /// needs (e.g. a dataset without an owning organization).
    #[error("{service} returned unusable data: {message}")]
    InvalidUpstreamData {
        /// Which upstream produced the payload.
        service: UpstreamService,
        /// Description of the problem.
        message: String,
    },

    /// The portal configuration is invalid.
    ///
    /// Produced at load time; the server never starts with an invalid config.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}

impl PortalError {
    /// Shorthand for a [`PortalError::NotFound`].
    pub fn not_found(what: impl Into<String>) -> Self {
        PortalError::NotFound { what: what.into() }
    }

    /// Returns `true` for [`PortalError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortalError::NotFound { .. })
    }
}
