//! Portal DMS infrastructure adapter.
//!
//! Implements the [`portal::DataCatalog`] trait over the CKAN action API
//! (`{api_url}{action}?…`, JSON envelope `{ success, result, error }`).
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Query translation, HTTP transport, envelope handling and
//! the CKAN-to-datapackage mapping all live here. The [`portal`] crate sees only
//! [`portal::DataCatalog`], [`portal::DataPackage`] and friends.
//!
//! ## Mapping
//!
//! CKAN packages are converted to portal [`portal::DataPackage`]s by
//! [`ckan_to_data_package`]: `notes` become the description, maintainer becomes
//! author, tags become keywords, resource `url`s become `path`s, and every
//! resource receives default views (a data explorer for datastore-backed
//! resources, a text preview for small textual formats).

mod client;
mod errors;
mod mapping;
mod query;
mod wire;

pub use client::{CkanClient, DmsConfig};
pub use errors::DmsError;
pub use mapping::ckan_to_data_package;
pub use query::{to_ckan_search_params, DEFAULT_FACET_FIELDS};
pub use wire::CkanPackage;
