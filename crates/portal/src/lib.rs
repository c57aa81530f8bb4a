//! Core domain for the open-data portal frontend.
//!
//! This crate contains every domain concept, newtype identifier, value type, and
//! error type the site works with, plus the pure page-assembly logic: paging,
//! dataset descriptor preparation, locale negotiation, and text formatting.
//! Adapter crates implement the traits defined here; they never add page rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate performs no network I/O.
//! It defines *what* is needed from the CMS and DMS; the `wordpress` and `ckan`
//! crates define *how* to fetch it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`OwnerName`, `DatasetName`, etc.) |
//! | [`types`] | Posts, profiles, collections, search queries and results |
//! | [`datapackage`] | Dataset descriptors and their display preparation |
//! | [`pagination`] | Page-number arithmetic |
//! | [`locale`] | Locale negotiation and date formatting |
//! | [`text`] | Markdown, sanitising, slugs, byte sizes |
//! | [`ports`] | `ContentStore` and `DataCatalog` traits |
//! | [`errors`] | Top-level error type |

pub mod datapackage;
pub mod errors;
pub mod identifiers;
pub mod locale;
pub mod pagination;
pub mod ports;
pub mod text;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use datapackage::{
    prepare_data_explorers, prepare_for_render, prepare_resources_for_display, prepare_views,
    process_data_package, DataPackage, DisplayContext, DisplayResource, License, OrganizationRef,
    Person, Resource, Source, View, DATA_EXPLORER_VIEW, TEXT_VIEW,
};
pub use errors::{PortalError, UpstreamService};
pub use identifiers::{CollectionName, DatasetName, LocaleTag, OwnerName, PostSlug, ResourceId};
pub use locale::{format_post_date, join_date, Locales};
pub use pagination::{pagination, PageItem, Paging, DEFAULT_SEARCH_SIZE};
pub use ports::{ContentStore, DataCatalog};
pub use text::{format_bytes, render_markdown, sanitize_param, slugify};
pub use types::{
    Attachment, Collection, Facet, FacetItem, Post, PostList, PostLookup, PostQuery, PostView,
    Profile, SearchQuery, SearchResult, DEFAULT_POSTS_PER_PAGE, DEFAULT_POST_FIELDS,
};
