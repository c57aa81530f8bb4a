//! Portal HTTP surface.
//!
//! Serves the public site over `axum`: blog and static pages from a
//! [`portal::ContentStore`], dataset search and showcases from a
//! [`portal::DataCatalog`], and permanent redirects from the DMS's legacy URL
//! scheme. Pages are rendered with `ructe` templates compiled from
//! `templates/` by `build.rs`.
//!
//! ## Architectural Layer
//!
//! **Interface.** Handlers translate requests into port calls and port results
//! into templates. The only direct network I/O here is the text-preview
//! fetcher ([`preview`]) and the resource proxy.
//!
//! ## Request pipeline
//!
//! | Layer | Purpose |
//! |-------|---------|
//! | `SetRequestIdLayer` | assigns a UUID `x-request-id` |
//! | `TraceLayer` | one span per request |
//! | `PropagateRequestIdLayer` | echoes `x-request-id` on the response |
//! | handlers | see [`router`] |
//!
//! Errors become rendered `404`/`500` pages through [`SiteError`]'s
//! `IntoResponse` implementation.

mod config;
mod errors;
mod locale;
pub mod preview;
mod proxy;
mod routes;
mod state;
pub mod view;

include!(concat!(env!("OUT_DIR"), "/templates.rs"));

pub use config::{SiteConfig, DEFAULT_PREVIEW_LIMIT_BYTES};
pub use errors::SiteError;
pub use locale::RequestLocale;
pub use routes::router;
pub use state::SiteState;
