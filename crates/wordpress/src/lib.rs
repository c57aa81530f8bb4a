//! Portal CMS infrastructure adapter.
//!
//! Implements the [`portal::ContentStore`] trait over the WordPress.com v1.1
//! REST API (`/sites/{site}/posts/…`). Blog posts and static pages both live in
//! the CMS; pages in non-default locales are separate posts whose slug carries a
//! `-{locale}` suffix.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, URL construction, and response decoding
//! live here. The [`portal`] crate sees only [`portal::ContentStore`] and
//! [`portal::PortalError`].

mod client;
mod errors;
mod wire;

pub use client::{CmsConfig, WordPressClient, DEFAULT_API_URL};
pub use errors::CmsError;
