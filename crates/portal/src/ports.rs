//! Port traits implemented by the upstream adapters.
//!
//! Route handlers depend only on these traits. The `wordpress` crate implements
//! [`ContentStore`]; the `ckan` crate implements [`DataCatalog`]. Tests swap in
//! in-memory fakes.

use async_trait::async_trait;

use crate::{
    Collection, CollectionName, DataPackage, DatasetName, OwnerName, PortalError, Post,
    PostList, PostLookup, PostQuery, Profile, SearchQuery, SearchResult,
};

/// Read access to the content management system (blog posts and static pages).
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Lists posts, newest first.
    async fn list_posts(&self, query: &PostQuery) -> Result<PostList, PortalError>;

    /// Fetches one post or page.
    ///
    /// Returns [`PortalError::NotFound`] when no post matches, including when
    /// `lookup.parent_slug` is set and the post has a different parent.
    async fn get_post(&self, lookup: &PostLookup) -> Result<Post, PortalError>;
}

/// Read access to the data management system.
#[async_trait]
pub trait DataCatalog: Send + Sync {
    /// Fetches one dataset descriptor.
    async fn get_package(&self, name: &DatasetName) -> Result<DataPackage, PortalError>;

    /// Searches datasets.
    async fn search(&self, query: &SearchQuery) -> Result<SearchResult, PortalError>;

    /// Lists every collection.
    async fn get_collections(&self) -> Result<Vec<Collection>, PortalError>;

    /// Fetches one collection.
    async fn get_collection(&self, name: &CollectionName) -> Result<Collection, PortalError>;

    /// Fetches an organization profile.
    ///
    /// Never fails with [`PortalError::NotFound`]: an unknown owner yields an
    /// empty profile for which [`Profile::exists`] is `false`.
    async fn get_profile(&self, owner: &OwnerName) -> Result<Profile, PortalError>;

    /// Lists every organization.
    async fn get_organizations(&self) -> Result<Vec<Profile>, PortalError>;
}
