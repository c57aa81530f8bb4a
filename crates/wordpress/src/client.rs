use std::time::Duration;

use async_trait::async_trait;
use portal::{ContentStore, PortalError, Post, PostList, PostLookup, PostQuery};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::{
    wire::{PostsResponse, WpError, WpPost},
    CmsError,
};

/// Public WordPress.com REST API root; the site name is appended to it.
pub const DEFAULT_API_URL: &str = "https://public-api.wordpress.com/rest/v1.1/sites/";

const USER_AGENT: &str = concat!("portal/", env!("CARGO_PKG_VERSION"));

/// Connection settings for the CMS.
#[derive(Debug, Clone)]
pub struct CmsConfig {
    /// API root, e.g. [`DEFAULT_API_URL`].
    pub api_url: Url,
    /// Site identifier (`example.wordpress.com` or a numeric site id).
    pub site: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// [`ContentStore`] backed by the WordPress.com v1.1 REST API.
#[derive(Debug, Clone)]
pub struct WordPressClient {
    http: reqwest::Client,
    /// `{api_url}{site}/`
    base: Url,
}

impl WordPressClient {
    pub fn new(config: CmsConfig) -> Result<Self, CmsError> {
        let mut base = config.api_url.clone();
        base.path_segments_mut()
            .map_err(|()| CmsError::BaseUrl {
                url: config.api_url.to_string(),
            })?
            .pop_if_empty()
            .push(&config.site)
            .push("");
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http, base })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // `base` was validated as a base URL in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T, CmsError> {
        debug!(%url, "CMS request");
        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();
        if status.is_success() {
            let body = response.bytes().await?;
            return Ok(serde_json::from_slice(&body)?);
        }

        let body = response.text().await.unwrap_or_default();
        let api_error = serde_json::from_str::<WpError>(&body).ok();
        if status == StatusCode::NOT_FOUND
            || api_error.as_ref().is_some_and(|e| e.error == "unknown_post")
        {
            return Err(CmsError::NotFound {
                what: what.to_string(),
            });
        }
        Err(CmsError::Status {
            status: status.as_u16(),
            message: api_error.map(|e| e.message).unwrap_or(body),
        })
    }

    /// Lists posts (`GET posts/`).
    #[instrument(skip(self))]
    pub async fn fetch_posts(&self, query: &PostQuery) -> Result<PostList, CmsError> {
        let params = [
            ("number", query.number.to_string()),
            ("page", query.page.to_string()),
            ("fields", query.fields.clone()),
        ];
        let response: PostsResponse = self
            .get_json(self.endpoint(&["posts", ""]), &params, "post list")
            .await?;
        Ok(response.into_post_list())
    }

    /// Fetches one post by id or slug, enforcing the parent page when asked to.
    #[instrument(skip(self))]
    pub async fn fetch_post(&self, lookup: &PostLookup) -> Result<Post, CmsError> {
        let what = format!("post '{}'", lookup.slug);
        let post: WpPost = match lookup.id {
            Some(id) => {
                self.get_json(self.endpoint(&["posts", id.to_string().as_str()]), &[], &what)
                    .await?
            }
            None => {
                let segment = format!("slug:{}", lookup.slug);
                self.get_json(self.endpoint(&["posts", segment.as_str()]), &[], &what)
                    .await?
            }
        };

        if let (Some(parent_slug), Some(parent_id)) = (&lookup.parent_slug, post.parent) {
            let segment = format!("slug:{parent_slug}");
            let parent: WpPost = self
                .get_json(
                    self.endpoint(&["posts", segment.as_str()]),
                    &[("fields", "ID".to_string())],
                    &format!("page '{parent_slug}'"),
                )
                .await?;
            if parent.id != Some(parent_id) {
                debug!(%parent_slug, parent_id, "post belongs to a different parent");
                return Err(CmsError::NotFound { what });
            }
        }
        Ok(post.into_post())
    }
}

#[async_trait]
impl ContentStore for WordPressClient {
    async fn list_posts(&self, query: &PostQuery) -> Result<PostList, PortalError> {
        Ok(self.fetch_posts(query).await?)
    }

    async fn get_post(&self, lookup: &PostLookup) -> Result<Post, PortalError> {
        Ok(self.fetch_post(lookup).await?)
    }
}
