//! Shared value types for posts, organizations, collections, and searches.
//!
//! Dataset descriptors live in [`crate::datapackage`]; everything else the
//! upstream clients return is defined here.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::{format_post_date, DataPackage, LocaleTag};

// ---------------------------------------------------------------------------
// CMS posts
// ---------------------------------------------------------------------------

/// Fields requested from the CMS when listing or showing posts.
pub const DEFAULT_POST_FIELDS: &str =
    "slug,title,content,date,modified,featured_image,categories,attachments";

/// Default number of posts on a blog listing page.
pub const DEFAULT_POSTS_PER_PAGE: u32 = 100;

/// A media attachment belonging to a post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Public URL of the media file.
    pub url: String,
    /// Caption (may contain HTML).
    pub caption: Option<String>,
    /// Alternative text.
    pub alt: Option<String>,
}

/// A blog post or static page as returned by the CMS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Numeric CMS id.
    pub id: Option<u64>,
    /// URL slug.
    pub slug: String,
    /// Title (may contain HTML entities).
    pub title: String,
    /// Body HTML.
    pub content: String,
    /// Publication time.
    pub date: Option<DateTime<FixedOffset>>,
    /// Last modification time.
    pub modified: Option<DateTime<FixedOffset>>,
    /// URL of the featured image, if any.
    pub featured_image: Option<String>,
    /// Category names.
    pub categories: Vec<String>,
    /// Media attachments.
    pub attachments: Vec<Attachment>,
}

impl Post {
    /// The attachment whose URL is the featured image.
    pub fn featured_attachment(&self) -> Option<&Attachment> {
        let image = self.featured_image.as_deref().filter(|s| !s.is_empty())?;
        self.attachments.iter().find(|a| a.url == image)
    }
}

/// One page of posts plus the total count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostList {
    /// Total number of posts matching the query, across all pages.
    pub found: u64,
    /// Posts on this page.
    pub posts: Vec<Post>,
}

/// Parameters of a post listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    /// Posts per page.
    pub number: u32,
    /// 1-based page.
    pub page: u32,
    /// Comma-separated list of fields to return.
    pub fields: String,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            number: DEFAULT_POSTS_PER_PAGE,
            page: 1,
            fields: DEFAULT_POST_FIELDS.to_string(),
        }
    }
}

impl PostQuery {
    /// The latest `n` posts.
    pub fn latest(n: u32) -> Self {
        Self {
            number: n,
            ..Self::default()
        }
    }

    /// Applies `number`, `page`, and `fields` overrides from a request's query
    /// string. Values that do not parse are ignored.
    pub fn with_overrides<'a>(mut self, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        for (key, value) in pairs {
            match key {
                "number" => {
                    if let Some(n) = value.trim().parse().ok().filter(|n: &u32| *n > 0) {
                        self.number = n;
                    }
                }
                "page" => {
                    if let Some(p) = value.trim().parse().ok().filter(|p: &u32| *p > 0) {
                        self.page = p;
                    }
                }
                "fields" if !value.is_empty() => self.fields = value.to_string(),
                _ => {}
            }
        }
        self
    }
}

/// How to look up a single post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostLookup {
    /// Slug to fetch by.
    pub slug: String,
    /// Numeric id; takes precedence over the slug when present.
    pub id: Option<u64>,
    /// Required parent page slug, for nested static pages.
    pub parent_slug: Option<String>,
}

impl PostLookup {
    /// Lookup by slug alone.
    pub fn by_slug(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            id: None,
            parent_slug: None,
        }
    }
}

/// A post prepared for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub slug: String,
    pub title: String,
    pub content: String,
    pub published: String,
    pub modified: String,
    pub image: Option<String>,
    pub categories: Vec<String>,
    pub image_caption: Option<String>,
    pub image_alt: Option<String>,
}

impl PostView {
    /// Formats `post` for `locale`.
    pub fn new(post: &Post, locale: &LocaleTag) -> Self {
        let format = |d: Option<DateTime<FixedOffset>>| {
            d.map(|d| format_post_date(d.naive_local(), locale))
                .unwrap_or_default()
        };
        let attachment = post.featured_attachment();
        Self {
            slug: post.slug.clone(),
            title: post.title.clone(),
            content: post.content.clone(),
            published: format(post.date),
            modified: format(post.modified),
            image: post.featured_image.clone().filter(|s| !s.is_empty()),
            categories: post.categories.clone(),
            image_caption: attachment.and_then(|a| a.caption.clone()),
            image_alt: attachment.and_then(|a| a.alt.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// DMS organizations and collections
// ---------------------------------------------------------------------------

/// A publishing organization.
///
/// The DMS answers unknown owners with an empty profile; such a profile has no
/// `created` timestamp and [`Profile::exists`] returns `false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub image_display_url: Option<String>,
    pub created: Option<NaiveDateTime>,
    pub package_count: Option<u64>,
}

impl Profile {
    /// Whether this is a real organization.
    pub fn exists(&self) -> bool {
        self.created.is_some()
    }

    /// The avatar to display: the display URL, falling back to the raw image URL.
    pub fn avatar(&self) -> Option<&str> {
        self.image_display_url
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.image_url.as_deref().filter(|s| !s.is_empty()))
    }
}

/// A curated collection of datasets (a CKAN group).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub package_count: Option<u64>,
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// A dataset search as expressed by the portal's own query string.
///
/// Translation to the DMS dialect happens in the DMS adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Free text; `field:value` terms are filters.
    pub q: Option<String>,
    /// Explicit filter query.
    pub fq: Option<String>,
    /// Offset of the first result.
    pub from: Option<u64>,
    /// Page size.
    pub size: Option<u64>,
    /// Sort specifications (`field:direction` or `field direction`).
    pub sort: Vec<String>,
    /// Facet fields to request; empty means the adapter's default set.
    pub facet_fields: Vec<String>,
    pub facet_limit: Option<u64>,
    pub facet_mincount: Option<u64>,
}

impl SearchQuery {
    /// Parses a query string's key/value pairs. Unknown keys are ignored;
    /// numeric values that do not parse are treated as absent.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut query = Self::default();
        let non_empty = |v: &str| Some(v.to_string()).filter(|s| !s.trim().is_empty());
        for (key, value) in pairs {
            match key {
                "q" => query.q = non_empty(value),
                "fq" => query.fq = non_empty(value),
                "from" => query.from = value.trim().parse().ok(),
                "size" => query.size = value.trim().parse().ok().filter(|s: &u64| *s > 0),
                "sort" if !value.is_empty() => query.sort.push(value.to_string()),
                "facet.field" if !value.is_empty() => query.facet_fields.push(value.to_string()),
                "facet.limit" => query.facet_limit = value.trim().parse().ok(),
                "facet.mincount" => query.facet_mincount = value.trim().parse().ok(),
                _ => {}
            }
        }
        query
    }

    /// Appends a filter term to the free-text query (`groups:{name}`,
    /// `organization:{owner}`).
    pub fn and_term(mut self, term: &str) -> Self {
        self.q = Some(match self.q.take() {
            Some(q) => format!("{q} {term}"),
            None => term.to_string(),
        });
        self
    }

    /// Offset, defaulting to zero.
    pub fn from_or_default(&self) -> u64 {
        self.from.unwrap_or(0)
    }

    /// Page size, defaulting to [`crate::DEFAULT_SEARCH_SIZE`].
    pub fn size_or_default(&self) -> u64 {
        self.size.unwrap_or(crate::DEFAULT_SEARCH_SIZE)
    }

    /// Re-encodes this query as a query string with `from` replaced, for
    /// pagination links. Terms added with [`SearchQuery::and_term`] are
    /// included, so callers building owner or collection links should encode
    /// the query they received rather than the one they sent upstream.
    pub fn to_query_string_with_from(&self, from: u64) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        if let Some(q) = &self.q {
            out.append_pair("q", q);
        }
        if let Some(fq) = &self.fq {
            out.append_pair("fq", fq);
        }
        for sort in &self.sort {
            out.append_pair("sort", sort);
        }
        if let Some(size) = self.size {
            out.append_pair("size", &size.to_string());
        }
        out.append_pair("from", &from.to_string());
        out.finish()
    }
}

/// One value of a search facet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetItem {
    pub name: String,
    pub display_name: String,
    pub count: u64,
}

/// Facet counts for one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Facet {
    pub name: String,
    pub title: String,
    pub items: Vec<FacetItem>,
}

/// A page of dataset search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Total number of matching datasets.
    pub count: u64,
    /// Datasets on this page.
    pub results: Vec<DataPackage>,
    /// Facet counts, in the order the DMS returned them.
    pub facets: Vec<Facet>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_query_overrides() {
        let q = PostQuery::default().with_overrides([("page", "3"), ("number", "x"), ("other", "1")]);
        assert_eq!(q.page, 3);
        assert_eq!(q.number, DEFAULT_POSTS_PER_PAGE);
        assert_eq!(q.fields, DEFAULT_POST_FIELDS);
    }

    #[test]
    fn post_view_picks_featured_attachment() {
        let post = Post {
            slug: "rilis".into(),
            title: "Rilis".into(),
            featured_image: Some("https://cdn/img.png".into()),
            date: DateTime::parse_from_rfc3339("2019-05-02T10:00:00+07:00").ok(),
            attachments: vec![
                Attachment {
                    url: "https://cdn/other.png".into(),
                    caption: Some("no".into()),
                    alt: None,
                },
                Attachment {
                    url: "https://cdn/img.png".into(),
                    caption: Some("Caption".into()),
                    alt: Some("Alt".into()),
                },
            ],
            ..Post::default()
        };
        let view = PostView::new(&post, &LocaleTag::new("en").unwrap());
        assert_eq!(view.image_caption.as_deref(), Some("Caption"));
        assert_eq!(view.image_alt.as_deref(), Some("Alt"));
        assert_eq!(view.published, "2nd May 2019");
        assert_eq!(view.modified, "");
    }

    #[test]
    fn search_query_parsing_and_terms() {
        let q = SearchQuery::from_pairs([
            ("q", "penduduk"),
            ("size", "20"),
            ("from", "abc"),
            ("sort", "score:desc"),
            ("sort", "title:asc"),
        ])
        .and_term("organization:bps");
        assert_eq!(q.q.as_deref(), Some("penduduk organization:bps"));
        assert_eq!(q.size_or_default(), 20);
        assert_eq!(q.from_or_default(), 0);
        assert_eq!(q.sort.len(), 2);

        let empty = SearchQuery::default().and_term("groups:ekonomi");
        assert_eq!(empty.q.as_deref(), Some("groups:ekonomi"));
    }

    #[test]
    fn pagination_links_replace_from() {
        let q = SearchQuery::from_pairs([("q", "air bersih"), ("from", "10")]);
        assert_eq!(q.to_query_string_with_from(20), "q=air+bersih&from=20");
    }

    #[test]
    fn profile_avatar_fallback() {
        let p = Profile {
            image_url: Some("raw.png".into()),
            image_display_url: Some(String::new()),
            ..Profile::default()
        };
        assert_eq!(p.avatar(), Some("raw.png"));
        assert!(!p.exists());
    }
}
