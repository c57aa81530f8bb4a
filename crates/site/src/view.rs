//! Template-facing view models.

use axum::http::StatusCode;
use portal::{join_date, render_markdown, Facet, PageItem, Paging, Profile, SearchQuery};

/// What every page passes to the `base` layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    pub title: String,
    pub description: Option<String>,
    /// Value of `<html lang>`.
    pub locale: String,
    pub blog_path: String,
}

impl PageMeta {
    pub fn new(title: impl Into<String>, locale: impl Into<String>, blog_path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            locale: locale.into(),
            blog_path: blog_path.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Error pages are rendered outside any request context.
    pub fn error(status: StatusCode) -> Self {
        let title = if status == StatusCode::NOT_FOUND {
            "404"
        } else {
            "500"
        };
        Self::new(title, "id", "/blog")
    }
}

/// One entry of a pagination bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerLink {
    pub label: String,
    /// `None` for gaps and for the current page.
    pub href: Option<String>,
    pub current: bool,
}

/// Builds pagination links; `href` maps a page number to its URL.
pub fn pager_links(paging: &Paging, href: impl Fn(u64) -> String) -> Vec<PagerLink> {
    paging
        .pages
        .iter()
        .map(|item| match item {
            PageItem::Page(n) => {
                let current = *n == paging.current_page;
                PagerLink {
                    label: n.to_string(),
                    href: (!current).then(|| href(*n)),
                    current,
                }
            }
            PageItem::Gap => PagerLink {
                label: "…".to_string(),
                href: None,
                current: false,
            },
        })
        .collect()
}

/// A facet value with the link that narrows the search to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetItemView {
    pub label: String,
    pub count: u64,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetView {
    pub title: String,
    pub items: Vec<FacetItemView>,
}

/// Facet links add `{facet}:"{value}"` to the received filter query and
/// restart at the first page.
pub fn facet_views(facets: &[Facet], query: &SearchQuery, path: &str) -> Vec<FacetView> {
    facets
        .iter()
        .filter(|f| !f.items.is_empty())
        .map(|facet| FacetView {
            title: facet.title.clone(),
            items: facet
                .items
                .iter()
                .map(|item| {
                    let term = format!("{}:\"{}\"", facet.name, item.name);
                    let mut narrowed = query.clone();
                    narrowed.fq = Some(match narrowed.fq.take() {
                        Some(fq) => format!("{fq} {term}"),
                        None => term,
                    });
                    FacetItemView {
                        label: item.display_name.clone(),
                        count: item.count,
                        href: format!("{path}?{}", narrowed.to_query_string_with_from(0)),
                    }
                })
                .collect(),
        })
        .collect()
}

/// An organization as shown on its own page and next to its datasets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerView {
    pub name: String,
    pub title: String,
    pub description_html: String,
    pub avatar: Option<String>,
    pub join_date: Option<String>,
}

impl OwnerView {
    pub fn new(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            title: profile.title.clone(),
            description_html: render_markdown(&profile.description),
            avatar: profile.avatar().map(str::to_string),
            join_date: profile.created.map(join_date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pager_marks_current_and_gaps() {
        let paging = Paging::from_offset(0, 10, 100);
        let links = pager_links(&paging, |n| format!("/search?from={}", paging.offset_of(n)));
        assert_eq!(links[0].label, "1");
        assert!(links[0].current);
        assert_eq!(links[0].href, None);
        assert_eq!(links[1].href.as_deref(), Some("/search?from=10"));
        assert!(links.iter().any(|l| l.label == "…" && l.href.is_none()));
        assert_eq!(links.last().unwrap().label, "10");
    }

    #[test]
    fn facet_links_extend_the_filter_query() {
        let facets = vec![Facet {
            name: "res_format".into(),
            title: "Format".into(),
            items: vec![portal::FacetItem {
                name: "CSV".into(),
                display_name: "CSV".into(),
                count: 3,
            }],
        }];
        let query = SearchQuery::from_pairs([("q", "air"), ("from", "20")]);
        let views = facet_views(&facets, &query, "/search");
        assert_eq!(
            views[0].items[0].href,
            "/search?q=air&fq=res_format%3A%22CSV%22&from=0"
        );
    }

    #[test]
    fn owner_view_renders_markdown_and_avatar() {
        let profile = Profile {
            name: "bps".into(),
            title: "BPS".into(),
            description: "**Statistik**".into(),
            image_url: Some("raw.png".into()),
            ..Profile::default()
        };
        let view = OwnerView::new(&profile);
        assert_eq!(view.description_html, "<p><strong>Statistik</strong></p>\n");
        assert_eq!(view.avatar.as_deref(), Some("raw.png"));
        assert_eq!(view.join_date, None);
    }
}
