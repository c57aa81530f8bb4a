//! Blog, news, and CMS-backed static pages.

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::HeaderMap,
    response::Html,
};
use portal::{
    sanitize_param, LocaleTag, Paging, Post, PostLookup, PostQuery, PostView, DEFAULT_POSTS_PER_PAGE,
};
use tracing::{debug, warn};

use crate::{locale::RequestLocale, templates, view::pager_links, SiteError, SiteState};

use super::{catalog, full_url, html, page_meta, pair_refs, share_link};

pub(crate) async fn home(
    State(state): State<SiteState>,
    RequestLocale(locale): RequestLocale,
) -> Result<Html<Vec<u8>>, SiteError> {
    let posts = match &state.cms {
        Some(cms) => match cms.list_posts(&PostQuery::latest(1)).await {
            Ok(list) => list.posts.iter().map(|p| PostView::new(p, &locale)).collect(),
            Err(e) => {
                warn!(error = %e, "latest posts unavailable");
                Vec::new()
            }
        },
        None => Vec::new(),
    };
    let meta = page_meta(&state, &locale, "Home");
    html(|out| templates::home_html(out, &meta, &posts))
}

pub(crate) async fn blog(
    State(state): State<SiteState>,
    RequestLocale(locale): RequestLocale,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Html<Vec<u8>>, SiteError> {
    let cms = state
        .cms
        .as_ref()
        .ok_or_else(|| SiteError::not_found("blog (no CMS configured)"))?;
    let query = PostQuery::default().with_overrides(pair_refs(&pairs));
    let list = cms.list_posts(&query).await?;

    let paging = Paging::from_page(query.page.into(), query.number.into(), list.found);
    let blog_path = state.config.blog_path.as_str();
    let pager = pager_links(&paging, |page| {
        if query.number == DEFAULT_POSTS_PER_PAGE {
            format!("{blog_path}?page={page}")
        } else {
            format!("{blog_path}?page={page}&number={}", query.number)
        }
    });
    let posts: Vec<PostView> = list.posts.iter().map(|p| PostView::new(p, &locale)).collect();
    let meta = page_meta(&state, &locale, "Berita");
    html(|out| templates::blog_html(out, &meta, &posts, list.found, &pager))
}

/// `{blog_path}/news/{page}`: a blog post by slug.
pub(crate) async fn post(
    State(state): State<SiteState>,
    RequestLocale(locale): RequestLocale,
    Path(page): Path<String>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Html<Vec<u8>>, SiteError> {
    let cms = state
        .cms
        .as_ref()
        .ok_or_else(|| SiteError::not_found("post (no CMS configured)"))?;
    let post = cms.get_post(&PostLookup::by_slug(sanitize_param(&page))).await?;
    let view = PostView::new(&post, &locale);
    let meta = page_meta(&state, &locale, view.title.clone());
    let share = share_link(&full_url(&headers, &uri));
    html(|out| templates::post_html(out, &meta, &view, &share))
}

/// `/news/{page}`: a static page under the `news` parent, otherwise the
/// showcase of a dataset owned by `news`.
pub(crate) async fn news_page(
    State(state): State<SiteState>,
    RequestLocale(locale): RequestLocale,
    Path(page): Path<String>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Html<Vec<u8>>, SiteError> {
    let page = sanitize_param(&page);
    catalog::render_showcase(&state, &locale, "news", &page, &full_url(&headers, &uri)).await
}

/// Looks up `/{parent}/{page}` in the CMS, using the locale's slug variant.
/// `Ok(None)` when there is no CMS or no such page.
pub(crate) async fn find_static_page(
    state: &SiteState,
    locale: &LocaleTag,
    parent: &str,
    page: &str,
) -> Result<Option<Post>, SiteError> {
    let Some(cms) = &state.cms else {
        return Ok(None);
    };
    let lookup = PostLookup {
        slug: state.locales.localized_slug(page, locale),
        id: page.parse().ok(),
        parent_slug: Some(parent.to_string()),
    };
    match cms.get_post(&lookup).await {
        Ok(post) => Ok(Some(post)),
        Err(e) if e.is_not_found() => {
            debug!(parent, page, "no CMS page");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn render_static_page(
    state: &SiteState,
    locale: &LocaleTag,
    post: &Post,
    parent: &str,
    url: &str,
) -> Result<Html<Vec<u8>>, SiteError> {
    let view = PostView::new(post, locale);
    let meta = page_meta(state, locale, view.title.clone());
    html(|out| templates::static_page_html(out, &meta, &view, parent, url))
}
