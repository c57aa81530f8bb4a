//! Route table and shared handler helpers.
//!
//! Static paths always win over parameters, so the `/{owner}/{name}` and
//! `/{owner}` catch-alls only see what no other route claimed.

mod catalog;
mod cms;
mod info;
mod redirects;

use axum::{
    http::{header, HeaderMap, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use http::{HeaderName, HeaderValue, Request};
use tower_http::{
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use url::form_urlencoded;
use uuid::Uuid;

use crate::{proxy, view::PageMeta, SiteError, SiteState};

const REQUEST_ID: &str = "x-request-id";

/// First path segments claimed by fixed routes. Info page slugs are claimed
/// too; see [`is_reserved_root`].
const FIXED_ROOTS: &[&str] = &[
    "robots.txt",
    "healthz",
    "dataset",
    "organization",
    "group",
    "search",
    "collections",
    "news",
    "proxy",
];

/// Whether a path whose first segment is `segment` would collide with a
/// built-in route.
pub(crate) fn is_reserved_root(segment: &str) -> bool {
    FIXED_ROOTS.contains(&segment) || info::find(segment).is_some()
}

/// Random v4 UUIDs for `x-request-id`.
#[derive(Clone, Copy, Debug, Default)]
struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Builds the complete application router.
pub fn router(state: SiteState) -> Router {
    let blog_path = state.config.blog_path.clone();

    let mut router = Router::new()
        .route("/robots.txt", get(robots))
        .route("/healthz", get(healthz))
        // Legacy DMS URLs
        .route("/dataset", get(redirects::search))
        .route("/dataset/{name}", get(redirects::dataset))
        .route("/dataset/{name}/resource/{id}", get(redirects::resource))
        .route("/organization/{owner}", get(redirects::organization))
        .route("/group", get(redirects::collections))
        .route("/group/{collection}", get(redirects::collection))
        // CMS
        .route("/", get(cms::home))
        .route(&blog_path, get(cms::blog))
        .route(&format!("{blog_path}/news/{{page}}"), get(cms::post))
        .route("/news/{page}", get(cms::news_page))
        // DMS
        .route("/search", get(catalog::search))
        .route("/collections/{name}", get(catalog::collection))
        .route("/organization", get(catalog::organizations))
        .route("/proxy/datastore/{*path}", get(proxy::datastore))
        .route("/proxy/filestore/{*path}", get(proxy::filestore))
        .route("/{owner}/{name}/datapackage.json", get(catalog::datapackage_json))
        .route("/{owner}/{name}", get(catalog::showcase))
        .route("/{owner}", get(catalog::owner));

    for page in info::INFO_PAGES {
        router = router.route(&format!("/{}", page.slug), get(info::render));
    }

    router
        .fallback(fallback)
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID)))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID),
            UuidRequestId,
        ))
        .with_state(state)
}

async fn robots() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "User-agent: *\nAllow: /",
    )
}

async fn healthz() -> &'static str {
    "ok"
}

async fn fallback(uri: Uri) -> SiteError {
    SiteError::not_found(uri.path().to_string())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Renders a template into an HTML response body.
pub(crate) fn html(
    render: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>,
) -> Result<Html<Vec<u8>>, SiteError> {
    let mut body = Vec::new();
    render(&mut body)?;
    Ok(Html(body))
}

/// `301 Moved Permanently`; axum's `Redirect::permanent` answers 308.
pub(crate) fn moved_permanently(location: impl AsRef<str>) -> Response {
    match HeaderValue::from_str(location.as_ref()) {
        Ok(value) => (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, value)]).into_response(),
        Err(_) => SiteError::not_found(location.as_ref().to_string()).into_response(),
    }
}

pub(crate) fn page_meta(state: &SiteState, locale: &portal::LocaleTag, title: impl Into<String>) -> PageMeta {
    PageMeta::new(title, locale.as_str(), state.config.blog_path.as_str())
}

/// `//{host}{path?query}`, for share links.
pub(crate) fn full_url(headers: &HeaderMap, uri: &Uri) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    format!("//{host}{path}")
}

/// Twitter intent link sharing `url`, percent-encoded as one query value.
pub(crate) fn share_link(url: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(url.as_bytes()).collect();
    format!("https://twitter.com/intent/tweet?url={encoded}")
}

/// Borrowed view over owned query pairs.
pub(crate) fn pair_refs(pairs: &[(String, String)]) -> impl Iterator<Item = (&str, &str)> {
    pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_url_is_protocol_relative() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("data.go.id"));
        let uri: Uri = "/bps/penduduk?x=1".parse().unwrap();
        assert_eq!(full_url(&headers, &uri), "//data.go.id/bps/penduduk?x=1");
    }

    #[test]
    fn share_link_encodes_the_whole_url() {
        assert_eq!(
            share_link("//data.go.id/blog/news/rilis?lang=en&x=a b#top"),
            "https://twitter.com/intent/tweet?url=%2F%2Fdata.go.id%2Fblog%2Fnews%2Frilis%3Flang%3Den%26x%3Da+b%23top"
        );
    }

    #[test]
    fn reserved_roots_cover_every_fixed_route() {
        for root in ["search", "healthz", "robots.txt", "about", "login", "proxy"] {
            assert!(is_reserved_root(root), "{root}");
        }
        assert!(!is_reserved_root("blog"));
        assert!(!is_reserved_root("berita"));
    }

    #[test]
    fn redirects_are_301() {
        let response = moved_permanently("/collections");
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "/collections");
    }
}
