use axum::{
    body::Body,
    extract::{Path, RawQuery, State},
    http::{header, HeaderName, HeaderValue},
    response::Response,
};
use tracing::{debug, instrument};
use url::Url;

use crate::{SiteError, SiteState};

/// Response headers copied from the upstream file host.
const FORWARDED_HEADERS: [HeaderName; 5] = [
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::CONTENT_DISPOSITION,
    header::LAST_MODIFIED,
    header::ETAG,
];

/// Which configured host a proxy route relays to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProxyTarget {
    Datastore,
    Filestore,
}

impl ProxyTarget {
    fn host(self, state: &SiteState) -> Option<&str> {
        match self {
            ProxyTarget::Datastore => state.config.proxy_datastore.as_deref(),
            ProxyTarget::Filestore => state.config.proxy_filestore.as_deref(),
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            ProxyTarget::Datastore => "/proxy/datastore",
            ProxyTarget::Filestore => "/proxy/filestore",
        }
    }
}

pub(crate) fn upstream_url(scheme: &str, host: &str, path: &str, query: Option<&str>) -> String {
    let path = path.trim_start_matches('/');
    match query.filter(|q| !q.is_empty()) {
        Some(q) => format!("{scheme}://{host}/{path}?{q}"),
        None => format!("{scheme}://{host}/{path}"),
    }
}

fn authority(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

/// Resolves an upstream `Location` against the requested URL. Targets on the
/// proxied host are mapped back under the proxy prefix; other targets are
/// passed on as absolute URLs.
fn rewrite_location(target: ProxyTarget, host: &str, requested: &Url, location: &str) -> Option<HeaderValue> {
    let resolved = requested.join(location).ok()?;
    let value = if authority(&resolved) == host {
        match resolved.query() {
            Some(q) => format!("{}{}?{q}", target.prefix(), resolved.path()),
            None => format!("{}{}", target.prefix(), resolved.path()),
        }
    } else {
        resolved.to_string()
    };
    HeaderValue::from_str(&value).ok()
}

/// Relays a GET to the configured host. Status, entity headers and
/// `Location` are passed through and the body is streamed, never buffered.
#[instrument(skip(state, query))]
pub(crate) async fn relay(
    target: ProxyTarget,
    state: &SiteState,
    path: &str,
    query: Option<&str>,
) -> Result<Response, SiteError> {
    let host = target
        .host(state)
        .ok_or_else(|| SiteError::not_found(format!("{target:?} proxy is not configured")))?;
    let url = upstream_url(state.proxy_scheme, host, path, query);
    debug!(%url, "proxying");

    let upstream = state.http.get(&url).send().await?;
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    let location = headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .zip(Url::parse(&url).ok())
        .and_then(|(location, requested)| rewrite_location(target, host, &requested, location));

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    let out = response.headers_mut();
    for name in FORWARDED_HEADERS {
        if let Some(value) = headers.remove(&name) {
            out.insert(name, value);
        }
    }
    if !out.contains_key(header::CONTENT_TYPE) {
        out.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
    }
    if let Some(location) = location {
        out.insert(header::LOCATION, location);
    }
    Ok(response)
}

pub(crate) async fn datastore(
    State(state): State<SiteState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, SiteError> {
    relay(ProxyTarget::Datastore, &state, &path, query.as_deref()).await
}

pub(crate) async fn filestore(
    State(state): State<SiteState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, SiteError> {
    relay(ProxyTarget::Filestore, &state, &path, query.as_deref()).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{body::to_bytes, http::StatusCode};
    use portal::{
        Collection, CollectionName, DataCatalog, DataPackage, DatasetName, OwnerName, PortalError,
        Profile, SearchQuery, SearchResult,
    };
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;
    use crate::SiteConfig;

    struct EmptyCatalog;

    #[async_trait]
    impl DataCatalog for EmptyCatalog {
        async fn get_package(&self, name: &DatasetName) -> Result<DataPackage, PortalError> {
            Err(PortalError::not_found(name.to_string()))
        }
        async fn search(&self, _query: &SearchQuery) -> Result<SearchResult, PortalError> {
            Ok(SearchResult::default())
        }
        async fn get_collections(&self) -> Result<Vec<Collection>, PortalError> {
            Ok(Vec::new())
        }
        async fn get_collection(&self, name: &CollectionName) -> Result<Collection, PortalError> {
            Err(PortalError::not_found(name.to_string()))
        }
        async fn get_profile(&self, _owner: &OwnerName) -> Result<Profile, PortalError> {
            Ok(Profile::default())
        }
        async fn get_organizations(&self) -> Result<Vec<Profile>, PortalError> {
            Ok(Vec::new())
        }
    }

    fn state_for(server: &MockServer) -> SiteState {
        let config = SiteConfig {
            proxy_filestore: Some(server.address().to_string()),
            ..SiteConfig::default()
        };
        let mut state = SiteState::new(
            config,
            Url::parse("https://ckan.example.org/api/3/action/").unwrap(),
            None,
            Arc::new(EmptyCatalog),
        )
        .unwrap();
        state.proxy_scheme = "http";
        state
    }

    #[test]
    fn urls_keep_path_and_query() {
        assert_eq!(
            upstream_url("https", "files.example.org", "a/b.csv", Some("x=1")),
            "https://files.example.org/a/b.csv?x=1"
        );
        assert_eq!(
            upstream_url("https", "files.example.org", "/a.csv", Some("")),
            "https://files.example.org/a.csv"
        );
    }

    #[test]
    fn locations_on_the_proxied_host_stay_behind_the_proxy() {
        let requested = Url::parse("https://files.example.org/a/b.csv").unwrap();
        let host = "files.example.org";
        assert_eq!(
            rewrite_location(ProxyTarget::Filestore, host, &requested, "/x/y.csv?v=2").unwrap(),
            "/proxy/filestore/x/y.csv?v=2"
        );
        assert_eq!(
            rewrite_location(ProxyTarget::Datastore, host, &requested, "c.csv").unwrap(),
            "/proxy/datastore/a/c.csv"
        );
        assert_eq!(
            rewrite_location(ProxyTarget::Filestore, host, &requested, "https://cdn.example.org/z").unwrap(),
            "https://cdn.example.org/z"
        );
    }

    #[tokio::test]
    async fn relays_status_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dataset/p1/tabel.csv"))
            .and(query_param("v", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-internal", "secret")
                    .set_body_raw("a,b\n1,2\n", "text/csv"),
            )
            .mount(&server)
            .await;

        let response = relay(
            ProxyTarget::Filestore,
            &state_for(&server),
            "dataset/p1/tabel.csv",
            Some("v=2"),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "8");
        assert!(!response.headers().contains_key("x-internal"));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"a,b\n1,2\n");
    }

    #[tokio::test]
    async fn redirects_keep_their_location() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old.csv"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/new.csv"))
            .mount(&server)
            .await;

        let response = relay(ProxyTarget::Filestore, &state_for(&server), "old.csv", None)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/proxy/filestore/new.csv");
    }

    #[tokio::test]
    async fn unconfigured_target_is_not_found() {
        let server = MockServer::start().await;
        let err = relay(ProxyTarget::Datastore, &state_for(&server), "a.csv", None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
