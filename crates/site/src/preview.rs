//! Text previews: the first few KiB of a resource file, embedded in `text`
//! views on dataset pages.

use futures::future::join_all;
use portal::{DataPackage, TEXT_VIEW};
use reqwest::{header::LOCATION, StatusCode};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("invalid preview URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("redirect without a usable Location header")]
    BadRedirect,

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

fn check_scheme(url: &Url) -> Result<(), PreviewError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(PreviewError::UnsupportedScheme(other.to_string())),
    }
}

/// Fetches at most `limit` bytes of `url` and decodes them lossily as UTF-8.
///
/// One `301`/`302` is followed. The body is read chunk by chunk and the
/// connection dropped as soon as more than `limit` bytes have arrived.
#[instrument(skip(http))]
pub async fn fetch_text_preview(
    http: &reqwest::Client,
    url: &str,
    limit: usize,
) -> Result<String, PreviewError> {
    let url = Url::parse(url).map_err(|source| PreviewError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    check_scheme(&url)?;

    let mut response = http.get(url.clone()).send().await?;
    if matches!(
        response.status(),
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND
    ) {
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|l| url.join(l).ok())
            .ok_or(PreviewError::BadRedirect)?;
        check_scheme(&location)?;
        debug!(%location, "following preview redirect");
        response = http.get(location).send().await?;
    }

    let mut buffer = Vec::with_capacity(limit.min(64 * 1024));
    while let Some(chunk) = response.chunk().await? {
        buffer.extend_from_slice(&chunk);
        if buffer.len() > limit {
            break;
        }
    }
    buffer.truncate(limit);
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Fills `content` of every `text` view on the package's display resources.
/// Fetches run concurrently; a failed fetch leaves its view empty.
pub async fn load_text_views(http: &reqwest::Client, mut dp: DataPackage, limit: usize) -> DataPackage {
    let targets: Vec<(usize, usize, String)> = dp
        .display_resources
        .iter()
        .enumerate()
        .flat_map(|(r, display)| {
            let path = display.resource.path.clone();
            display
                .resource
                .views
                .iter()
                .enumerate()
                .filter(|(_, view)| view.spec_type == TEXT_VIEW)
                .filter_map(move |(v, _)| path.clone().map(|p| (r, v, p)))
        })
        .collect();

    let fetched = join_all(targets.iter().map(|(_, _, path)| async move {
        match fetch_text_preview(http, path, limit).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(path = %path, error = %e, "text preview failed");
                None
            }
        }
    }))
    .await;

    for ((r, v, _), content) in targets.into_iter().zip(fetched) {
        if let Some(view) = dp
            .display_resources
            .get_mut(r)
            .and_then(|d| d.resource.views.get_mut(v))
        {
            view.content = content;
        }
    }
    dp
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal::{DisplayResource, Resource, View};
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn client() -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn body_is_cut_at_the_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/big.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(50_000)))
            .mount(&server)
            .await;

        let text = fetch_text_preview(&client(), &format!("{}/big.txt", server.uri()), 10240)
            .await
            .unwrap();
        assert_eq!(text.len(), 10240);
    }

    #[tokio::test]
    async fn one_redirect_is_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old.csv"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new.csv"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("a,b\n1,2\n"))
            .mount(&server)
            .await;

        let text = fetch_text_preview(&client(), &format!("{}/old.csv", server.uri()), 10240)
            .await
            .unwrap();
        assert_eq!(text, "a,b\n1,2\n");
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'o', b'k', 0xff]))
            .mount(&server)
            .await;

        let text = fetch_text_preview(&client(), &format!("{}/x", server.uri()), 10)
            .await
            .unwrap();
        assert_eq!(text, "ok\u{fffd}");
    }

    #[tokio::test]
    async fn unsupported_schemes_are_rejected() {
        let err = fetch_text_preview(&client(), "ftp://example.org/a.txt", 10)
            .await
            .unwrap_err();
        assert!(matches!(err, PreviewError::UnsupportedScheme(_)));
    }

    #[tokio::test]
    async fn text_views_are_filled_and_failures_left_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/catatan.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("halo"))
            .mount(&server)
            .await;

        let display = |path: String| DisplayResource {
            resource: Resource {
                id: "r".into(),
                name: "r".into(),
                path: Some(path),
                views: vec![View {
                    spec_type: TEXT_VIEW.into(),
                    ..View::default()
                }],
                ..Resource::default()
            },
            ..DisplayResource::default()
        };
        let dp = DataPackage {
            display_resources: vec![
                display(format!("{}/catatan.txt", server.uri())),
                display("not a url".into()),
            ],
            ..DataPackage::default()
        };

        let dp = load_text_views(&client(), dp, 10240).await;
        assert_eq!(dp.display_resources[0].resource.views[0].content.as_deref(), Some("halo"));
        assert_eq!(dp.display_resources[1].resource.views[0].content, None);
    }
}
