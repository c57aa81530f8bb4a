use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use portal::LocaleTag;
use url::form_urlencoded;

use crate::SiteState;

const LANG: &str = "lang";

/// The locale negotiated for a request: `?lang=`, then the `lang` cookie, then
/// `Accept-Language`, then the site default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLocale(pub LocaleTag);

fn query_lang(parts: &Parts) -> Option<String> {
    let query = parts.uri.query()?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == LANG)
        .map(|(_, v)| v.into_owned())
}

fn cookie_lang(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == LANG)
        .map(|(_, value)| value.trim().to_string())
}

impl FromRequestParts<SiteState> for RequestLocale {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &SiteState) -> Result<Self, Self::Rejection> {
        let explicit = [query_lang(parts), cookie_lang(parts)]
            .into_iter()
            .flatten()
            .find(|lang| state.locales.find(lang).is_some());
        let accept = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok());
        Ok(RequestLocale(state.locales.negotiate(explicit.as_deref(), accept)))
    }
}
