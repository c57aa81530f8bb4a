//! Dataset search, collections, organizations, and dataset showcases.

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Json, Response},
};
use portal::{
    prepare_for_render, sanitize_param, CollectionName, DataPackage, DatasetName, LocaleTag,
    OwnerName, Paging, SearchQuery, SearchResult,
};

use crate::{
    locale::RequestLocale,
    preview::load_text_views,
    templates,
    view::{facet_views, pager_links, OwnerView, PagerLink},
    SiteError, SiteState,
};

use super::{cms, full_url, html, page_meta, pair_refs};

/// Runs `query` against the DMS and builds pagination links that re-encode
/// `received` (the query as the visitor sent it) at `path`.
async fn search_page(
    state: &SiteState,
    query: &SearchQuery,
    received: &SearchQuery,
    path: &str,
) -> Result<(SearchResult, Vec<PagerLink>), SiteError> {
    let result = state.dms.search(query).await?;
    let paging = Paging::from_offset(query.from_or_default(), query.size_or_default(), result.count);
    let pager = pager_links(&paging, |page| {
        format!(
            "{path}?{}",
            received.to_query_string_with_from(paging.offset_of(page))
        )
    });
    Ok((result, pager))
}

pub(crate) async fn search(
    State(state): State<SiteState>,
    RequestLocale(locale): RequestLocale,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Html<Vec<u8>>, SiteError> {
    let query = SearchQuery::from_pairs(pair_refs(&pairs));
    let (result, pager) = search_page(&state, &query, &query, "/search").await?;
    let facets = facet_views(&result.facets, &query, "/search");
    let q = query.q.clone().unwrap_or_default();
    let meta = page_meta(&state, &locale, "Search");
    html(|out| templates::search_html(out, &meta, &q, &result, &facets, &pager))
}

pub(crate) async fn collection(
    State(state): State<SiteState>,
    RequestLocale(locale): RequestLocale,
    Path(name): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Html<Vec<u8>>, SiteError> {
    let name = sanitize_param(&name);
    let collection_name =
        CollectionName::new(name.clone()).ok_or_else(|| SiteError::not_found("collection"))?;
    let collection = state.dms.get_collection(&collection_name).await?;

    let received = SearchQuery::from_pairs(pair_refs(&pairs));
    let query = received.clone().and_term(&format!("groups:{name}"));
    let path = format!("/collections/{name}");
    let (result, pager) = search_page(&state, &query, &received, &path).await?;

    let meta = page_meta(&state, &locale, collection.title.clone());
    html(|out| templates::collection_html(out, &meta, &collection, &result, &pager))
}

pub(crate) async fn organizations(
    State(state): State<SiteState>,
    RequestLocale(locale): RequestLocale,
) -> Result<Html<Vec<u8>>, SiteError> {
    let organizations = state.dms.get_organizations().await?;
    let meta = page_meta(&state, &locale, "Daftar Instansi").with_description(
        "Halaman ini menampilkan Daftar Instansi Pusat dan Daerah yang telah terkoneksi dengan Portal Satu Data Indonesia.",
    );
    html(|out| templates::organizations_html(out, &meta, &organizations))
}

/// Fetches a dataset and runs every preparation step, text previews included.
async fn prepared_package(state: &SiteState, name: &str) -> Result<DataPackage, SiteError> {
    let name = DatasetName::new(name).ok_or_else(|| SiteError::not_found("dataset"))?;
    let dp = state.dms.get_package(&name).await?;
    let dp = prepare_for_render(dp, &state.display);
    Ok(load_text_views(&state.http, dp, state.config.preview_limit_bytes).await)
}

/// `/{owner}/{name}`: a CMS static page when one exists, otherwise the
/// dataset showcase.
pub(crate) async fn showcase(
    State(state): State<SiteState>,
    RequestLocale(locale): RequestLocale,
    Path((owner, name)): Path<(String, String)>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Html<Vec<u8>>, SiteError> {
    let owner = sanitize_param(&owner);
    let name = sanitize_param(&name);
    render_showcase(&state, &locale, &owner, &name, &full_url(&headers, &uri)).await
}

/// Renders `/{owner}/{name}` for already sanitised parameters.
pub(crate) async fn render_showcase(
    state: &SiteState,
    locale: &LocaleTag,
    owner: &str,
    name: &str,
    url: &str,
) -> Result<Html<Vec<u8>>, SiteError> {
    if let Some(post) = cms::find_static_page(state, locale, owner, name).await? {
        return cms::render_static_page(state, locale, &post, owner, url);
    }

    let dataset = prepared_package(state, name).await?;
    let owner_name = OwnerName::new(owner.to_string()).ok_or_else(|| SiteError::not_found("owner"))?;
    let profile = state.dms.get_profile(&owner_name).await?;
    let owner_view = OwnerView::new(&profile);
    let dp_id = serde_json::to_string(&dataset)?.replace('\'', "&#x27;");

    let meta = page_meta(state, locale, format!("{owner} | {name}"));
    html(|out| templates::showcase_html(out, &meta, &dataset, &owner_view, url, &dp_id))
}

/// `/{owner}/{name}/datapackage.json`: the prepared descriptor.
pub(crate) async fn datapackage_json(
    State(state): State<SiteState>,
    Path((_owner, name)): Path<(String, String)>,
) -> Result<Response, SiteError> {
    let dataset = prepared_package(&state, &sanitize_param(&name)).await?;
    Ok(Json(dataset).into_response())
}

/// `/{owner}`: organization page with its datasets.
pub(crate) async fn owner(
    State(state): State<SiteState>,
    RequestLocale(locale): RequestLocale,
    Path(owner): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Html<Vec<u8>>, SiteError> {
    let owner = sanitize_param(&owner);
    let owner_name = OwnerName::new(owner.clone()).ok_or_else(|| SiteError::OwnerNotFound {
        owner: owner.clone(),
    })?;
    let profile = state.dms.get_profile(&owner_name).await?;
    if !profile.exists() {
        return Err(SiteError::OwnerNotFound { owner });
    }

    let received = SearchQuery::from_pairs(pair_refs(&pairs));
    let query = received.clone().and_term(&format!("organization:{owner}"));
    let (result, pager) = search_page(&state, &query, &received, &format!("/{owner}")).await?;

    let owner_view = OwnerView::new(&profile);
    let meta = page_meta(&state, &locale, profile.title.clone());
    html(|out| templates::owner_html(out, &meta, &owner_view, &result, &pager))
}
