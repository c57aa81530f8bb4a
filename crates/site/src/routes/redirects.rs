//! Permanent redirects from the DMS's own URL scheme.

use axum::{
    extract::{Path, RawQuery, State},
    response::Response,
};
use portal::{sanitize_param, DatasetName};
use tracing::debug;

use crate::{SiteError, SiteState};

use super::moved_permanently;

fn dataset_name(raw: &str) -> Result<DatasetName, SiteError> {
    DatasetName::new(sanitize_param(raw)).ok_or_else(|| SiteError::not_found("dataset"))
}

/// `/dataset` → `/search`, keeping the query.
pub(crate) async fn search(RawQuery(query): RawQuery) -> Response {
    match query.filter(|q| !q.is_empty()) {
        Some(q) => moved_permanently(format!("/search?{q}")),
        None => moved_permanently("/search"),
    }
}

/// `/dataset/{name}` → `/{organization}/{name}`.
pub(crate) async fn dataset(
    State(state): State<SiteState>,
    Path(name): Path<String>,
) -> Result<Response, SiteError> {
    let dp = state.dms.get_package(&dataset_name(&name)?).await?;
    let owner = dp.owner_name()?;
    Ok(moved_permanently(format!("/{owner}/{}", dp.name)))
}

/// `/dataset/{name}/resource/{id}` → `/{organization}/{name}#resource-{anchor}`.
pub(crate) async fn resource(
    State(state): State<SiteState>,
    Path((name, id)): Path<(String, String)>,
) -> Result<Response, SiteError> {
    let id = sanitize_param(&id);
    let dp = state.dms.get_package(&dataset_name(&name)?).await?;
    let owner = dp.owner_name()?;
    let resource = dp.resource_by_id(&id).ok_or_else(|| {
        debug!(dataset = %dp.name, resource = %id, "unknown resource");
        SiteError::not_found(format!("resource '{id}'"))
    })?;
    Ok(moved_permanently(format!(
        "/{owner}/{}#resource-{}",
        dp.name,
        resource.legacy_anchor()
    )))
}

/// `/organization/{owner}` → `/{owner}`.
pub(crate) async fn organization(Path(owner): Path<String>) -> Response {
    moved_permanently(format!("/{}", sanitize_param(&owner)))
}

/// `/group` → `/collections`.
pub(crate) async fn collections() -> Response {
    moved_permanently("/collections")
}

/// `/group/{collection}` → `/collections/{collection}`.
pub(crate) async fn collection(Path(collection): Path<String>) -> Response {
    moved_permanently(format!("/collections/{}", sanitize_param(&collection)))
}
