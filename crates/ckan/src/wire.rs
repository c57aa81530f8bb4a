//! CKAN action API response shapes.
//!
//! Only the fields the portal reads are declared; CKAN sends many more. Every
//! field is optional because CKAN instances differ in which extensions (and
//! therefore which fields) they carry.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime};
use portal::{Collection, Facet, FacetItem, Profile};
use serde::{Deserialize, Deserializer};

/// CKAN sends `null` as freely as it omits a field; both mean "default".
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The `{ success, result, error }` envelope every action returns.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    pub result: Option<T>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    #[serde(rename = "__type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        self.kind == "Not Found Error"
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct CkanTag {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct CkanOrganizationRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct CkanResource {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    pub name: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub format: Option<String>,
    /// Numbers, numeric strings, or null depending on the uploader.
    #[serde(default)]
    pub size: serde_json::Value,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub datastore_active: bool,
}

/// A CKAN dataset (`package_show` result, `package_search` result item).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CkanPackage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) name: String,
    pub(crate) title: Option<String>,
    pub(crate) notes: Option<String>,
    pub(crate) url: Option<String>,
    pub(crate) ckan_url: Option<String>,
    pub(crate) version: Option<String>,
    pub(crate) author: Option<String>,
    pub(crate) author_email: Option<String>,
    pub(crate) maintainer: Option<String>,
    pub(crate) maintainer_email: Option<String>,
    pub(crate) license_id: Option<String>,
    pub(crate) license_title: Option<String>,
    pub(crate) license_url: Option<String>,
    pub(crate) metadata_created: Option<String>,
    pub(crate) metadata_modified: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) tags: Vec<CkanTag>,
    pub(crate) organization: Option<CkanOrganizationRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) resources: Vec<CkanResource>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CkanFacetItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CkanFacet {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<CkanFacetItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CkanSearchResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<CkanPackage>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub search_facets: BTreeMap<String, CkanFacet>,
}

impl CkanSearchResult {
    pub fn facets(self) -> Vec<Facet> {
        self.search_facets
            .into_iter()
            .map(|(name, facet)| Facet {
                title: if facet.title.is_empty() {
                    name.clone()
                } else {
                    facet.title
                },
                name,
                items: facet
                    .items
                    .into_iter()
                    .map(|i| FacetItem {
                        display_name: if i.display_name.is_empty() {
                            i.name.clone()
                        } else {
                            i.display_name
                        },
                        name: i.name,
                        count: i.count,
                    })
                    .collect(),
            })
            .collect()
    }
}

/// A group or organization (`group_show`, `organization_show`, and the
/// `all_fields` list actions share this shape).
#[derive(Debug, Deserialize)]
pub(crate) struct CkanGroup {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    pub title: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub image_display_url: Option<String>,
    pub created: Option<String>,
    pub package_count: Option<u64>,
}

/// Parses CKAN timestamps, which usually lack a zone (`2019-03-01T10:20:30.123456`).
pub(crate) fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|d| d.naive_utc()))
}

impl CkanGroup {
    fn title(&self) -> String {
        self.title
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| self.display_name.clone())
            .unwrap_or_else(|| self.name.clone())
    }

    pub fn into_collection(self) -> Collection {
        Collection {
            title: self.title(),
            name: self.name,
            description: self.description.unwrap_or_default(),
            image_url: self.image_display_url.or(self.image_url),
            package_count: self.package_count,
        }
    }

    pub fn into_profile(self) -> Profile {
        Profile {
            title: self.title(),
            created: self.created.as_deref().and_then(parse_timestamp),
            name: self.name,
            description: self.description.unwrap_or_default(),
            image_url: self.image_url,
            image_display_url: self.image_display_url,
            package_count: self.package_count,
        }
    }
}
