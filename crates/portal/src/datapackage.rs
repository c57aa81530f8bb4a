//! Dataset descriptors and their preparation for display.
//!
//! The DMS adapter produces a [`DataPackage`] from whatever the upstream speaks.
//! Before a dataset page is rendered the descriptor goes through four pure
//! steps, in this order:
//!
//! 1. [`process_data_package`]: markdown to HTML, normalized formats, readable
//!    sizes.
//! 2. [`prepare_resources_for_display`]: one [`DisplayResource`] per resource
//!    with API, proxy, and anchor information.
//! 3. [`prepare_views`]: per-resource views consolidated onto the package.
//! 4. [`prepare_data_explorers`]: data-explorer widget configurations.
//!
//! [`prepare_for_render`] runs all four. Loading the content of `text` views
//! needs network access and is done by the site crate afterwards.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use url::Url;

use crate::{format_bytes, render_markdown, slugify, PortalError, UpstreamService};

/// `spec_type` of a view that shows the first bytes of a file as text.
pub const TEXT_VIEW: &str = "text";

/// `spec_type` of a view that hosts several widgets over one resource.
pub const DATA_EXPLORER_VIEW: &str = "dataExplorer";

// ---------------------------------------------------------------------------
// Descriptor types
// ---------------------------------------------------------------------------

/// License of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct License {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Where the data came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<String>,
}

/// A named contact (the dataset maintainer).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// The organization that owns a dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRef {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A visualisation of one or more resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    #[serde(default)]
    pub id: String,
    pub spec_type: String,
    /// Names of the resources the view draws from.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
    /// Renderer-specific configuration.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub spec: serde_json::Value,
    /// Preloaded file content for `text` views.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A single file or API endpoint within a dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Download URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the DMS holds a queryable copy of the data.
    #[serde(default, rename = "datastore_active")]
    pub datastore_active: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub views: Vec<View>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_formatted: Option<String>,
}

impl Resource {
    /// Title for display, falling back to the name.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(&self.name)
    }

    /// The `#resource-…` anchor suffix used by legacy resource redirects: the
    /// name with its first `.` replaced by `_`.
    pub fn legacy_anchor(&self) -> String {
        self.name.replacen('.', "_", 1)
    }
}

/// A resource together with everything a template needs to present it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayResource {
    pub resource: Resource,
    /// Datastore query URL, for resources with an active datastore.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<String>,
    /// Same-origin proxy path, used to avoid CORS issues.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    /// The DMS's own resource proxy URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cc_proxy: Option<String>,
    /// Anchor id, unique within the page.
    pub slug: String,
    /// Serialized data-explorer configurations, HTML-attribute safe.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_explorers: Vec<String>,
}

/// A dataset descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPackage {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Person>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<OrganizationRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub views: Vec<View>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub formats: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme_html: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub display_resources: Vec<DisplayResource>,
}

impl DataPackage {
    /// Title for display, falling back to the name.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(&self.name)
    }

    /// Name of the owning organization.
    ///
    /// A dataset without an organization cannot be placed under `/{owner}/…`.
    pub fn owner_name(&self) -> Result<&str, PortalError> {
        self.organization
            .as_ref()
            .map(|o| o.name.as_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| PortalError::InvalidUpstreamData {
                service: UpstreamService::Dms,
                message: format!("dataset '{}' has no organization", self.name),
            })
    }

    /// Finds a resource by id.
    pub fn resource_by_id(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }
}

// ---------------------------------------------------------------------------
// Preparation
// ---------------------------------------------------------------------------

/// Upstream locations needed to compute resource links.
#[derive(Debug, Clone)]
pub struct DisplayContext {
    /// Base URL of the DMS action API (ends with `/`).
    pub api_url: Url,
    /// Host whose resources are served through `/proxy/datastore`.
    pub proxy_datastore: Option<String>,
    /// Host whose resources are served through `/proxy/filestore`.
    pub proxy_filestore: Option<String>,
}

/// Runs every preparation step in order.
pub fn prepare_for_render(datapackage: DataPackage, ctx: &DisplayContext) -> DataPackage {
    let datapackage = process_data_package(datapackage);
    let datapackage = prepare_resources_for_display(datapackage, ctx);
    let datapackage = prepare_views(datapackage);
    prepare_data_explorers(datapackage)
}

/// Renders markdown, normalizes resource formats, and formats sizes.
pub fn process_data_package(mut dp: DataPackage) -> DataPackage {
    dp.description_html = dp.description.as_deref().filter(|d| !d.is_empty()).map(render_markdown);
    dp.readme_html = dp.readme.as_deref().filter(|r| !r.is_empty()).map(render_markdown);

    for resource in &mut dp.resources {
        resource.description_html = resource
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(render_markdown);
        if let Some(format) = resource.format.as_mut().filter(|f| !f.is_empty()) {
            *format = format.to_lowercase();
            if !dp.formats.contains(format) {
                dp.formats.push(format.clone());
            }
        }
        resource.size_formatted = resource.size.filter(|s| *s > 0).map(format_bytes);
    }
    dp
}

/// Builds one [`DisplayResource`] per resource.
pub fn prepare_resources_for_display(mut dp: DataPackage, ctx: &DisplayContext) -> DataPackage {
    let display: Vec<DisplayResource> = dp
        .resources
        .iter()
        .enumerate()
        .map(|(index, resource)| {
            let api = resource.datastore_active.then(|| {
                format!(
                    "{}datastore_search?resource_id={}&sort=_id asc",
                    ctx.api_url, resource.id
                )
            });
            let (proxy, cc_proxy) = resource_proxies(&dp.id, resource, ctx);
            DisplayResource {
                resource: resource.clone(),
                api,
                proxy,
                cc_proxy,
                slug: format!("{}-{}", slugify(&resource.name), index),
                data_explorers: Vec::new(),
            }
        })
        .collect();
    dp.display_resources = display;
    dp
}

fn resource_proxies(
    package_id: &str,
    resource: &Resource,
    ctx: &DisplayContext,
) -> (Option<String>, Option<String>) {
    let Some(path) = resource.path.as_deref() else {
        return (None, None);
    };
    let url = match Url::parse(path) {
        Ok(url) => url,
        Err(e) => {
            warn!(resource = %resource.id, path, error = %e, "resource path is not a URL");
            return (None, None);
        }
    };

    let is_pdf = resource.format.as_deref() == Some("pdf");
    let host = url.host_str();
    let proxied = |prefix: &str| {
        let query = url.query().map(|q| format!("?{q}")).unwrap_or_default();
        format!("{prefix}{}{query}", url.path())
    };
    let mut proxy = None;
    if !is_pdf && host.is_some() && host == ctx.proxy_datastore.as_deref() {
        proxy = Some(proxied("/proxy/datastore"));
    }
    if !is_pdf && host.is_some() && host == ctx.proxy_filestore.as_deref() {
        proxy = Some(proxied("/proxy/filestore"));
    }

    let cc_proxy = format!(
        "{}/dataset/{}/resource/{}/proxy",
        ctx.api_url.origin().ascii_serialization(),
        package_id,
        resource.id
    );
    (proxy, Some(cc_proxy))
}

/// Appends every resource's views to the package views, tagging each with the
/// resource it belongs to.
pub fn prepare_views(mut dp: DataPackage) -> DataPackage {
    for resource in &mut dp.resources {
        for view in &mut resource.views {
            view.resources = vec![resource.name.clone()];
            dp.views.push(view.clone());
        }
    }
    dp
}

fn widget_name(spec_type: &str, index: usize) -> String {
    match spec_type {
        "table" => "Table".to_string(),
        "tabularmap" => "Map".to_string(),
        "simple" => "Chart".to_string(),
        _ => format!("Widget-{index}"),
    }
}

/// Serializes a data-explorer configuration for every `dataExplorer` view.
///
/// The result is embedded in a single-quoted HTML attribute, so `'` is
/// replaced by `&#x27;`.
pub fn prepare_data_explorers(mut dp: DataPackage) -> DataPackage {
    for display in &mut dp.display_resources {
        let mut explorers = Vec::new();
        for view in display
            .resource
            .views
            .iter()
            .filter(|v| v.spec_type == DATA_EXPLORER_VIEW)
        {
            let widgets: Vec<serde_json::Value> = view
                .spec
                .get("widgets")
                .and_then(|w| w.as_array())
                .map(|widgets| {
                    widgets
                        .iter()
                        .enumerate()
                        .map(|(index, widget)| {
                            let spec_type = widget
                                .get("specType")
                                .and_then(|s| s.as_str())
                                .unwrap_or_default();
                            json!({
                                "name": widget_name(spec_type, index),
                                "active": index == 0,
                                "datapackage": {
                                    "views": [{ "id": view.id, "specType": spec_type }]
                                }
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            let explorer = json!({
                "widgets": widgets,
                "datapackage": { "resources": [&display.resource] }
            });
            explorers.push(explorer.to_string().replace('\'', "&#x27;"));
        }
        display.data_explorers = explorers;
    }
    dp
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> DisplayContext {
        DisplayContext {
            api_url: Url::parse("https://ckan.example.org/api/3/action/").unwrap(),
            proxy_datastore: Some("datastore.example.org".into()),
            proxy_filestore: Some("files.example.org".into()),
        }
    }

    fn resource(id: &str, name: &str, path: &str, format: &str) -> Resource {
        Resource {
            id: id.into(),
            name: name.into(),
            path: Some(path.into()),
            format: Some(format.into()),
            ..Resource::default()
        }
    }

    fn package() -> DataPackage {
        let mut explorer = resource("r1", "penduduk.csv", "https://files.example.org/a/b.csv?x=1", "CSV");
        explorer.datastore_active = true;
        explorer.size = Some(2048);
        explorer.description = Some("Jumlah *penduduk*".into());
        explorer.views = vec![View {
            id: "v1".into(),
            spec_type: DATA_EXPLORER_VIEW.into(),
            spec: json!({ "widgets": [{ "specType": "table" }, { "specType": "simple" }, { "specType": "odd" }] }),
            ..View::default()
        }];
        let mut text = resource("r2", "catatan", "https://files.example.org/readme.txt", "TXT");
        text.views = vec![View {
            id: "v2".into(),
            spec_type: TEXT_VIEW.into(),
            ..View::default()
        }];
        DataPackage {
            id: "pkg-1".into(),
            name: "penduduk".into(),
            description: Some("Data *penduduk*".into()),
            organization: Some(OrganizationRef {
                name: "bps".into(),
                ..OrganizationRef::default()
            }),
            resources: vec![
                explorer,
                text,
                resource("r3", "laporan", "https://files.example.org/l.pdf", "PDF"),
                resource("r4", "extra", "https://files.example.org/x.csv", "csv"),
            ],
            ..DataPackage::default()
        }
    }

    #[test]
    fn processing_normalizes_formats_and_renders_markdown() {
        let dp = process_data_package(package());
        assert_eq!(dp.formats, vec!["csv", "txt", "pdf"]);
        assert_eq!(dp.description_html.as_deref(), Some("<p>Data <em>penduduk</em></p>\n"));
        assert_eq!(dp.resources[0].size_formatted.as_deref(), Some("2KB"));
        assert!(dp.resources[0].description_html.is_some());
        assert_eq!(dp.resources[1].size_formatted, None);
    }

    #[test]
    fn display_resources_carry_links() {
        let dp = prepare_resources_for_display(process_data_package(package()), &ctx());
        let first = &dp.display_resources[0];
        assert_eq!(
            first.api.as_deref(),
            Some("https://ckan.example.org/api/3/action/datastore_search?resource_id=r1&sort=_id asc")
        );
        assert_eq!(first.proxy.as_deref(), Some("/proxy/filestore/a/b.csv?x=1"));
        assert_eq!(
            first.cc_proxy.as_deref(),
            Some("https://ckan.example.org/dataset/pkg-1/resource/r1/proxy")
        );
        assert_eq!(first.slug, "penduduk.csv-0");
        // PDFs are never proxied.
        assert_eq!(dp.display_resources[2].proxy, None);
        assert_eq!(dp.display_resources[1].api, None);
    }

    #[test]
    fn unparseable_paths_leave_proxies_empty() {
        let mut dp = package();
        dp.resources[0].path = Some("not a url".into());
        let dp = prepare_resources_for_display(dp, &ctx());
        assert_eq!(dp.display_resources[0].proxy, None);
        assert_eq!(dp.display_resources[0].cc_proxy, None);
    }

    #[test]
    fn views_are_consolidated() {
        let dp = prepare_views(package());
        assert_eq!(dp.views.len(), 2);
        assert_eq!(dp.views[0].resources, vec!["penduduk.csv"]);
        assert_eq!(dp.views[1].resources, vec!["catatan"]);
    }

    #[test]
    fn data_explorers_are_built_for_explorer_views() {
        let dp = prepare_for_render(package(), &ctx());
        let explorers = &dp.display_resources[0].data_explorers;
        assert_eq!(explorers.len(), 1);
        let parsed: serde_json::Value = serde_json::from_str(&explorers[0]).unwrap();
        let widgets = parsed["widgets"].as_array().unwrap();
        assert_eq!(widgets[0]["name"], "Table");
        assert_eq!(widgets[0]["active"], true);
        assert_eq!(widgets[1]["name"], "Chart");
        assert_eq!(widgets[1]["active"], false);
        assert_eq!(widgets[2]["name"], "Widget-2");
        assert_eq!(widgets[0]["datapackage"]["views"][0]["id"], "v1");
        assert_eq!(parsed["datapackage"]["resources"][0]["id"], "r1");
        assert!(dp.display_resources[1].data_explorers.is_empty());
    }

    #[test]
    fn explorer_json_escapes_single_quotes() {
        let mut dp = package();
        dp.resources[0].title = Some("Penduduk 'BPS'".into());
        let dp = prepare_for_render(dp, &ctx());
        assert!(dp.display_resources[0].data_explorers[0].contains("&#x27;BPS&#x27;"));
    }

    #[test]
    fn owner_and_legacy_anchor() {
        let dp = package();
        assert_eq!(dp.owner_name().unwrap(), "bps");
        assert_eq!(dp.resource_by_id("r1").unwrap().legacy_anchor(), "penduduk_csv");
        let orphan = DataPackage::default();
        assert!(orphan.owner_name().is_err());
    }
}
