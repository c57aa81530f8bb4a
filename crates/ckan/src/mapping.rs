use portal::{
    DataPackage, License, OrganizationRef, Person, Resource, Source, View, DATA_EXPLORER_VIEW,
    TEXT_VIEW,
};
use serde_json::json;

use crate::wire::{CkanPackage, CkanResource};

/// Formats small enough, and plain enough, to preview as text.
const TEXT_FORMATS: &[&str] = &["txt", "md", "json", "xml", "geojson", "csv"];

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Converts a CKAN package into a portal [`DataPackage`], attaching default
/// views to every resource.
pub fn ckan_to_data_package(pkg: CkanPackage) -> DataPackage {
    let license = (pkg.license_id.is_some() || pkg.license_title.is_some()).then(|| License {
        kind: non_empty(pkg.license_id),
        title: non_empty(pkg.license_title),
        url: non_empty(pkg.license_url),
    });

    let source = Source {
        name: non_empty(pkg.author),
        email: non_empty(pkg.author_email),
        web: non_empty(pkg.url),
    };
    let sources = if source == Source::default() {
        Vec::new()
    } else {
        vec![source]
    };

    let author = Person {
        name: non_empty(pkg.maintainer),
        email: non_empty(pkg.maintainer_email),
    };

    DataPackage {
        id: pkg.id,
        name: pkg.name.to_lowercase(),
        title: non_empty(pkg.title),
        description: non_empty(pkg.notes),
        readme: None,
        homepage: non_empty(pkg.ckan_url),
        version: non_empty(pkg.version),
        license,
        sources,
        author: (author != Person::default()).then_some(author),
        keywords: pkg
            .tags
            .into_iter()
            .map(|t| t.name)
            .filter(|n| !n.is_empty())
            .collect(),
        organization: pkg.organization.map(|o| OrganizationRef {
            name: o.name,
            title: o.title,
            image_url: non_empty(o.image_url),
        }),
        created: pkg.metadata_created,
        modified: pkg.metadata_modified,
        resources: pkg.resources.into_iter().map(map_resource).collect(),
        ..DataPackage::default()
    }
}

fn parse_size(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Lowercased file extension of a URL or path, ignoring query and fragment.
fn extension_of(path: &str) -> Option<String> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let file = path.rsplit('/').next().unwrap_or_default();
    let (stem, ext) = file.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then(|| ext.to_lowercase())
}

fn map_resource(res: CkanResource) -> Resource {
    let name = match non_empty(res.name) {
        Some(name) => name,
        None => res.id.clone(),
    };
    let path = non_empty(res.url);
    let format = non_empty(res.format).or_else(|| path.as_deref().and_then(extension_of));

    let mut resource = Resource {
        title: non_empty(res.title).or_else(|| Some(name.clone())),
        name: name.to_lowercase().replace(' ', "_"),
        id: res.id,
        path,
        format,
        size: parse_size(&res.size),
        description: non_empty(res.description),
        datastore_active: res.datastore_active,
        ..Resource::default()
    };
    resource.views = default_views(&resource);
    resource
}

fn default_views(resource: &Resource) -> Vec<View> {
    if resource.datastore_active {
        return vec![View {
            id: format!("{}-explorer", resource.id),
            spec_type: DATA_EXPLORER_VIEW.to_string(),
            spec: json!({
                "widgets": [
                    { "specType": "table" },
                    { "specType": "simple" }
                ]
            }),
            ..View::default()
        }];
    }

    let textual = resource
        .format
        .as_deref()
        .map(str::to_lowercase)
        .is_some_and(|f| TEXT_FORMATS.contains(&f.as_str()));
    if textual && resource.path.is_some() {
        return vec![View {
            id: format!("{}-text", resource.id),
            spec_type: TEXT_VIEW.to_string(),
            ..View::default()
        }];
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn package() -> CkanPackage {
        serde_json::from_value(json!({
            "id": "0c5b",
            "name": "Penduduk-2019",
            "title": "Penduduk 2019",
            "notes": "Jumlah *penduduk*",
            "url": "https://bps.go.id",
            "ckan_url": "https://ckan.example.org/dataset/penduduk-2019",
            "author": "BPS",
            "author_email": "",
            "maintainer": "Dinas",
            "maintainer_email": "data@dinas.go.id",
            "license_id": "cc-by",
            "license_title": "Creative Commons Attribution",
            "tags": [{ "name": "kependudukan" }, { "name": "sensus" }],
            "organization": { "name": "bps", "title": "Badan Pusat Statistik" },
            "resources": [
                {
                    "id": "r1", "name": "Tabel Penduduk", "url": "https://files/x.csv",
                    "format": "CSV", "size": "2048", "datastore_active": true
                },
                { "id": "r2", "name": null, "url": "https://files/catatan.TXT?dl=1", "size": null },
                { "id": "r3", "name": "Laporan", "url": "https://files/laporan.pdf", "format": "PDF", "size": 10 }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn package_fields_are_mapped() {
        let dp = ckan_to_data_package(package());
        assert_eq!(dp.name, "penduduk-2019");
        assert_eq!(dp.description.as_deref(), Some("Jumlah *penduduk*"));
        assert_eq!(dp.homepage.as_deref(), Some("https://ckan.example.org/dataset/penduduk-2019"));
        assert_eq!(dp.license.as_ref().unwrap().kind.as_deref(), Some("cc-by"));
        assert_eq!(dp.sources[0].name.as_deref(), Some("BPS"));
        assert_eq!(dp.sources[0].email, None);
        assert_eq!(dp.sources[0].web.as_deref(), Some("https://bps.go.id"));
        assert_eq!(dp.author.as_ref().unwrap().name.as_deref(), Some("Dinas"));
        assert_eq!(dp.keywords, vec!["kependudukan", "sensus"]);
        assert_eq!(dp.owner_name().unwrap(), "bps");
    }

    #[test]
    fn resources_get_names_formats_and_sizes() {
        let dp = ckan_to_data_package(package());
        let first = &dp.resources[0];
        assert_eq!(first.name, "tabel_penduduk");
        assert_eq!(first.title.as_deref(), Some("Tabel Penduduk"));
        assert_eq!(first.size, Some(2048));

        let second = &dp.resources[1];
        assert_eq!(second.name, "r2");
        assert_eq!(second.format.as_deref(), Some("txt"));
        assert_eq!(second.size, None);
        assert_eq!(dp.resources[2].size, Some(10));
    }

    #[test]
    fn default_views_follow_format_and_datastore() {
        let dp = ckan_to_data_package(package());
        assert_eq!(dp.resources[0].views[0].spec_type, DATA_EXPLORER_VIEW);
        assert_eq!(dp.resources[0].views[0].id, "r1-explorer");
        assert_eq!(dp.resources[0].views[0].spec["widgets"][1]["specType"], "simple");
        assert_eq!(dp.resources[1].views[0].spec_type, TEXT_VIEW);
        assert!(dp.resources[2].views.is_empty());
    }

    #[test]
    fn extensions_ignore_queries_and_dotfiles() {
        assert_eq!(extension_of("https://h/a/b.GeoJSON?x=1").as_deref(), Some("geojson"));
        assert_eq!(extension_of("https://h/a/.hidden"), None);
        assert_eq!(extension_of("https://h/a/noext"), None);
    }

    #[test]
    fn bare_package_has_no_optional_sections() {
        let dp = ckan_to_data_package(CkanPackage {
            name: "x".into(),
            ..CkanPackage::default()
        });
        assert!(dp.license.is_none());
        assert!(dp.sources.is_empty());
        assert!(dp.author.is_none());
        assert!(dp.organization.is_none());
    }
}
