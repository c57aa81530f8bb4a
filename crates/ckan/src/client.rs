use std::time::Duration;

use async_trait::async_trait;
use portal::{
    Collection, CollectionName, DataCatalog, DataPackage, DatasetName, OwnerName, PortalError,
    Profile, SearchQuery, SearchResult,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::{
    mapping::ckan_to_data_package,
    query::to_ckan_search_params,
    wire::{CkanGroup, CkanPackage, CkanSearchResult, Envelope},
    DmsError,
};

const USER_AGENT: &str = concat!("portal/", env!("CARGO_PKG_VERSION"));

/// Connection settings for the DMS.
#[derive(Debug, Clone)]
pub struct DmsConfig {
    /// Action API root, e.g. `https://demo.ckan.org/api/3/action/`.
    pub api_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// [`DataCatalog`] backed by the CKAN action API.
#[derive(Debug, Clone)]
pub struct CkanClient {
    http: reqwest::Client,
    api_url: Url,
}

impl CkanClient {
    pub fn new(config: DmsConfig) -> Result<Self, DmsError> {
        let mut api_url = config.api_url;
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http, api_url })
    }

    /// The action API root, with a trailing slash.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Calls `action` and unwraps the `{ success, result, error }` envelope.
    async fn action<T: DeserializeOwned>(
        &self,
        action: &str,
        params: &[(String, String)],
    ) -> Result<T, DmsError> {
        let url = self.api_url.join(action)?;
        debug!(%url, "DMS request");
        let response = self.http.get(url).query(params).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        let envelope: Envelope<T> = match serde_json::from_slice(&body) {
            Ok(envelope) => envelope,
            Err(_) if status == StatusCode::NOT_FOUND => {
                return Err(DmsError::NotFound {
                    what: action.to_string(),
                })
            }
            Err(_) if !status.is_success() => {
                return Err(DmsError::Status {
                    action: action.to_string(),
                    status: status.as_u16(),
                })
            }
            Err(source) => {
                return Err(DmsError::Decode {
                    action: action.to_string(),
                    source,
                })
            }
        };

        match (envelope.success, envelope.result, envelope.error) {
            (true, Some(result), _) => Ok(result),
            (_, _, Some(error)) if error.is_not_found() || status == StatusCode::NOT_FOUND => {
                Err(DmsError::NotFound {
                    what: format!("{action}: {}", error.message),
                })
            }
            (_, _, Some(error)) => Err(DmsError::Api {
                action: action.to_string(),
                message: error.message,
            }),
            _ if status == StatusCode::NOT_FOUND => Err(DmsError::NotFound {
                what: action.to_string(),
            }),
            _ => Err(DmsError::Api {
                action: action.to_string(),
                message: format!("unsuccessful response (HTTP {})", status.as_u16()),
            }),
        }
    }

    #[instrument(skip(self, name), fields(dataset = %name))]
    pub async fn package_show(&self, name: &DatasetName) -> Result<DataPackage, DmsError> {
        let package: CkanPackage = self
            .action("package_show", &[("id".to_string(), name.to_string())])
            .await?;
        Ok(ckan_to_data_package(package))
    }

    #[instrument(skip(self))]
    pub async fn package_search(&self, query: &SearchQuery) -> Result<SearchResult, DmsError> {
        let params = to_ckan_search_params(query);
        let mut result: CkanSearchResult = self.action("package_search", &params).await?;
        let results = std::mem::take(&mut result.results)
            .into_iter()
            .map(ckan_to_data_package)
            .collect();
        Ok(SearchResult {
            count: result.count,
            results,
            facets: result.facets(),
        })
    }

    #[instrument(skip(self))]
    pub async fn group_list(&self) -> Result<Vec<Collection>, DmsError> {
        let groups: Vec<CkanGroup> = self
            .action("group_list", &[("all_fields".to_string(), "true".to_string())])
            .await?;
        Ok(groups.into_iter().map(CkanGroup::into_collection).collect())
    }

    #[instrument(skip(self, name), fields(collection = %name))]
    pub async fn group_show(&self, name: &CollectionName) -> Result<Collection, DmsError> {
        let group: CkanGroup = self
            .action("group_show", &[("id".to_string(), name.to_string())])
            .await?;
        Ok(group.into_collection())
    }

    #[instrument(skip(self, owner), fields(owner = %owner))]
    pub async fn organization_show(&self, owner: &OwnerName) -> Result<Profile, DmsError> {
        let group: CkanGroup = self
            .action("organization_show", &[("id".to_string(), owner.to_string())])
            .await?;
        Ok(group.into_profile())
    }

    #[instrument(skip(self))]
    pub async fn organization_list(&self) -> Result<Vec<Profile>, DmsError> {
        let groups: Vec<CkanGroup> = self
            .action(
                "organization_list",
                &[("all_fields".to_string(), "true".to_string())],
            )
            .await?;
        Ok(groups.into_iter().map(CkanGroup::into_profile).collect())
    }
}

#[async_trait]
impl DataCatalog for CkanClient {
    async fn get_package(&self, name: &DatasetName) -> Result<DataPackage, PortalError> {
        Ok(self.package_show(name).await?)
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResult, PortalError> {
        Ok(self.package_search(query).await?)
    }

    async fn get_collections(&self) -> Result<Vec<Collection>, PortalError> {
        Ok(self.group_list().await?)
    }

    async fn get_collection(&self, name: &CollectionName) -> Result<Collection, PortalError> {
        Ok(self.group_show(name).await?)
    }

    /// Unknown owners come back as an empty profile. Transport failures still
    /// propagate.
    async fn get_profile(&self, owner: &OwnerName) -> Result<Profile, PortalError> {
        match self.organization_show(owner).await {
            Ok(profile) => Ok(profile),
            Err(err @ DmsError::Transport(_)) => Err(err.into()),
            Err(err) => {
                debug!(%owner, error = %err, "no profile for owner");
                Ok(Profile::default())
            }
        }
    }

    async fn get_organizations(&self) -> Result<Vec<Profile>, PortalError> {
        Ok(self.organization_list().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn client(server: &MockServer) -> CkanClient {
        CkanClient::new(DmsConfig {
            api_url: Url::parse(&format!("{}/api/3/action", server.uri())).unwrap(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn ok(result: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "success": true, "result": result }))
    }

    #[tokio::test]
    async fn package_show_maps_the_package() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/3/action/package_show"))
            .and(query_param("id", "penduduk"))
            .respond_with(ok(json!({
                "id": "p1", "name": "Penduduk",
                "organization": { "name": "bps", "title": "BPS" },
                "resources": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dp = client(&server)
            .get_package(&DatasetName::new("penduduk").unwrap())
            .await
            .unwrap();
        assert_eq!(dp.name, "penduduk");
        assert_eq!(dp.owner_name().unwrap(), "bps");
    }

    #[tokio::test]
    async fn not_found_envelope_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/3/action/package_show"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "success": false,
                "error": { "__type": "Not Found Error", "message": "Not found" }
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .get_package(&DatasetName::new("hilang").unwrap())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn search_translates_parameters_and_facets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/3/action/package_search"))
            .and(query_param("q", "air"))
            .and(query_param("fq", "organization:bps"))
            .and(query_param("rows", "2"))
            .respond_with(ok(json!({
                "count": 7,
                "results": [{ "id": "a", "name": "air-bersih" }],
                "search_facets": {
                    "tags": { "title": "tags", "items": [{ "name": "air", "display_name": "air", "count": 3 }] }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = SearchQuery::from_pairs([("q", "air"), ("size", "2")]).and_term("organization:bps");
        let result = client(&server).search(&query).await.unwrap();
        assert_eq!(result.count, 7);
        assert_eq!(result.results[0].name, "air-bersih");
        assert_eq!(result.facets[0].items[0].count, 3);
    }

    #[tokio::test]
    async fn collections_and_organizations_use_all_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/3/action/group_list"))
            .and(query_param("all_fields", "true"))
            .respond_with(ok(json!([{ "name": "ekonomi", "title": "Ekonomi", "package_count": 4 }])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/3/action/organization_list"))
            .and(query_param("all_fields", "true"))
            .respond_with(ok(json!([{ "name": "bps", "display_name": "BPS", "created": "2019-01-02T03:04:05" }])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/3/action/group_show"))
            .and(query_param("id", "ekonomi"))
            .respond_with(ok(json!({ "name": "ekonomi", "title": "Ekonomi", "description": "Data ekonomi" })))
            .mount(&server)
            .await;

        let client = client(&server);
        let collections = client.get_collections().await.unwrap();
        assert_eq!(collections[0].title, "Ekonomi");
        assert_eq!(collections[0].package_count, Some(4));

        let orgs = client.get_organizations().await.unwrap();
        assert_eq!(orgs[0].title, "BPS");
        assert!(orgs[0].exists());

        let collection = client
            .get_collection(&CollectionName::new("ekonomi").unwrap())
            .await
            .unwrap();
        assert_eq!(collection.description, "Data ekonomi");
    }

    #[tokio::test]
    async fn unknown_owner_is_an_empty_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/3/action/organization_show"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "success": false,
                "error": { "__type": "Not Found Error", "message": "Not found" }
            })))
            .mount(&server)
            .await;

        let profile = client(&server)
            .get_profile(&OwnerName::new("siapa").unwrap())
            .await
            .unwrap();
        assert!(!profile.exists());
    }

    #[tokio::test]
    async fn unsuccessful_envelope_is_an_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "success": false,
                "error": { "__type": "Search Query Error", "message": "bad sort" }
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .package_search(&SearchQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DmsError::Api { ref message, .. } if message == "bad sort"));
    }

    #[tokio::test]
    async fn garbage_on_success_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server).get_collections().await.unwrap_err();
        assert!(matches!(err, PortalError::InvalidUpstreamData { .. }));
    }
}
