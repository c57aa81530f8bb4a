use std::sync::Arc;

use portal::{ContentStore, DataCatalog, DisplayContext, Locales, PortalError};
use url::Url;

use crate::{SiteConfig, SiteError};

const USER_AGENT: &str = concat!("portal/", env!("CARGO_PKG_VERSION"));

/// Shared, cheaply cloneable handler state.
#[derive(Clone)]
pub struct SiteState {
    pub(crate) config: Arc<SiteConfig>,
    pub(crate) locales: Arc<Locales>,
    pub(crate) display: Arc<DisplayContext>,
    pub(crate) cms: Option<Arc<dyn ContentStore>>,
    pub(crate) dms: Arc<dyn DataCatalog>,
    /// Client for text previews and the resource proxy. Never follows
    /// redirects on its own.
    pub(crate) http: reqwest::Client,
    /// Scheme used to reach the proxy hosts.
    pub(crate) proxy_scheme: &'static str,
}

impl SiteState {
    /// `dms_api_url` is the DMS action API root, used for datastore and proxy
    /// links on dataset pages.
    pub fn new(
        config: SiteConfig,
        dms_api_url: Url,
        cms: Option<Arc<dyn ContentStore>>,
        dms: Arc<dyn DataCatalog>,
    ) -> Result<Self, SiteError> {
        config
            .validate()
            .map_err(|message| PortalError::Configuration { message })?;
        let locales = Locales::new(&config.locale, &config.locales)?;
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(config.fetch_timeout())
            .user_agent(USER_AGENT)
            .build()?;
        let display = DisplayContext {
            api_url: dms_api_url,
            proxy_datastore: config.proxy_datastore.clone(),
            proxy_filestore: config.proxy_filestore.clone(),
        };
        Ok(Self {
            config: Arc::new(config),
            locales: Arc::new(locales),
            display: Arc::new(display),
            cms,
            dms,
            http,
            proxy_scheme: "https",
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }
}
