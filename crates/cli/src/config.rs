//! `portal.toml` loading and validation.

use std::{net::SocketAddr, path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;
use site::SiteConfig;
use url::Url;

const DEFAULT_LISTEN: &str = "127.0.0.1:4000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The whole configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub site: SiteConfig,
    /// Absent: the portal runs without a CMS.
    pub cms: Option<CmsSection>,
    pub dms: DmsSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub telemetry: TelemetrySection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CmsSection {
    #[serde(default = "default_cms_api_url")]
    pub api_url: String,
    pub site: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DmsSection {
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub json: bool,
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            json: false,
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetrySection {
    /// OTLP gRPC collector, e.g. `http://localhost:4317`. Tracing export is
    /// off when unset.
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: "portal".to_string(),
        }
    }
}

fn default_cms_api_url() -> String {
    wordpress::DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Config {
    /// Reads and validates `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration from {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid configuration in {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let mut config: Config = toml::from_str(raw)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// The default locale is always served.
    fn normalize(&mut self) {
        let locale = self.site.locale.trim().to_ascii_lowercase();
        if !self
            .site
            .locales
            .iter()
            .any(|l| l.trim().eq_ignore_ascii_case(&locale))
        {
            self.site.locales.insert(0, locale.clone());
        }
        self.site.locale = locale;
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.listen_addr()?;
        self.dms_config()?;
        self.cms_config()?;
        if self.site.locale.is_empty() {
            bail!("site.locale must not be empty");
        }
        self.site.validate().map_err(anyhow::Error::msg)?;
        Ok(())
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        self.server
            .listen
            .parse()
            .with_context(|| format!("server.listen '{}' is not a socket address", self.server.listen))
    }

    pub fn dms_config(&self) -> anyhow::Result<ckan::DmsConfig> {
        let api_url = Url::parse(&self.dms.api_url)
            .with_context(|| format!("dms.api_url '{}' is not a URL", self.dms.api_url))?;
        Ok(ckan::DmsConfig {
            api_url,
            timeout: Duration::from_secs(self.dms.timeout_secs),
        })
    }

    pub fn cms_config(&self) -> anyhow::Result<Option<wordpress::CmsConfig>> {
        let Some(cms) = &self.cms else {
            return Ok(None);
        };
        if cms.site.trim().is_empty() {
            bail!("cms.site must name the CMS site");
        }
        let api_url = Url::parse(&cms.api_url)
            .with_context(|| format!("cms.api_url '{}' is not a URL", cms.api_url))?;
        Ok(Some(wordpress::CmsConfig {
            api_url,
            site: cms.site.clone(),
            timeout: Duration::from_secs(cms.timeout_secs),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [dms]
        api_url = "https://demo.ckan.org/api/3/action/"
    "#;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::parse(MINIMAL).unwrap();
        assert_eq!(config.listen_addr().unwrap().port(), 4000);
        assert!(config.cms.is_none());
        assert!(config.cms_config().unwrap().is_none());
        assert_eq!(config.site.blog_path, "/blog");
        assert_eq!(config.site.preview_limit_bytes, 10240);
        assert!(!config.logging.json);
        assert_eq!(config.telemetry.service_name, "portal");
        assert!(config.telemetry.otlp_endpoint.is_none());
    }

    #[test]
    fn full_config() {
        let config = Config::parse(
            r#"
            [server]
            listen = "0.0.0.0:8080"

            [site]
            locale = "id"
            locales = ["en"]
            blog_path = "/berita"
            proxy_datastore = "datastore.example.org"

            [cms]
            site = "portal.wordpress.com"
            timeout_secs = 5

            [dms]
            api_url = "https://ckan.example.org/api/3/action/"

            [logging]
            json = true
            level = "debug"

            [telemetry]
            otlp_endpoint = "http://localhost:4317"
            "#,
        )
        .unwrap();
        assert_eq!(config.site.locales, vec!["id", "en"]);
        let cms = config.cms_config().unwrap().unwrap();
        assert_eq!(cms.api_url.as_str(), wordpress::DEFAULT_API_URL);
        assert_eq!(cms.timeout, Duration::from_secs(5));
        assert_eq!(
            config.dms_config().unwrap().timeout,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
        assert!(config.logging.json);
    }

    #[test]
    fn dms_is_required() {
        assert!(Config::parse("[server]\nlisten = \"127.0.0.1:1\"").is_err());
    }

    #[test]
    fn rejects_bad_values() {
        let with = |extra: &str| format!("{MINIMAL}\n{extra}");
        assert!(Config::parse(&with("[server]\nlisten = \"nope\"")).is_err());
        assert!(Config::parse(&with("[site]\nblog_path = \"/\"")).is_err());
        assert!(Config::parse(&with("[cms]\nsite = \"\"")).is_err());
        assert!(Config::parse(&with("[site]\nunknown = 1")).is_err());
        assert!(Config::parse("[dms]\napi_url = \"not a url\"").is_err());
    }
}
