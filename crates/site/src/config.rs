use std::time::Duration;

use serde::Deserialize;

/// Bytes of a resource file loaded into a text view.
pub const DEFAULT_PREVIEW_LIMIT_BYTES: usize = 10 * 1024;

/// Presentation settings for the site (`[site]` in the configuration file).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Default locale; CMS pages in this locale use bare slugs.
    pub locale: String,
    /// Every locale the site serves.
    pub locales: Vec<String>,
    /// Mount point of the blog (`/blog`).
    pub blog_path: String,
    /// Host whose resource files are relayed through `/proxy/datastore`.
    pub proxy_datastore: Option<String>,
    /// Host whose resource files are relayed through `/proxy/filestore`.
    pub proxy_filestore: Option<String>,
    /// Cut-off for text previews.
    pub preview_limit_bytes: usize,
    /// Timeout for previews and proxied requests, in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            locales: vec!["en".to_string()],
            blog_path: "/blog".to_string(),
            proxy_datastore: None,
            proxy_filestore: None,
            preview_limit_bytes: DEFAULT_PREVIEW_LIMIT_BYTES,
            fetch_timeout_secs: 30,
        }
    }
}

impl SiteConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Checks the settings that would otherwise surface as routing panics or
    /// silent misbehaviour.
    pub fn validate(&self) -> Result<(), String> {
        if !self.blog_path.starts_with('/') || self.blog_path == "/" {
            return Err(format!(
                "site.blog_path must start with '/' and name a sub-path, got '{}'",
                self.blog_path
            ));
        }
        if self.blog_path.ends_with('/') {
            return Err(format!(
                "site.blog_path must not end with '/', got '{}'",
                self.blog_path
            ));
        }
        if self.blog_path.contains(['{', '}', '*']) {
            return Err(format!(
                "site.blog_path must be a literal path, got '{}'",
                self.blog_path
            ));
        }
        let root = self.blog_path[1..].split('/').next().unwrap_or_default();
        if root.is_empty() || crate::routes::is_reserved_root(root) {
            return Err(format!(
                "site.blog_path '{}' collides with a built-in route",
                self.blog_path
            ));
        }
        if self.preview_limit_bytes == 0 {
            return Err("site.preview_limit_bytes must be positive".to_string());
        }
        Ok(())
    }
}
