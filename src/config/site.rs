//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Freshness window of every generated page, in seconds
pub const DEFAULT_REVALIDATE: u64 = 86_400;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub timezone: String,

    // URL
    pub url: String,

    // Directory
    pub public_dir: String,
    pub static_dir: String,

    // Date / Time format
    pub date_format: String,
    pub time_format: String,

    // Regeneration
    pub revalidate: u64,

    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub detail: DetailConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            description: String::new(),
            author: String::new(),
            language: "en".to_string(),
            timezone: String::new(),

            url: "http://localhost:3000".to_string(),

            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            date_format: "DD MMM YYYY".to_string(),
            time_format: "HH:mm".to_string(),

            revalidate: DEFAULT_REVALIDATE,

            listing: ListingConfig::default(),
            detail: DetailConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `PRISMIC_API_ENDPOINT` / `PRISMIC_ACCESS_TOKEN` overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var("PRISMIC_API_ENDPOINT").ok(),
            std::env::var("PRISMIC_ACCESS_TOKEN").ok(),
        );
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, token: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            tracing::debug!("API endpoint overridden from environment");
            self.api.endpoint = endpoint;
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            tracing::debug!("API access token taken from environment");
            self.api.access_token = Some(token);
        }
    }

    /// Resolve the fixture path against the site directory
    pub fn fixture_path(&self, base_dir: &Path) -> Option<PathBuf> {
        self.api.fixture.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                base_dir.join(p)
            }
        })
    }
}

/// Listing (home) page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Posts per fetched page, for the first render and every "load more"
    pub page_size: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self { page_size: 2 }
    }
}

/// Post page configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DetailConfig {
    /// Pre-render only the newest N posts; the rest render on first request.
    /// `None` pre-renders every post.
    pub prerender_limit: Option<usize>,
}

/// Content API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Repository API endpoint, e.g. `https://<repo>.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Custom type of blog documents
    pub document_type: String,
    /// Request timeout; unset leaves the HTTP client default in place
    pub timeout_secs: Option<u64>,
    /// Read documents from a local JSON file instead of the remote API
    pub fixture: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            document_type: "post".to_string(),
            timeout_secs: None,
            fixture: None,
        }
    }
}
