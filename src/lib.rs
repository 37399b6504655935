//! spacetraveling: a blog frontend backed by a headless CMS
//!
//! Posts are fetched from a Prismic-style content API, rendered with
//! embedded Tera templates and either exported as static files or served
//! with incremental regeneration.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod navigation;
pub mod pages;
pub mod prismic;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use prismic::{ContentApi, FixtureContentApi, PrismicClient};

/// The blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Static assets directory
    pub static_dir: std::path::PathBuf,
    /// Public (output) directory
    pub public_dir: std::path::PathBuf,
}

impl Blog {
    /// Create a new Blog instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();

        let static_dir = base_dir.join(&config.static_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            base_dir,
            static_dir,
            public_dir,
        })
    }

    /// Content API selected by the configuration: the local fixture when
    /// `api.fixture` is set, the remote API otherwise
    pub fn content_api(&self) -> Result<Arc<dyn ContentApi>> {
        match self.config.fixture_path(&self.base_dir) {
            Some(path) => {
                let api = FixtureContentApi::load(&path)
                    .map_err(|e| anyhow::anyhow!("failed to load fixture {:?}: {}", path, e))?;
                Ok(Arc::new(api))
            }
            None => Ok(Arc::new(PrismicClient::new(&self.config.api)?)),
        }
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<generator::GenerateReport> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_blog_without_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.public_dir, dir.path().join("public"));
        assert_eq!(blog.config.revalidate, 86_400);
    }

    #[test]
    fn test_content_api_prefers_fixture() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("content.json"), r#"{"documents": []}"#).unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "title: Test\napi:\n  fixture: content.json\n",
        )
        .unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        let api = blog.content_api().unwrap();
        assert_eq!(blog.config.title, "Test");
        assert!(!api.owns_cursor("https://blog.cdn.prismic.io/api/v2/documents/search"));
    }
}
