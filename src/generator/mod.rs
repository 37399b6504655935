//! Generator module - exports the blog as static HTML files

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::SiteConfig;
use crate::error::Result;
use crate::pages::{detail, listing, PreviewContext};
use crate::prismic::ContentApi;
use crate::templates::{post_path, TemplateRenderer};

/// Outcome of a static export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReport {
    pub posts: usize,
    pub assets: usize,
}

/// Static site generator
pub struct Generator<'a> {
    config: &'a SiteConfig,
    api: &'a dyn ContentApi,
    renderer: TemplateRenderer,
    public_dir: PathBuf,
}

impl<'a> Generator<'a> {
    /// Create a new generator
    pub fn new(
        config: &'a SiteConfig,
        api: &'a dyn ContentApi,
        public_dir: PathBuf,
    ) -> Result<Self> {
        Ok(Self {
            config,
            api,
            renderer: TemplateRenderer::new()?,
            public_dir,
        })
    }

    /// Generate the entire site.
    ///
    /// Every page is rendered in memory first; any content fetch failure
    /// aborts the export before anything is written.
    pub async fn generate(&self, static_dir: &Path) -> Result<GenerateReport> {
        let mut pages: Vec<(String, String)> = Vec::new();

        // Listing; the browser follows the content API cursor directly
        let listing = listing::load(self.api, self.config).await?;
        if listing
            .props
            .next_page
            .as_deref()
            .is_some_and(|cursor| !cursor.starts_with("http"))
        {
            tracing::warn!("listing cursor is not a URL; \"load more\" needs the server");
        }
        let html = self
            .renderer
            .render_index(self.config, &listing.props, None)?;
        pages.push(("index.html".to_string(), html));

        // Posts
        let mut config = self.config.clone();
        config.detail.prerender_limit = None;
        let paths = detail::static_paths(self.api, &config).await?;
        let preview = PreviewContext::default();
        for uid in &paths.paths {
            if uid == "." || uid == ".." {
                tracing::warn!("skipping post with unusable uid {:?}", uid);
                continue;
            }
            let page = detail::load(self.api, self.config, uid, &preview).await?;
            let html = self.renderer.render_post(self.config, &page.props)?;
            let dest = format!("{}/index.html", post_path(uid).trim_start_matches('/'));
            pages.push((dest, html));
        }

        let html = self.renderer.render_not_found(self.config)?;
        pages.push(("404.html".to_string(), html));

        fs::create_dir_all(&self.public_dir)?;
        let assets = self.copy_static_assets(static_dir)?;
        for (dest, html) in &pages {
            self.write(dest, html)?;
            tracing::debug!("Generated: {}", dest);
        }

        Ok(GenerateReport {
            posts: paths.paths.len(),
            assets,
        })
    }

    fn write(&self, relative: &str, content: &str) -> Result<()> {
        let dest = self.public_dir.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, content)?;
        Ok(())
    }

    /// Copy static assets (stylesheet, images) to the public directory
    fn copy_static_assets(&self, static_dir: &Path) -> Result<usize> {
        if !static_dir.is_dir() {
            return Ok(0);
        }

        let mut copied = 0;
        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let Ok(relative) = path.strip_prefix(static_dir) else {
                continue;
            };
            let dest = self.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
            copied += 1;
        }

        Ok(copied)
    }
}
