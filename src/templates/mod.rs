//! Built-in blog templates using the Tera template engine
//!
//! Templates are embedded in the binary. Page data is turned into view
//! structs here (dates formatted, text escaped, rich text rendered to HTML)
//! so the templates only place strings.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{rich_text, PostPagination, PostSummary};
use crate::error::Result;
use crate::helpers::{date_xml, format_local};
use crate::pages::DetailPage;

/// Template renderer with the embedded blog theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Views are escaped when built; URLs must reach the page as-is
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("blog/layout.html")),
            ("index.html", include_str!("blog/index.html")),
            ("post.html", include_str!("blog/post.html")),
            ("loading.html", include_str!("blog/loading.html")),
            ("not_found.html", include_str!("blog/not_found.html")),
            (
                "partials/header.html",
                include_str!("blog/partials/header.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// Home page. `load_more_endpoint` is the server route the browser asks
    /// for further pages; `None` makes it follow the cursor directly.
    pub fn render_index(
        &self,
        config: &SiteConfig,
        page: &PostPagination,
        load_more_endpoint: Option<&str>,
    ) -> Result<String> {
        let posts: Vec<SummaryView> = page
            .results
            .iter()
            .map(|p| SummaryView::new(config, p))
            .collect();

        let mut context = self.base_context(config, false);
        context.insert("posts", &posts);
        context.insert("next_page", &page.next_page.as_deref().map(escape));
        context.insert("load_more_endpoint", &escape(load_more_endpoint.unwrap_or("")));
        self.render("index.html", &context)
    }

    pub fn render_post(&self, config: &SiteConfig, page: &DetailPage) -> Result<String> {
        let post = &page.post;
        let published = post.first_publication_date;

        let view = PostView {
            uid: escape(&post.uid),
            title: escape(&post.data.title),
            subtitle: escape(&post.data.subtitle),
            author: escape(&post.data.author),
            banner: post.data.banner.as_ref().map(|b| BannerView {
                url: escape(&b.url),
                alt: escape(b.alt.as_deref().unwrap_or(&post.data.title)),
            }),
            date: published.map(|d| format_local(&d, &config.timezone, &config.date_format)),
            datetime: published.map(|d| date_xml(&d)),
            sections: post
                .data
                .content
                .iter()
                .map(|block| SectionView {
                    heading: block.heading.as_deref().map(escape),
                    html: rich_text::as_html(&block.body),
                })
                .collect(),
        };

        let navigation = NavigationView {
            previous: page.navigation.previous.as_ref().map(|p| SummaryView::new(config, p)),
            next: page.navigation.next.as_ref().map(|p| SummaryView::new(config, p)),
        };

        let edited = page.edited_at.map(|d| {
            format!(
                "on {}, at {}",
                format_local(&d, &config.timezone, &config.date_format),
                format_local(&d, &config.timezone, &config.time_format)
            )
        });

        let mut context = self.base_context(config, page.preview);
        context.insert("post", &view);
        context.insert("navigation", &navigation);
        context.insert("reading_time", &page.reading_time);
        context.insert("edited", &edited);
        self.render("post.html", &context)
    }

    /// Placeholder served while a post renders for the first time
    pub fn render_loading(&self, config: &SiteConfig) -> Result<String> {
        self.render("loading.html", &self.base_context(config, false))
    }

    pub fn render_not_found(&self, config: &SiteConfig) -> Result<String> {
        self.render("not_found.html", &self.base_context(config, false))
    }

    fn base_context(&self, config: &SiteConfig, preview: bool) -> Context {
        let mut context = Context::new();
        context.insert("site", &SiteView::from(config));
        context.insert("preview", &preview);
        context
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteView {
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub url: String,
}

impl From<&SiteConfig> for SiteView {
    fn from(config: &SiteConfig) -> Self {
        Self {
            title: escape(&config.title),
            description: escape(&config.description),
            author: escape(&config.author),
            language: escape(&config.language),
            url: escape(&config.url),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryView {
    pub uid: String,
    pub path: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: Option<String>,
    pub datetime: Option<String>,
}

impl SummaryView {
    fn new(config: &SiteConfig, summary: &PostSummary) -> Self {
        let published = summary.first_publication_date;
        Self {
            uid: escape(&summary.uid),
            path: post_path(&summary.uid),
            title: escape(&summary.data.title),
            subtitle: escape(&summary.data.subtitle),
            author: escape(&summary.data.author),
            date: published.map(|d| format_local(&d, &config.timezone, &config.date_format)),
            datetime: published.map(|d| date_xml(&d)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner: Option<BannerView>,
    pub date: Option<String>,
    pub datetime: Option<String>,
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BannerView {
    pub url: String,
    pub alt: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub heading: Option<String>,
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavigationView {
    pub previous: Option<SummaryView>,
    pub next: Option<SummaryView>,
}

/// Characters left as-is in a path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Route of a post page
pub fn post_path(uid: &str) -> String {
    format!("/post/{}", utf8_percent_encode(uid, PATH_SEGMENT))
}

/// Escape for both element text and double-quoted attributes
fn escape(value: &str) -> String {
    html_escape::encode_double_quoted_attribute(value).into_owned()
}
