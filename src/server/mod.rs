//! Blog server with incremental regeneration
//!
//! ## Routes
//!
//! - `GET /` - Listing page
//! - `GET /post/:slug` - Post page (loading fallback for unknown slugs)
//! - `GET /api/posts?cursor=` - Next listing page as JSON
//! - `GET /api/preview?token=&documentId=` - Enter preview mode
//! - `GET /api/exit-preview` - Leave preview mode
//! - `GET /health` - Health check
//! - anything else - static files from the public directory

mod handlers;

use anyhow::Result;
use axum::{http::Request, routing::get, Router};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::Level;

use crate::cache::PageCache;
use crate::config::SiteConfig;
use crate::pages::detail;
use crate::prismic::ContentApi;
use crate::templates::TemplateRenderer;
use crate::Blog;

/// Server state
pub struct ServerState {
    pub config: SiteConfig,
    pub api: Arc<dyn ContentApi>,
    pub renderer: TemplateRenderer,
    pub cache: PageCache,
    pub static_dir: PathBuf,
}

pub type SharedState = Arc<ServerState>;

impl ServerState {
    pub fn new(
        config: SiteConfig,
        api: Arc<dyn ContentApi>,
        static_dir: PathBuf,
    ) -> crate::error::Result<Self> {
        let cache = PageCache::new(Duration::from_secs(config.revalidate));
        Ok(Self {
            renderer: TemplateRenderer::new()?,
            config,
            api,
            cache,
            static_dir,
        })
    }
}

/// Build the router
pub fn router(state: SharedState) -> Router {
    let public = ServeDir::new(&state.static_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/", get(handlers::index))
        .route("/post/:slug", get(handlers::post))
        .route("/api/posts", get(handlers::load_more))
        .route("/api/preview", get(handlers::preview))
        .route("/api/exit-preview", get(handlers::exit_preview))
        .route("/health", get(handlers::health))
        .fallback_service(public)
        .with_state(state)
}

/// Render the listing and the pre-enumerated posts into the cache.
///
/// Failures are logged; the affected pages render on first request.
pub async fn prerender(state: &ServerState) {
    if let Err(e) = handlers::render_index_into_cache(state).await {
        tracing::warn!(error = %e, "listing prerender failed");
    }

    let paths = match detail::static_paths(state.api.as_ref(), &state.config).await {
        Ok(paths) => paths.paths,
        Err(e) => {
            tracing::warn!(error = %e, "could not enumerate posts");
            return;
        }
    };

    let mut rendered = 0;
    for uid in &paths {
        match handlers::render_post_into_cache(state, uid).await {
            Ok(()) => rendered += 1,
            Err(e) => tracing::warn!(uid = %uid, error = %e, "post prerender failed"),
        }
    }

    tracing::info!(rendered, total = paths.len(), "prerendered posts");
}

/// Start the server
pub async fn start(blog: &Blog, ip: &str, port: u16) -> Result<()> {
    let api = blog.content_api()?;
    let state = Arc::new(ServerState::new(
        blog.config.clone(),
        api,
        blog.static_dir.clone(),
    )?);

    tracing::info!("Prerendering pages...");
    prerender(&state).await;

    let app = router(state).layer(TraceLayer::new_for_http().make_span_with(
        |request: &Request<_>| {
            tracing::span!(
                Level::INFO,
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
            )
        },
    ));

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Cache key of the listing page
const INDEX_KEY: &str = "/";
