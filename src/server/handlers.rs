//! Request handlers

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ServerState, SharedState, INDEX_KEY};
use crate::cache::Lookup;
use crate::error::{BlogError, Result};
use crate::pages::{detail, listing, preview, PreviewContext};
use crate::templates::post_path;

/// Route the browser uses for "load more"
const LOAD_MORE_ROUTE: &str = "/api/posts";

pub(super) async fn render_index_into_cache(state: &ServerState) -> Result<Arc<String>> {
    let props = listing::load(state.api.as_ref(), &state.config).await?;
    let html = state
        .renderer
        .render_index(&state.config, &props.props, Some(LOAD_MORE_ROUTE))?;
    Ok(state.cache.store(INDEX_KEY, html))
}

/// Render the post `uid` and store the outcome, a not-found result included
pub(super) async fn render_post_into_cache(state: &ServerState, uid: &str) -> Result<()> {
    let key = post_path(uid);

    let preview = PreviewContext::default();
    let rendered = match detail::load(state.api.as_ref(), &state.config, uid, &preview).await {
        Ok(props) => state.renderer.render_post(&state.config, &props.props),
        Err(e) => Err(e),
    };

    match rendered {
        Ok(html) => {
            state.cache.store(&key, html);
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            tracing::info!(uid, "post not found");
            state.cache.store_not_found(&key);
            Ok(())
        }
        Err(e) => {
            state.cache.abandon(&key);
            Err(e)
        }
    }
}

fn spawn_post_render(state: &SharedState, uid: &str) {
    let state = Arc::clone(state);
    let uid = uid.to_string();
    tokio::spawn(async move {
        if let Err(e) = render_post_into_cache(&state, &uid).await {
            tracing::error!(uid = %uid, error = %e, "post regeneration failed");
        }
    });
}

fn spawn_index_render(state: &SharedState) {
    let state = Arc::clone(state);
    tokio::spawn(async move {
        if let Err(e) = render_index_into_cache(&state).await {
            state.cache.abandon(INDEX_KEY);
            tracing::error!(error = %e, "listing regeneration failed");
        }
    });
}

/// HTML response carrying the regeneration contract in `Cache-Control`
fn cached_page(state: &ServerState, html: &str) -> Response {
    let value = format!(
        "s-maxage={}, stale-while-revalidate",
        state.cache.revalidate().as_secs()
    );
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(header::CACHE_CONTROL, value);
    }
    (StatusCode::OK, headers, Html(html.to_string())).into_response()
}

fn uncached_page(status: StatusCode, cache_control: &'static str, html: String) -> Response {
    (
        status,
        [(header::CACHE_CONTROL, cache_control)],
        Html(html),
    )
        .into_response()
}

fn not_found_page(state: &ServerState) -> Response {
    match state.renderer.render_not_found(&state.config) {
        Ok(html) => uncached_page(StatusCode::NOT_FOUND, "no-store", html),
        Err(e) => e.into_response(),
    }
}

fn preview_context(headers: &HeaderMap) -> PreviewContext {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(PreviewContext::from_cookie_header)
        .find(PreviewContext::is_active)
        .unwrap_or_default()
}

/// `GET /`
pub(super) async fn index(State(state): State<SharedState>) -> Response {
    match state.cache.lookup(INDEX_KEY) {
        Lookup::Hit { html, regenerate } => {
            if regenerate {
                spawn_index_render(&state);
            }
            cached_page(&state, &html)
        }
        // The listing has no loading fallback: render in the request
        _ => match render_index_into_cache(&state).await {
            Ok(html) => cached_page(&state, &html),
            Err(e) => {
                state.cache.abandon(INDEX_KEY);
                e.into_response()
            }
        },
    }
}

/// `GET /post/:slug`
pub(super) async fn post(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Response {
    let preview = preview_context(&headers);
    if preview.is_active() {
        return render_preview(&state, &slug, &preview).await;
    }

    match state.cache.lookup(&post_path(&slug)) {
        Lookup::Hit { html, regenerate } => {
            if regenerate {
                spawn_post_render(&state, &slug);
            }
            cached_page(&state, &html)
        }
        Lookup::NotFound => not_found_page(&state),
        Lookup::Miss { render } => {
            if render {
                spawn_post_render(&state, &slug);
            }
            match state.renderer.render_loading(&state.config) {
                Ok(html) => uncached_page(StatusCode::OK, "no-store", html),
                Err(e) => e.into_response(),
            }
        }
    }
}

/// Preview requests bypass the cache and render against the preview ref
async fn render_preview(state: &ServerState, slug: &str, preview: &PreviewContext) -> Response {
    let rendered = match detail::load(state.api.as_ref(), &state.config, slug, preview).await {
        Ok(props) => state.renderer.render_post(&state.config, &props.props),
        Err(e) => Err(e),
    };

    match rendered {
        Ok(html) => uncached_page(StatusCode::OK, "private, no-store", html),
        Err(e) if e.is_not_found() => not_found_page(state),
        Err(e) => e.into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct LoadMoreQuery {
    cursor: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Error rendered as JSON for the browser's fetch calls
struct JsonError(BlogError);

impl IntoResponse for JsonError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "load more failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// `GET /api/posts?cursor=`
pub(super) async fn load_more(
    State(state): State<SharedState>,
    Query(query): Query<LoadMoreQuery>,
) -> Response {
    match listing::load_more_page(state.api.as_ref(), &query.cursor).await {
        Ok(page) => (
            [(header::CACHE_CONTROL, "no-store")],
            Json(page),
        )
            .into_response(),
        Err(e) => JsonError(e).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct PreviewQuery {
    token: Option<String>,
    #[serde(rename = "documentId")]
    document_id: Option<String>,
}

/// `GET /api/preview?token=&documentId=`
pub(super) async fn preview(
    State(state): State<SharedState>,
    Query(query): Query<PreviewQuery>,
) -> Response {
    let Some(token) = query.token.filter(|t| !t.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "missing preview token").into_response();
    };

    let path = match preview::resolve_path(
        state.api.as_ref(),
        &state.config.api.document_type,
        query.document_id.as_deref(),
        &token,
    )
    .await
    {
        Ok(path) => path,
        Err(e) => return e.into_response(),
    };

    tracing::info!(path = %path, "entering preview mode");
    (
        [(header::SET_COOKIE, PreviewContext::set_cookie(&token))],
        Redirect::temporary(&path),
    )
        .into_response()
}

/// `GET /api/exit-preview`
pub(super) async fn exit_preview() -> Response {
    (
        [(header::SET_COOKIE, PreviewContext::clear_cookie())],
        Redirect::temporary("/"),
    )
        .into_response()
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub(super) struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

/// `GET /health`
pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "spacetraveling",
        version: env!("CARGO_PKG_VERSION"),
    })
}
