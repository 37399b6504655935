//! reqwest-based client for the Prismic REST API (v2)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use super::document::{ApiResponse, ApiRoot};
use super::predicate::{render_orderings, render_query, Predicate, QueryOptions};
use super::ContentApi;
use crate::config::ApiConfig;
use crate::error::{BlogError, Result};

pub struct PrismicClient {
    client: Client,
    endpoint: Url,
    access_token: Option<String>,
}

impl PrismicClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let endpoint = config.endpoint.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(BlogError::Config(
                "api.endpoint is not set (or set PRISMIC_API_ENDPOINT)".to_string(),
            ));
        }
        let endpoint = Url::parse(endpoint)?;

        let mut builder = Client::builder()
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| BlogError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            access_token: config
                .access_token
                .clone()
                .filter(|t| !t.trim().is_empty()),
        })
    }

    /// URL of the API root, which lists the current refs
    fn root_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        if let Some(token) = &self.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }
        url
    }

    /// URL of a search against `reference`
    pub(crate) fn search_url(
        &self,
        reference: &str,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| BlogError::Config(format!("invalid API endpoint: {}", self.endpoint)))?
            .pop_if_empty()
            .push("documents")
            .push("search");

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("ref", reference);
            query.append_pair("q", &render_query(predicates));
            if let Some(size) = options.page_size {
                query.append_pair("pageSize", &size.to_string());
            }
            if let Some(page) = options.page {
                query.append_pair("page", &page.to_string());
            }
            if let Some(after) = &options.after {
                query.append_pair("after", after);
            }
            if !options.orderings.is_empty() {
                query.append_pair("orderings", &render_orderings(&options.orderings));
            }
            if !options.fetch.is_empty() {
                query.append_pair("fetch", &options.fetch.join(","));
            }
            if let Some(token) = &self.access_token {
                query.append_pair("access_token", token);
            }
        }

        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!(path = %url.path(), "content API request");

        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        let body = response.bytes().await?;

        Ok(serde_json::from_slice(&body)?)
    }

    /// Ref of the published content; refs move on every publish
    async fn master_ref(&self) -> Result<String> {
        let root: ApiRoot = self.get_json(self.root_url()).await?;
        root.master_ref()
            .map(String::from)
            .ok_or_else(|| BlogError::ContentFetch("API root lists no master ref".to_string()))
    }
}

#[async_trait]
impl ContentApi for PrismicClient {
    async fn query(&self, predicates: &[Predicate], options: &QueryOptions) -> Result<ApiResponse> {
        let reference = match &options.reference {
            Some(reference) => reference.clone(),
            None => self.master_ref().await?,
        };

        let url = self.search_url(&reference, predicates, options)?;
        let response: ApiResponse = self.get_json(url).await?;
        tracing::debug!(
            results = response.results.len(),
            total = response.total_results_size,
            has_next = response.next_page.is_some(),
            "search completed"
        );
        Ok(response)
    }

    async fn fetch_page(&self, cursor: &str) -> Result<ApiResponse> {
        if !self.owns_cursor(cursor) {
            return Err(BlogError::InvalidCursor(cursor.to_string()));
        }
        self.get_json(Url::parse(cursor)?).await
    }

    fn owns_cursor(&self, cursor: &str) -> bool {
        match Url::parse(cursor) {
            Ok(url) => {
                url.scheme() == self.endpoint.scheme()
                    && url.host_str() == self.endpoint.host_str()
                    && url.port_or_known_default() == self.endpoint.port_or_known_default()
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prismic::predicate::{Ordering, FIRST_PUBLICATION_DATE};
    use std::collections::HashMap;

    fn client(token: Option<&str>) -> PrismicClient {
        let config = ApiConfig {
            endpoint: "https://blog.cdn.prismic.io/api/v2/".to_string(),
            access_token: token.map(String::from),
            ..ApiConfig::default()
        };
        PrismicClient::new(&config).unwrap()
    }

    #[test]
    fn test_missing_endpoint_is_config_error() {
        let err = PrismicClient::new(&ApiConfig::default()).err().unwrap();
        assert!(matches!(err, BlogError::Config(_)));
    }

    #[test]
    fn test_search_url() {
        let client = client(Some("secret"));
        let options = QueryOptions::new()
            .page_size(2)
            .after("YF0xABAAACMAqRBp")
            .order_by(Ordering::desc(FIRST_PUBLICATION_DATE))
            .fetch("post", &["title", "subtitle"]);

        let url = client
            .search_url("master-ref", &[Predicate::document_type("post")], &options)
            .unwrap();

        assert_eq!(url.host_str(), Some("blog.cdn.prismic.io"));
        assert_eq!(url.path(), "/api/v2/documents/search");

        let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["ref"], "master-ref");
        assert_eq!(pairs["q"], r#"[[at(document.type, "post")]]"#);
        assert_eq!(pairs["pageSize"], "2");
        assert_eq!(pairs["after"], "YF0xABAAACMAqRBp");
        assert_eq!(pairs["orderings"], "[document.first_publication_date desc]");
        assert_eq!(pairs["fetch"], "post.title,post.subtitle");
        assert_eq!(pairs["access_token"], "secret");
        assert!(!pairs.contains_key("page"));
    }

    #[test]
    fn test_root_url_without_token() {
        let client = client(None);
        assert_eq!(
            client.root_url().as_str(),
            "https://blog.cdn.prismic.io/api/v2"
        );
    }

    #[test]
    fn test_owns_cursor() {
        let client = client(None);
        assert!(client.owns_cursor(
            "https://blog.cdn.prismic.io/api/v2/documents/search?page=2&pageSize=2"
        ));
        assert!(!client.owns_cursor("https://evil.example.com/api/v2/documents/search"));
        assert!(!client.owns_cursor("http://blog.cdn.prismic.io/api/v2/documents/search"));
        assert!(!client.owns_cursor("not a url"));
    }

    #[tokio::test]
    async fn test_foreign_cursor_rejected_without_request() {
        let client = client(None);
        let err = client
            .fetch_page("https://evil.example.com/steal")
            .await
            .unwrap_err();
        assert!(matches!(err, BlogError::InvalidCursor(_)));
    }

    mod http {
        use super::*;
        use axum::extract::{Query, State};
        use axum::http::StatusCode;
        use axum::response::{IntoResponse, Response};
        use axum::routing::get;
        use axum::{Json, Router};
        use serde_json::{json, Value};
        use tokio::net::TcpListener;

        /// Serve `app` on a local port and return its API endpoint
        async fn serve(build: impl FnOnce(String) -> Router) -> String {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let endpoint = format!("http://{}/api/v2", listener.local_addr().unwrap());
            let app = build(endpoint.clone());
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            endpoint
        }

        fn client_for(endpoint: &str) -> PrismicClient {
            PrismicClient::new(&ApiConfig {
                endpoint: endpoint.to_string(),
                timeout_secs: Some(5),
                ..ApiConfig::default()
            })
            .unwrap()
        }

        fn document(id: &str, uid: &str) -> Value {
            json!({
                "id": id,
                "uid": uid,
                "type": "post",
                "first_publication_date": "2021-03-15T19:25:28+0000",
                "last_publication_date": "2021-03-15T19:25:28+0000",
                "data": {"title": format!("Title {uid}")}
            })
        }

        async fn root() -> Json<Value> {
            Json(json!({
                "refs": [
                    {"id": "preview", "ref": "draft-ref", "label": "Draft", "isMasterRef": false},
                    {"id": "master", "ref": "master-ref", "label": "Master", "isMasterRef": true}
                ]
            }))
        }

        async fn search(
            State(endpoint): State<String>,
            Query(params): Query<HashMap<String, String>>,
        ) -> Response {
            if params.get("ref").map(String::as_str) != Some("master-ref") {
                return (StatusCode::BAD_REQUEST, "unknown ref").into_response();
            }
            if params.get("q").is_some_and(|q| q.contains("missing")) {
                return Json(json!({"page": 1, "results": [], "next_page": null})).into_response();
            }

            let body = match params.get("page").map(String::as_str) {
                Some("2") => json!({
                    "page": 2,
                    "total_pages": 2,
                    "results": [document("ID-A", "a")],
                    "next_page": null
                }),
                _ => json!({
                    "page": 1,
                    "total_pages": 2,
                    "results": [document("ID-B", "b")],
                    "next_page": format!("{endpoint}/documents/search?ref=master-ref&page=2")
                }),
            };
            Json(body).into_response()
        }

        fn blog_api(endpoint: String) -> Router {
            Router::new()
                .route("/api/v2", get(root))
                .route("/api/v2/documents/search", get(search))
                .with_state(endpoint)
        }

        #[tokio::test]
        async fn test_query_resolves_master_ref_and_follows_cursor() {
            let endpoint = serve(blog_api).await;
            let client = client_for(&endpoint);

            let first = client
                .query(&[Predicate::document_type("post")], &QueryOptions::new().page_size(1))
                .await
                .unwrap();
            assert_eq!(first.results[0].uid.as_deref(), Some("b"));

            let cursor = first.next_page.unwrap();
            assert!(client.owns_cursor(&cursor));
            let second = client.fetch_page(&cursor).await.unwrap();
            assert_eq!(second.page, 2);
            assert_eq!(second.results[0].uid.as_deref(), Some("a"));
            assert!(second.next_page.is_none());
        }

        #[tokio::test]
        async fn test_empty_results_are_not_found() {
            let endpoint = serve(blog_api).await;
            let client = client_for(&endpoint);

            let err = client
                .get_by_uid("post", "missing", &QueryOptions::new())
                .await
                .unwrap_err();
            assert!(matches!(err, BlogError::NotFound(_)));
        }

        #[tokio::test]
        async fn test_error_statuses_are_fetch_failures() {
            for status in [
                StatusCode::UNAUTHORIZED,
                StatusCode::FORBIDDEN,
                StatusCode::INTERNAL_SERVER_ERROR,
            ] {
                // Failing API root
                let endpoint = serve(move |_| {
                    Router::new().route("/api/v2", get(move || async move { status }))
                })
                .await;
                let err = client_for(&endpoint)
                    .query(&[Predicate::document_type("post")], &QueryOptions::new())
                    .await
                    .unwrap_err();
                assert!(matches!(err, BlogError::ContentFetch(_)), "{status}: {err}");

                // Failing search under an explicit ref
                let endpoint = serve(move |_| {
                    Router::new()
                        .route("/api/v2/documents/search", get(move || async move { status }))
                })
                .await;
                let err = client_for(&endpoint)
                    .query(
                        &[Predicate::document_type("post")],
                        &QueryOptions::new().reference(Some("draft-ref")),
                    )
                    .await
                    .unwrap_err();
                assert!(matches!(err, BlogError::ContentFetch(_)), "{status}: {err}");
                assert!(!err.is_not_found());
            }
        }

        #[tokio::test]
        async fn test_undecodable_body_is_invalid_response() {
            let endpoint = serve(|_| {
                Router::new().route(
                    "/api/v2/documents/search",
                    get(|| async { "<html>maintenance</html>" }),
                )
            })
            .await;

            let err = client_for(&endpoint)
                .query(&[], &QueryOptions::new().reference(Some("master-ref")))
                .await
                .unwrap_err();
            assert!(matches!(err, BlogError::InvalidResponse(_)));
        }

        #[tokio::test]
        async fn test_api_root_without_master_ref() {
            let endpoint = serve(|_| {
                Router::new().route("/api/v2", get(|| async { Json(json!({"refs": []})) }))
            })
            .await;

            let err = client_for(&endpoint)
                .query(&[], &QueryOptions::new())
                .await
                .unwrap_err();
            assert!(matches!(err, BlogError::ContentFetch(_)));
        }
    }
}
