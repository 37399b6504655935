//! Content API client.
//!
//! [`ContentApi`] is the seam between the blog and the headless CMS. The
//! [`PrismicClient`] talks to the remote REST API; the [`FixtureContentApi`]
//! answers the same queries from a local JSON file.

pub mod client;
pub mod document;
pub mod fixture;
pub mod predicate;

use async_trait::async_trait;

use crate::error::{BlogError, Result};

pub use client::PrismicClient;
pub use document::{parse_timestamp, ApiResponse, RawDocument};
pub use fixture::{Fixture, FixtureContentApi};
pub use predicate::{Direction, Ordering, Predicate, QueryOptions};

#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Run a search and return one page of documents
    async fn query(&self, predicates: &[Predicate], options: &QueryOptions) -> Result<ApiResponse>;

    /// Fetch the page a cursor (a `next_page` value) points at
    async fn fetch_page(&self, cursor: &str) -> Result<ApiResponse>;

    /// Whether `cursor` was issued by this backend
    fn owns_cursor(&self, cursor: &str) -> bool;

    /// Single document of `doc_type` with the given uid
    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        options: &QueryOptions,
    ) -> Result<RawDocument> {
        let options = QueryOptions {
            page_size: Some(1),
            page: None,
            ..options.clone()
        };
        self.query(&[Predicate::uid(doc_type, uid)], &options)
            .await?
            .results
            .into_iter()
            .next()
            .ok_or_else(|| BlogError::NotFound(format!("{doc_type}/{uid}")))
    }

    /// Single document by internal id
    async fn get_by_id(&self, id: &str, options: &QueryOptions) -> Result<RawDocument> {
        let options = QueryOptions {
            page_size: Some(1),
            page: None,
            ..options.clone()
        };
        self.query(&[Predicate::id(id)], &options)
            .await?
            .results
            .into_iter()
            .next()
            .ok_or_else(|| BlogError::NotFound(id.to_string()))
    }

    /// Run a search and follow cursors until the results are exhausted
    async fn fetch_all(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<Vec<RawDocument>> {
        let mut response = self.query(predicates, options).await?;
        let mut documents = std::mem::take(&mut response.results);

        while let Some(cursor) = response.next_page.take() {
            tracing::debug!(fetched = documents.len(), "following cursor");
            response = self.fetch_page(&cursor).await?;
            documents.append(&mut response.results);
        }

        Ok(documents)
    }
}
