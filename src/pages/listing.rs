//! Home page: newest posts first, with cursor-based "load more"

use crate::config::SiteConfig;
use crate::content::{normalize_page, PostPagination, PostSummary};
use crate::error::{BlogError, Result};
use crate::prismic::{
    predicate::FIRST_PUBLICATION_DATE, ContentApi, Ordering, Predicate, QueryOptions,
};

use super::StaticProps;

/// Fields the listing shows for each post
pub const SUMMARY_FIELDS: &[&str] = &["title", "subtitle", "author"];

/// Query for the first listing page
pub fn first_page_query(config: &SiteConfig) -> (Vec<Predicate>, QueryOptions) {
    let doc_type = &config.api.document_type;
    (
        vec![Predicate::document_type(doc_type)],
        QueryOptions::new()
            .page_size(config.listing.page_size)
            .order_by(Ordering::desc(FIRST_PUBLICATION_DATE))
            .fetch(doc_type, SUMMARY_FIELDS),
    )
}

/// Generate the listing page data
pub async fn load(
    api: &dyn ContentApi,
    config: &SiteConfig,
) -> Result<StaticProps<PostPagination>> {
    let (predicates, options) = first_page_query(config);
    let response = api.query(&predicates, &options).await?;
    let page = normalize_page(&response)?;

    tracing::info!(
        posts = page.results.len(),
        has_more = page.has_more(),
        "listing generated"
    );

    Ok(StaticProps::new(page, config.revalidate))
}

/// Fetch the page a listing cursor points at.
///
/// Only cursors issued by `api` are followed.
pub async fn load_more_page(api: &dyn ContentApi, cursor: &str) -> Result<PostPagination> {
    if !api.owns_cursor(cursor) {
        return Err(BlogError::InvalidCursor(cursor.to_string()));
    }
    let response = api.fetch_page(cursor).await?;
    normalize_page(&response)
}

/// Posts shown so far plus the cursor of the next page.
///
/// Appends only. The cursor moves forward after each successful fetch and
/// stays empty once the listing is exhausted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingState {
    posts: Vec<PostSummary>,
    next_page: Option<String>,
}

impl From<PostPagination> for ListingState {
    fn from(page: PostPagination) -> Self {
        Self {
            posts: page.results,
            next_page: page.next_page,
        }
    }
}

impl ListingState {
    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// Fetch the next page and append it. Returns the number of new posts.
    ///
    /// `&mut self` keeps a single fetch in flight. State changes only once
    /// the fetch succeeds, so a failed or dropped call can be retried.
    pub async fn load_more(&mut self, api: &dyn ContentApi) -> Result<usize> {
        let Some(cursor) = self.next_page.as_deref() else {
            return Ok(0);
        };

        let page = load_more_page(api, cursor).await?;
        let added = page.results.len();

        self.posts.extend(page.results);
        self.next_page = page.next_page;

        tracing::debug!(added, total = self.posts.len(), "loaded more posts");
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prismic::fixture::tests::three_posts;

    fn config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.listing.page_size = 2;
        config
    }

    fn uids(posts: &[PostSummary]) -> Vec<&str> {
        posts.iter().map(|p| p.uid.as_str()).collect()
    }

    #[tokio::test]
    async fn test_first_page_then_load_more() {
        let api = three_posts();
        let props = load(&api, &config()).await.unwrap();

        assert_eq!(props.revalidate, 86_400);
        assert_eq!(uids(&props.props.results), ["c", "b"]);
        assert!(props.props.next_page.is_some());

        let mut state = ListingState::from(props.props);
        assert_eq!(state.load_more(&api).await.unwrap(), 1);
        assert_eq!(uids(state.posts()), ["c", "b", "a"]);
        assert_eq!(state.next_page(), None);
        assert!(!state.has_more());

        // Exhausted: no fetch, nothing appended
        assert_eq!(state.load_more(&api).await.unwrap(), 0);
        assert_eq!(state.posts().len(), 3);
    }

    #[tokio::test]
    async fn test_accumulated_equals_concatenated_pages() {
        let api = three_posts();
        let mut config = config();
        config.listing.page_size = 1;

        let first = load(&api, &config).await.unwrap().props;
        let mut expected = first.results.clone();
        let mut cursor = first.next_page.clone();
        while let Some(c) = cursor {
            let page = load_more_page(&api, &c).await.unwrap();
            expected.extend(page.results);
            cursor = page.next_page;
        }

        let mut state = ListingState::from(first);
        while state.has_more() {
            state.load_more(&api).await.unwrap();
        }
        assert_eq!(state.posts(), expected.as_slice());
        assert_eq!(uids(state.posts()), ["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_state() {
        let api = three_posts();
        let mut state = ListingState::from(PostPagination {
            next_page: Some("https://evil.example.com/search".to_string()),
            results: vec![],
        });

        let err = state.load_more(&api).await.unwrap_err();
        assert!(matches!(err, BlogError::InvalidCursor(_)));
        assert_eq!(state.next_page(), Some("https://evil.example.com/search"));
        assert!(state.posts().is_empty());
    }

    #[tokio::test]
    async fn test_summaries_only_carry_listing_fields() {
        let api = three_posts();
        let (predicates, options) = first_page_query(&config());
        let response = api.query(&predicates, &options).await.unwrap();
        assert!(response.results[0].data.get("content").is_none());
        assert!(response.results[0].data.get("title").is_some());
    }
}
