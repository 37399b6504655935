//! Post page

use chrono::{DateTime, Utc};

use crate::config::SiteConfig;
use crate::content::{normalize_post, normalize_summary, NavigationContext, Post};
use crate::error::Result;
use crate::navigation;
use crate::prismic::{
    predicate::FIRST_PUBLICATION_DATE, ContentApi, Ordering, Predicate, QueryOptions,
};

use super::{PreviewContext, StaticProps};

/// Page size used when walking every post for path enumeration
const PATHS_PAGE_SIZE: usize = 100;

/// What to do with a path that was not generated ahead of time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Unknown paths are 404
    NotFound,
    /// Serve a loading page, render on demand and cache the result
    Loading,
}

/// Paths to generate ahead of time
#[derive(Debug, Clone, PartialEq)]
pub struct StaticPaths {
    /// Post uids, newest first
    pub paths: Vec<String>,
    pub fallback: Fallback,
}

/// Everything the post template needs
#[derive(Debug, Clone, PartialEq)]
pub struct DetailPage {
    pub post: Post,
    pub navigation: NavigationContext,
    /// Minutes
    pub reading_time: u32,
    pub edited_at: Option<DateTime<Utc>>,
    pub preview: bool,
}

/// Enumerate the post uids to generate up front.
///
/// With `detail.prerender_limit` set only the newest posts are listed; the
/// rest are left to the loading fallback.
pub async fn static_paths(api: &dyn ContentApi, config: &SiteConfig) -> Result<StaticPaths> {
    let doc_type = &config.api.document_type;
    let predicates = [Predicate::document_type(doc_type)];
    let options = QueryOptions::new()
        .order_by(Ordering::desc(FIRST_PUBLICATION_DATE))
        .fetch(doc_type, &["title"]);

    let documents = match config.detail.prerender_limit {
        Some(limit) => {
            api.query(&predicates, &options.page_size(limit.max(1)))
                .await?
                .results
                .into_iter()
                .take(limit)
                .collect()
        }
        None => {
            api.fetch_all(&predicates, &options.page_size(PATHS_PAGE_SIZE))
                .await?
        }
    };

    let paths = documents
        .iter()
        .map(|doc| normalize_summary(doc).map(|summary| summary.uid))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(paths = paths.len(), "static paths enumerated");

    Ok(StaticPaths {
        paths,
        fallback: Fallback::Loading,
    })
}

/// Generate the data of the post page `uid`.
///
/// Fails with `NotFound` when no post has that uid.
pub async fn load(
    api: &dyn ContentApi,
    config: &SiteConfig,
    uid: &str,
    preview: &PreviewContext,
) -> Result<StaticProps<DetailPage>> {
    let doc_type = &config.api.document_type;
    let options = QueryOptions::new().reference(preview.reference());

    let raw = api.get_by_uid(doc_type, uid, &options).await?;
    let post = normalize_post(&raw)?;
    let navigation = navigation::resolve(api, doc_type, &post.id, preview.reference()).await?;

    let page = DetailPage {
        reading_time: post.reading_time(),
        edited_at: post.edited_at(),
        navigation,
        preview: preview.is_active(),
        post,
    };

    tracing::info!(
        uid = %page.post.uid,
        reading_time = page.reading_time,
        preview = page.preview,
        "post generated"
    );

    Ok(StaticProps::new(page, config.revalidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlogError;
    use crate::prismic::fixture::tests::{post, three_posts};
    use crate::prismic::{Fixture, FixtureContentApi};
    use serde_json::json;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_static_paths() {
        let api = three_posts();
        let mut config = SiteConfig::default();

        let all = static_paths(&api, &config).await.unwrap();
        assert_eq!(all.paths, ["c", "b", "a"]);
        assert_eq!(all.fallback, Fallback::Loading);

        config.detail.prerender_limit = Some(2);
        let limited = static_paths(&api, &config).await.unwrap();
        assert_eq!(limited.paths, ["c", "b"]);
    }

    #[tokio::test]
    async fn test_load_post() {
        let api = three_posts();
        let props = load(&api, &SiteConfig::default(), "b", &PreviewContext::default())
            .await
            .unwrap();

        let page = props.props;
        assert_eq!(props.revalidate, 86_400);
        assert_eq!(page.post.uid, "b");
        assert_eq!(page.reading_time, 1);
        assert_eq!(page.edited_at, None);
        assert!(!page.preview);
        assert_eq!(page.navigation.previous.map(|p| p.uid), Some("a".to_string()));
        assert_eq!(page.navigation.next.map(|p| p.uid), Some("c".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_uid_is_not_found() {
        let api = three_posts();
        let err = load(&api, &SiteConfig::default(), "missing", &PreviewContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BlogError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_preview_returns_draft() {
        let published = post("ID-A", "a", "2021-03-01T10:00:00+0000", "2021-03-01T10:00:00+0000");
        let mut draft = post("ID-A", "a", "2021-03-01T10:00:00+0000", "2021-03-05T08:30:00+0000");
        draft
            .data
            .insert("title".to_string(), json!("Draft title"));

        let api = FixtureContentApi::new(Fixture {
            documents: vec![published],
            refs: HashMap::from([("draft-ref".to_string(), vec![draft])]),
        });
        let config = SiteConfig::default();

        let live = load(&api, &config, "a", &PreviewContext::default())
            .await
            .unwrap()
            .props;
        assert_eq!(live.post.data.title, "Title a");

        let preview = load(&api, &config, "a", &PreviewContext::new("draft-ref"))
            .await
            .unwrap()
            .props;
        assert!(preview.preview);
        assert_eq!(preview.post.data.title, "Draft title");
        assert!(preview.edited_at.is_some());
    }
}
