//! Previous / next post lookups

use crate::content::{normalize_summary, NavigationContext, PostSummary};
use crate::error::Result;
use crate::prismic::{
    predicate::{FIRST_PUBLICATION_DATE, LAST_PUBLICATION_DATE},
    ContentApi, Ordering, Predicate, QueryOptions, RawDocument,
};

/// Fields a navigation link needs
const SUMMARY_FIELDS: &[&str] = &["title", "subtitle", "author"];

/// Resolve the neighbours of the document `document_id`.
///
/// Both lookups page `after` the current document, one ordered by last
/// publication date descending and one by first publication date
/// ascending. They run concurrently; an empty result means no link.
pub async fn resolve(
    api: &dyn ContentApi,
    doc_type: &str,
    document_id: &str,
    reference: Option<&str>,
) -> Result<NavigationContext> {
    let predicates = [Predicate::document_type(doc_type)];
    let base = QueryOptions::new()
        .page_size(1)
        .after(document_id)
        .fetch(doc_type, SUMMARY_FIELDS)
        .reference(reference);

    let previous_options = base.clone().order_by(Ordering::desc(LAST_PUBLICATION_DATE));
    let next_options = base.order_by(Ordering::asc(FIRST_PUBLICATION_DATE));

    let (previous, next) = tokio::join!(
        api.query(&predicates, &previous_options),
        api.query(&predicates, &next_options),
    );

    let context = NavigationContext {
        previous: first_summary(previous?.results.first())?,
        next: first_summary(next?.results.first())?,
    };

    tracing::debug!(
        document_id,
        previous = context.previous.as_ref().map(|p| p.uid.as_str()),
        next = context.next.as_ref().map(|p| p.uid.as_str()),
        "navigation resolved"
    );

    Ok(context)
}

fn first_summary(raw: Option<&RawDocument>) -> Result<Option<PostSummary>> {
    raw.map(normalize_summary).transpose()
}
