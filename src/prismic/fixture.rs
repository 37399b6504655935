//! Content API backed by a local JSON file.
//!
//! The file holds published documents plus optional draft snapshots keyed by
//! ref. Queries follow the remote API: `at` predicates, orderings, `after`,
//! paging and field selection. Cursors are `fixture://search?...` URLs.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::document::{parse_timestamp, ApiResponse, RawDocument};
use super::predicate::{
    Direction, Ordering, Predicate, QueryOptions, FIRST_PUBLICATION_DATE, LAST_PUBLICATION_DATE,
};
use super::ContentApi;
use crate::error::{BlogError, Result};

const CURSOR_SCHEME: &str = "fixture";
const DEFAULT_PAGE_SIZE: usize = 20;

/// On-disk fixture layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub documents: Vec<RawDocument>,
    /// Draft snapshots: documents here replace published ones with the same id
    #[serde(default)]
    pub refs: HashMap<String, Vec<RawDocument>>,
}

/// State carried inside a fixture cursor
#[derive(Debug, Serialize, Deserialize)]
struct CursorState {
    predicates: Vec<Predicate>,
    options: QueryOptions,
}

pub struct FixtureContentApi {
    fixture: Fixture,
}

impl FixtureContentApi {
    pub fn new(fixture: Fixture) -> Self {
        Self { fixture }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let fixture: Fixture = serde_json::from_str(&content)?;
        tracing::info!(
            documents = fixture.documents.len(),
            refs = fixture.refs.len(),
            "loaded content fixture from {:?}",
            path
        );
        Ok(Self::new(fixture))
    }

    /// Documents visible under `reference`
    fn snapshot(&self, reference: Option<&str>) -> Result<Vec<&RawDocument>> {
        let mut documents: Vec<&RawDocument> = self.fixture.documents.iter().collect();

        if let Some(reference) = reference {
            let drafts = self
                .fixture
                .refs
                .get(reference)
                .ok_or_else(|| BlogError::ContentFetch(format!("unknown ref: {reference}")))?;

            for draft in drafts {
                match documents.iter().position(|d| d.id == draft.id) {
                    Some(pos) => documents[pos] = draft,
                    None => documents.push(draft),
                }
            }
        }

        Ok(documents)
    }

    fn search(&self, predicates: &[Predicate], options: &QueryOptions) -> Result<ApiResponse> {
        let mut matching: Vec<&RawDocument> = self
            .snapshot(options.reference.as_deref())?
            .into_iter()
            .filter(|doc| predicates.iter().all(|p| matches(doc, p)))
            .collect();

        // Stable sort: later orderings only break ties of earlier ones
        matching.sort_by(|a, b| {
            options
                .orderings
                .iter()
                .map(|ordering| compare(a, b, ordering))
                .find(|c| *c != CmpOrdering::Equal)
                .unwrap_or(CmpOrdering::Equal)
        });

        if let Some(after) = &options.after {
            let position = matching.iter().position(|d| &d.id == after);
            matching = match position {
                Some(pos) => matching.split_off(pos + 1),
                None => Vec::new(),
            };
        }

        let page_size = options.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let page = options.page.unwrap_or(1).max(1);
        let total = matching.len();
        let total_pages = total.div_ceil(page_size);

        let results: Vec<RawDocument> = matching
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .map(|doc| select_fields(doc, &options.fetch))
            .collect();

        let next_page = if page < total_pages {
            Some(cursor_url(predicates, &options.clone().page(page + 1))?)
        } else {
            None
        };
        let prev_page = if page > 1 {
            Some(cursor_url(predicates, &options.clone().page(page - 1))?)
        } else {
            None
        };

        Ok(ApiResponse {
            page,
            results_per_page: page_size,
            results_size: results.len(),
            total_results_size: total,
            total_pages,
            next_page,
            prev_page,
            results,
        })
    }
}

#[async_trait]
impl ContentApi for FixtureContentApi {
    async fn query(&self, predicates: &[Predicate], options: &QueryOptions) -> Result<ApiResponse> {
        self.search(predicates, options)
    }

    async fn fetch_page(&self, cursor: &str) -> Result<ApiResponse> {
        let state = parse_cursor(cursor)?;
        self.search(&state.predicates, &state.options)
    }

    fn owns_cursor(&self, cursor: &str) -> bool {
        parse_cursor(cursor).is_ok()
    }
}

fn cursor_url(predicates: &[Predicate], options: &QueryOptions) -> Result<String> {
    let state = CursorState {
        predicates: predicates.to_vec(),
        options: options.clone(),
    };
    let mut url = Url::parse(&format!("{CURSOR_SCHEME}://search"))?;
    url.query_pairs_mut()
        .append_pair("state", &serde_json::to_string(&state)?);
    Ok(url.to_string())
}

fn parse_cursor(cursor: &str) -> Result<CursorState> {
    let invalid = || BlogError::InvalidCursor(cursor.to_string());

    let url = Url::parse(cursor).map_err(|_| invalid())?;
    if url.scheme() != CURSOR_SCHEME {
        return Err(invalid());
    }
    let state = url
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(invalid)?;

    let state: CursorState = serde_json::from_str(&state).map_err(|_| invalid())?;

    // Cursors come back from the browser; their paging must stay addressable
    let page_size = state.options.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = state
        .options
        .page
        .unwrap_or(1)
        .checked_sub(1)
        .and_then(|page| page.checked_mul(page_size));
    if page_size == 0 || offset.is_none() {
        return Err(invalid());
    }

    Ok(state)
}

fn data_str<'a>(doc: &'a RawDocument, field: &str) -> Option<&'a str> {
    doc.data.get(field).and_then(Value::as_str)
}

/// Split `my.<type>.<field>` into its type and field
fn custom_field(path: &str) -> Option<(&str, &str)> {
    path.strip_prefix("my.")?.split_once('.')
}

fn matches(doc: &RawDocument, predicate: &Predicate) -> bool {
    let Predicate::At { path, value } = predicate;

    match path.as_str() {
        "document.type" => doc.doc_type == *value,
        "document.id" => doc.id == *value,
        "document.tags" => doc.tags.iter().any(|t| t == value),
        _ => match custom_field(path) {
            Some((doc_type, "uid")) => {
                doc.doc_type == doc_type && doc.uid.as_deref() == Some(value.as_str())
            }
            Some((doc_type, field)) => {
                doc.doc_type == doc_type && data_str(doc, field) == Some(value.as_str())
            }
            None => {
                tracing::warn!("unsupported predicate path in fixture: {}", path);
                false
            }
        },
    }
}

fn compare(a: &RawDocument, b: &RawDocument, ordering: &Ordering) -> CmpOrdering {
    let timestamp = |doc: &RawDocument, first: bool| {
        let value = if first {
            &doc.first_publication_date
        } else {
            &doc.last_publication_date
        };
        value.as_deref().and_then(parse_timestamp)
    };

    let ord = match ordering.field.as_str() {
        FIRST_PUBLICATION_DATE => timestamp(a, true).cmp(&timestamp(b, true)),
        LAST_PUBLICATION_DATE => timestamp(a, false).cmp(&timestamp(b, false)),
        field => match custom_field(field) {
            Some((_, name)) => data_str(a, name).cmp(&data_str(b, name)),
            None => CmpOrdering::Equal,
        },
    };

    match ordering.direction {
        Direction::Asc => ord,
        Direction::Desc => ord.reverse(),
    }
}

/// Keep only the requested `type.field` data entries
fn select_fields(doc: &RawDocument, fetch: &[String]) -> RawDocument {
    let mut doc = doc.clone();
    if fetch.is_empty() {
        return doc;
    }

    let prefix = format!("{}.", doc.doc_type);
    let wanted: Vec<&str> = fetch
        .iter()
        .filter_map(|f| f.strip_prefix(prefix.as_str()))
        .collect();
    doc.data.retain(|key, _| wanted.contains(&key.as_str()));
    doc
}
