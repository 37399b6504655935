//! Query building blocks: predicates, orderings and per-query options

use serde::{Deserialize, Serialize};
use std::fmt;

/// A filter on documents, rendered in the CMS query syntax
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Predicate {
    /// `[at(path, "value")]`: exact match on a document or data field
    At { path: String, value: String },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::At {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Documents of a given custom type
    pub fn document_type(doc_type: &str) -> Self {
        Self::at("document.type", doc_type)
    }

    /// A document by its internal id
    pub fn id(id: &str) -> Self {
        Self::at("document.id", id)
    }

    /// A document of `doc_type` by its uid
    pub fn uid(doc_type: &str, uid: &str) -> Self {
        Self::at(format!("my.{doc_type}.uid"), uid)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At { path, value } => {
                let value = value.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "[at({}, \"{}\")]", path, value)
            }
        }
    }
}

/// Render a predicate list as the `q` parameter
pub fn render_query(predicates: &[Predicate]) -> String {
    let inner: String = predicates.iter().map(|p| p.to_string()).collect();
    format!("[{}]", inner)
}

/// Sort direction of an ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// Sort documents by a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ordering {
    pub field: String,
    pub direction: Direction,
}

impl Ordering {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Asc => write!(f, "{}", self.field),
            Direction::Desc => write!(f, "{} desc", self.field),
        }
    }
}

/// Render an ordering list as the `orderings` parameter
pub fn render_orderings(orderings: &[Ordering]) -> String {
    let inner: Vec<String> = orderings.iter().map(|o| o.to_string()).collect();
    format!("[{}]", inner.join(","))
}

pub const FIRST_PUBLICATION_DATE: &str = "document.first_publication_date";
pub const LAST_PUBLICATION_DATE: &str = "document.last_publication_date";

/// Options of a single query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Data fields to return, as `type.field`; empty returns everything
    #[serde(default)]
    pub fetch: Vec<String>,
    pub page_size: Option<usize>,
    /// 1-based page number
    pub page: Option<usize>,
    /// Start after the document with this internal id
    pub after: Option<String>,
    #[serde(default)]
    pub orderings: Vec<Ordering>,
    /// Content snapshot to read; `None` reads the published (master) one
    #[serde(rename = "ref")]
    pub reference: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    pub fn after(mut self, id: impl Into<String>) -> Self {
        self.after = Some(id.into());
        self
    }

    pub fn order_by(mut self, ordering: Ordering) -> Self {
        self.orderings.push(ordering);
        self
    }

    /// Restrict returned data to `fields` of `doc_type`
    pub fn fetch(mut self, doc_type: &str, fields: &[&str]) -> Self {
        self.fetch
            .extend(fields.iter().map(|f| format!("{doc_type}.{f}")));
        self
    }

    pub fn reference(mut self, reference: Option<&str>) -> Self {
        self.reference = reference.map(String::from);
        self
    }
}
