//! Post models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::reading_time;
use super::rich_text::RichTextNode;

/// A fully normalized blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// CMS internal id, used for adjacent-post lookups
    pub id: String,

    /// URL slug; the only identity used for routing and caching
    pub uid: String,

    pub first_publication_date: Option<DateTime<Utc>>,
    pub last_publication_date: Option<DateTime<Utc>>,

    pub data: PostData,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PostData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner: Option<Banner>,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub url: String,
    pub alt: Option<String>,
}

/// A section of a post: an optional heading and its rich-text body
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentBlock {
    pub heading: Option<String>,
    pub body: Vec<RichTextNode>,
}

/// Listing entry; no content body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub uid: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub data: SummaryData,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// One page of summaries plus the cursor of the following page
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PostPagination {
    pub next_page: Option<String>,
    pub results: Vec<PostSummary>,
}

/// Neighbours of a post; `None` at either end of the timeline
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NavigationContext {
    pub previous: Option<PostSummary>,
    pub next: Option<PostSummary>,
}

impl Post {
    pub fn summary(&self) -> PostSummary {
        PostSummary {
            uid: self.uid.clone(),
            first_publication_date: self.first_publication_date,
            data: SummaryData {
                title: self.data.title.clone(),
                subtitle: self.data.subtitle.clone(),
                author: self.data.author.clone(),
            },
        }
    }

    /// Last publication date, if the post was edited after first publishing
    pub fn edited_at(&self) -> Option<DateTime<Utc>> {
        match (self.first_publication_date, self.last_publication_date) {
            (Some(first), Some(last)) if first != last => Some(last),
            (None, Some(last)) => Some(last),
            _ => None,
        }
    }

    /// Estimated minutes to read the post
    pub fn reading_time(&self) -> u32 {
        reading_time::estimate(&self.data.content)
    }
}

impl PostPagination {
    pub fn has_more(&self) -> bool {
        self.next_page.as_deref().is_some_and(|c| !c.is_empty())
    }
}
