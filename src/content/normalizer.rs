//! Map raw CMS documents onto the post models

use serde_json::{Map, Value};

use super::post::{
    Banner, ContentBlock, Post, PostData, PostPagination, PostSummary, SummaryData,
};
use super::rich_text::{self, RichTextNode};
use crate::error::{BlogError, Result};
use crate::prismic::{parse_timestamp, ApiResponse, RawDocument};

/// Full post, including the content body
pub fn normalize_post(raw: &RawDocument) -> Result<Post> {
    let uid = require_uid(raw)?;
    let data = &raw.data;

    Ok(Post {
        id: raw.id.clone(),
        uid,
        first_publication_date: raw.first_publication_date.as_deref().and_then(parse_timestamp),
        last_publication_date: raw.last_publication_date.as_deref().and_then(parse_timestamp),
        data: PostData {
            title: text_field(data, "title"),
            subtitle: text_field(data, "subtitle"),
            author: text_field(data, "author"),
            banner: banner(data),
            content: content(data),
        },
    })
}

/// Listing entry: uid, first publication date, title, subtitle, author
pub fn normalize_summary(raw: &RawDocument) -> Result<PostSummary> {
    let uid = require_uid(raw)?;
    let data = &raw.data;

    Ok(PostSummary {
        uid,
        first_publication_date: raw.first_publication_date.as_deref().and_then(parse_timestamp),
        data: SummaryData {
            title: text_field(data, "title"),
            subtitle: text_field(data, "subtitle"),
            author: text_field(data, "author"),
        },
    })
}

/// One search page as summaries, keeping result order and the cursor
pub fn normalize_page(response: &ApiResponse) -> Result<PostPagination> {
    let results = response
        .results
        .iter()
        .map(normalize_summary)
        .collect::<Result<Vec<_>>>()?;

    Ok(PostPagination {
        next_page: response.next_page.clone().filter(|c| !c.is_empty()),
        results,
    })
}

fn require_uid(raw: &RawDocument) -> Result<String> {
    match raw.uid.as_deref() {
        Some(uid) if !uid.trim().is_empty() => Ok(uid.to_string()),
        _ => Err(BlogError::InvalidDocument(format!(
            "document {} has no uid",
            raw.id
        ))),
    }
}

/// Key text fields arrive as plain strings; title fields as rich text
fn text_field(data: &Map<String, Value>, key: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(nodes)) => rich_text::as_text(&rich_text_nodes(nodes)),
        _ => String::new(),
    }
}

fn rich_text_nodes(nodes: &[Value]) -> Vec<RichTextNode> {
    nodes.iter().map(RichTextNode::from_value).collect()
}

fn banner(data: &Map<String, Value>) -> Option<Banner> {
    let banner = data.get("banner")?;
    let url = banner.get("url").and_then(Value::as_str)?;
    if url.is_empty() {
        return None;
    }

    Some(Banner {
        url: url.to_string(),
        alt: banner
            .get("alt")
            .and_then(Value::as_str)
            .map(String::from),
    })
}

fn content(data: &Map<String, Value>) -> Vec<ContentBlock> {
    let Some(Value::Array(blocks)) = data.get("content") else {
        return Vec::new();
    };

    blocks
        .iter()
        .filter_map(Value::as_object)
        .map(|block| ContentBlock {
            heading: Some(text_field(block, "heading")).filter(|h| !h.is_empty()),
            body: match block.get("body") {
                Some(Value::Array(nodes)) => rich_text_nodes(nodes),
                _ => Vec::new(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prismic::fixture::tests::post;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_normalize_post() {
        let raw = post(
            "ID-A",
            "a",
            "2021-03-25T19:25:28+0000",
            "2021-03-25T19:27:35+0000",
        );
        let post = normalize_post(&raw).unwrap();

        assert_eq!(post.id, "ID-A");
        assert_eq!(post.uid, "a");
        assert_eq!(
            post.first_publication_date,
            Some(Utc.with_ymd_and_hms(2021, 3, 25, 19, 25, 28).unwrap())
        );
        assert_eq!(post.data.title, "Title a");
        assert_eq!(post.data.author, "Joseph Oliveira");
        assert_eq!(post.data.banner, None);
        assert_eq!(post.data.content.len(), 1);
        assert_eq!(post.data.content[0].heading.as_deref(), Some("Intro"));
        assert_eq!(
            rich_text::as_text(&post.data.content[0].body),
            "Some words here"
        );
    }

    #[test]
    fn test_uid_required() {
        let mut raw = post("ID-A", "a", "2021-03-01T10:00:00+0000", "2021-03-01T10:00:00+0000");
        raw.uid = None;
        assert!(matches!(
            normalize_post(&raw),
            Err(BlogError::InvalidDocument(_))
        ));

        raw.uid = Some("  ".to_string());
        assert!(matches!(
            normalize_summary(&raw),
            Err(BlogError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_uid_kept_verbatim() {
        let mut raw = post("ID-A", "a", "2021-03-01T10:00:00+0000", "2021-03-01T10:00:00+0000");
        raw.uid = Some(" a ".to_string());

        assert_eq!(normalize_post(&raw).unwrap().uid, " a ");
        assert_eq!(normalize_summary(&raw).unwrap().uid, " a ");
    }

    #[test]
    fn test_missing_fields_are_empty() {
        let raw = RawDocument {
            id: "ID-X".to_string(),
            uid: Some("bare".to_string()),
            doc_type: "post".to_string(),
            href: None,
            tags: vec![],
            first_publication_date: None,
            last_publication_date: None,
            lang: None,
            data: Map::new(),
        };
        let post = normalize_post(&raw).unwrap();
        assert_eq!(post.first_publication_date, None);
        assert_eq!(post.data.subtitle, "");
        assert!(post.data.content.is_empty());
        assert_eq!(post.reading_time(), 0);
    }

    #[test]
    fn test_rich_text_title_and_banner() {
        let mut raw = post("ID-A", "a", "2021-03-01T10:00:00+0000", "2021-03-01T10:00:00+0000");
        raw.data.insert(
            "title".to_string(),
            json!([{"type": "heading1", "text": "Rich title", "spans": []}]),
        );
        raw.data.insert(
            "banner".to_string(),
            json!({"url": "https://images.prismic.io/banner.png", "alt": "Banner"}),
        );
        let post = normalize_post(&raw).unwrap();
        assert_eq!(post.data.title, "Rich title");
        assert_eq!(
            post.data.banner.map(|b| b.url),
            Some("https://images.prismic.io/banner.png".to_string())
        );

        raw.data.insert("banner".to_string(), json!({}));
        assert_eq!(normalize_post(&raw).unwrap().data.banner, None);
    }

    #[test]
    fn test_content_order_preserved() {
        let mut raw = post("ID-A", "a", "2021-03-01T10:00:00+0000", "2021-03-01T10:00:00+0000");
        raw.data.insert(
            "content".to_string(),
            json!([
                {"heading": "First", "body": [{"type": "paragraph", "text": "one", "spans": []}]},
                {"heading": "Second", "body": [
                    {"type": "paragraph", "text": "two", "spans": []},
                    {"type": "mystery"},
                    {"type": "paragraph", "text": "three", "spans": []}
                ]}
            ]),
        );
        let post = normalize_post(&raw).unwrap();
        let headings: Vec<_> = post
            .data
            .content
            .iter()
            .map(|b| b.heading.clone().unwrap())
            .collect();
        assert_eq!(headings, ["First", "Second"]);
        assert_eq!(post.data.content[1].body.len(), 3);
        assert_eq!(post.data.content[1].body[1], RichTextNode::Unsupported);
        assert_eq!(rich_text::as_text(&post.data.content[1].body), "two three");
    }

    #[test]
    fn test_normalize_page() {
        let response = ApiResponse {
            page: 1,
            results_per_page: 3,
            results_size: 3,
            total_results_size: 3,
            total_pages: 1,
            next_page: Some(String::new()),
            prev_page: None,
            results: vec![
                post("ID-A", "a", "2021-03-01T10:00:00+0000", "2021-03-01T10:00:00+0000"),
                post("ID-B", "b", "2021-03-02T10:00:00+0000", "2021-03-02T10:00:00+0000"),
                post("ID-C", "c", "2021-03-03T10:00:00+0000", "2021-03-03T10:00:00+0000"),
            ],
        };
        let page = normalize_page(&response).unwrap();
        let uids: Vec<_> = page.results.iter().map(|s| s.uid.as_str()).collect();
        assert_eq!(uids, ["a", "b", "c"]);
        assert_eq!(page.next_page, None);
    }
}
