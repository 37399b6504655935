//! Typed rich-text nodes and their plain-text / HTML renderings

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One block of a rich-text field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RichTextNode {
    #[serde(rename = "paragraph")]
    Paragraph(TextBlock),
    #[serde(rename = "heading1")]
    Heading1(TextBlock),
    #[serde(rename = "heading2")]
    Heading2(TextBlock),
    #[serde(rename = "heading3")]
    Heading3(TextBlock),
    #[serde(rename = "heading4")]
    Heading4(TextBlock),
    #[serde(rename = "heading5")]
    Heading5(TextBlock),
    #[serde(rename = "heading6")]
    Heading6(TextBlock),
    #[serde(rename = "preformatted")]
    Preformatted(TextBlock),
    #[serde(rename = "list-item")]
    ListItem(TextBlock),
    #[serde(rename = "o-list-item")]
    OrderedListItem(TextBlock),
    #[serde(rename = "image")]
    Image(ImageBlock),
    #[serde(rename = "embed")]
    Embed(EmbedBlock),
    /// Block types the blog does not render
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
}

/// Inline formatting over `[start, end)` offsets in UTF-16 code units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink(String),
    Label(String),
    Other,
}

impl Span {
    pub fn kind(&self) -> SpanKind {
        let data_str = |key: &str| {
            self.data
                .as_ref()
                .and_then(|d| d.get(key))
                .and_then(Value::as_str)
                .map(String::from)
        };

        match self.kind.as_str() {
            "strong" => SpanKind::Strong,
            "em" => SpanKind::Em,
            "hyperlink" => data_str("url").map_or(SpanKind::Other, SpanKind::Hyperlink),
            "label" => data_str("label").map_or(SpanKind::Other, SpanKind::Label),
            _ => SpanKind::Other,
        }
    }

    fn open_tag(&self) -> String {
        match self.kind() {
            SpanKind::Strong => "<strong>".to_string(),
            SpanKind::Em => "<em>".to_string(),
            SpanKind::Hyperlink(url) => format!(
                r#"<a href="{}" target="_blank" rel="noopener noreferrer">"#,
                html_escape::encode_double_quoted_attribute(&url)
            ),
            SpanKind::Label(label) => format!(
                r#"<span class="{}">"#,
                html_escape::encode_double_quoted_attribute(&label)
            ),
            SpanKind::Other => "<span>".to_string(),
        }
    }

    fn close_tag(&self) -> &'static str {
        match self.kind() {
            SpanKind::Strong => "</strong>",
            SpanKind::Em => "</em>",
            SpanKind::Hyperlink(_) => "</a>",
            SpanKind::Label(_) | SpanKind::Other => "</span>",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedBlock {
    #[serde(default)]
    pub oembed: Value,
}

impl RichTextNode {
    /// Text content of text blocks; `None` for images, embeds and unknowns
    pub fn text_block(&self) -> Option<&TextBlock> {
        match self {
            Self::Paragraph(b)
            | Self::Heading1(b)
            | Self::Heading2(b)
            | Self::Heading3(b)
            | Self::Heading4(b)
            | Self::Heading5(b)
            | Self::Heading6(b)
            | Self::Preformatted(b)
            | Self::ListItem(b)
            | Self::OrderedListItem(b) => Some(b),
            Self::Image(_) | Self::Embed(_) | Self::Unsupported => None,
        }
    }

    /// Decode a node, keeping unknown or malformed nodes as `Unsupported`
    pub fn from_value(value: &Value) -> Self {
        match serde_json::from_value(value.clone()) {
            Ok(node) => node,
            Err(e) => {
                tracing::warn!("skipping malformed rich-text node: {}", e);
                Self::Unsupported
            }
        }
    }
}

/// Plain text of a rich-text field, blocks joined by a space
pub fn as_text(nodes: &[RichTextNode]) -> String {
    nodes
        .iter()
        .filter_map(|n| n.text_block())
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// HTML of a rich-text field. Consecutive list items share one list.
pub fn as_html(nodes: &[RichTextNode]) -> String {
    let mut html = String::new();
    let mut open_list: Option<&'static str> = None;

    for node in nodes {
        let list = match node {
            RichTextNode::ListItem(_) => Some("ul"),
            RichTextNode::OrderedListItem(_) => Some("ol"),
            _ => None,
        };
        if open_list != list {
            if let Some(tag) = open_list {
                html.push_str(&format!("</{tag}>"));
            }
            if let Some(tag) = list {
                html.push_str(&format!("<{tag}>"));
            }
            open_list = list;
        }

        match node {
            RichTextNode::Paragraph(b) => wrap(&mut html, "p", b),
            RichTextNode::Heading1(b) => wrap(&mut html, "h1", b),
            RichTextNode::Heading2(b) => wrap(&mut html, "h2", b),
            RichTextNode::Heading3(b) => wrap(&mut html, "h3", b),
            RichTextNode::Heading4(b) => wrap(&mut html, "h4", b),
            RichTextNode::Heading5(b) => wrap(&mut html, "h5", b),
            RichTextNode::Heading6(b) => wrap(&mut html, "h6", b),
            RichTextNode::Preformatted(b) => wrap(&mut html, "pre", b),
            RichTextNode::ListItem(b) | RichTextNode::OrderedListItem(b) => {
                wrap(&mut html, "li", b)
            }
            RichTextNode::Image(image) => {
                html.push_str(&format!(
                    r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                    html_escape::encode_double_quoted_attribute(&image.url),
                    html_escape::encode_double_quoted_attribute(
                        image.alt.as_deref().unwrap_or("")
                    )
                ));
            }
            RichTextNode::Embed(embed) => {
                // oEmbed markup comes from the CMS and is emitted verbatim
                let field = |key: &str| embed.oembed.get(key).and_then(Value::as_str);
                html.push_str(&format!(
                    r#"<div data-oembed="{}" data-oembed-type="{}">{}</div>"#,
                    html_escape::encode_double_quoted_attribute(
                        field("embed_url").unwrap_or("")
                    ),
                    html_escape::encode_double_quoted_attribute(field("type").unwrap_or("")),
                    field("html").unwrap_or("")
                ));
            }
            RichTextNode::Unsupported => {}
        }
    }

    if let Some(tag) = open_list {
        html.push_str(&format!("</{tag}>"));
    }

    html
}

fn wrap(html: &mut String, tag: &str, block: &TextBlock) {
    html.push_str(&format!("<{tag}>"));
    html.push_str(&render_spans(&block.text, &block.spans));
    html.push_str(&format!("</{tag}>"));
}

/// Escape `text` and apply its spans. Overlapping spans are closed and
/// reopened so the output stays well nested.
fn render_spans(text: &str, spans: &[Span]) -> String {
    // Span offsets count UTF-16 code units
    let len = text.encode_utf16().count();

    let mut spans: Vec<&Span> = spans
        .iter()
        .filter(|s| s.start < s.end && s.start < len)
        .collect();
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::with_capacity(text.len());
    let mut stack: Vec<&Span> = Vec::new();
    let mut next = 0;
    let mut pos = 0;
    let mut buf = [0u8; 4];
    let mut chars = text.chars();

    loop {
        if stack.iter().any(|s| s.end.min(len) <= pos) {
            let mut reopen = Vec::new();
            while let Some(span) = stack.pop() {
                out.push_str(span.close_tag());
                if span.end.min(len) > pos {
                    reopen.push(span);
                }
                if stack.iter().all(|s| s.end.min(len) > pos) {
                    break;
                }
            }
            for span in reopen.into_iter().rev() {
                out.push_str(&span.open_tag());
                stack.push(span);
            }
        }

        let Some(c) = chars.next() else {
            break;
        };

        while next < spans.len() && spans[next].start <= pos {
            out.push_str(&spans[next].open_tag());
            stack.push(spans[next]);
            next += 1;
        }

        match c {
            '\n' => out.push_str("<br />"),
            c => out.push_str(&html_escape::encode_text(c.encode_utf8(&mut buf))),
        }
        pos += c.len_utf16();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paragraph(text: &str, spans: Vec<Span>) -> RichTextNode {
        RichTextNode::Paragraph(TextBlock {
            text: text.to_string(),
            spans,
        })
    }

    fn span(start: usize, end: usize, kind: &str) -> Span {
        Span {
            start,
            end,
            kind: kind.to_string(),
            data: None,
        }
    }

    #[test]
    fn test_decode_nodes() {
        let value = json!([
            {"type": "heading2", "text": "Title", "spans": []},
            {"type": "paragraph", "text": "Body", "spans": [{"start": 0, "end": 4, "type": "strong"}]},
            {"type": "image", "url": "https://images.prismic.io/x.png", "alt": null, "dimensions": {"width": 10, "height": 10}},
            {"type": "o-list-item", "text": "one", "spans": []},
            {"type": "table", "rows": []}
        ]);
        let nodes: Vec<RichTextNode> = serde_json::from_value(value).unwrap();
        assert!(matches!(nodes[0], RichTextNode::Heading2(_)));
        assert_eq!(nodes[1].text_block().unwrap().spans[0].kind(), SpanKind::Strong);
        assert!(matches!(nodes[2], RichTextNode::Image(_)));
        assert!(matches!(nodes[3], RichTextNode::OrderedListItem(_)));
        assert_eq!(nodes[4], RichTextNode::Unsupported);
    }

    #[test]
    fn test_from_value_tolerates_malformed_node() {
        let node = RichTextNode::from_value(&json!({"text": "no type"}));
        assert_eq!(node, RichTextNode::Unsupported);
    }

    #[test]
    fn test_as_text() {
        let nodes = vec![
            paragraph("Hello world", vec![]),
            RichTextNode::Image(ImageBlock::default()),
            paragraph("second block", vec![]),
        ];
        assert_eq!(as_text(&nodes), "Hello world second block");
        assert_eq!(as_text(&[]), "");
    }

    #[test]
    fn test_as_html_escapes_and_spans() {
        let nodes = vec![paragraph(
            "Use <b> & more",
            vec![span(0, 3, "strong"), span(10, 14, "em")],
        )];
        assert_eq!(
            as_html(&nodes),
            "<p><strong>Use</strong> &lt;b&gt; &amp; <em>more</em></p>"
        );
    }

    #[test]
    fn test_as_html_hyperlink() {
        let mut link = span(0, 4, "hyperlink");
        link.data = Some(json!({"link_type": "Web", "url": "https://example.com/?a=1&b=2"}));
        let html = as_html(&[paragraph("Docs here", vec![link])]);
        assert_eq!(
            html,
            r#"<p><a href="https://example.com/?a=1&amp;b=2" target="_blank" rel="noopener noreferrer">Docs</a> here</p>"#
        );
    }

    #[test]
    fn test_as_html_overlapping_spans_stay_nested() {
        let html = as_html(&[paragraph("abcdef", vec![span(0, 4, "strong"), span(2, 6, "em")])]);
        assert_eq!(
            html,
            "<p><strong>ab<em>cd</em></strong><em>ef</em></p>"
        );
    }

    #[test]
    fn test_as_html_span_offsets_count_utf16_units() {
        // The emoji takes two code units, the accented letter one
        let html = as_html(&[paragraph(
            "😀 bold é end",
            vec![span(3, 7, "strong"), span(8, 9, "em")],
        )]);
        assert_eq!(html, "<p>😀 <strong>bold</strong> <em>é</em> end</p>");
    }

    #[test]
    fn test_as_html_groups_lists() {
        let item = |t: &str| {
            RichTextNode::ListItem(TextBlock {
                text: t.to_string(),
                spans: vec![],
            })
        };
        let nodes = vec![item("one"), item("two"), paragraph("after", vec![])];
        assert_eq!(
            as_html(&nodes),
            "<ul><li>one</li><li>two</li></ul><p>after</p>"
        );
    }

    #[test]
    fn test_as_html_line_breaks() {
        assert_eq!(
            as_html(&[paragraph("line\nbreak", vec![])]),
            "<p>line<br />break</p>"
        );
    }
}
