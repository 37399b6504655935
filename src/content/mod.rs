//! Content module - post models, rich text and normalization

pub mod normalizer;
mod post;
pub mod reading_time;
pub mod rich_text;

pub use normalizer::{normalize_page, normalize_post, normalize_summary};
pub use post::{
    Banner, ContentBlock, NavigationContext, Post, PostData, PostPagination, PostSummary,
    SummaryData,
};
pub use rich_text::RichTextNode;
