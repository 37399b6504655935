//! Reading-time estimate from rich-text word counts

use super::post::ContentBlock;
use super::rich_text;

/// Average reading speed
pub const WORDS_PER_MINUTE: usize = 200;

/// Count whitespace-separated words
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Minutes needed to read `content`, rounded up.
///
/// Headings and bodies both count. Empty content is 0 minutes; anything
/// else is at least 1.
pub fn estimate(content: &[ContentBlock]) -> u32 {
    if content.is_empty() {
        return 0;
    }

    let heading_words: usize = content
        .iter()
        .filter_map(|block| block.heading.as_deref())
        .map(count_words)
        .sum();
    let body_words: usize = content
        .iter()
        .map(|block| count_words(&rich_text::as_text(&block.body)))
        .sum();

    let words = heading_words + body_words;
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}
