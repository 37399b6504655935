//! Page controllers.
//!
//! Each controller fetches and normalizes the data one page needs. Rendering
//! is left to [`crate::templates`]; caching to [`crate::cache`].

pub mod detail;
pub mod listing;
pub mod preview;

pub use detail::{DetailPage, StaticPaths};
pub use listing::ListingState;
pub use preview::PreviewContext;

/// Output of a page generation: the page data plus its freshness window
#[derive(Debug, Clone, PartialEq)]
pub struct StaticProps<T> {
    pub props: T,
    /// Seconds before the generated page is considered stale
    pub revalidate: u64,
}

impl<T> StaticProps<T> {
    pub fn new(props: T, revalidate: u64) -> Self {
        Self { props, revalidate }
    }
}
