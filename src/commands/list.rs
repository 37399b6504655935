//! List site content

use anyhow::Result;

use crate::content::PostSummary;
use crate::helpers::format_local;
use crate::pages::{listing, ListingState};
use crate::prismic::ContentApi;
use crate::Blog;

/// Print every published post, newest first
pub async fn run(blog: &Blog) -> Result<()> {
    let api = blog.content_api()?;
    let posts = collect_posts(blog, api.as_ref()).await?;

    println!("Posts ({}):", posts.len());
    for post in &posts {
        let date = post
            .first_publication_date
            .map(|d| format_local(&d, &blog.config.timezone, &blog.config.date_format))
            .unwrap_or_else(|| "unpublished".to_string());
        println!("  {} - {} [{}]", date, post.data.title, post.uid);
    }

    Ok(())
}

/// Walk the listing the way the home page does, one page at a time
async fn collect_posts(blog: &Blog, api: &dyn ContentApi) -> Result<Vec<PostSummary>> {
    let first = listing::load(api, &blog.config).await?;
    let mut state = ListingState::from(first.props);
    while state.has_more() {
        state.load_more(api).await?;
    }
    Ok(state.posts().to_vec())
}
