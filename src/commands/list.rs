//! List posts

use anyhow::Result;

use crate::content::pagination::load_all;
use crate::content::{PaginationState, PostDetail};
use crate::helpers::format_publication_date;
use crate::prismic::ContentApi;
use crate::Blog;

/// Print every post with its publication date and reading time
pub async fn run(blog: &Blog) -> Result<()> {
    let lines = collect(blog, &blog.api).await?;
    println!("Posts ({}):", lines.len());
    for line in lines {
        println!("  {}", line);
    }
    Ok(())
}

async fn collect<A: ContentApi>(blog: &Blog, api: &A) -> Result<Vec<String>> {
    let first = PaginationState::from_page(api.query_posts(blog.config.page_size).await?);
    let all = load_all(first, api).await?;

    let locale = blog.config.locale();
    let tz = blog.config.tz();

    let mut lines = Vec::with_capacity(all.items.len());
    for summary in &all.items {
        let post = PostDetail::from(api.get_by_uid(&summary.uid).await?);
        let date = summary
            .first_publication_date
            .as_ref()
            .map(|d| format_publication_date(d, locale, tz))
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "{} - {} [{}] {} min",
            date,
            summary.title,
            summary.uid,
            post.reading_time()
        ));
    }
    Ok(lines)
}
