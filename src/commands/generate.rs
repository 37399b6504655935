//! Generate static files

use anyhow::Result;

use crate::generator::{GenerateReport, Generator};
use crate::Blog;

/// Export the whole blog into the public directory
pub async fn run(blog: &Blog) -> Result<GenerateReport> {
    let start = std::time::Instant::now();

    let api = blog.content_api()?;
    let generator = Generator::new(&blog.config, api.as_ref(), blog.public_dir.clone())?;
    let report = generator.generate(&blog.static_dir).await?;

    let duration = start.elapsed();
    tracing::info!(
        posts = report.posts,
        assets = report.assets,
        "Generated in {:.2}s",
        duration.as_secs_f64()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init::init_site;

    #[tokio::test]
    async fn test_generate_initialized_site() {
        let dir = tempfile::tempdir().unwrap();
        init_site(dir.path()).unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        let report = run(&blog).await.unwrap();

        assert_eq!(report.posts, 3);
        assert!(report.assets >= 2);
        assert!(blog.public_dir.join("index.html").exists());
        assert!(blog.public_dir.join("css/style.css").exists());
        assert!(blog
            .public_dir
            .join("post/como-utilizar-hooks/index.html")
            .exists());
    }
}
