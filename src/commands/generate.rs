//! Export static files

use anyhow::Result;

use crate::generator::Generator;
use crate::Blog;

/// Export the listing and every post page into the public directory
pub async fn run(blog: &Blog) -> Result<()> {
    let start = std::time::Instant::now();

    let generator = Generator::new(&blog.config, &blog.api, &blog.public_dir, &blog.static_dir)?;
    let written = generator.generate().await?;

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} post pages in {:.2}s",
        written,
        duration.as_secs_f64()
    );

    Ok(())
}
