//! Generator module - exports the blog as static HTML files

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::SiteConfig;
use crate::content::pagination::load_all;
use crate::content::{PaginationState, PostDetail};
use crate::prismic::ContentApi;
use crate::templates::TemplateRenderer;

/// Static exporter using the built-in Tera templates
pub struct Generator<'a, A> {
    config: &'a SiteConfig,
    api: &'a A,
    renderer: TemplateRenderer,
    public_dir: PathBuf,
    static_dir: PathBuf,
}

impl<'a, A: ContentApi> Generator<'a, A> {
    /// Create a new generator
    pub fn new(config: &'a SiteConfig, api: &'a A, public_dir: &Path, static_dir: &Path) -> Result<Self> {
        Ok(Self {
            config,
            api,
            renderer: TemplateRenderer::new(config)?,
            public_dir: public_dir.to_path_buf(),
            static_dir: static_dir.to_path_buf(),
        })
    }

    /// Write the listing and all post pages. Returns the number of post
    /// pages written.
    pub async fn generate(&self) -> Result<usize> {
        fs::create_dir_all(&self.public_dir)?;
        self.copy_static_assets()?;

        let first = PaginationState::from_page(self.api.query_posts(self.config.page_size).await?);
        let all = load_all(first, self.api).await?;
        tracing::info!("Found {} posts", all.items.len());

        // A static listing has nowhere to post "load more" to, so it lists
        // every post at once.
        let index = self.renderer.render_listing(&all, None)?;
        fs::write(self.public_dir.join("index.html"), index)?;
        tracing::debug!("Generated: index.html");

        let mut written = 0;
        for summary in &all.items {
            if !is_safe_segment(&summary.uid) {
                tracing::warn!("Skipping post with unusable uid {:?}", summary.uid);
                continue;
            }
            let post = PostDetail::from(self.api.get_by_uid(&summary.uid).await?);
            self.generate_post_page(&post)?;
            written += 1;
        }

        Ok(written)
    }

    fn generate_post_page(&self, post: &PostDetail) -> Result<()> {
        let html = self.renderer.render_post(post)?;
        let dir = self.public_dir.join("post").join(&post.uid);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("index.html"), html)?;
        tracing::debug!("Generated: post/{}/index.html", post.uid);
        Ok(())
    }

    /// Copy static assets to public/static
    fn copy_static_assets(&self) -> Result<()> {
        if !self.static_dir.exists() {
            return Ok(());
        }

        let target = self.public_dir.join("static");
        for entry in WalkDir::new(&self.static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(&self.static_dir)?;
            let dest = target.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
        }

        Ok(())
    }
}

/// A uid usable as a single directory name
fn is_safe_segment(uid: &str) -> bool {
    !uid.is_empty() && uid != "." && uid != ".." && !uid.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::pagination::tests::FakeApi;

    #[tokio::test]
    async fn test_generate_exports_every_post() {
        let mut api = FakeApi::default();
        api.first = Some((vec!["a"], Some("p2")));
        api.pages.insert("p2", (vec!["b", ".."], None));

        let base = tempfile::tempdir().unwrap();
        let public_dir = base.path().join("public");
        let static_dir = base.path().join("static");
        fs::create_dir_all(static_dir.join("images")).unwrap();
        fs::write(static_dir.join("images/logo.svg"), "<svg/>").unwrap();

        let config = SiteConfig::default();
        let generator = Generator::new(&config, &api, &public_dir, &static_dir).unwrap();
        let written = generator.generate().await.unwrap();

        assert_eq!(written, 2);
        let index = fs::read_to_string(public_dir.join("index.html")).unwrap();
        assert!(index.contains(r#"href="/post/a""#));
        assert!(index.contains(r#"href="/post/b""#));
        assert!(!index.contains("Carregar mais posts"));

        let post = fs::read_to_string(public_dir.join("post/b/index.html")).unwrap();
        assert!(post.contains("<h1>Post b</h1>"));
        assert!(public_dir.join("post/a/index.html").exists());
        assert!(public_dir.join("static/images/logo.svg").exists());
    }

    #[test]
    fn test_is_safe_segment() {
        assert!(is_safe_segment("como-utilizar-hooks"));
        assert!(!is_safe_segment(""));
        assert!(!is_safe_segment(".."));
        assert!(!is_safe_segment("a/b"));
    }
}
