//! cms-blog: a server-rendered blog front end for a headless content API
//!
//! Posts are fetched from a Prismic repository, listed with incremental
//! "load more" pagination and rendered with an estimated reading time.

pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod prismic;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// The main application: configuration plus the content API client
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Static export directory
    pub public_dir: PathBuf,
    /// Static assets served under /static
    pub static_dir: PathBuf,
    /// Content API client
    pub api: prismic::PrismicClient,
}

impl Blog {
    /// Create a new Blog instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No _config.yml in {:?}, using defaults", base_dir);
            config::SiteConfig::default()
        };
        config.apply_env();
        config.validate()?;

        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);
        let api = prismic::PrismicClient::new(&config)?;

        Ok(Self {
            config,
            base_dir,
            public_dir,
            static_dir,
            api,
        })
    }

    /// Export the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the export directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_unusable_document_type() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("_config.yml"), "document_type: \"posts.uid\"\n").unwrap();

        let err = Blog::new(dir.path()).err().expect("invalid config");
        assert!(err.to_string().contains("document_type"));
    }

    #[test]
    fn test_new_without_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.document_type, "posts");
        assert_eq!(blog.public_dir, dir.path().join("public"));
    }
}
