//! Site configuration (_config.yml)

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Environment variable that overrides `access_token`
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub language: String,
    pub timezone: String,

    // Content API
    pub api_endpoint: String,
    pub access_token: Option<String>,
    pub document_type: String,

    // Listing
    pub page_size: usize,
    pub max_sessions: usize,

    // Post pages
    pub prebuild_count: usize,
    pub revalidate_secs: u64,
    pub max_cached_pages: usize,

    // Directory
    pub public_dir: String,
    pub static_dir: String,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            description: String::new(),
            language: "pt_BR".to_string(),
            timezone: "UTC".to_string(),

            api_endpoint: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            document_type: "posts".to_string(),

            page_size: 1,
            max_sessions: 1024,

            prebuild_count: 2,
            revalidate_secs: 60 * 60 * 24,
            max_cached_pages: 1024,

            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read {:?}", path.as_ref()))?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.is_empty() {
                tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
                self.access_token = Some(token);
            }
        }
    }

    /// Reject values that cannot be placed into API queries as is
    pub fn validate(&self) -> Result<()> {
        let valid_type = !self.document_type.is_empty()
            && self
                .document_type
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid_type {
            bail!(
                "document_type {:?} must be a non-empty custom type id (letters, digits, '_' or '-')",
                self.document_type
            );
        }
        if self.page_size == 0 {
            bail!("page_size must be at least 1");
        }
        Ok(())
    }

    /// Configured time zone, falling back to UTC on unknown names
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown timezone {:?}, using UTC", self.timezone);
            chrono_tz::UTC
        })
    }

    /// Configured locale, falling back to pt_BR on unknown names
    pub fn locale(&self) -> chrono::Locale {
        let name = self.language.replace('-', "_");
        chrono::Locale::try_from(name.as_str()).unwrap_or_else(|_| {
            tracing::warn!("Unknown language {:?}, using pt_BR", self.language);
            chrono::Locale::pt_BR
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.document_type, "posts");
        assert_eq!(config.page_size, 1);
        assert_eq!(config.prebuild_count, 2);
        assert_eq!(config.revalidate_secs, 86_400);
        assert_eq!(config.max_cached_pages, 1024);
    }

    #[test]
    fn test_validate_document_type() {
        assert!(SiteConfig::default().validate().is_ok());

        let config = SiteConfig {
            document_type: "blog_post-v2".to_string(),
            ..SiteConfig::default()
        };
        assert!(config.validate().is_ok());

        for bad in ["", "posts.uid", "posts\")]]", "my posts"] {
            let config = SiteConfig {
                document_type: bad.to_string(),
                ..SiteConfig::default()
            };
            assert!(config.validate().is_err(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_parse_config() {
        let yaml = r##"
title: My Blog
api_endpoint: https://example.cdn.prismic.io/api/v2
page_size: 5
timezone: America/Sao_Paulo
theme_color: "#ff57b2"
"##;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.api_endpoint, "https://example.cdn.prismic.io/api/v2");
        assert_eq!(config.page_size, 5);
        assert_eq!(config.tz(), chrono_tz::America::Sao_Paulo);
        assert!(config.extra.contains_key("theme_color"));
        // untouched fields keep their defaults
        assert_eq!(config.language, "pt_BR");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "title: From Disk\nprebuild_count: 0").unwrap();

        let config = SiteConfig::load(file.path()).unwrap();
        assert_eq!(config.title, "From Disk");
        assert_eq!(config.prebuild_count, 0);
    }

    #[test]
    fn test_unknown_timezone_falls_back() {
        let config = SiteConfig {
            timezone: "Mars/Olympus".to_string(),
            ..SiteConfig::default()
        };
        assert_eq!(config.tz(), chrono_tz::UTC);
    }

    #[test]
    fn test_locale_accepts_hyphen() {
        let config = SiteConfig {
            language: "pt-BR".to_string(),
            ..SiteConfig::default()
        };
        assert_eq!(config.locale(), chrono::Locale::pt_BR);
    }
}
