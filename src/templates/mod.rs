//! Built-in theme templates using Tera template engine
//!
//! All templates are embedded directly in the binary.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{rich_text, PaginationState, PostDetail, PostSummary};
use crate::helpers::{date_xml, format_publication_date, post_path};

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
    config: ConfigData,
    locale: chrono::Locale,
    tz: chrono_tz::Tz,
}

impl TemplateRenderer {
    /// Create a new renderer with all theme templates loaded
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("theme/layout.html")),
            ("index.html", include_str!("theme/index.html")),
            ("post.html", include_str!("theme/post.html")),
            ("loading.html", include_str!("theme/loading.html")),
            ("error.html", include_str!("theme/error.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("theme/partials/header.html"),
            ),
            (
                "partials/post_meta.html",
                include_str!("theme/partials/post_meta.html"),
            ),
        ])?;

        // Register custom filters
        tera.register_filter("post_url", post_url_filter);

        Ok(Self {
            tera,
            config: ConfigData::from(config),
            locale: config.locale(),
            tz: config.tz(),
        })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("config", &self.config);
        context
    }

    /// Listing page. `load_more_url` is the form target of the "load more"
    /// control; the control is only rendered while a next page exists.
    pub fn render_listing(
        &self,
        state: &PaginationState,
        load_more_url: Option<&str>,
    ) -> Result<String> {
        let mut context = self.base_context();
        let posts: Vec<PostView> = state.items.iter().map(|p| self.summary_view(p)).collect();
        context.insert("posts", &posts);
        context.insert(
            "load_more_url",
            &load_more_url.filter(|_| state.has_more()),
        );
        self.render("index.html", &context)
    }

    /// Full post page
    pub fn render_post(&self, post: &PostDetail) -> Result<String> {
        let mut context = self.base_context();
        let mut view = self.summary_view(&post.summary());
        view.reading_time = Some(post.reading_time());
        view.banner_url = post.banner.url.clone();
        view.sections = post
            .content
            .iter()
            .map(|block| SectionView {
                heading: block.heading.clone(),
                html: rich_text::as_html(&block.body),
            })
            .collect();
        context.insert("post", &view);
        self.render("post.html", &context)
    }

    /// Transient page shown while a post is generated for the first time
    pub fn render_loading(&self, refresh_secs: u64) -> Result<String> {
        let mut context = self.base_context();
        context.insert("refresh_secs", &refresh_secs);
        self.render("loading.html", &context)
    }

    pub fn render_error(&self, status: u16, message: &str) -> Result<String> {
        let mut context = self.base_context();
        context.insert("status", &status);
        context.insert("message", message);
        self.render("error.html", &context)
    }

    fn summary_view(&self, post: &PostSummary) -> PostView {
        PostView {
            uid: post.uid.clone(),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            date: post
                .first_publication_date
                .as_ref()
                .map(|d| format_publication_date(d, self.locale, self.tz)),
            date_xml: post.first_publication_date.as_ref().map(date_xml),
            reading_time: None,
            banner_url: String::new(),
            sections: Vec::new(),
        }
    }
}

/// Tera filter: post uid to page path
fn post_url_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let uid = tera::try_get_value!("post_url", "value", String, value);
    Ok(tera::Value::String(post_path(&uid)))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub description: String,
    pub language: String,
}

impl From<&SiteConfig> for ConfigData {
    fn from(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            language: config.language.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: Option<String>,
    pub date_xml: Option<String>,
    pub reading_time: Option<u32>,
    pub banner_url: String,
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub heading: String,
    pub html: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::pagination::tests::{doc, page};

    fn renderer() -> TemplateRenderer {
        TemplateRenderer::new(&SiteConfig::default()).unwrap()
    }

    #[test]
    fn test_listing_shows_load_more_while_next_page_exists() {
        let state = PaginationState::from_page(page(&["a"], Some("p2")));
        let html = renderer().render_listing(&state, Some("/more/s1")).unwrap();

        assert!(html.contains(r#"href="/post/a""#));
        assert!(html.contains("19 abr 2021"));
        assert!(html.contains("Carregar mais posts"));
        assert!(html.contains(r#"action="/more/s1""#));
    }

    #[test]
    fn test_listing_hides_load_more_on_last_page() {
        let state = PaginationState::from_page(page(&["a", "b"], None));
        let html = renderer().render_listing(&state, Some("/more/s1")).unwrap();

        assert!(html.contains(r#"href="/post/b""#));
        assert!(!html.contains("Carregar mais posts"));
    }

    #[test]
    fn test_post_page() {
        let post = PostDetail::from(doc("hooks"));
        let html = renderer().render_post(&post).unwrap();

        assert!(html.contains("<h1>Post hooks</h1>"));
        assert!(html.contains("1 min"));
        assert!(html.contains("<h2>Heading</h2>"));
        assert!(html.contains("<p>one two three</p>"));
        assert!(html.contains("b.png"));
    }

    #[test]
    fn test_titles_are_escaped() {
        let mut post = PostDetail::from(doc("x"));
        post.title = "<script>".to_string();
        let html = renderer().render_post(&post).unwrap();
        assert!(!html.contains("<h1><script></h1>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_loading_page_refreshes() {
        let html = renderer().render_loading(1).unwrap();
        assert!(html.contains("Carregando..."));
        assert!(html.contains(r#"http-equiv="refresh" content="1""#));
    }
}
