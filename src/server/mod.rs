//! HTTP server: listing page with "load more", post pages with revalidation

mod detail;
mod listing;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use detail::{DetailCache, Lookup};
pub use listing::{Claim, ListingStore};

use crate::config::SiteConfig;
use crate::content::{load_more, PaginationState, PostDetail};
use crate::helpers::{listing_path, load_more_path};
use crate::prismic::{ContentApi, FetchError};
use crate::templates::TemplateRenderer;
use crate::Blog;

/// Seconds between refreshes of the loading page
const LOADING_REFRESH_SECS: u64 = 1;

/// Errors surfaced by request handlers
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("post not found: {0}")]
    NotFound(String),

    #[error("listing session not found: {0}")]
    SessionNotFound(String),

    #[error("a page is already loading for this listing")]
    LoadInFlight,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("render failed: {0}")]
    Render(#[from] anyhow::Error),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::NotFound(_) | ServerError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Fetch(FetchError::NotFound(_)) => StatusCode::NOT_FOUND,
            ServerError::LoadInFlight => StatusCode::CONFLICT,
            ServerError::Fetch(_) => StatusCode::BAD_GATEWAY,
            ServerError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Server state
pub struct ServerState<A> {
    pub config: SiteConfig,
    pub api: Arc<A>,
    pub renderer: TemplateRenderer,
    pub listings: ListingStore,
    pub posts: DetailCache,
}

impl<A: ContentApi> ServerState<A> {
    pub fn new(config: SiteConfig, api: Arc<A>) -> Result<Self> {
        let renderer = TemplateRenderer::new(&config)?;
        let listings = ListingStore::new(config.max_sessions);
        let posts = DetailCache::new(
            Duration::from_secs(config.revalidate_secs),
            config.max_cached_pages,
        );
        Ok(Self {
            config,
            api,
            renderer,
            listings,
            posts,
        })
    }

    fn error_response(&self, err: &ServerError) -> Response {
        let status = err.status();
        if status.is_server_error() {
            tracing::error!("{}", err);
        } else {
            tracing::debug!("{}", err);
        }

        let message = match err {
            ServerError::NotFound(_) | ServerError::Fetch(FetchError::NotFound(_)) => {
                "Post não encontrado.".to_string()
            }
            other => other.to_string(),
        };
        match self.renderer.render_error(status.as_u16(), &message) {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                tracing::error!("Failed to render error page: {}", e);
                (status, message).into_response()
            }
        }
    }

    fn render_listing(&self, id: &str, state: &PaginationState) -> Result<String, ServerError> {
        Ok(self
            .renderer
            .render_listing(state, Some(&load_more_path(id)))?)
    }

    /// Fetch and render one post page
    pub async fn generate_post(&self, slug: &str) -> Result<String, ServerError> {
        let doc = self.api.get_by_uid(slug).await.map_err(|e| match e {
            FetchError::NotFound(uid) => ServerError::NotFound(uid),
            other => ServerError::Fetch(other),
        })?;
        let post = PostDetail::from(doc);
        Ok(self.renderer.render_post(&post)?)
    }

    /// Generate the first `prebuild_count` posts ahead of any request
    pub async fn prebuild(&self) -> Result<usize, ServerError> {
        if self.config.prebuild_count == 0 {
            return Ok(0);
        }
        let page = self.api.query_posts(self.config.prebuild_count).await?;
        let mut built = 0;
        for doc in page.results {
            let Some(uid) = doc.uid.clone() else {
                continue;
            };
            let post = PostDetail::from(doc);
            let html = self.renderer.render_post(&post)?;
            self.posts.store(&uid, html).await;
            built += 1;
        }
        Ok(built)
    }
}

/// Start the server
pub async fn start(blog: &Blog, ip: &str, port: u16, open: bool) -> Result<()> {
    let state = Arc::new(ServerState::new(blog.config.clone(), Arc::new(blog.api.clone()))?);

    let built = state.prebuild().await?;
    tracing::info!("Prebuilt {} post pages", built);

    let app = router(state, blog.static_dir.clone());

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    // Open browser if requested
    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router
pub fn router<A: ContentApi>(state: Arc<ServerState<A>>, static_dir: PathBuf) -> Router {
    Router::new()
        .route("/", get(index_handler::<A>))
        .route("/more/:id", post(load_more_handler::<A>))
        .route("/post/:slug", get(post_handler::<A>))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(not_found_handler::<A>)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ListingQuery {
    session: Option<String>,
}

/// Listing page. Without a known session a new listing starts from the
/// first page.
async fn index_handler<A: ContentApi>(
    State(state): State<Arc<ServerState<A>>>,
    Query(query): Query<ListingQuery>,
) -> Response {
    if let Some(id) = query.session.as_deref() {
        if let Some(listing) = state.listings.get(id).await {
            return match state.render_listing(id, &listing) {
                Ok(html) => Html(html).into_response(),
                Err(e) => state.error_response(&e),
            };
        }
        tracing::debug!("Unknown listing session {}, starting over", id);
    }

    let result: Result<String, ServerError> = async {
        let page = state.api.query_posts(state.config.page_size).await?;
        let listing = PaginationState::from_page(page);
        let id = state.listings.create(listing.clone()).await;
        state.render_listing(&id, &listing)
    }
    .await;

    match result {
        Ok(html) => Html(html).into_response(),
        Err(e) => state.error_response(&e),
    }
}

/// One guarded "load more". A failed fetch leaves the listing as it was and
/// still redirects back to it.
async fn load_more_handler<A: ContentApi>(
    State(state): State<Arc<ServerState<A>>>,
    Path(id): Path<String>,
) -> Response {
    let claim = match state.listings.begin_load(&id).await {
        Ok(claim) => claim,
        Err(e) => return state.error_response(&e),
    };

    match claim {
        Claim::InFlight => return state.error_response(&ServerError::LoadInFlight),
        Claim::Exhausted => tracing::debug!("Listing {} has no next page", id),
        Claim::Ready(snapshot) => {
            let loaded = load_more(&snapshot, state.api.as_ref()).await;
            match state.listings.finish_load(&id, loaded).await {
                Ok(count) => tracing::debug!("Listing {} grew by {} posts", id, count),
                Err(e) => tracing::warn!("Load more failed for listing {}: {}", id, e),
            }
        }
    }

    Redirect::to(&listing_path(&id)).into_response()
}

async fn post_handler<A: ContentApi>(
    State(state): State<Arc<ServerState<A>>>,
    Path(slug): Path<String>,
) -> Response {
    match state.posts.lookup(&slug).await {
        Lookup::Fresh(html) => Html(html).into_response(),
        Lookup::Stale(html) => {
            tracing::debug!("Revalidating post {}", slug);
            spawn_generation(state.clone(), slug);
            Html(html).into_response()
        }
        Lookup::Miss => {
            spawn_generation(state.clone(), slug);
            loading_response(&state)
        }
        Lookup::Pending => loading_response(&state),
        Lookup::Failed(e) => state.error_response(&e),
    }
}

async fn not_found_handler<A: ContentApi>(State(state): State<Arc<ServerState<A>>>) -> Response {
    let err = ServerError::NotFound("page".to_string());
    state.error_response(&err)
}

fn spawn_generation<A: ContentApi>(state: Arc<ServerState<A>>, slug: String) {
    tokio::spawn(async move {
        match state.generate_post(&slug).await {
            Ok(html) => {
                tracing::info!("Generated post page {}", slug);
                state.posts.store(&slug, html).await;
            }
            Err(e) => {
                tracing::warn!("Generating post page {} failed: {}", slug, e);
                state.posts.fail(&slug, e).await;
            }
        }
    });
}

fn loading_response<A: ContentApi>(state: &ServerState<A>) -> Response {
    match state.renderer.render_loading(LOADING_REFRESH_SECS) {
        Ok(html) => Html(html).into_response(),
        Err(e) => state.error_response(&ServerError::Render(e)),
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
