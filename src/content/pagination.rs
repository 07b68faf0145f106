//! Incremental "load more" pagination
//!
//! A [`PaginationState`] holds the posts shown so far and the opaque locator
//! of the next page. [`load_more`] fetches that page and appends its posts.
//! The state is rebuilt only after the whole page was fetched and
//! transformed, so a failed fetch never leaves a half-updated listing.

use serde::Serialize;

use super::post::PostSummary;
use crate::prismic::{ContentApi, FetchError, SearchResponse};

/// Posts listed so far plus the locator of the next page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PaginationState {
    /// Append-only; duplicates are kept if the CMS returns a post twice
    pub items: Vec<PostSummary>,

    /// `None` once the last page was loaded
    pub next_page: Option<String>,

    /// Set while a fetch for `next_page` is outstanding
    pub in_flight: bool,
}

impl PaginationState {
    /// State for the first page of a listing
    pub fn from_page(page: SearchResponse) -> Self {
        Self {
            items: page.results.into_iter().map(PostSummary::from).collect(),
            next_page: page.next_page,
            in_flight: false,
        }
    }

    /// Whether the "load more" control should be offered
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// Claim the next page for loading.
    ///
    /// Marks the state in flight and returns a snapshot to hand to
    /// [`load_more`]. Returns `None` when there is nothing left to load or
    /// another load already holds the claim.
    pub fn begin_load(&mut self) -> Option<PaginationState> {
        if self.in_flight || !self.has_more() {
            return None;
        }
        let snapshot = self.clone();
        self.in_flight = true;
        Some(snapshot)
    }

    /// Release the claim taken by [`begin_load`](Self::begin_load), committing
    /// the loaded state on success. Returns the number of appended posts.
    pub fn finish_load(
        &mut self,
        loaded: Result<PaginationState, FetchError>,
    ) -> Result<usize, FetchError> {
        self.in_flight = false;
        let loaded = loaded?;
        let appended = loaded.items.len().saturating_sub(self.items.len());
        self.items = loaded.items;
        self.next_page = loaded.next_page;
        Ok(appended)
    }

    fn append(&mut self, page: SearchResponse) {
        self.items
            .extend(page.results.into_iter().map(PostSummary::from));
        self.next_page = page.next_page;
    }
}

/// Fetch the page after `state` and return the extended state.
///
/// With no next page this is a no-op that returns the state unchanged
/// without touching the network. On failure the error is returned and
/// `state` is left as it was.
pub async fn load_more<A: ContentApi>(
    state: &PaginationState,
    api: &A,
) -> Result<PaginationState, FetchError> {
    let Some(url) = state.next_page.as_deref() else {
        tracing::debug!("No next page, load more ignored");
        return Ok(state.clone());
    };

    let page = api.fetch_page(url).await?;
    tracing::debug!(
        "Fetched {} posts, next page: {:?}",
        page.results.len(),
        page.next_page
    );

    let mut next = state.clone();
    next.append(page);
    Ok(next)
}

/// Follow `next_page` until the listing is exhausted
pub async fn load_all<A: ContentApi>(
    mut state: PaginationState,
    api: &A,
) -> Result<PaginationState, FetchError> {
    while state.has_more() {
        state = load_more(&state, api).await?;
    }
    Ok(state)
}
