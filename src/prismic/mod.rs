//! Headless content API access
//!
//! The rest of the crate only talks to the [`ContentApi`] trait. The
//! production implementation is [`PrismicClient`], which speaks the Prismic
//! REST API v2. Tests plug in in-memory implementations.

mod client;
pub mod response;

use std::future::Future;
use thiserror::Error;

pub use client::PrismicClient;
pub use response::{ApiRoot, Document, SearchResponse};

/// Errors produced while talking to the content API
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no master ref published by {0}")]
    NoMasterRef(String),

    #[error("document not found: {0}")]
    NotFound(String),
}

/// Read-only access to the post documents of a content repository.
///
/// The client is constructed once and passed to whatever needs it; there is
/// no process-wide instance.
pub trait ContentApi: Send + Sync + 'static {
    /// First page of posts, at most `page_size` documents
    fn query_posts(
        &self,
        page_size: usize,
    ) -> impl Future<Output = Result<SearchResponse, FetchError>> + Send;

    /// Dereference an opaque `next_page` locator
    fn fetch_page(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<SearchResponse, FetchError>> + Send;

    /// Single post looked up by its uid (slug)
    fn get_by_uid(&self, uid: &str)
        -> impl Future<Output = Result<Document, FetchError>> + Send;
}
