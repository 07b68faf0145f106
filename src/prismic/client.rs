//! Prismic REST API v2 client

use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::response::{ApiRoot, Document, SearchResponse};
use super::{ContentApi, FetchError};
use crate::config::SiteConfig;

/// HTTP client bound to one content repository
#[derive(Debug, Clone)]
pub struct PrismicClient {
    endpoint: String,
    access_token: Option<String>,
    document_type: String,
    client: Client,
}

impl PrismicClient {
    /// Build a client from the site configuration
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::ClientBuilder::new()
            .default_headers(headers)
            .user_agent(concat!("cms-blog/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            endpoint: config.api_endpoint.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            document_type: config.document_type.clone(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }

    fn token_query(&self) -> Vec<(&'static str, String)> {
        self.access_token
            .iter()
            .map(|t| ("access_token", t.clone()))
            .collect()
    }

    async fn master_ref(&self) -> Result<String, FetchError> {
        let root: ApiRoot = self.get_json(&self.endpoint, &self.token_query()).await?;
        root.master_ref()
            .map(str::to_string)
            .ok_or_else(|| FetchError::NoMasterRef(self.endpoint.clone()))
    }

    async fn search(&self, predicate: String, page_size: usize) -> Result<SearchResponse, FetchError> {
        let reference = self.master_ref().await?;
        let url = format!("{}/documents/search", self.endpoint);

        let mut query = vec![
            ("ref", reference),
            ("q", predicate),
            ("pageSize", page_size.to_string()),
        ];
        query.extend(self.token_query());

        tracing::debug!("Querying {} with {:?}", url, query);
        self.get_json(&url, &query).await
    }
}

impl ContentApi for PrismicClient {
    async fn query_posts(&self, page_size: usize) -> Result<SearchResponse, FetchError> {
        self.search(type_predicate(&self.document_type), page_size)
            .await
    }

    async fn fetch_page(&self, url: &str) -> Result<SearchResponse, FetchError> {
        // The locator already carries ref, page and token.
        tracing::debug!("Fetching next page {}", url);
        self.get_json(url, &[]).await
    }

    async fn get_by_uid(&self, uid: &str) -> Result<Document, FetchError> {
        let page = self
            .search(uid_predicate(&self.document_type, uid), 1)
            .await?;
        page.results
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::NotFound(uid.to_string()))
    }
}

fn type_predicate(document_type: &str) -> String {
    format!(r#"[[at(document.type,"{}")]]"#, escape_quotes(document_type))
}

fn uid_predicate(document_type: &str, uid: &str) -> String {
    format!(
        r#"[[at(my.{}.uid,"{}")]]"#,
        document_type,
        escape_quotes(uid)
    )
}

fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
