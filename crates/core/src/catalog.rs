use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue},
};

use crate::{
    config::TmdbConfig,
    error::{CinefindError, Result},
    types::MoviePage,
};

/// The two listing shapes the catalog is asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogRequest {
    SearchText { query: String },
    DiscoverPopular,
}

impl CatalogRequest {
    /// An empty query browses popular titles instead of searching.
    pub fn for_query(query: &str) -> Self {
        if query.is_empty() {
            CatalogRequest::DiscoverPopular
        } else {
            CatalogRequest::SearchText {
                query: query.to_string(),
            }
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            CatalogRequest::SearchText { .. } => "/search/movie",
            CatalogRequest::DiscoverPopular => "/discover/movie",
        }
    }

    fn params(&self) -> [(&'static str, &str); 1] {
        match self {
            CatalogRequest::SearchText { query } => [("query", query.as_str())],
            CatalogRequest::DiscoverPopular => [("sort_by", "popularity.desc")],
        }
    }
}

#[async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Transport failures and non-success statuses come back as errors; a
    /// well-formed body is returned as-is, failure sentinel included.
    async fn fetch(&self, request: &CatalogRequest) -> Result<MoviePage>;
}

pub struct TmdbClient {
    client: Client,
    base_url: String,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        match HeaderValue::from_str(&format!("Bearer {}", config.api_key)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            // Sent without credentials; the catalog answers 401.
            Err(_) => tracing::warn!("TMDB_API_KEY contains characters not allowed in a header"),
        }

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl MovieCatalog for TmdbClient {
    async fn fetch(&self, request: &CatalogRequest) -> Result<MoviePage> {
        let endpoint = request.path();
        tracing::debug!(endpoint, ?request, "Fetching movies");

        let response = self
            .client
            .get(format!("{}{}", self.base_url, endpoint))
            .query(&request.params())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CinefindError::Status {
                endpoint: endpoint.to_string(),
                status,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
