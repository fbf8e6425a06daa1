use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder, Response,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    config::AppwriteConfig,
    counter::{PopularityCounter, rank_entries},
    error::{CinefindError, Result},
    types::{Movie, SearchCountRecord, TrendingEntry},
};

#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    documents: Vec<SearchCountRecord>,
}

/// Search counts stored as documents in a hosted Appwrite collection.
pub struct AppwriteCounter {
    client: Client,
    documents_url: String,
    limit: usize,
}

impl AppwriteCounter {
    pub fn new(config: &AppwriteConfig, limit: usize) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-appwrite-project"),
            header_value("APPWRITE_PROJECT_ID", &config.project_id)?,
        );
        if let Some(key) = &config.api_key {
            let mut value = header_value("APPWRITE_API_KEY", key)?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static("x-appwrite-key"), value);
        }

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            documents_url: format!(
                "{}/databases/{}/collections/{}/documents",
                config.endpoint, config.database_id, config.collection_id
            ),
            limit,
        })
    }

    async fn list(&self, queries: &[serde_json::Value]) -> Result<Vec<SearchCountRecord>> {
        let params: Vec<(&str, String)> = queries
            .iter()
            .map(|query| ("queries[]", query.to_string()))
            .collect();

        let response = self
            .client
            .get(&self.documents_url)
            .query(&params)
            .send()
            .await?;
        let response = ensure_success("list documents", response).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice::<DocumentList>(&body)?.documents)
    }

    async fn send(&self, operation: &'static str, request: RequestBuilder) -> Result<()> {
        ensure_success(operation, request.send().await?).await?;
        Ok(())
    }
}

fn header_value(key: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| CinefindError::InvalidConfig {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

async fn ensure_success(operation: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CinefindError::CounterRejected {
        operation,
        reason: format!("{status} {body}"),
    })
}

#[async_trait]
impl PopularityCounter for AppwriteCounter {
    async fn increment_search_count(&self, query: &str, movie: &Movie) -> Result<()> {
        let existing = self
            .list(&[json!({
                "method": "equal",
                "attribute": "searchTerm",
                "values": [query],
            })])
            .await?;

        match existing.into_iter().next() {
            Some(SearchCountRecord {
                id: Some(id),
                count,
                ..
            }) => {
                let request = self
                    .client
                    .patch(format!("{}/{}", self.documents_url, id))
                    .json(&json!({ "data": { "count": count + 1 } }));
                self.send("update document", request).await?;
                tracing::debug!(query, count = count + 1, "Search count updated");
            }
            Some(_) => {
                return Err(CinefindError::CounterRejected {
                    operation: "list documents",
                    reason: "document without $id".to_string(),
                });
            }
            None => {
                let request = self.client.post(&self.documents_url).json(&json!({
                    "documentId": uuid::Uuid::new_v4().simple().to_string(),
                    "data": SearchCountRecord::first_search(query, movie),
                }));
                self.send("create document", request).await?;
                tracing::debug!(query, movie_id = movie.id, "Search count created");
            }
        }

        Ok(())
    }

    async fn trending(&self) -> Result<Vec<TrendingEntry>> {
        let records = self
            .list(&[
                json!({ "method": "limit", "values": [self.limit] }),
                json!({ "method": "orderDesc", "attribute": "count" }),
            ])
            .await?;
        Ok(rank_entries(records, self.limit))
    }
}
