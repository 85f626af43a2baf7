use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::types::SearchResponse;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no search results")]
    NotFound,
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("search API returned {status}: {body}")]
    Api { status: u16, body: String },
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Link of the top-ranked result for `query`.
    async fn search_first_link(&self, query: &str) -> Result<String, SearchError>;
}

/// Google Programmable Search (Custom Search JSON API) client.
pub struct CustomSearchClient {
    client: Client,
    endpoint: String,
    api_key: String,
    engine_id: String,
    topic: String,
}

impl CustomSearchClient {
    pub fn new(config: &Config) -> Result<Self, SearchError> {
        let client = Client::builder().timeout(config.search_timeout).build()?;

        Ok(Self {
            client,
            endpoint: config.search_endpoint.clone(),
            api_key: config.search_api_key.clone(),
            engine_id: config.search_engine_id.clone(),
            topic: config.search_topic.clone(),
        })
    }
}

#[async_trait]
impl SearchProvider for CustomSearchClient {
    async fn search_first_link(&self, query: &str) -> Result<String, SearchError> {
        let q = topic_query(&self.topic, query);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", q.as_str()),
                ("start", "1"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await?;
            return Err(SearchError::Api { status, body });
        }

        let data: SearchResponse = response.json().await?;
        first_link(data)
    }
}

/// Scope a user query to the configured topic.
pub fn topic_query(topic: &str, query: &str) -> String {
    let query = query.trim();
    if topic.is_empty() {
        query.to_string()
    } else {
        format!("{} {}", topic, query)
    }
}

fn first_link(data: SearchResponse) -> Result<String, SearchError> {
    let item = data.items.into_iter().next().ok_or(SearchError::NotFound)?;
    debug!(title = %item.title, link = %item.link, "search_top_result");
    Ok(item.link)
}
