use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::models::SearchHit;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Ranked web search restricted by a `site:` clause in the query.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError>;
}

// ── SerpApi ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    link: Option<String>,
    title: Option<String>,
    snippet: Option<String>,
}

pub struct SerpApiClient {
    inner: reqwest::Client,
    endpoint: Url,
    engine: String,
    api_key: String,
}

impl SerpApiClient {
    pub fn new(config: &SearchConfig, api_key: impl Into<String>) -> Result<Self, SearchError> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| SearchError::InvalidEndpoint {
            endpoint: config.endpoint.clone(),
            reason: e.to_string(),
        })?;

        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .build()?;

        Ok(Self {
            inner,
            endpoint,
            engine: config.engine.clone(),
            api_key: api_key.into(),
        })
    }

    /// `None` when no credential is configured.
    pub fn from_config(config: &SearchConfig) -> Result<Option<Self>, SearchError> {
        match config.api_key.as_deref() {
            Some(key) => Self::new(config, key).map(Some),
            None => Ok(None),
        }
    }

    fn request_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("engine", &self.engine)
            .append_pair("q", query)
            .append_pair("api_key", &self.api_key);
        url
    }
}

#[async_trait]
impl SearchIndex for SerpApiClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        debug!("Search index query: {:?}", query);

        let resp = self.inner.get(self.request_url(query)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SearchError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body: SerpResponse = resp.json().await?;
        if let Some(err) = body.error {
            return Err(SearchError::Provider(err));
        }

        let hits: Vec<SearchHit> = body
            .organic_results
            .into_iter()
            .filter_map(|r| {
                let url = r.link.filter(|l| !l.trim().is_empty())?;
                Some(SearchHit {
                    url: url.trim().to_string(),
                    title: r.title,
                    snippet: r.snippet,
                })
            })
            .collect();

        debug!("Search index returned {} results", hits.len());
        Ok(hits)
    }
}
