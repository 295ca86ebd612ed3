//! Web search tool backed by the Serper API
//!
//! Requests are rate limited with `governor` and answers are cached for a
//! short time so that coworkers repeating the same query during one run do
//! not hit the API twice.

use crate::Tool;
use async_trait::async_trait;
use cached::{Cached, TimedCache};
use crew_core::{Error, Result};
use crew_llm::tools::schema;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const TOOL_NAME: &str = "search_the_internet";
const DEFAULT_BASE_URL: &str = "https://google.serper.dev";

/// Configuration for [`WebSearchTool`]
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Serper API key
    pub api_key: String,
    /// API base URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Requests allowed per minute
    pub rate_limit_per_minute: u32,
    /// Results returned when the caller does not ask for a number
    pub default_num_results: usize,
    /// How long a query's results are reused
    pub cache_ttl: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            rate_limit_per_minute: 60,
            default_num_results: 10,
            cache_ttl: Duration::from_secs(300),
        }
    }
}

impl SearchConfig {
    /// Config with the given API key and defaults for everything else
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_rate_limit(mut self, per_minute: u32) -> Self {
        self.rate_limit_per_minute = per_minute;
        self
    }

    pub fn with_default_num_results(mut self, n: usize) -> Self {
        self.default_num_results = n;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

/// One organic search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub position: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SearchResult>,
}

/// Web search tool exposed to agents as `search_the_internet`
pub struct WebSearchTool {
    client: Client,
    config: SearchConfig,
    rate_limiter: SharedRateLimiter,
    cache: Mutex<TimedCache<(String, usize), Vec<SearchResult>>>,
}

impl WebSearchTool {
    /// Create a search tool with custom configuration
    pub fn new(config: SearchConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::Configuration(
                "Search API key must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::InitializationFailed(format!("HTTP client: {e}")))?;

        let per_minute = NonZeroU32::new(config.rate_limit_per_minute).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));
        let cache = Mutex::new(TimedCache::with_lifespan(config.cache_ttl));

        Ok(Self {
            client,
            config,
            rate_limiter,
            cache,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run a query, serving repeated queries from the cache
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>> {
        let key = (query.to_string(), num_results);
        if let Some(hit) = self.cache.lock().await.cache_get(&key).cloned() {
            debug!(query, "Search cache hit");
            return Ok(hit);
        }

        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .post(format!("{}/search", self.config.base_url))
            .header("X-API-KEY", &self.config.api_key)
            .json(&json!({ "q": query, "num": num_results }))
            .send()
            .await
            .map_err(|e| Error::unavailable(TOOL_NAME, format!("Search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("Search API error {status}: {body}");
            return Err(if status.is_server_error() {
                Error::unavailable(TOOL_NAME, message)
            } else {
                Error::tool(TOOL_NAME, message)
            });
        }

        let parsed: SerperResponse = response
            .json()
            .await
            .map_err(|e| Error::tool(TOOL_NAME, format!("Failed to parse search response: {e}")))?;

        let mut results = parsed.organic;
        results.truncate(num_results);
        info!(query, results = results.len(), "Search completed");

        self.cache.lock().await.cache_set(key, results.clone());
        Ok(results)
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let query = params
            .get("search_query")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| Error::tool(TOOL_NAME, "Missing required parameter 'search_query'"))?;

        let num_results = params
            .get("n_results")
            .and_then(Value::as_u64)
            .map_or(self.config.default_num_results, |n| n as usize);

        let results = self.search(query, num_results).await?;
        Ok(json!({ "query": query, "results": results }))
    }

    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Search the internet for a query and return the top results with title, link and snippet."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "search_query": schema::string("Query to search the internet with"),
                "n_results": schema::integer("Number of results to return"),
            }),
            &["search_query"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> WebSearchTool {
        WebSearchTool::new(
            SearchConfig::new("test-key")
                .with_base_url("http://127.0.0.1:9")
                .with_timeout(2),
        )
        .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = SearchConfig::new("k");
        assert_eq!(config.base_url, "https://google.serper.dev");
        assert_eq!(config.default_num_results, 10);
        assert_eq!(config.rate_limit_per_minute, 60);
    }

    #[test]
    fn test_empty_key_rejected() {
        let err = WebSearchTool::new(SearchConfig::new("  ")).err().unwrap();
        assert_eq!(err.kind(), crew_core::ErrorKind::Configuration);
    }

    #[test]
    fn test_tool_metadata() {
        let tool = tool();
        assert_eq!(tool.name(), "search_the_internet");
        assert_eq!(tool.input_schema()["required"][0], "search_query");
        assert_eq!(tool.definition().name, "search_the_internet");
    }

    #[tokio::test]
    async fn test_missing_query() {
        let err = tool().execute(json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Tool { .. }));
        assert!(err.to_string().contains("search_query"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_unavailable() {
        let err = tool()
            .execute(json!({"search_query": "AI LLMs"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unavailable { .. }));
        assert_eq!(err.kind(), crew_core::ErrorKind::Tool);
        assert!(
            err.to_string()
                .starts_with("Tool 'search_the_internet' is unavailable: Search request failed")
        );
    }

    #[test]
    fn test_parse_serper_response() {
        let raw = json!({
            "searchParameters": {"q": "AI LLMs"},
            "organic": [
                {"title": "OpenAI", "link": "https://openai.com", "snippet": "LLMs", "position": 1},
                {"title": "Anthropic", "link": "https://anthropic.com", "position": 2}
            ]
        });
        let parsed: SerperResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.organic.len(), 2);
        assert_eq!(parsed.organic[1].snippet, "");
    }
}
