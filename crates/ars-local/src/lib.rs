use ars_core::{Error, FetchBackend, FetchRequest, FetchResponse, Result};
use regex::Regex;
use std::time::Duration;

pub mod compose;
pub mod config;
pub mod domain;
pub mod extract;
pub mod lexical;
pub mod pipeline;
pub mod pool;
pub mod signals;

pub use config::{ConfigStore, EngineSnapshot, RankConfig};
pub use domain::Blacklist;
pub use pipeline::{rank_locally, rank_with_fallback, RankingPipeline};

/// Identifies the fetcher to origin servers as a compatible crawler.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; ARS/1.0)";

/// Compile a static pattern table. Literal tables are covered by tests that
/// assert nothing was dropped.
pub(crate) fn compile_patterns(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().filter_map(|p| Regex::new(p).ok()).collect()
}

/// reqwest-backed page fetcher with a streaming body cap.
#[derive(Debug, Clone)]
pub struct LocalFetcher {
    client: reqwest::Client,
}

impl LocalFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            // Upper bound for any request; per-request timeouts (FetchRequest.timeout_ms)
            // are normally much shorter.
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl FetchBackend for LocalFetcher {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse> {
        let url = url::Url::parse(&req.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "unsupported scheme: {}",
                url.scheme()
            )));
        }

        let mut rb = self.client.get(url);
        if let Some(to) = req.timeout() {
            rb = rb.timeout(to);
        }
        let resp = rb.send().await.map_err(|e| Error::Fetch(e.to_string()))?;
        let final_url = resp.url().to_string();
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let max_bytes = req.max_bytes.unwrap_or(u64::MAX) as usize;
        let mut truncated = false;
        let mut bytes = Vec::new();
        let mut stream = resp.bytes_stream();
        use futures_util::StreamExt;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Fetch(e.to_string()))?;
            if bytes.len().saturating_add(chunk.len()) > max_bytes {
                let can_take = max_bytes.saturating_sub(bytes.len());
                bytes.extend_from_slice(&chunk[..can_take]);
                truncated = true;
                break;
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(FetchResponse {
            url: req.url.clone(),
            final_url,
            status,
            content_type,
            bytes,
            truncated,
        })
    }
}
