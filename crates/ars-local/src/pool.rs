//! Bounded page fetching.
//!
//! A fixed number of workers drain one FIFO queue; every input URL gets an
//! entry in the output map, empty when the fetch timed out, failed or returned a
//! non-success status.

use ars_core::{FetchBackend, FetchRequest};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_MAX_BYTES: u64 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub concurrency: usize,
    pub timeout: Duration,
    pub max_bytes: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

/// Fetch every URL with at most `cfg.concurrency` requests in flight.
///
/// Duplicate URLs are fetched once. Completion order is unspecified; the
/// returned map is keyed by the input URL.
pub async fn fetch_all(
    backend: &dyn FetchBackend,
    urls: &[String],
    cfg: &PoolConfig,
) -> HashMap<String, String> {
    let mut seen = HashSet::new();
    let queue: VecDeque<String> = urls
        .iter()
        .filter(|u| seen.insert(u.as_str()))
        .cloned()
        .collect();
    let total = queue.len();
    if total == 0 {
        return HashMap::new();
    }
    let workers = cfg.concurrency.max(1).min(total);
    let t0 = Instant::now();

    let queue = Mutex::new(queue);
    let pages = Mutex::new(HashMap::with_capacity(total));
    let (queue, pages) = (&queue, &pages);

    let runs = (0..workers).map(move |worker| async move {
        loop {
            let next = queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();
            let Some(url) = next else {
                break;
            };
            let body = fetch_one(backend, &url, cfg).await;
            tracing::trace!(worker, url = %url, bytes = body.len(), "page settled");
            pages
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(url, body);
        }
    });
    futures_util::future::join_all(runs).await;

    let pages = std::mem::take(&mut *pages.lock().unwrap_or_else(PoisonError::into_inner));
    let empty = pages.values().filter(|b| b.is_empty()).count();
    tracing::debug!(
        urls = total,
        workers,
        empty,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "fetch batch settled"
    );
    pages
}

async fn fetch_one(backend: &dyn FetchBackend, url: &str, cfg: &PoolConfig) -> String {
    let req = FetchRequest {
        url: url.to_string(),
        timeout_ms: Some(cfg.timeout.as_millis() as u64),
        max_bytes: Some(cfg.max_bytes),
    };
    // The backend is asked to honor the deadline too; this outer bound holds
    // even when it does not.
    let resp = match tokio::time::timeout(cfg.timeout, backend.fetch(&req)).await {
        Err(_) => {
            tracing::debug!(url, timeout_ms = cfg.timeout.as_millis() as u64, "fetch timed out");
            return String::new();
        }
        Ok(Err(e)) => {
            tracing::debug!(url, error = %e, "fetch failed");
            return String::new();
        }
        Ok(Ok(resp)) => resp,
    };
    if !resp.is_success() {
        tracing::debug!(url, status = resp.status, "fetch returned non-success status");
        return String::new();
    }
    let mut bytes = resp.bytes;
    bytes.truncate(cfg.max_bytes as usize);
    String::from_utf8_lossy(&bytes).into_owned()
}
