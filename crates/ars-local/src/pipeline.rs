//! Ranking pipeline: filter, fetch, score, sort, truncate.
//!
//! One pass runs `Idle → Filtering → Fetching → Scoring → Sorted → Done` against
//! a single configuration snapshot. Scoring starts only after the whole fetch
//! batch has settled.

use crate::compose::{self, PageState, ScoreInputs};
use crate::config::{ConfigStore, EngineSnapshot};
use crate::domain::{self, Blacklist};
use crate::{extract, lexical, pool, signals};
use ars_core::{
    AnalysisMode, AnalyzeRequest, Analyzer, Error, FetchBackend, RankedResult, Ranking, Result,
    SearchResult,
};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Filtering,
    Fetching,
    Scoring,
    Sorted,
    Done,
}

fn enter(stage: Stage) {
    tracing::debug!(?stage, "ranking stage");
}

/// The full (fetching) analyzer.
pub struct RankingPipeline {
    fetcher: Arc<dyn FetchBackend>,
    store: Arc<ConfigStore>,
}

impl RankingPipeline {
    pub fn new(fetcher: Arc<dyn FetchBackend>, store: Arc<ConfigStore>) -> Self {
        Self { fetcher, store }
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Run one pass. Individual fetch failures only zero out that result's page
    /// signals; this never fails.
    pub async fn run(&self, req: &AnalyzeRequest) -> Ranking {
        let t0 = Instant::now();
        let snap = self.store.snapshot();
        enter(Stage::Idle);

        enter(Stage::Filtering);
        let blacklist = effective_blacklist(&snap, req);
        let (kept, filtered_out) = filter(&req.results, &blacklist);

        enter(Stage::Fetching);
        let window = snap.rank.fetch_window.min(kept.len());
        let urls: Vec<String> = kept[..window].iter().map(|r| r.url.clone()).collect();
        let pages = pool::fetch_all(self.fetcher.as_ref(), &urls, &snap.rank.pool()).await;

        enter(Stage::Scoring);
        let mut ranked: Vec<RankedResult> = kept
            .into_iter()
            .enumerate()
            .map(|(i, result)| {
                let page = if i < window {
                    PageState::Fetched
                } else {
                    PageState::OutsideFetchWindow
                };
                // Duplicates past the window must not borrow the fetched copy's markup.
                let html = match page {
                    PageState::Fetched => pages.get(&result.url).map(String::as_str).unwrap_or(""),
                    _ => "",
                };
                score_one(result, html, page, req, &blacklist, &snap)
            })
            .collect();

        sort_and_truncate(&mut ranked, snap.rank.output_cap);
        enter(Stage::Done);
        tracing::info!(
            inputs = req.results.len(),
            filtered_out,
            fetched = urls.len(),
            returned = ranked.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "ranking pass complete"
        );
        Ranking {
            mode: AnalysisMode::Fetched,
            filtered_out,
            results: ranked,
        }
    }
}

#[async_trait::async_trait]
impl Analyzer for RankingPipeline {
    async fn analyze(&self, req: &AnalyzeRequest) -> Result<Ranking> {
        if !self.store.snapshot().settings.ars_enabled {
            return Err(Error::NotConfigured("ranking is disabled".to_string()));
        }
        Ok(self.run(req).await)
    }
}

/// Local-only variant: blacklist filtering and URL/text signals, no fetcher.
/// Affiliate score is always 0.
pub fn rank_locally(req: &AnalyzeRequest, snap: &EngineSnapshot) -> Ranking {
    let blacklist = effective_blacklist(snap, req);
    let (kept, filtered_out) = filter(&req.results, &blacklist);
    let mut ranked: Vec<RankedResult> = kept
        .into_iter()
        .map(|result| score_one(result, "", PageState::LocalMode, req, &blacklist, snap))
        .collect();
    sort_and_truncate(&mut ranked, snap.rank.output_cap);
    Ranking {
        mode: AnalysisMode::Local,
        filtered_out,
        results: ranked,
    }
}

/// Ask `primary` for a ranking; answer locally when it is absent, fails, or
/// comes back empty for input that was not entirely blacklisted.
///
/// `None` means ranking is disabled and the caller should show results as-is.
pub async fn rank_with_fallback(
    primary: Option<&dyn Analyzer>,
    req: &AnalyzeRequest,
    snap: &EngineSnapshot,
) -> Option<Ranking> {
    if !snap.settings.ars_enabled {
        tracing::debug!("ranking disabled; passing results through");
        return None;
    }
    let Some(primary) = primary else {
        return Some(rank_locally(req, snap));
    };
    match primary.analyze(req).await {
        Ok(r)
            if snap.rank.output_cap > 0
                && r.results.is_empty()
                && r.filtered_out < req.results.len() =>
        {
            tracing::warn!(
                inputs = req.results.len(),
                "analysis returned nothing; using local ranking"
            );
            Some(rank_locally(req, snap))
        }
        Ok(r) => Some(r),
        Err(e) => {
            tracing::warn!(error = %e, "analysis unavailable; using local ranking");
            Some(rank_locally(req, snap))
        }
    }
}

fn effective_blacklist<'a>(snap: &'a EngineSnapshot, req: &AnalyzeRequest) -> Cow<'a, Blacklist> {
    if req.custom_blacklist.is_empty() {
        Cow::Borrowed(&snap.blacklist)
    } else {
        Cow::Owned(snap.blacklist.with_additions(&req.custom_blacklist))
    }
}

fn filter(results: &[SearchResult], blacklist: &Blacklist) -> (Vec<SearchResult>, usize) {
    let kept: Vec<SearchResult> = results
        .iter()
        .filter(|r| !domain::is_blacklisted(&r.url, blacklist))
        .cloned()
        .collect();
    let dropped = results.len() - kept.len();
    (kept, dropped)
}

fn score_one(
    result: SearchResult,
    html: &str,
    page: PageState,
    req: &AnalyzeRequest,
    blacklist: &Blacklist,
    snap: &EngineSnapshot,
) -> RankedResult {
    let mut text = format!("{} {}", result.snippet, result.title);
    if page == PageState::Fetched && snap.rank.score_page_text {
        let body = extract::visible_text(html);
        if !body.is_empty() {
            text.push(' ');
            text.push_str(&body);
        }
    }
    let ad = match page {
        PageState::Fetched => signals::ad_score(html),
        PageState::OutsideFetchWindow | PageState::LocalMode => 0.0,
    };
    let inputs = ScoreInputs {
        personal: lexical::personal_score(&text),
        seo: lexical::seo_score(&text, req.strength),
        ad,
        brand: domain::brand_affinity(&result.url, blacklist) + signals::trust_signals(html),
        rank: result.rank,
    };
    compose::ranked(result, &inputs, page, snap.rank.rank_cap)
}

/// Stable: equal anti-scores keep their input order.
fn sort_and_truncate(ranked: &mut Vec<RankedResult>, output_cap: usize) {
    ranked.sort_by(|a, b| b.scores.anti_score.total_cmp(&a.scores.anti_score));
    enter(Stage::Sorted);
    ranked.truncate(output_cap);
}
