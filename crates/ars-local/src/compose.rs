//! Composite anti-score and reason strings.
//!
//! Policy: bounded. `antiScore = clamp(50 + 3p − 2s − 2a − 3b − rankPenalty, 0, 100)`
//! with `rankPenalty = max(0, rank_cap − rank)`. The same formula is used for
//! fetched, unfetched and local-mode results so one ranking pass never mixes
//! scales.

use crate::signals::AD_POINTS_PER_MATCH;
use ars_core::{RankedResult, ScoreBreakdown, SearchResult};

pub const DEFAULT_RANK_CAP: u32 = 10;
/// Neutral midpoint of the bounded score.
pub const ANTI_BASE: f64 = 50.0;
pub const ANTI_MIN: f64 = 0.0;
pub const ANTI_MAX: f64 = 100.0;

const PERSONAL_WEIGHT: f64 = 3.0;
const SEO_WEIGHT: f64 = 2.0;
const AD_WEIGHT: f64 = 2.0;
const BRAND_WEIGHT: f64 = 3.0;

const PERSONAL_FLAG_ABOVE: f64 = 3.0;
const SEO_LOW_BELOW: f64 = 2.0;
const SEO_HIGH_ABOVE: f64 = 5.0;
const BRAND_MAJOR_AT: f64 = 2.0;

/// Whether page markup was available when the result was scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// Fetch attempted; failures count as empty markup.
    Fetched,
    /// Beyond the fetch window of a full pass.
    OutsideFetchWindow,
    /// Fetcher skipped for the whole pass.
    LocalMode,
}

/// Raw per-result signals, before weighting.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreInputs {
    pub personal: f64,
    pub seo: f64,
    pub ad: f64,
    pub brand: f64,
    pub rank: u32,
}

pub fn rank_penalty(rank: u32, rank_cap: u32) -> f64 {
    f64::from(rank_cap.saturating_sub(rank))
}

pub fn anti_score(inputs: &ScoreInputs, rank_penalty: f64) -> f64 {
    let raw = ANTI_BASE + inputs.personal * PERSONAL_WEIGHT
        - inputs.seo * SEO_WEIGHT
        - inputs.ad * AD_WEIGHT
        - inputs.brand * BRAND_WEIGHT
        - rank_penalty;
    raw.clamp(ANTI_MIN, ANTI_MAX)
}

/// Ordered reasons: personal flag, SEO density, affiliate links, domain character,
/// search rank. Consumers rely on this order.
pub fn reasons(inputs: &ScoreInputs, page: PageState) -> Vec<String> {
    let mut out = Vec::with_capacity(5);
    if inputs.personal > PERSONAL_FLAG_ABOVE {
        out.push(format!("first-person language: frequent ({:.1})", inputs.personal));
    }
    if inputs.seo < SEO_LOW_BELOW {
        out.push("SEO vocabulary: low".to_string());
    } else if inputs.seo > SEO_HIGH_ABOVE {
        out.push(format!("SEO vocabulary: heavy ({:.1})", inputs.seo));
    }
    out.push(match page {
        PageState::Fetched => {
            let links = (inputs.ad / AD_POINTS_PER_MATCH).round() as u64;
            format!("affiliate links: {links}")
        }
        PageState::OutsideFetchWindow => "affiliate links: not checked (unfetched)".to_string(),
        PageState::LocalMode => "affiliate links: not checked (unfetched/local mode)".to_string(),
    });
    if inputs.brand < BRAND_MAJOR_AT {
        out.push("domain: independent".to_string());
    } else {
        out.push("domain: likely major brand".to_string());
    }
    out.push(format!("search rank: #{}", inputs.rank));
    out
}

pub fn compose(
    inputs: &ScoreInputs,
    page: PageState,
    rank_cap: u32,
) -> (ScoreBreakdown, Vec<String>) {
    let penalty = rank_penalty(inputs.rank, rank_cap);
    let breakdown = ScoreBreakdown {
        personal_score: inputs.personal,
        seo_score: inputs.seo,
        ad_score: inputs.ad,
        brand_score: inputs.brand,
        rank_penalty: penalty,
        anti_score: anti_score(inputs, penalty),
    };
    (breakdown, reasons(inputs, page))
}

fn to_index(x: f64) -> u8 {
    x.round().clamp(0.0, 100.0) as u8
}

pub fn personal_index(personal: f64) -> u8 {
    to_index(personal * 5.0)
}

pub fn commercial_index(seo: f64, ad: f64, brand: f64) -> u8 {
    to_index((seo + ad + brand) * 3.0)
}

pub fn ranked(
    result: SearchResult,
    inputs: &ScoreInputs,
    page: PageState,
    rank_cap: u32,
) -> RankedResult {
    let (scores, reasons) = compose(inputs, page, rank_cap);
    RankedResult {
        result,
        personal_index: personal_index(inputs.personal),
        commercial_index: commercial_index(inputs.seo, inputs.ad, inputs.brand),
        scores,
        reasons,
    }
}
