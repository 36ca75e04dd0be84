//! Weighted vocabulary scoring.
//!
//! Matching is a plain case-insensitive substring count per term: every
//! non-overlapping occurrence adds `weight`. Terms nested in longer terms
//! ("公式" inside "公式サイト") are counted by both entries.

use ars_core::Strength;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedTerm {
    pub term: &'static str,
    pub weight: f64,
}

const fn wt(term: &'static str, weight: f64) -> WeightedTerm {
    WeightedTerm { term, weight }
}

/// Ceiling on the personal score so one chatty page cannot dominate.
pub const PERSONAL_CAP: f64 = 20.0;

/// Listicle, ranking and "official" vocabulary.
pub const SEO_TERMS: &[WeightedTerm] = &[
    wt("おすすめ", 2.0),
    wt("ランキング", 2.0),
    wt("比較", 1.5),
    wt("最新", 1.0),
    wt("徹底", 1.5),
    wt("まとめ", 2.0),
    wt("厳選", 1.5),
    wt("人気", 1.0),
    wt("口コミ", 1.5),
    wt("レビュー", 1.0),
    wt("評判", 1.0),
    wt("必見", 1.5),
    wt("完全ガイド", 2.0),
    wt("保存版", 1.5),
    wt("決定版", 2.0),
    wt("〇選", 2.0),
    wt("選", 0.5),
    // official / corporate voice weighs heavily
    wt("公式サイト", 5.0),
    wt("公式ページ", 5.0),
    wt("公式ショップ", 5.0),
    wt("公式ストア", 5.0),
    wt("公式ブログ", 3.0),
    wt("公式", 3.0),
    wt("オフィシャル", 4.0),
    wt("official", 4.0),
    wt("公式通販", 5.0),
];

/// First-person and lived-experience vocabulary.
pub const PERSONAL_TERMS: &[WeightedTerm] = &[
    wt("私", 1.0),
    wt("僕", 1.5),
    wt("俺", 1.5),
    wt("自分", 0.8),
    wt("体験", 2.0),
    wt("経験", 1.5),
    wt("感想", 2.0),
    wt("使ってみた", 3.0),
    wt("行ってきた", 3.0),
    wt("食べてきた", 3.0),
    wt("買ってみた", 3.0),
    wt("試してみた", 3.0),
    wt("日記", 2.0),
    wt("ブログ", 1.0),
];

/// Sum of `occurrences × weight` over every term in `table`.
pub fn score(text: &str, table: &[WeightedTerm]) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    let haystack = text.to_lowercase();
    table
        .iter()
        .map(|t| {
            let needle = t.term.to_lowercase();
            if needle.is_empty() {
                return 0.0;
            }
            haystack.matches(needle.as_str()).count() as f64 * t.weight
        })
        .sum()
}

pub fn personal_score(text: &str) -> f64 {
    score(text, PERSONAL_TERMS).min(PERSONAL_CAP)
}

/// Uncapped; scaled by the operator's strength setting.
pub fn seo_score(text: &str, strength: Strength) -> f64 {
    score(text, SEO_TERMS) * strength.multiplier()
}
