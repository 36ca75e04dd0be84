//! Markup-level commerce signals: affiliate links and trust/commerce boilerplate.
//!
//! Patterns run over raw markup (no parsing), so they also see attribute values
//! such as `href`. All pattern sets compile once per process.

use crate::compile_patterns;
use regex::Regex;
use std::sync::LazyLock;

/// Points per affiliate-pattern match.
pub const AD_POINTS_PER_MATCH: f64 = 2.0;

const AFFILIATE_PATTERNS: &[&str] = &[
    r"(?i)[?&]ref=",
    r"(?i)[?&]affiliate=",
    r"(?i)[?&]tag=",
    r"(?i)amazon\.co\.jp.*[?&]tag=",
    r"(?i)rakuten\.co\.jp.*[?&]affiliate",
    r"(?i)a8\.net",
    r"(?i)valuecommerce",
    r"(?i)accesstrade",
    r"(?i)moshimo\.com",
    r"(?i)felmat",
    r"(?i)rentracks",
];

static AFFILIATE_RES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_patterns(AFFILIATE_PATTERNS));

struct TrustSignal {
    pattern: &'static str,
    delta: f64,
}

const TRUST_SIGNALS: &[TrustSignal] = &[
    // privacy policy
    TrustSignal {
        pattern: r"(?i)プライバシーポリシー|privacy.?policy",
        delta: 0.5,
    },
    // company profile
    TrustSignal {
        pattern: r"(?i)会社概要|企業情報|corporate",
        delta: 1.0,
    },
    // legal commerce disclosure (Specified Commercial Transactions Act notice)
    TrustSignal {
        pattern: r"(?i)特定商取引法|特商法|運営会社",
        delta: 2.0,
    },
    // advertising / sponsorship / tie-up
    TrustSignal {
        pattern: r"(?i)広告掲載|スポンサー|提供元|PR記事|タイアップ",
        delta: 2.0,
    },
];

static TRUST_RES: LazyLock<Vec<(Regex, f64)>> = LazyLock::new(|| {
    TRUST_SIGNALS
        .iter()
        .filter_map(|s| Regex::new(s.pattern).ok().map(|re| (re, s.delta)))
        .collect()
});

/// Total non-overlapping matches across all affiliate patterns. One link can
/// match several patterns (`amazon.co.jp/...?tag=` hits two).
pub fn affiliate_match_count(html: &str) -> usize {
    if html.is_empty() {
        return 0;
    }
    AFFILIATE_RES
        .iter()
        .map(|re| re.find_iter(html).count())
        .sum()
}

pub fn ad_score(html: &str) -> f64 {
    affiliate_match_count(html) as f64 * AD_POINTS_PER_MATCH
}

/// Brand-score contribution from site boilerplate. Each signal counts once.
pub fn trust_signals(html: &str) -> f64 {
    if html.is_empty() {
        return 0.0;
    }
    TRUST_RES
        .iter()
        .filter(|(re, _)| re.is_match(html))
        .map(|(_, delta)| delta)
        .sum()
}
