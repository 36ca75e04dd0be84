//! Host normalization, blacklist membership and brand-affinity heuristics.
//!
//! All checks work on the normalized host: lowercase, leading `www.` removed.
//! An unparsable URL normalizes to `""`, which is never blacklisted and never
//! brand-flagged.

use crate::compile_patterns;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Domains excluded outright: marketplaces, encyclopedias, portals, comparison and
/// review aggregators, booking, real estate, recruiting, news media, SNS, recipe
/// portals and large ISPs. Blog platforms are not listed; their hosts are scored
/// like any other.
pub const SEED_BLACKLIST: &[&str] = &[
    // marketplaces
    "amazon.co.jp",
    "amazon.com",
    "rakuten.co.jp",
    "rakuten.com",
    "mercari.com",
    "zozo.jp",
    "shopping.yahoo.co.jp",
    "paypaymall.yahoo.co.jp",
    "store.line.me",
    "qoo10.jp",
    "au-commerce.jp",
    // encyclopedias / dictionaries
    "wikipedia.org",
    "wikiwand.com",
    "weblio.jp",
    "kotobank.jp",
    // developer Q&A
    "qiita.com",
    "zenn.dev",
    "teratail.com",
    // portals
    "yahoo.co.jp",
    "yahoo.com",
    "msn.com",
    "bing.com",
    // price comparison / reviews
    "kakaku.com",
    "cosme.net",
    "mybest.com",
    "the360.life",
    "rentry.jp",
    "roomclip.jp",
    // restaurants
    "tabelog.com",
    "hotpepper.jp",
    "gnavi.co.jp",
    "retty.me",
    "hitosara.com",
    "yelp.co.jp",
    "ubereats.com",
    "demae-can.com",
    // travel
    "jalan.net",
    "booking.com",
    "trivago.jp",
    "ikyu.com",
    "travel.rakuten.co.jp",
    "expedia.co.jp",
    "agoda.com",
    "hotels.com",
    "airbnb.jp",
    "jtb.co.jp",
    "his-j.com",
    "rurubu.travel",
    "yahoo-travel.jp",
    // real estate
    "suumo.jp",
    "homes.co.jp",
    "athome.co.jp",
    "chintai.net",
    // recruiting
    "mynavi.jp",
    "rikunabi.com",
    "doda.jp",
    "en-japan.com",
    "type.jp",
    "indeed.com",
    "wantedly.com",
    "green-japan.com",
    // news / media
    "nikkei.com",
    "asahi.com",
    "mainichi.jp",
    "yomiuri.co.jp",
    "sankei.com",
    "nhk.or.jp",
    "itmedia.co.jp",
    "gizmodo.jp",
    "gigazine.net",
    "huffingtonpost.jp",
    "buzzfeed.com",
    "withnews.jp",
    "j-cast.com",
    "oricon.co.jp",
    "natalie.mu",
    "prtimes.jp",
    "president.jp",
    "diamond.jp",
    "toyokeizai.net",
    // curation
    "livedoor.com",
    "naver.jp",
    "matomame.jp",
    // SNS
    "twitter.com",
    "x.com",
    "facebook.com",
    "instagram.com",
    "youtube.com",
    "tiktok.com",
    "linkedin.com",
    "pinterest.com",
    "threads.net",
    "reddit.com",
    // recipes / lifestyle
    "cookpad.com",
    "delishkitchen.tv",
    "kurashiru.com",
    // beauty
    "hotpepper-beauty.com",
    "beauty.yahoo.co.jp",
    // other large sites
    "dmm.com",
    "nifty.com",
    "biglobe.ne.jp",
    "so-net.ne.jp",
    "ocn.ne.jp",
    "goo.ne.jp",
    "excite.co.jp",
];

/// Shortest first label that still counts for the near-brand substring check.
/// Shorter labels ("x" from x.com) would match nearly every host.
pub const NEAR_BRAND_MIN_LABEL: usize = 3;

pub const NEAR_BRAND_DELTA: f64 = 3.0;
pub const INSTITUTIONAL_TLD_DELTA: f64 = 1.0;
pub const COMMERCIAL_KEYWORD_DELTA: f64 = 2.0;
pub const MANY_LABELS_DELTA: f64 = 1.0;
pub const COMMERCIAL_PATH_DELTA: f64 = 2.0;
pub const INDIE_SHAPE_DELTA: f64 = -2.0;

const MANY_LABELS: usize = 4;

const INSTITUTIONAL_SUFFIXES: &[&str] = &[".co.jp", ".or.jp", ".ne.jp", ".go.jp", ".ac.jp"];

const COMMERCIAL_DOMAIN_KEYWORDS: &[&str] = &[
    "shop", "store", "mall", "buy", "market", "auction", "hotel", "travel", "tour", "booking",
    "reserve", "navi", "guide", "hikaku", "compare", "price", "search", "job", "career",
    "recruit", "agent", "news", "media", "press", "times", "clinic", "salon", "beauty", "estate",
    "fudosan", "corp", "official",
];

const COMMERCIAL_PATH_PATTERNS: &[&str] = &[
    r"(?i)/(?:shop|store|product|item|buy|cart|checkout|order)",
    r"(?i)/(?:booking|reserve|reservation|plan|yoyaku)",
    r"(?i)/(?:price|pricing|campaign|sale|coupon|discount)",
    r"(?i)/(?:lp|landing|promo|offer|deal)",
    r"(?i)/(?:compare|hikaku|ranking|osusume)",
    r"(?i)/(?:ad|sponsor|pr)/",
];

const INDIE_PATH_PATTERNS: &[&str] = &[
    r"~[a-zA-Z0-9]+",
    r"\.html?$",
    r"cgi-bin",
    r"diary",
    r"profile",
    r"link",
];

static COMMERCIAL_PATH_RES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_patterns(COMMERCIAL_PATH_PATTERNS));
static INDIE_PATH_RES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_patterns(INDIE_PATH_PATTERNS));

/// Ordered, de-duplicated set of registrable domains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blacklist {
    entries: Vec<String>,
}

impl Blacklist {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn seeded() -> Self {
        Self::empty().with_additions(SEED_BLACKLIST.iter().copied())
    }

    /// Returns a new set with `extra` appended. `self` is left untouched so a
    /// published snapshot never changes under a reader.
    pub fn with_additions<I, S>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: BTreeSet<String> = self.entries.iter().cloned().collect();
        let mut entries = self.entries.clone();
        for raw in extra {
            let Some(d) = normalize_entry(raw.as_ref()) else {
                continue;
            };
            if seen.insert(d.clone()) {
                entries.push(d);
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact or label-boundary suffix match against a normalized host.
    pub fn contains_host(&self, host: &str) -> bool {
        if host.is_empty() {
            return false;
        }
        self.entries.iter().any(|bl| host_matches_entry(host, bl))
    }
}

fn host_matches_entry(host: &str, entry: &str) -> bool {
    match host.strip_suffix(entry) {
        Some("") => true,
        Some(prefix) => prefix.ends_with('.'),
        None => false,
    }
}

/// Lowercase host without a leading `www.`; `""` when the URL does not parse or
/// has no host.
pub fn normalize_host(url: &str) -> String {
    let Ok(u) = url::Url::parse(url.trim()) else {
        return String::new();
    };
    let host = u.host_str().unwrap_or("").to_ascii_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// Normalize a user-supplied blacklist entry. Accepts bare domains or full URLs.
///
/// Bare domains go through the same URL host parser as result URLs, so an IDN
/// entry ends up in the punycode form `normalize_host` produces.
pub fn normalize_entry(raw: &str) -> Option<String> {
    let s = raw.trim().trim_end_matches('/');
    if s.is_empty() {
        return None;
    }
    let host = if s.contains("://") {
        normalize_host(s)
    } else {
        let bare = s.split('/').next().unwrap_or("").trim_matches('.');
        if bare.is_empty() {
            return None;
        }
        normalize_host(&format!("http://{bare}"))
    };
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

pub fn is_blacklisted(url: &str, blacklist: &Blacklist) -> bool {
    blacklist.contains_host(&normalize_host(url))
}

/// Heuristic "belongs to a large commercial or institutional entity" score from the
/// URL alone. May be negative for indie-looking URLs.
pub fn brand_affinity(url: &str, blacklist: &Blacklist) -> f64 {
    let Ok(parsed) = url::Url::parse(url.trim()) else {
        return 0.0;
    };
    let host = normalize_host(url);
    if host.is_empty() {
        return 0.0;
    }
    let path = parsed.path();
    let mut score = 0.0;

    let near_brand = blacklist.entries().iter().any(|bl| {
        let first = bl.split('.').next().unwrap_or("");
        first.len() >= NEAR_BRAND_MIN_LABEL && host.contains(first)
    });
    if near_brand {
        score += NEAR_BRAND_DELTA;
    }

    if INSTITUTIONAL_SUFFIXES.iter().any(|s| host.ends_with(s)) {
        score += INSTITUTIONAL_TLD_DELTA;
    }

    if COMMERCIAL_DOMAIN_KEYWORDS.iter().any(|kw| host.contains(kw)) {
        score += COMMERCIAL_KEYWORD_DELTA;
    }

    if host.split('.').count() >= MANY_LABELS {
        score += MANY_LABELS_DELTA;
    }

    if COMMERCIAL_PATH_RES.iter().any(|re| re.is_match(path)) {
        score += COMMERCIAL_PATH_DELTA;
    }

    for re in INDIE_PATH_RES.iter() {
        if re.is_match(path) {
            score += INDIE_SHAPE_DELTA;
        }
    }

    score
}
