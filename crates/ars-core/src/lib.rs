use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    /// The scoring subsystem as a whole could not be reached.
    #[error("transport failed: {0}")]
    Transport(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// One organic result as extracted from a search results page.
///
/// `title` and `snippet` default to the empty string when the extractor could not
/// find them, so scorers never see a "missing" value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
    /// 1-based position in the original ranking.
    pub rank: u32,
}

/// Operator-chosen aggressiveness applied to the SEO score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Weak,
    #[default]
    Medium,
    Strong,
}

impl Strength {
    pub fn multiplier(self) -> f64 {
        match self {
            Strength::Weak => 0.5,
            Strength::Medium => 1.0,
            Strength::Strong => 1.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strength::Weak => "weak",
            Strength::Medium => "medium",
            Strength::Strong => "strong",
        }
    }

    /// Lenient parse: anything unrecognized is treated as `Medium`.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strength {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weak" => Ok(Strength::Weak),
            "medium" => Ok(Strength::Medium),
            "strong" => Ok(Strength::Strong),
            other => Err(Error::Config(format!(
                "unknown strength {other:?} (allowed: weak, medium, strong)"
            ))),
        }
    }
}

/// User preferences as persisted by the settings collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// When false, no ranking is produced at all.
    pub ars_enabled: bool,
    #[serde(deserialize_with = "deserialize_strength_lenient")]
    pub filter_strength: Strength,
    pub custom_blacklist: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ars_enabled: true,
            filter_strength: Strength::Medium,
            custom_blacklist: Vec::new(),
        }
    }
}

fn deserialize_strength_lenient<'de, D>(d: D) -> std::result::Result<Strength, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw.as_deref().map(Strength::parse_lenient).unwrap_or_default())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub personal_score: f64,
    pub seo_score: f64,
    pub ad_score: f64,
    /// Signed: indie URL shapes subtract from it.
    pub brand_score: f64,
    pub rank_penalty: f64,
    pub anti_score: f64,
}

/// Externally visible output unit: the input result plus its scores and reasons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    #[serde(flatten)]
    pub result: SearchResult,
    #[serde(flatten)]
    pub scores: ScoreBreakdown,
    pub reasons: Vec<String>,
    pub personal_index: u8,
    pub commercial_index: u8,
}

/// How a ranking was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Pages were fetched and inspected.
    Fetched,
    /// Fetcher skipped; URL and text signals only.
    Local,
}

/// Inbound request from the result-extraction side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub strength: Strength,
    #[serde(default)]
    pub custom_blacklist: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ranking {
    pub mode: AnalysisMode,
    /// Number of inputs dropped by the blacklist before scoring.
    pub filtered_out: usize,
    pub results: Vec<RankedResult>,
}

/// A scoring subsystem that may be unreachable (see `Error::Transport`).
#[async_trait::async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, req: &AnalyzeRequest) -> Result<Ranking>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    pub timeout_ms: Option<u64>,
    /// Hard cap on bytes read from the response body.
    pub max_bytes: Option<u64>,
}

impl FetchRequest {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    pub url: String,
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub truncated: bool,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).to_string()
    }
}

#[async_trait::async_trait]
pub trait FetchBackend: Send + Sync {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_defaults_when_fields_are_missing() {
        let s: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(s, Settings::default());
        assert!(s.ars_enabled);
    }

    #[test]
    fn settings_unknown_strength_falls_back_to_medium() {
        let s: Settings =
            serde_json::from_str(r#"{"arsEnabled":false,"filterStrength":"extreme"}"#).unwrap();
        assert!(!s.ars_enabled);
        assert_eq!(s.filter_strength, Strength::Medium);

        let s: Settings = serde_json::from_str(r#"{"filterStrength":"strong"}"#).unwrap();
        assert_eq!(s.filter_strength, Strength::Strong);
    }

    #[test]
    fn strict_strength_parse_rejects_unknown_values() {
        assert!("loud".parse::<Strength>().is_err());
        assert_eq!(" Weak ".parse::<Strength>().unwrap(), Strength::Weak);
        assert_eq!(Strength::Strong.multiplier(), 1.5);
    }

    #[test]
    fn search_result_missing_text_fields_default_to_empty() {
        let r: SearchResult =
            serde_json::from_str(r#"{"url":"https://a.example/","rank":3}"#).unwrap();
        assert_eq!(r.title, "");
        assert_eq!(r.snippet, "");
        assert_eq!(r.rank, 3);
    }

    #[test]
    fn ranked_result_serializes_flat_camel_case() {
        let rr = RankedResult {
            result: SearchResult {
                title: "t".to_string(),
                url: "https://a.example/".to_string(),
                snippet: String::new(),
                rank: 1,
            },
            scores: ScoreBreakdown {
                anti_score: 42.0,
                ..ScoreBreakdown::default()
            },
            reasons: vec!["r".to_string()],
            personal_index: 0,
            commercial_index: 0,
        };
        let v = serde_json::to_value(&rr).unwrap();
        assert_eq!(v["url"].as_str(), Some("https://a.example/"));
        assert_eq!(v["antiScore"].as_f64(), Some(42.0));
        assert_eq!(v["personalIndex"].as_u64(), Some(0));
        assert!(v.get("scores").is_none());
    }
}
