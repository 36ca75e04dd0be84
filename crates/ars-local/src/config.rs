//! Engine constants, env overrides and the shared configuration snapshot.
//!
//! A ranking pass reads one `Arc<EngineSnapshot>` for its whole duration.
//! Updates build a new snapshot and swap the pointer, so a pass sees either the
//! old or the new blacklist, never a partially extended one.

use crate::compose::DEFAULT_RANK_CAP;
use crate::domain::Blacklist;
use crate::pool::{PoolConfig, DEFAULT_CONCURRENCY, DEFAULT_MAX_BYTES, DEFAULT_TIMEOUT_MS};
use ars_core::{Settings, Strength};
use std::str::FromStr;
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_FETCH_WINDOW: usize = 20;
pub const DEFAULT_OUTPUT_CAP: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankConfig {
    /// `rankPenalty = max(0, rank_cap - rank)`.
    pub rank_cap: u32,
    /// Only this many leading (post-filter) results are fetched.
    pub fetch_window: usize,
    pub output_cap: usize,
    pub concurrency: usize,
    pub timeout_ms: u64,
    pub max_bytes: u64,
    /// Also run the lexical scorer over the fetched page's visible text.
    pub score_page_text: bool,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            rank_cap: DEFAULT_RANK_CAP,
            fetch_window: DEFAULT_FETCH_WINDOW,
            output_cap: DEFAULT_OUTPUT_CAP,
            concurrency: DEFAULT_CONCURRENCY,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_bytes: DEFAULT_MAX_BYTES,
            score_page_text: false,
        }
    }
}

impl RankConfig {
    /// Defaults overlaid with `ARS_*` env values; unparsable values are ignored.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            rank_cap: env_parse("ARS_RANK_CAP").unwrap_or(d.rank_cap),
            fetch_window: env_parse("ARS_FETCH_WINDOW").unwrap_or(d.fetch_window),
            output_cap: env_parse("ARS_OUTPUT_CAP").unwrap_or(d.output_cap),
            concurrency: env_parse::<usize>("ARS_FETCH_CONCURRENCY")
                .filter(|n| *n > 0)
                .unwrap_or(d.concurrency),
            timeout_ms: env_parse::<u64>("ARS_FETCH_TIMEOUT_MS")
                .filter(|n| *n > 0)
                .unwrap_or(d.timeout_ms),
            max_bytes: env_parse("ARS_FETCH_MAX_BYTES").unwrap_or(d.max_bytes),
            score_page_text: env_bool("ARS_SCORE_PAGE_TEXT").unwrap_or(d.score_page_text),
        }
    }

    pub fn pool(&self) -> PoolConfig {
        PoolConfig {
            concurrency: self.concurrency.max(1),
            timeout: Duration::from_millis(self.timeout_ms),
            max_bytes: self.max_bytes,
        }
    }
}

fn env_str(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_str(key).and_then(|s| s.parse().ok())
}

fn env_bool(key: &str) -> Option<bool> {
    match env_str(key)?.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Split a comma/whitespace-separated list, dropping blanks and repeats.
pub fn split_list(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in raw.split(|c: char| c == ',' || c.is_whitespace()) {
        let s = part.trim();
        if s.is_empty() {
            continue;
        }
        let s = s.to_string();
        if !out.contains(&s) {
            out.push(s);
        }
    }
    out
}

/// Overlay `ARS_ENABLED`, `ARS_FILTER_STRENGTH` and `ARS_CUSTOM_BLACKLIST` (appended)
/// onto `base`.
pub fn settings_from_env(mut base: Settings) -> Settings {
    if let Some(enabled) = env_bool("ARS_ENABLED") {
        base.ars_enabled = enabled;
    }
    if let Some(s) = env_str("ARS_FILTER_STRENGTH") {
        base.filter_strength = Strength::parse_lenient(&s);
    }
    if let Some(list) = env_str("ARS_CUSTOM_BLACKLIST") {
        for d in split_list(&list) {
            if !base.custom_blacklist.contains(&d) {
                base.custom_blacklist.push(d);
            }
        }
    }
    base
}

/// Everything a ranking pass reads, frozen.
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    pub settings: Settings,
    /// Seed list plus `settings.custom_blacklist`.
    pub blacklist: Blacklist,
    pub rank: RankConfig,
}

impl EngineSnapshot {
    pub fn new(settings: Settings, rank: RankConfig) -> Self {
        let blacklist = Blacklist::seeded().with_additions(&settings.custom_blacklist);
        Self {
            settings,
            blacklist,
            rank,
        }
    }
}

impl Default for EngineSnapshot {
    fn default() -> Self {
        Self::new(Settings::default(), RankConfig::default())
    }
}

#[derive(Debug)]
pub struct ConfigStore {
    current: ArcSwap<EngineSnapshot>,
}

impl ConfigStore {
    pub fn new(snapshot: EngineSnapshot) -> Self {
        Self {
            current: ArcSwap::new(Arc::new(snapshot)),
        }
    }

    pub fn snapshot(&self) -> Arc<EngineSnapshot> {
        self.current.load_full()
    }

    /// Compare-and-swap loop: `f` may run more than once under contention, and
    /// the snapshot it finally built is the one returned.
    fn update(&self, f: impl Fn(&EngineSnapshot) -> EngineSnapshot) -> Arc<EngineSnapshot> {
        let mut published = None;
        self.current.rcu(|cur| {
            let next = Arc::new(f(cur));
            published = Some(next.clone());
            next
        });
        published.unwrap_or_else(|| self.current.load_full())
    }

    /// Append user domains to both the persisted list and the effective blacklist.
    pub fn add_blacklist<I, S>(&self, domains: I) -> Arc<EngineSnapshot>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains: Vec<String> = domains.into_iter().map(|d| d.as_ref().to_string()).collect();
        let next = self.update(|cur| {
            let mut settings = cur.settings.clone();
            for d in &domains {
                let d = d.trim();
                if !d.is_empty() && !settings.custom_blacklist.iter().any(|x| x == d) {
                    settings.custom_blacklist.push(d.to_string());
                }
            }
            EngineSnapshot {
                blacklist: cur.blacklist.with_additions(&domains),
                settings,
                rank: cur.rank.clone(),
            }
        });
        tracing::debug!(entries = next.blacklist.len(), "blacklist updated");
        next
    }

    /// Replace user settings wholesale (a configuration-change event).
    pub fn replace_settings(&self, settings: Settings) -> Arc<EngineSnapshot> {
        self.update(|cur| EngineSnapshot::new(settings.clone(), cur.rank.clone()))
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(EngineSnapshot::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SEED_BLACKLIST;
    use std::sync::Mutex;

    // Env vars are process-global; serialize tests that mutate them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "ARS_RANK_CAP",
        "ARS_FETCH_WINDOW",
        "ARS_OUTPUT_CAP",
        "ARS_FETCH_CONCURRENCY",
        "ARS_FETCH_TIMEOUT_MS",
        "ARS_FETCH_MAX_BYTES",
        "ARS_SCORE_PAGE_TEXT",
        "ARS_ENABLED",
        "ARS_FILTER_STRENGTH",
        "ARS_CUSTOM_BLACKLIST",
    ];

    fn clear_env() {
        for k in ENV_KEYS {
            std::env::remove_var(k);
        }
    }

    #[test]
    fn rank_config_reads_env_and_ignores_garbage() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        assert_eq!(RankConfig::from_env(), RankConfig::default());

        std::env::set_var("ARS_RANK_CAP", "20");
        std::env::set_var("ARS_FETCH_CONCURRENCY", "0");
        std::env::set_var("ARS_FETCH_TIMEOUT_MS", "abc");
        std::env::set_var("ARS_SCORE_PAGE_TEXT", "yes");
        let c = RankConfig::from_env();
        assert_eq!(c.rank_cap, 20);
        assert_eq!(c.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(c.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(c.score_page_text);
        clear_env();
    }

    #[test]
    fn settings_env_overlay() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        std::env::set_var("ARS_ENABLED", "off");
        std::env::set_var("ARS_FILTER_STRENGTH", "STRONG");
        std::env::set_var("ARS_CUSTOM_BLACKLIST", "a.example, b.example a.example");
        let base = Settings {
            custom_blacklist: vec!["b.example".to_string()],
            ..Settings::default()
        };
        let s = settings_from_env(base);
        assert!(!s.ars_enabled);
        assert_eq!(s.filter_strength, Strength::Strong);
        assert_eq!(s.custom_blacklist, vec!["b.example", "a.example"]);
        clear_env();
    }

    #[test]
    fn snapshot_merges_custom_blacklist() {
        let settings = Settings {
            custom_blacklist: vec!["Blog-Farm.example".to_string()],
            ..Settings::default()
        };
        let snap = EngineSnapshot::new(settings, RankConfig::default());
        assert_eq!(snap.blacklist.len(), SEED_BLACKLIST.len() + 1);
        assert!(snap.blacklist.contains_host("blog-farm.example"));
    }

    #[test]
    fn updates_publish_new_snapshots_without_touching_old_ones() {
        let store = ConfigStore::default();
        let before = store.snapshot();
        let after = store.add_blacklist(["spam.example", "spam.example", " "]);

        assert!(!before.blacklist.contains_host("spam.example"));
        assert!(after.blacklist.contains_host("spam.example"));
        assert_eq!(after.blacklist.len(), before.blacklist.len() + 1);
        assert_eq!(after.settings.custom_blacklist, vec!["spam.example"]);
        assert!(Arc::ptr_eq(&after, &store.snapshot()));

        let replaced = store.replace_settings(Settings::default());
        assert!(!replaced.blacklist.contains_host("spam.example"));
    }

    #[test]
    fn concurrent_readers_see_whole_snapshots() {
        let store = Arc::new(ConfigStore::default());
        let seed = SEED_BLACKLIST.len();
        let batch: Vec<String> = (0..50).map(|i| format!("d{i}.example")).collect();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let len = store.snapshot().blacklist.len();
                        assert!(len == seed || len == seed + 50, "torn snapshot: {len}");
                    }
                })
            })
            .collect();
        store.add_blacklist(&batch);
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(store.snapshot().blacklist.len(), seed + 50);
    }

    #[test]
    fn concurrent_writers_never_lose_an_addition() {
        let store = Arc::new(ConfigStore::default());
        let seed = SEED_BLACKLIST.len();
        let writers: Vec<_> = (0..8)
            .map(|w| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..10 {
                        store.add_blacklist([format!("w{w}-{i}.example")]);
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }
        let snap = store.snapshot();
        assert_eq!(snap.blacklist.len(), seed + 80);
        assert_eq!(snap.settings.custom_blacklist.len(), 80);
    }
}
