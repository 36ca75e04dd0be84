use anyhow::{Context, Result};
use ars_core::{
    AnalysisMode, AnalyzeRequest, Analyzer, RankedResult, SearchResult, Settings, Strength,
};
use ars_local::config::settings_from_env;
use ars_local::{
    rank_with_fallback, ConfigStore, EngineSnapshot, LocalFetcher, RankConfig, RankingPipeline,
};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ars")]
#[command(about = "Re-rank search results toward personally-authored pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank a JSON list of search results (json).
    Rank(RankCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug)]
struct RankCmd {
    /// Input file with a JSON array of results (or `{"results": [...]}`); `-` or omitted reads stdin.
    #[arg(long)]
    input: Option<PathBuf>,
    /// Settings file (json): `{"arsEnabled", "filterStrength", "customBlacklist"}`.
    #[arg(long)]
    settings: Option<PathBuf>,
    /// SEO strength. Allowed: weak, medium, strong
    #[arg(long)]
    strength: Option<String>,
    /// Extra blacklisted domain (repeatable).
    #[arg(long)]
    blacklist: Vec<String>,
    /// Skip page fetching entirely (URL and text signals only).
    #[arg(long, default_value_t = false)]
    local: bool,
    /// Max concurrent page fetches.
    #[arg(long)]
    concurrency: Option<usize>,
    /// Per-page fetch deadline in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Per-page body cap in bytes.
    #[arg(long)]
    max_bytes: Option<u64>,
    /// How many leading results are fetched.
    #[arg(long)]
    fetch_window: Option<usize>,
    /// Max results returned.
    #[arg(long)]
    output_cap: Option<usize>,
    /// Rank penalty cap: results ranked above it lose `cap - rank` points.
    #[arg(long)]
    rank_cap: Option<u32>,
    /// Also score the visible text of fetched pages.
    #[arg(long, default_value_t = false)]
    score_page_text: bool,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RankInput {
    List(Vec<SearchResult>),
    Wrapped { results: Vec<SearchResult> },
}

#[derive(serde::Serialize)]
struct RankOutput {
    schema_version: u32,
    kind: &'static str,
    enabled: bool,
    mode: Option<AnalysisMode>,
    filtered_out: usize,
    results: Option<Vec<RankedResult>>,
}

fn init_tracing() {
    let filter = std::env::var("ARS_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "ars=info".to_string());
    // stdout carries the JSON result; logs go to stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_input(path: Option<&PathBuf>) -> Result<Vec<SearchResult>> {
    let raw = match path {
        Some(p) if p.as_os_str() != "-" => std::fs::read_to_string(p)
            .with_context(|| format!("read input {}", p.display()))?,
        _ => {
            let mut s = String::new();
            std::io::stdin()
                .read_to_string(&mut s)
                .context("read input from stdin")?;
            s
        }
    };
    let input: RankInput = serde_json::from_str(&raw).context("parse input results")?;
    Ok(match input {
        RankInput::List(v) => v,
        RankInput::Wrapped { results } => results,
    })
}

fn load_settings(args: &RankCmd) -> Result<Settings> {
    let base = match &args.settings {
        Some(p) => {
            let raw = std::fs::read_to_string(p)
                .with_context(|| format!("read settings {}", p.display()))?;
            serde_json::from_str(&raw).context("parse settings")?
        }
        None => Settings::default(),
    };
    let mut settings = settings_from_env(base);
    if let Some(s) = &args.strength {
        settings.filter_strength = s.parse::<Strength>()?;
    }
    for d in &args.blacklist {
        if !settings.custom_blacklist.contains(d) {
            settings.custom_blacklist.push(d.clone());
        }
    }
    Ok(settings)
}

fn rank_config(args: &RankCmd) -> RankConfig {
    let mut rank = RankConfig::from_env();
    if let Some(n) = args.concurrency {
        rank.concurrency = n.max(1);
    }
    if let Some(n) = args.timeout_ms {
        rank.timeout_ms = n;
    }
    if let Some(n) = args.max_bytes {
        rank.max_bytes = n;
    }
    if let Some(n) = args.fetch_window {
        rank.fetch_window = n;
    }
    if let Some(n) = args.output_cap {
        rank.output_cap = n;
    }
    if let Some(n) = args.rank_cap {
        rank.rank_cap = n;
    }
    if args.score_page_text {
        rank.score_page_text = true;
    }
    rank
}

async fn run_rank(args: RankCmd) -> Result<RankOutput> {
    let settings = load_settings(&args)?;
    let store = Arc::new(ConfigStore::new(EngineSnapshot::new(settings, rank_config(&args))));
    let snap = store.snapshot();
    let req = AnalyzeRequest {
        results: read_input(args.input.as_ref())?,
        strength: snap.settings.filter_strength,
        // Already merged into the snapshot blacklist.
        custom_blacklist: Vec::new(),
    };

    let pipeline = if args.local {
        None
    } else {
        match LocalFetcher::new() {
            Ok(f) => Some(RankingPipeline::new(Arc::new(f), store.clone())),
            Err(e) => {
                tracing::warn!(error = %e, "fetcher unavailable");
                None
            }
        }
    };
    let primary = pipeline.as_ref().map(|p| p as &dyn Analyzer);
    let ranking = rank_with_fallback(primary, &req, &snap).await;

    Ok(match ranking {
        Some(r) => RankOutput {
            schema_version: 1,
            kind: "ars_ranking",
            enabled: true,
            mode: Some(r.mode),
            filtered_out: r.filtered_out,
            results: Some(r.results),
        },
        None => RankOutput {
            schema_version: 1,
            kind: "ars_ranking",
            enabled: false,
            mode: None,
            filtered_out: 0,
            results: None,
        },
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Rank(args) => {
            let out = run_rank(args).await?;
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Version(args) => {
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "version",
                "ok": true,
                "name": "ars",
                "version": env!("CARGO_PKG_VERSION"),
            });
            match args.output.to_ascii_lowercase().as_str() {
                "text" => println!("ars {}", env!("CARGO_PKG_VERSION")),
                _ => println!("{}", v),
            }
        }
    }
    Ok(())
}
