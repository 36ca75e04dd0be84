use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

const ENV_KEYS: &[&str] = &[
    "ARS_ENABLED",
    "ARS_FILTER_STRENGTH",
    "ARS_CUSTOM_BLACKLIST",
    "ARS_RANK_CAP",
    "ARS_FETCH_WINDOW",
    "ARS_OUTPUT_CAP",
    "ARS_FETCH_CONCURRENCY",
    "ARS_FETCH_TIMEOUT_MS",
    "ARS_FETCH_MAX_BYTES",
    "ARS_SCORE_PAGE_TEXT",
];

const BLOG_VS_SHOP: &str = r#"[
  {"title": "私のおすすめランキング", "url": "https://example-blog.example/x.html", "snippet": "実際に使ってみた感想です", "rank": 1},
  {"title": "公式通販サイト", "url": "https://shop.example.co.jp/item/1", "snippet": "公式ストアで購入", "rank": 2}
]"#;

fn ars() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ars"));
    for k in ENV_KEYS {
        cmd.env_remove(k);
    }
    cmd.env("ARS_LOG", "off");
    cmd
}

fn json_file(body: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().expect("tempfile");
    f.write_all(body.as_bytes()).expect("write tempfile");
    f
}

fn run_json(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.output().expect("run ars rank");
    assert!(
        out.status.success(),
        "ars rank failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("parse rank json")
}

fn urls(v: &serde_json::Value) -> Vec<String> {
    v["results"]
        .as_array()
        .expect("results array")
        .iter()
        .map(|r| r["url"].as_str().unwrap_or("").to_string())
        .collect()
}

#[test]
fn local_rank_orders_personal_blog_first() {
    let v = run_json(ars().args(["rank", "--local"]).write_stdin(BLOG_VS_SHOP));

    assert_eq!(v["schema_version"].as_u64(), Some(1));
    assert_eq!(v["kind"].as_str(), Some("ars_ranking"));
    assert_eq!(v["enabled"].as_bool(), Some(true));
    assert_eq!(v["mode"].as_str(), Some("local"));
    assert_eq!(v["filtered_out"].as_u64(), Some(0));
    assert_eq!(
        urls(&v),
        vec![
            "https://example-blog.example/x.html",
            "https://shop.example.co.jp/item/1"
        ]
    );

    let first = &v["results"][0];
    assert_eq!(first["rank"].as_u64(), Some(1));
    assert_eq!(first["adScore"].as_f64(), Some(0.0));
    let second = &v["results"][1];
    assert!(first["antiScore"].as_f64().unwrap() > second["antiScore"].as_f64().unwrap());
    let reasons: Vec<&str> = first["reasons"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r.as_str())
        .collect();
    assert!(reasons.contains(&"affiliate links: not checked (unfetched/local mode)"));
    assert_eq!(reasons.last().copied(), Some("search rank: #1"));
}

#[test]
fn wrapped_input_file_and_blacklist_flag() {
    let input = json_file(&format!(r#"{{"results": {BLOG_VS_SHOP}}}"#));
    let v = run_json(ars().args([
        "rank",
        "--local",
        "--blacklist",
        "example.co.jp",
        "--input",
        input.path().to_str().unwrap(),
    ]));

    assert_eq!(v["filtered_out"].as_u64(), Some(1));
    assert_eq!(urls(&v), vec!["https://example-blog.example/x.html"]);
}

#[test]
fn settings_file_blacklist_and_env_blacklist_are_merged() {
    let settings = json_file(r#"{"customBlacklist": ["example-blog.example"]}"#);
    let v = run_json(
        ars()
            .args(["rank", "--local", "--settings", settings.path().to_str().unwrap()])
            .env("ARS_CUSTOM_BLACKLIST", "example.co.jp")
            .write_stdin(BLOG_VS_SHOP),
    );
    assert_eq!(v["filtered_out"].as_u64(), Some(2));
    assert!(urls(&v).is_empty());
}

#[test]
fn disabled_settings_return_no_ranking() {
    let settings = json_file(r#"{"arsEnabled": false}"#);
    let v = run_json(
        ars()
            .args(["rank", "--settings", settings.path().to_str().unwrap()])
            .write_stdin(BLOG_VS_SHOP),
    );
    assert_eq!(v["enabled"].as_bool(), Some(false));
    assert!(v["results"].is_null());
}

#[test]
fn unreachable_pages_still_rank() {
    let input = r#"[
      {"title": "a", "url": "https://a.invalid/diary.html", "snippet": "", "rank": 1},
      {"title": "b", "url": "https://b.invalid/shop/", "snippet": "", "rank": 2}
    ]"#;
    let v = run_json(
        ars()
            .args(["rank", "--timeout-ms", "500", "--concurrency", "2"])
            .write_stdin(input),
    );
    assert_eq!(v["mode"].as_str(), Some("fetched"));
    assert_eq!(v["results"].as_array().map(Vec::len), Some(2));
    for r in v["results"].as_array().unwrap() {
        assert_eq!(r["adScore"].as_f64(), Some(0.0));
    }
}

#[test]
fn output_cap_flag_truncates() {
    let input: Vec<serde_json::Value> = (1..=6)
        .map(|i| {
            serde_json::json!({
                "title": format!("t{i}"),
                "url": format!("https://s{i}.example/"),
                "rank": i,
            })
        })
        .collect();
    let v = run_json(
        ars()
            .args(["rank", "--local", "--output-cap", "4"])
            .write_stdin(serde_json::to_string(&input).unwrap()),
    );
    assert_eq!(v["results"].as_array().map(Vec::len), Some(4));
}

#[test]
fn unknown_strength_flag_is_rejected() {
    ars()
        .args(["rank", "--local", "--strength", "extreme"])
        .write_stdin("[]")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown strength"));
}

#[test]
fn malformed_input_is_an_error() {
    ars()
        .args(["rank", "--local"])
        .write_stdin("{not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("parse input results"));
}
