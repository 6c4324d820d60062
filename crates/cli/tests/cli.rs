use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use sqlx::sqlite::SqlitePoolOptions;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn records() -> Vec<Value> {
    vec![
        json!({
            "id": 20,
            "full_text": "just setting up my twttr",
            "created_at": "Tue Mar 21 20:50:14 +0000 2006",
            "@timestamp": "2006-03-21T20:50:14Z",
            "user": {"screen_name": "jack", "name": "jack"}
        }),
        json!({
            "id": 1615425412921987074u64,
            "full_text": "please connect a keyboard https://t.co/abc",
            "created_at": "Wed Jan 18 07:20:00 +0000 2023",
            "@timestamp": "2023-01-18T07:20:00Z",
            "user": {"screen_name": "wzyboy", "name": "Zhuoyun"},
            "entities": {"urls": [], "media": [{
                "type": "photo",
                "url": "https://t.co/abc",
                "display_url": "pic.twitter.com/abc",
                "expanded_url": "https://twitter.com/wzyboy/status/1615425412921987074/photo/1",
                "media_url_https": "https://pbs.twimg.com/media/Fmsk2gHacAAJGL0.jpg"
            }]}
        }),
        json!({
            "id": 109312345678u64,
            "content": "<p>hello fediverse</p>",
            "created_at": "2022-11-05T12:34:56.000Z",
            "@timestamp": "2022-11-05T12:34:56Z",
            "in_reply_to_id": null,
            "account": {
                "id": "1",
                "fqn": "alice@example.social",
                "display_name": "Alice",
                "avatar": "https://example.social/a.png",
                "url": "https://example.social/@alice"
            },
            "media_attachments": []
        }),
    ]
}

/// Write a SQLite archive plus a config file pointing at it
fn setup(extra_config: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("tweets.db");
    seed(&db_path);

    let config_path = dir.path().join("config.toml");
    let content = format!(
        "[general]\nbackend = \"sqlite\"\n\n[sqlite]\npath = {:?}\npartition = \"tweets\"\n\n{}",
        db_path.display().to_string(),
        extra_config
    );
    fs::write(&config_path, content).expect("write config");
    (dir, config_path)
}

fn seed(db_path: &Path) {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    runtime.block_on(async {
        let url = format!("sqlite:{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .connect(&url)
            .await
            .expect("create db");
        sqlx::query("CREATE TABLE tweets (id INTEGER PRIMARY KEY, text TEXT, raw_json TEXT)")
            .execute(&pool)
            .await
            .expect("create table");
        for record in records() {
            sqlx::query("INSERT INTO tweets (id, text, raw_json) VALUES (?, ?, ?)")
                .bind(record["id"].as_u64().expect("id") as i64)
                .bind(record["full_text"].as_str().unwrap_or_default())
                .bind(record.to_string())
                .execute(&pool)
                .await
                .expect("insert");
        }
        pool.close().await;
    });
}

#[test]
fn config_init_writes_example_file() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("config.toml");

    let mut cmd = cargo_bin_cmd!("tweet-archive");
    cmd.args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).expect("read config");
    assert!(content.contains("[search_index]"));
    assert!(content.contains("cache_capacity = 1024"));
}

#[test]
fn config_init_refuses_to_overwrite() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "# mine").expect("write config");

    let mut cmd = cargo_bin_cmd!("tweet-archive");
    cmd.args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn show_outputs_json_record() {
    let (_dir, config_path) = setup("");

    let mut cmd = cargo_bin_cmd!("tweet-archive");
    let output = cmd
        .arg("--config")
        .arg(&config_path)
        .args(["show", "20", "--format", "json"])
        .output()
        .expect("run show");

    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["full_text"], "just setting up my twttr");
    assert_eq!(value["@index"], "tweets");
}

#[test]
fn show_missing_post_fails() {
    let (_dir, config_path) = setup("");

    let mut cmd = cargo_bin_cmd!("tweet-archive");
    cmd.arg("--config")
        .arg(&config_path)
        .args(["show", "999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Post not found: 999"));
}

#[test]
fn show_html_rewrites_media_and_links() {
    let (_dir, config_path) = setup(
        "[media]\nfrom = \"mirror\"\n\n[[media.mirrors]]\nfrom = \"pbs.twimg.com\"\nto = \"mirror.example.com/pbs\"\n",
    );

    let mut cmd = cargo_bin_cmd!("tweet-archive");
    cmd.arg("--config")
        .arg(&config_path)
        .args(["show", "1615425412921987074", "--format", "html"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "https://mirror.example.com/pbs/media/Fmsk2gHacAAJGL0.jpg",
        ))
        .stdout(predicate::str::contains("/tweet/1615425412921987074.html"))
        .stdout(predicate::str::contains("2023-01-18"));
}

#[test]
fn show_normalizes_toots() {
    let (_dir, config_path) = setup("");

    let mut cmd = cargo_bin_cmd!("tweet-archive");
    cmd.arg("--config")
        .arg(&config_path)
        .args(["show", "109312345678"])
        .assert()
        .success()
        .stdout(predicate::str::contains("@alice@example.social"))
        .stdout(predicate::str::contains("<p>hello fediverse</p>"));
}

#[test]
fn search_filters_by_keyword_and_user() {
    let (_dir, config_path) = setup("");

    let mut cmd = cargo_bin_cmd!("tweet-archive");
    let output = cmd
        .arg("--config")
        .arg(&config_path)
        .args(["search", "*", "-u", "jack", "--format", "json"])
        .output()
        .expect("run search");

    assert!(output.status.success());
    let posts: Vec<Value> = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["id"], 20);

    let mut cmd = cargo_bin_cmd!("tweet-archive");
    cmd.arg("--config")
        .arg(&config_path)
        .args(["search", "connect keyboard"])
        .assert()
        .success()
        .stdout(predicate::str::contains("@wzyboy"))
        .stdout(predicate::str::contains("@jack").not());
}

#[test]
fn ids_stream_in_both_directions() {
    let (_dir, config_path) = setup("");

    let mut cmd = cargo_bin_cmd!("tweet-archive");
    cmd.arg("--config")
        .arg(&config_path)
        .args(["ids"])
        .assert()
        .success()
        .stdout("20\n109312345678\n1615425412921987074\n");

    let mut cmd = cargo_bin_cmd!("tweet-archive");
    cmd.arg("--config")
        .arg(&config_path)
        .args(["ids", "--desc", "--limit", "2"])
        .assert()
        .success()
        .stdout("1615425412921987074\n109312345678\n");
}

#[test]
fn stats_reports_authors_and_partitions() {
    let (_dir, config_path) = setup("");

    let mut cmd = cargo_bin_cmd!("tweet-archive");
    let output = cmd
        .arg("--config")
        .arg(&config_path)
        .args(["stats", "--json"])
        .output()
        .expect("run stats");

    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["backend"], "sqlite");
    assert_eq!(value["total"], 3);
    assert_eq!(value["authors"].as_array().map(Vec::len), Some(3));
    assert_eq!(value["partitions"][0]["key"], "tweets");
}

#[test]
fn latest_honors_default_user_from_env() {
    let (_dir, config_path) = setup("");

    let mut cmd = cargo_bin_cmd!("tweet-archive");
    let output = cmd
        .env("TWEET_ARCHIVE__GENERAL__DEFAULT_USER", "jack")
        .arg("--config")
        .arg(&config_path)
        .args(["latest", "--json"])
        .output()
        .expect("run latest");

    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["total"], 3);
    assert_eq!(value["posts"].as_array().map(Vec::len), Some(1));
    assert_eq!(value["posts"][0]["user"]["screen_name"], "jack");
}

#[test]
fn doctor_reports_sqlite_backend() {
    let (_dir, config_path) = setup("");

    let mut cmd = cargo_bin_cmd!("tweet-archive");
    let output = cmd
        .arg("--config")
        .arg(&config_path)
        .args(["doctor", "--json"])
        .output()
        .expect("run doctor");

    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["overall"], "ok");
    assert_eq!(value["backend"]["details"]["count"], 3);
}

#[test]
fn doctor_fails_on_missing_database() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        format!(
            "[general]\nbackend = \"sqlite\"\n\n[sqlite]\npath = {:?}\n",
            dir.path().join("missing.db").display().to_string()
        ),
    )
    .expect("write config");

    let mut cmd = cargo_bin_cmd!("tweet-archive");
    cmd.arg("--config")
        .arg(&config_path)
        .arg("doctor")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Overall: ERROR"));
}
