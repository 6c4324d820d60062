//! Doctor command - validate configuration and show status

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use super::archive::{media_strategy, open_backend};
use crate::args::DoctorArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    backend: CheckResult,
    media: CheckResult,
    external: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        backend: CheckResult::error("Not checked"),
        media: CheckResult::error("Not checked"),
        external: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.backend = check_backend(config).await;
        report.media = check_media(config);
        report.external = check_external(config);
    }

    let checks = [
        &report.config,
        &report.backend,
        &report.media,
        &report.external,
    ];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

async fn check_backend(config: &AppConfig) -> CheckResult {
    let backend = match open_backend(config).await {
        Ok(b) => b,
        Err(e) => return CheckResult::error(format!("{:#}", e)),
    };

    match backend.count().await {
        Ok(0) => CheckResult::warn(format!("Backend: {}, archive is empty", backend.name())),
        Ok(count) => CheckResult::ok(format!("Backend: {}, {} posts", backend.name(), count))
            .with_details(serde_json::json!({
                "backend": backend.name(),
                "count": count
            })),
        Err(e) => CheckResult::error(format!("Backend: {}, {}", backend.name(), e)),
    }
}

fn check_media(config: &AppConfig) -> CheckResult {
    match media_strategy(config) {
        Ok(_) => CheckResult::ok(format!("Media served via: {}", config.media.from)),
        Err(e) => CheckResult::error(e.to_string()),
    }
}

fn check_external(config: &AppConfig) -> CheckResult {
    let external = &config.external;
    if !external.enabled {
        return CheckResult::ok("External posts disabled");
    }

    let is_set = |env_var: &str| {
        !env_var.is_empty() && std::env::var(env_var).is_ok_and(|v| !v.trim().is_empty())
    };

    if is_set(&external.bearer_token_env) {
        return CheckResult::ok(format!(
            "Bearer token: {} (set), cache capacity: {}",
            external.bearer_token_env, external.cache_capacity
        ));
    }

    if is_set(&external.consumer_key_env) && is_set(&external.consumer_secret_env) {
        return CheckResult::ok(format!(
            "Consumer credentials: {}/{} (set), token obtained on startup",
            external.consumer_key_env, external.consumer_secret_env
        ));
    }

    CheckResult::warn(format!(
        "External posts enabled but {} (not set) and {}/{} (not set)",
        external.bearer_token_env, external.consumer_key_env, external.consumer_secret_env
    ))
}

fn print_report(report: &DoctorReport) {
    println!("tweet-archive Doctor Report");
    println!("===========================");
    println!();

    print_check("Config", &report.config);
    print_check("Backend", &report.backend);
    print_check("Media", &report.media);
    print_check("External posts", &report.external);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready! Try: tweet-archive latest");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
