//! Doctor command - validate configuration and show status

use anyhow::Result;
use links_category_domain::{CategoryStore, normalize};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::args::DoctorArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    database: CheckResult,
    bind: CheckResult,
    settings: CheckResult,
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
        database: CheckResult::error("Not checked"),
        bind: CheckResult::error("Not checked"),
        settings: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    // Check config
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.database = check_database(config).await;
        report.bind = check_bind(&config.general.bind);
        report.settings = check_settings(config);
    }

    // Determine overall status
    let checks = [
        &report.config,
        &report.database,
        &report.bind,
        &report.settings,
    ];
    report.overall = if checks.iter().any(|c| c.is_error()) {
        "error".to_string()
    } else if checks.iter().all(|c| c.is_ok()) {
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

async fn check_database(config: &AppConfig) -> CheckResult {
    let store = match super::open_store(config).await {
        Ok(store) => store,
        Err(e) => return CheckResult::error(format!("{:#}", e)),
    };

    let categories = match store.list_categories().await {
        Ok(categories) => categories,
        Err(e) => return CheckResult::error(format!("Failed to list categories: {}", e)),
    };
    let link_ids: Vec<_> = categories
        .iter()
        .filter(|c| c.links_only)
        .map(|c| c.id)
        .collect();

    let message = format!(
        "{} categories, {} link-only",
        categories.len(),
        link_ids.len()
    );
    let result = if link_ids.is_empty() {
        CheckResult::warn(format!("{message} (no category accepts link topics)"))
    } else {
        CheckResult::ok(message)
    };

    result.with_details(serde_json::json!({
        "path": config.general.database_path,
        "links_category_ids": link_ids,
    }))
}

fn check_bind(bind: &str) -> CheckResult {
    match bind.parse::<SocketAddr>() {
        Ok(addr) => CheckResult::ok(format!("Listening address: {}", addr)),
        Err(_) => CheckResult::warn(format!("Bind address is not a socket address: {}", bind)),
    }
}

fn check_settings(config: &AppConfig) -> CheckResult {
    let settings = config.settings();
    if !settings.enabled {
        return CheckResult::warn("Links category disabled");
    }

    // Sanity check of the normalizer with a schemeless link
    match normalize("example.com/doctor") {
        Ok(url) if url.as_str() == "http://example.com/doctor" => CheckResult::ok(format!(
            "Enabled, onebox in post: {}",
            settings.show_onebox_in_post
        ))
        .with_details(serde_json::json!({
            "digest_email_anchor_style": settings.digest_email_anchor_style,
        })),
        Ok(url) => CheckResult::error(format!("Unexpected normalization result: {}", url)),
        Err(e) => CheckResult::error(format!("Link normalizer failed: {}", e)),
    }
}

fn print_report(report: &DoctorReport) {
    println!("links-category Doctor Report");
    println!("============================");
    println!();

    print_check("Config", &report.config);
    print_check("Database", &report.database);
    print_check("Bind", &report.bind);
    print_check("Settings", &report.settings);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready to serve! Try: links-category serve");
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
