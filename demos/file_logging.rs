//! File logging example
//!
//! Builds a logger from JSON options: console output plus JSON lines in a
//! rolling file, with events written from a background thread.
//!
//! Run with: cargo run --example file_logging

use lite_logger::prelude::*;
use lite_logger::{error, info};

fn main() -> Result<()> {
    println!("=== lite_logger - File Logging Example ===\n");

    let log_dir = std::env::temp_dir().join("lite_logger_demo");
    let path_format = log_dir.join("app-{Date}.log");

    let options = LoggerOptions::from_json(&format!(
        r#"{{
            "StdOut": true,
            "RollingFile": true,
            "FormatJson": true,
            "Async": true,
            "SkipMicrosoftLog": true,
            "LogMinLevel": "Debug",
            "PathFormat": {}
        }}"#,
        serde_json::to_string(&path_format.to_string_lossy())?
    ))?;

    let logger = build_logger(&options, Some("Development"))?;
    let startup = logger.for_context("Demo.Startup");

    println!("1. Logging to both console and file:");
    info!(startup, "Application started on {Port}", Port = 8080);
    startup.debug("Loading configuration...");
    startup.warning("Using default settings for some options");
    error!(startup, "Failed to load optional plugin {Plugin}", Plugin = "metrics");
    logger.for_context("Microsoft.AspNetCore").warning("Skipped by SkipMicrosoftLog");

    println!("\n2. Scoped properties from the log context:");
    if let Some(context) = logger.log_context() {
        let _request = context.push("RequestId", "req-17");
        info!(startup, "Handling request");
    }

    if !logger.shutdown(DEFAULT_SHUTDOWN_TIMEOUT) {
        eprintln!("Some sinks did not finish in time");
    }

    println!("\n3. Files written to {}:", log_dir.display());
    for entry in std::fs::read_dir(&log_dir)? {
        let path = entry?.path();
        println!("   {}", path.display());
        for line in std::fs::read_to_string(&path)?.lines().take(3) {
            println!("     {}", line);
        }
    }

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
