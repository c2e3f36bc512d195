//! Basic logger usage example
//!
//! Demonstrates console logging, per-context loggers, message templates and
//! source-context filtering.
//!
//! Run with: cargo run --example basic_usage

use lite_logger::prelude::*;
use lite_logger::{debug, info, warn};

fn main() -> Result<()> {
    println!("=== lite_logger - Basic Usage Example ===\n");

    let logger = LoggerConfiguration::new()
        .minimum_level(LogLevel::Verbose)
        .enrich_with(LoggerNameEnricher::new())
        .filter_with(SourceContextFilter::new(
            SourceContextFilterOptions::new(LogLevel::Information)
                .with_rule(SourceContextFilterRule::new("Microsoft"))
                .with_rule(SourceContextFilterRule::new("Shop.Cache").with_log_level(LogLevel::Warning)),
        ))
        .write_to(ConsoleSink::new())
        .create_logger();

    println!("1. Logging at different levels:");
    logger.verbose("This is a verbose message");
    logger.debug("This is a debug message");
    logger.information("This is an information message");
    logger.warning("This is a warning message");
    logger.error("This is an error message");
    logger.fatal("This is a fatal message");

    println!("\n2. Message templates with named properties:");
    let orders = logger.for_context("Shop.Orders");
    info!(orders, "Order {OrderId} placed by {Customer}", OrderId = 1042, Customer = "Ann");
    warn!(orders, "Payment for {OrderId} retried {Attempts} times", OrderId = 1042, Attempts = 3);
    debug!(orders, "Basket {Items}", Items = vec!["apple", "pear"]);

    println!("\n3. Source-context rules (Microsoft and Shop.Cache are quieter):");
    let hosting = logger.for_context("Microsoft.Hosting");
    hosting.information("Request starting (hidden)");
    hosting.warning("Slow request (visible)");

    let cache = logger.for_context("Shop.Cache");
    cache.warning("Cache miss storm (hidden)");
    cache.error("Cache unavailable (visible)");

    println!("\n4. Exceptions:");
    let failure = std::io::Error::new(std::io::ErrorKind::NotFound, "settings.json missing");
    orders.write_exception(
        LogLevel::Error,
        ExceptionInfo::from_error(&failure),
        "Could not load {File}",
        [("File", "settings.json")].into_iter().collect(),
    );

    logger.flush()?;
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
