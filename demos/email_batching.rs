//! Email batching example
//!
//! Warnings and errors are queued and mailed in batches. The transport here
//! prints each message instead of talking to an SMTP server; swap in
//! `SmtpTransport::from_config` to send real mail.
//!
//! Run with: cargo run --example email_batching

use lite_logger::prelude::*;
use lite_logger::sinks::{BatchingOptions, EmailMessage, EmailSinkOptions, EmailTransport};
use lite_logger::warn;
use std::time::Duration;

struct PrintTransport;

impl EmailTransport for PrintTransport {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        println!("--- mail to {} ---", message.to.join(", "));
        println!("Subject: {}", message.subject);
        print!("{}", message.body);
        println!("--- end of mail ---\n");
        Ok(())
    }
}

fn main() -> Result<()> {
    println!("=== lite_logger - Email Batching Example ===\n");

    let email = EmailConfig::new("app@example.com", "ops@example.com; dev@example.com")
        .with_subject("[{Level:u3}] {Message}");
    let configuration = LoggerConfiguration::new();
    let sink = EmailSink::with_options(
        &email,
        PrintTransport,
        EmailSinkOptions::default()
            .with_batching(
                BatchingOptions::default()
                    .with_period(Duration::from_millis(500))
                    .with_batch_size_limit(5),
            )
            .with_self_log(configuration.self_log().clone())
            .with_metrics(configuration.metrics()),
    )?;

    let logger = configuration
        .write_to(ConsoleSink::new())
        .write_to_restricted(sink, LogLevel::Warning)
        .create_logger();

    println!("1. Twelve events; only warnings and above are mailed, five per mail:");
    for n in 0..12 {
        match n % 4 {
            0 => logger.information("Heartbeat"),
            3 => logger.error("Inventory sync failed"),
            _ => warn!(logger, "Queue depth {Depth}", Depth = n * 10),
        }
    }

    std::thread::sleep(Duration::from_millis(800));

    println!("\n2. Shutdown sends whatever is still queued:");
    logger.fatal("Shutting down after repeated failures");
    logger.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);

    println!("=== Example completed successfully! ===");
    Ok(())
}
