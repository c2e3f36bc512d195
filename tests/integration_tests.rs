//! Integration tests for the logging pipeline
//!
//! These tests verify:
//! - Level, per-sink level and source-context gating end to end
//! - Enrichment of the `Logger` property
//! - JSON and output-template rendering through real sinks
//! - Email batching, back-pressure and the SMTP transport
//! - Isolation of failing sinks

use lite_logger::config::LoggerConfiguration;
use lite_logger::core::{LogEvent, LogLevel, Logger, LoggerError, Result, SelfLog};
use lite_logger::enrichers::{LogContextEnricher, LoggerNameEnricher, LOGGER_PROPERTY};
use lite_logger::filters::{SourceContextFilter, SourceContextFilterOptions, SourceContextFilterRule};
use lite_logger::formatting::{JsonFormatter, OutputTemplateFormatter};
use lite_logger::sinks::{
    BatchingOptions, EmailConfig, EmailMessage, EmailSink, EmailSinkOptions, EmailTransport,
    RollingFileSink, Sink, SmtpTransport,
};
use lite_logger::{error, info, warn};
use parking_lot::Mutex;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Clone, Default)]
struct Capture {
    events: Arc<Mutex<Vec<LogEvent>>>,
}

impl Capture {
    fn messages(&self) -> Vec<String> {
        self.events.lock().iter().map(LogEvent::render_message).collect()
    }
}

impl Sink for Capture {
    fn emit(&mut self, event: &LogEvent) -> Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "capture"
    }
}

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<EmailMessage>>,
}

impl EmailTransport for Outbox {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        self.sent.lock().push(message.clone());
        Ok(())
    }
}

struct Unreachable;

impl EmailTransport for Unreachable {
    fn send(&self, _message: &EmailMessage) -> Result<()> {
        Err(LoggerError::email("connection refused"))
    }
}

fn quiet() -> LoggerConfiguration {
    LoggerConfiguration::new().with_self_log(SelfLog::disabled())
}

fn hour() -> BatchingOptions {
    BatchingOptions::default().with_period(Duration::from_secs(3600))
}

#[test]
fn test_delivery_requires_global_sink_and_context_levels() {
    let all = Capture::default();
    let errors = Capture::default();
    let logger = quiet()
        .minimum_level(LogLevel::Debug)
        .filter_with(SourceContextFilter::new(
            SourceContextFilterOptions::new(LogLevel::Warning)
                .with_rule(SourceContextFilterRule::new("Microsoft")),
        ))
        .write_to(all.clone())
        .write_to_restricted(errors.clone(), LogLevel::Error)
        .create_logger();

    let hosting = logger.for_context("Microsoft.Hosting");
    let app = logger.for_context("MyApp.Service");

    app.verbose("below global");
    app.debug("app debug");
    hosting.warning("framework warning");
    hosting.error("framework error");
    app.fatal("app fatal");

    assert_eq!(all.messages(), ["app debug", "framework error", "app fatal"]);
    assert_eq!(errors.messages(), ["framework error", "app fatal"]);
}

#[test]
fn test_empty_rule_list_allows_everything() {
    let capture = Capture::default();
    let logger = quiet()
        .filter_with(SourceContextFilter::new(SourceContextFilterOptions::new(LogLevel::Fatal)))
        .write_to(capture.clone())
        .create_logger();

    for level in LogLevel::ALL {
        logger.for_context("Microsoft").write(level, "x", Default::default());
    }
    assert_eq!(capture.events.lock().len(), LogLevel::ALL.len());
}

#[test]
fn test_logger_name_enrichment() {
    let capture = Capture::default();
    let logger = quiet()
        .enrich_with(LoggerNameEnricher::new())
        .enrich_with(LoggerNameEnricher::new())
        .write_to(capture.clone())
        .create_logger();

    logger.for_context("MyApp.Service").information("with context");
    logger.information("without context");

    let events = capture.events.lock();
    let logger_name = |event: &LogEvent| {
        event
            .properties()
            .get(LOGGER_PROPERTY)
            .and_then(|value| value.as_str())
            .map(str::to_string)
    };
    assert_eq!(logger_name(&events[0]).as_deref(), Some("MyApp.Service"));
    assert_eq!(logger_name(&events[1]).as_deref(), Some("Default"));
}

#[test]
fn test_log_context_properties_are_scoped() {
    let capture = Capture::default();
    let context = LogContextEnricher::new();
    let logger = quiet()
        .enrich_from_log_context(context.clone())
        .write_to(capture.clone())
        .create_logger();

    {
        let _request = logger
            .log_context()
            .expect("installed")
            .push("RequestId", "r-1");
        info!(logger, "inside");
    }
    info!(logger, "outside");

    let events = capture.events.lock();
    assert_eq!(
        events[0].properties().get("RequestId").and_then(|v| v.as_str()),
        Some("r-1")
    );
    assert!(!events[1].properties().contains("RequestId"));
    assert!(context.is_empty());
}

#[test]
fn test_json_line_in_rolling_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let sink = RollingFileSink::new(temp_dir.path().join("json-{Date}.log"))
        .expect("Failed to create sink")
        .with_formatter(JsonFormatter::new());
    let logger = quiet().write_to(sink).create_logger();

    warn!(logger, "Dividing {A} by {B}", A = 10, B = 0);
    assert!(logger.shutdown(Duration::from_secs(5)));

    let path = std::fs::read_dir(temp_dir.path())
        .expect("Failed to list log dir")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .next()
        .expect("one log file");
    let content = std::fs::read_to_string(path).expect("Failed to read log file");

    assert_eq!(content.lines().count(), 1);
    assert!(content.ends_with("}\n"));
    assert!(content.contains(r#""Message":"Dividing 10 by 0","Level":"warn""#));
    assert!(!content.contains(r#""A":10"#));

    let parsed: serde_json::Value = serde_json::from_str(content.trim_end()).expect("valid JSON");
    assert_eq!(parsed["Level"], "warn");
    assert!(parsed["AppTime"].as_str().is_some_and(|time| time.len() == 23));
}

#[test]
fn test_email_flush_sends_one_batch_with_max_severity_subject() {
    let outbox = Arc::new(Outbox::default());
    let config = EmailConfig::new("app@example.com", "ops@example.com")
        .with_subject("{Level}: {Message}");
    let mut sink = EmailSink::with_options(
        &config,
        Arc::clone(&outbox),
        EmailSinkOptions::default()
            .with_batching(hour())
            .with_self_log(SelfLog::disabled()),
    )
    .expect("valid email config");

    for n in 0..150 {
        let level = match n {
            40 => LogLevel::Error,
            60 => LogLevel::Error,
            120 => LogLevel::Fatal,
            _ => LogLevel::Warning,
        };
        sink.emit(&LogEvent::new(level, format!("event {}", n)))
            .expect("enqueue never fails");
    }

    assert!(sink.emit_next_batch());
    {
        let sent = outbox.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Error: event 40");

        let body_lines: Vec<&str> = sent[0].body.lines().collect();
        assert_eq!(body_lines.len(), 100);
        assert!(body_lines[0].ends_with("event 0"));
        assert!(body_lines[99].ends_with("event 99"));
    }
    assert_eq!(sink.queued_len(), 50);

    sink.shutdown(Duration::from_secs(5)).expect("worker stops");
    let sent = outbox.sent.lock();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].subject, "Fatal: event 120");
}

#[test]
fn test_email_queue_limit_drops_newest_without_error() {
    let outbox = Arc::new(Outbox::default());
    let configuration = quiet();
    let sink = EmailSink::with_options(
        &EmailConfig::new("app@example.com", "ops@example.com"),
        Arc::clone(&outbox),
        EmailSinkOptions::default()
            .with_batching(hour().with_queue_limit(10).with_batch_size_limit(100))
            .with_self_log(configuration.self_log().clone())
            .with_metrics(configuration.metrics()),
    )
    .expect("valid email config");

    let logger = configuration
        .write_to_restricted(sink, LogLevel::Warning)
        .create_logger();
    for n in 0..25 {
        error!(logger, "failure {N}", N = n);
    }
    assert_eq!(logger.metrics().dropped_count(), 15);
    assert_eq!(logger.metrics().sink_failures(), 0);

    logger.flush().expect("flush");
    let sent = outbox.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body.lines().count(), 10);
    assert!(sent[0].body.contains("failure 9"));
    assert!(!sent[0].body.contains("failure 10"));
}

#[test]
fn test_failed_email_goes_to_self_log() {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&lines);
    let self_log = SelfLog::to_fn(move |line| captured.lock().push(line.to_string()));

    let sink = EmailSink::with_options(
        &EmailConfig::new("app@example.com", "ops@example.com"),
        Unreachable,
        EmailSinkOptions::default()
            .with_batching(hour())
            .with_self_log(self_log.clone()),
    )
    .expect("valid email config");
    let logger = LoggerConfiguration::new()
        .with_self_log(self_log)
        .write_to(sink)
        .create_logger();

    logger.fatal("disk full");
    logger.flush().expect("queued sinks flush without error");

    let lines = lines.lock();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("Failed to send email"));
    assert!(lines[0].contains("connection refused"));
}

/// Minimal scripted SMTP server; returns everything the client sent
fn fake_smtp_server() -> (u16, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut writer = stream.try_clone().expect("clone stream");
        let mut reader = BufReader::new(stream);
        let mut transcript = String::new();

        writer.write_all(b"220 fake.local ESMTP\r\n").expect("greeting");
        let mut in_data = false;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).expect("read") == 0 {
                break;
            }
            transcript.push_str(&line);

            if in_data {
                if line == ".\r\n" {
                    in_data = false;
                    writer.write_all(b"250 queued\r\n").expect("reply");
                }
                continue;
            }

            let reply: &[u8] = match line.split_whitespace().next().unwrap_or_default() {
                "EHLO" => b"250-fake.local\r\n250 SIZE 1000000\r\n",
                "MAIL" | "RCPT" => b"250 OK\r\n",
                "DATA" => {
                    in_data = true;
                    b"354 end with .\r\n"
                }
                "QUIT" => {
                    writer.write_all(b"221 bye\r\n").expect("reply");
                    break;
                }
                _ => b"500 unknown\r\n",
            };
            writer.write_all(reply).expect("reply");
        }
        transcript
    });

    (port, handle)
}

#[test]
fn test_smtp_transport_against_fake_server() {
    let (port, server) = fake_smtp_server();
    let config = EmailConfig::new("app@example.com", "ops@example.com; dev@example.com")
        .with_mail_server("127.0.0.1", port)
        .with_subject("[{Level:u3}] {Message}")
        .with_timeout(Duration::from_secs(5));

    let transport = SmtpTransport::from_config(&config).expect("valid SMTP settings");
    let sink = EmailSink::with_options(
        &config,
        transport,
        EmailSinkOptions::default().with_batching(hour()),
    )
    .expect("valid email config");

    let logger = quiet().write_to(sink).create_logger();
    logger.error("Payment gateway down");
    logger.warning(".hidden line");
    assert!(logger.shutdown(Duration::from_secs(10)));

    let transcript = server.join().expect("server thread");
    assert!(transcript.contains("MAIL FROM:<app@example.com>\r\n"));
    assert!(transcript.contains("RCPT TO:<ops@example.com>\r\n"));
    assert!(transcript.contains("RCPT TO:<dev@example.com>\r\n"));
    assert!(transcript.contains("Subject: [ERR] Payment gateway down\r\n"));
    assert!(transcript.contains("Payment gateway down"));
    assert!(transcript.contains(".hidden line\r\n"));
    assert!(transcript.ends_with("QUIT\r\n"));
}

#[test]
fn test_failing_sink_is_isolated() {
    struct Broken;

    impl Sink for Broken {
        fn emit(&mut self, _event: &LogEvent) -> Result<()> {
            Err(LoggerError::writer("disk unplugged"))
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    let capture = Capture::default();
    let logger = quiet().write_to(Broken).write_to(capture.clone()).create_logger();
    for n in 0..3 {
        logger.write(LogLevel::Error, "failure {N}", [("N", n)].into_iter().collect());
    }

    assert_eq!(capture.events.lock().len(), 3);
    assert_eq!(logger.metrics().sink_failures(), 3);
    assert_eq!(logger.metrics().total_logged(), 3);
}

#[test]
fn test_output_template_file_and_shutdown_on_drop() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let sink = RollingFileSink::new(temp_dir.path().join("{Date}.txt"))
        .expect("Failed to create sink")
        .with_buffered(true)
        .with_formatter(OutputTemplateFormatter::new(
            "{Level:u3} [{SourceContext}] {Message:lj} {Properties}{NewLine}",
        ));

    let logger: Logger = quiet().write_to(sink).create_logger();
    let orders = logger.for_context("Shop.Orders");
    info!(orders, "Order {OrderId} for {Customer}", OrderId = 7, Customer = "Ann", Total = 12.5);
    drop(orders);
    drop(logger);

    let path = std::fs::read_dir(temp_dir.path())
        .expect("Failed to list log dir")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .next()
        .expect("one log file");
    let content = std::fs::read_to_string(path).expect("Failed to read log file");
    assert_eq!(
        content,
        "INF [Shop.Orders] Order 7 for Ann { Total: 12.5 }\n",
        "buffered output is flushed when the last handle is dropped"
    );
}
