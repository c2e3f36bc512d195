//! Email transports
//!
//! `SmtpTransport` speaks plain SMTP over TCP: greeting, `EHLO`, optional
//! `AUTH LOGIN`, `MAIL FROM`, one `RCPT TO` per recipient, `DATA` and
//! `QUIT`. TLS is not supported.

use super::config::EmailConfig;
use crate::core::{LoggerError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

/// A rendered email ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub is_body_html: bool,
}

pub trait EmailTransport: Send + Sync {
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

impl<T: EmailTransport + ?Sized> EmailTransport for Arc<T> {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        (**self).send(message)
    }
}

impl<T: EmailTransport + ?Sized> EmailTransport for Box<T> {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        (**self).send(message)
    }
}

/// Minimal SMTP client; one connection per message
///
/// # Example
///
/// ```no_run
/// use lite_logger::sinks::{EmailConfig, EmailMessage, EmailTransport, SmtpTransport};
///
/// let config = EmailConfig::new("app@example.com", "ops@example.com")
///     .with_mail_server("smtp.example.com", 25);
/// let transport = SmtpTransport::from_config(&config).expect("valid SMTP settings");
/// transport.send(&EmailMessage {
///     from: config.from_email.clone(),
///     to: config.recipients(),
///     subject: "Hello".to_string(),
///     body: "World".to_string(),
///     is_body_html: false,
/// }).expect("mail accepted");
/// ```
#[derive(Debug, Clone)]
pub struct SmtpTransport {
    server: String,
    port: u16,
    timeout: Duration,
    credentials: Option<(String, String)>,
    client_name: String,
}

impl SmtpTransport {
    /// # Errors
    ///
    /// `InvalidConfiguration` when no mail server is set or SSL is requested
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        if config.enable_ssl {
            return Err(LoggerError::config(
                "SmtpTransport",
                "TLS connections are not supported; set enable_ssl to false",
            ));
        }

        let server = config
            .mail_server
            .as_deref()
            .map(str::trim)
            .filter(|server| !server.is_empty())
            .ok_or_else(|| LoggerError::config("SmtpTransport", "mail_server is not set"))?;

        let credentials = match (&config.account, &config.password) {
            (Some(account), Some(password)) if !account.is_empty() => {
                Some((account.clone(), password.clone()))
            }
            _ => None,
        };

        Ok(Self {
            server: server.to_string(),
            port: config.port,
            timeout: config.timeout_duration(),
            credentials,
            client_name: gethostname::gethostname().to_string_lossy().into_owned(),
        })
    }

    fn connect(&self) -> Result<TcpStream> {
        let addresses = (self.server.as_str(), self.port).to_socket_addrs().map_err(|e| {
            LoggerError::email(format!("Cannot resolve {}:{}: {}", self.server, self.port, e))
        })?;

        let mut last_error = None;
        for address in addresses {
            match TcpStream::connect_timeout(&address, self.timeout) {
                Ok(stream) => {
                    // Set timeouts to prevent hanging
                    stream.set_read_timeout(Some(self.timeout))?;
                    stream.set_write_timeout(Some(self.timeout))?;
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(LoggerError::email(match last_error {
            Some(e) => format!("Cannot connect to {}:{}: {}", self.server, self.port, e),
            None => format!("No address found for {}:{}", self.server, self.port),
        }))
    }
}

impl EmailTransport for SmtpTransport {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        let stream = self.connect()?;
        let mut session = SmtpSession::new(stream)?;

        session.command(None, &[220])?;
        session.command(Some(&format!("EHLO {}", self.client_name)), &[250])?;

        if let Some((account, password)) = &self.credentials {
            session.command(Some("AUTH LOGIN"), &[334])?;
            session.secret(&STANDARD.encode(account), &[334])?;
            session.secret(&STANDARD.encode(password), &[235])?;
        }

        session.command(Some(&format!("MAIL FROM:<{}>", message.from)), &[250])?;
        for recipient in &message.to {
            session.command(Some(&format!("RCPT TO:<{}>", recipient)), &[250, 251])?;
        }

        session.command(Some("DATA"), &[354])?;
        session.write_raw(&render_data(message))?;
        session.exchange(None, "message data", &[250])?;

        // The message is accepted at this point; a failed QUIT is not an error
        let _ = session.command(Some("QUIT"), &[221]);
        Ok(())
    }
}

struct SmtpSession {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl SmtpSession {
    fn new(stream: TcpStream) -> Result<Self> {
        let writer = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
        })
    }

    fn write_raw(&mut self, data: &str) -> Result<()> {
        self.writer.write_all(data.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    /// Send `command` (if any) and require one of `codes` in the reply
    fn command(&mut self, command: Option<&str>, codes: &[u16]) -> Result<String> {
        self.exchange(command, command.unwrap_or("(greeting)"), codes)
    }

    /// Like `command`, but keeps the command out of error messages
    fn secret(&mut self, secret: &str, codes: &[u16]) -> Result<String> {
        self.exchange(Some(secret), "AUTH credentials", codes)
    }

    fn exchange(&mut self, command: Option<&str>, label: &str, codes: &[u16]) -> Result<String> {
        if let Some(command) = command {
            self.write_raw(&format!("{}\r\n", command))?;
        }

        let (code, text) = self.read_reply()?;
        if codes.contains(&code) {
            Ok(text)
        } else {
            Err(LoggerError::email(format!(
                "Unexpected reply to {}: {} {}",
                label, code, text
            )))
        }
    }

    fn read_reply(&mut self) -> Result<(u16, String)> {
        let mut text = String::new();
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(LoggerError::email("Connection closed by server"));
            }

            let code = line
                .get(..3)
                .and_then(|code| code.parse::<u16>().ok())
                .ok_or_else(|| LoggerError::email(format!("Malformed reply: {}", line.trim_end())))?;

            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(line.get(4..).unwrap_or_default().trim_end());

            if line.as_bytes().get(3) != Some(&b'-') {
                return Ok((code, text));
            }
        }
    }
}

/// Headers and body of the DATA section, terminated by `<CRLF>.<CRLF>`
fn render_data(message: &EmailMessage) -> String {
    let content_type = if message.is_body_html {
        "text/html"
    } else {
        "text/plain"
    };

    let mut data = String::with_capacity(message.body.len() + 256);
    data.push_str(&format!("From: <{}>\r\n", message.from));
    let to: Vec<String> = message.to.iter().map(|address| format!("<{}>", address)).collect();
    data.push_str(&format!("To: {}\r\n", to.join(", ")));
    data.push_str(&format!("Subject: {}\r\n", encode_header(&message.subject)));
    data.push_str(&format!("Date: {}\r\n", chrono::Local::now().to_rfc2822()));
    data.push_str("MIME-Version: 1.0\r\n");
    data.push_str(&format!("Content-Type: {}; charset=utf-8\r\n", content_type));
    data.push_str("Content-Transfer-Encoding: 8bit\r\n\r\n");

    for line in message.body.lines() {
        // Dot-stuffing
        if line.starts_with('.') {
            data.push('.');
        }
        data.push_str(line);
        data.push_str("\r\n");
    }
    data.push_str(".\r\n");
    data
}

/// Subject lines are single-line; non-ASCII text is base64 encoded-word
fn encode_header(value: &str) -> String {
    let single_line: String = value
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect();
    if single_line.is_ascii() {
        single_line
    } else {
        format!("=?utf-8?B?{}?=", STANDARD.encode(single_line.as_bytes()))
    }
}
