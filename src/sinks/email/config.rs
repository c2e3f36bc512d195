//! Email sink configuration

use crate::core::{LoggerError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 25;
pub const DEFAULT_SUBJECT: &str = "Log Email";
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_subject() -> String {
    DEFAULT_SUBJECT.to_string()
}

/// Mail settings for the email sink
///
/// `to_email` holds one or more addresses separated by `,` or `;`.
/// `email_subject` is an output template rendered against the most severe
/// event of each batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailConfig {
    #[serde(default, alias = "FromEmail")]
    pub from_email: String,

    #[serde(default, alias = "ToEmail")]
    pub to_email: String,

    #[serde(default, alias = "MailServer")]
    pub mail_server: Option<String>,

    #[serde(default = "default_port", alias = "Port")]
    pub port: u16,

    /// Milliseconds
    #[serde(default = "default_timeout", alias = "Timeout")]
    pub timeout: u64,

    #[serde(default = "default_subject", alias = "EmailSubject")]
    pub email_subject: String,

    #[serde(default, alias = "EnableSsl")]
    pub enable_ssl: bool,

    #[serde(default, alias = "IsBodyHtml")]
    pub is_body_html: bool,

    #[serde(default, alias = "Account")]
    pub account: Option<String>,

    #[serde(default, alias = "Password")]
    pub password: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from_email: String::new(),
            to_email: String::new(),
            mail_server: None,
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT_MS,
            email_subject: DEFAULT_SUBJECT.to_string(),
            enable_ssl: false,
            is_body_html: false,
            account: None,
            password: None,
        }
    }
}

impl EmailConfig {
    pub fn new(from_email: impl Into<String>, to_email: impl Into<String>) -> Self {
        Self {
            from_email: from_email.into(),
            to_email: to_email.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_mail_server(mut self, server: impl Into<String>, port: u16) -> Self {
        self.mail_server = Some(server.into());
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, account: impl Into<String>, password: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.email_subject = subject.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// Recipient addresses, split on `,` and `;` with empty entries removed
    pub fn recipients(&self) -> Vec<String> {
        self.to_email
            .split([',', ';'])
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Subject template, falling back to the default when blank
    pub fn subject_template(&self) -> &str {
        if self.email_subject.trim().is_empty() {
            DEFAULT_SUBJECT
        } else {
            &self.email_subject
        }
    }

    /// Check the addresses required to build an email sink
    ///
    /// # Errors
    ///
    /// `MissingArgument` when the sender or the recipient list is empty
    pub fn validate(&self) -> Result<()> {
        if self.from_email.trim().is_empty() {
            return Err(LoggerError::missing_argument("from_email"));
        }
        if self.recipients().is_empty() {
            return Err(LoggerError::missing_argument("to_email"));
        }
        Ok(())
    }
}
