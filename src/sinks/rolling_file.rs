//! Rolling file sink
//!
//! The file name is derived from a path format containing one of the
//! placeholders `{Date}` (yyyyMMdd), `{Hour}` (yyyyMMddHH) or `{HalfHour}`
//! (yyyyMMddHHmm, minutes 00 or 30). A new file is started whenever an
//! event falls into a new period. When a size limit is set and the current
//! file has reached it, writing continues in `<name>_001.<ext>`,
//! `<name>_002.<ext>` and so on. Only the newest `retained_file_count_limit`
//! files matching the format are kept.

use super::Sink;
use crate::core::{LogEvent, LoggerError, Result};
use crate::formatting::{OutputTemplateFormatter, TextFormatter};
use chrono::{DateTime, Local, Timelike};
#[cfg(feature = "file")]
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// 1 GiB
pub const DEFAULT_FILE_SIZE_LIMIT_BYTES: u64 = 1024 * 1024 * 1024;

pub const DEFAULT_RETAINED_FILE_COUNT_LIMIT: usize = 31;

/// Period covered by one log file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollingInterval {
    /// No placeholder: a single file (still subject to the size limit)
    Infinite,
    /// `{Date}`
    Day,
    /// `{Hour}`
    Hour,
    /// `{HalfHour}`
    HalfHour,
}

impl RollingInterval {
    const PLACEHOLDERS: [(&'static str, RollingInterval); 3] = [
        ("{HalfHour}", RollingInterval::HalfHour),
        ("{Hour}", RollingInterval::Hour),
        ("{Date}", RollingInterval::Day),
    ];

    /// Period key for a timestamp, e.g. `20250108` for `Day`
    pub fn key(&self, timestamp: &DateTime<Local>) -> String {
        match self {
            RollingInterval::Infinite => String::new(),
            RollingInterval::Day => timestamp.format("%Y%m%d").to_string(),
            RollingInterval::Hour => timestamp.format("%Y%m%d%H").to_string(),
            RollingInterval::HalfHour => {
                let minute = if timestamp.minute() < 30 { 0 } else { 30 };
                format!("{}{:02}", timestamp.format("%Y%m%d%H"), minute)
            }
        }
    }

    fn key_len(&self) -> usize {
        match self {
            RollingInterval::Infinite => 0,
            RollingInterval::Day => 8,
            RollingInterval::Hour => 10,
            RollingInterval::HalfHour => 12,
        }
    }
}

/// File name split around the period key
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileNameTemplate {
    prefix: String,
    suffix: String,
    interval: RollingInterval,
}

impl FileNameTemplate {
    fn parse(file_name: &str) -> Self {
        for (placeholder, interval) in RollingInterval::PLACEHOLDERS {
            if let Some(pos) = file_name.find(placeholder) {
                return Self {
                    prefix: file_name[..pos].to_string(),
                    suffix: file_name[pos + placeholder.len()..].to_string(),
                    interval,
                };
            }
        }

        let split = file_name.rfind('.').filter(|&pos| pos > 0).unwrap_or(file_name.len());
        Self {
            prefix: file_name[..split].to_string(),
            suffix: file_name[split..].to_string(),
            interval: RollingInterval::Infinite,
        }
    }

    fn file_name(&self, key: &str, sequence: u32) -> String {
        if sequence == 0 {
            format!("{}{}{}", self.prefix, key, self.suffix)
        } else {
            format!("{}{}_{:03}{}", self.prefix, key, sequence, self.suffix)
        }
    }

    /// Parse `(key, sequence)` back out of a file name produced by this template
    fn matches(&self, file_name: &str) -> Option<(String, u32)> {
        let middle = file_name
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())?;

        let key_len = self.interval.key_len();
        if middle.len() < key_len {
            return None;
        }
        let (key, rest) = middle.split_at(key_len);
        if !key.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let sequence = if rest.is_empty() {
            0
        } else {
            let digits = rest.strip_prefix('_')?;
            if digits.len() < 3 || !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            digits.parse().ok()?
        };

        Some((key.to_string(), sequence))
    }
}

struct OpenFile {
    key: String,
    sequence: u32,
    path: PathBuf,
    writer: BufWriter<File>,
    size: u64,
}

/// File sink with date/size based naming and retention
///
/// # Example
///
/// ```no_run
/// use lite_logger::sinks::RollingFileSink;
///
/// let sink = RollingFileSink::new("logs/app-{Date}.log")
///     .expect("log directory is writable")
///     .with_file_size_limit(Some(10 * 1024 * 1024))
///     .with_retained_file_count_limit(Some(7));
/// ```
pub struct RollingFileSink {
    directory: PathBuf,
    template: FileNameTemplate,
    formatter: Box<dyn TextFormatter>,
    file_size_limit_bytes: Option<u64>,
    retained_file_count_limit: Option<usize>,
    buffered: bool,
    shared: bool,
    current: Option<OpenFile>,
    buffer: String,
}

impl RollingFileSink {
    /// Create a sink for `path_format`
    ///
    /// The placeholder must appear in the file name, not in a directory.
    /// Missing directories are created.
    ///
    /// # Errors
    ///
    /// Returns error if the path has no file name, the placeholder appears
    /// in the directory part, or the directory cannot be created
    pub fn new<P: AsRef<Path>>(path_format: P) -> Result<Self> {
        let path_format = path_format.as_ref();
        let file_name = path_format
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                LoggerError::file_sink(path_format.display().to_string(), "Path has no file name")
            })?;

        let directory = match path_format.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let directory_text = directory.to_string_lossy();
        if RollingInterval::PLACEHOLDERS
            .iter()
            .any(|(placeholder, _)| directory_text.contains(placeholder))
        {
            return Err(LoggerError::config(
                "RollingFileSink",
                format!(
                    "Rolling placeholder must be part of the file name: '{}'",
                    path_format.display()
                ),
            ));
        }

        fs::create_dir_all(&directory).map_err(|e| {
            LoggerError::io_operation(
                "create log directory",
                format!("Failed to create directory '{}'", directory.display()),
                e,
            )
        })?;

        Ok(Self {
            template: FileNameTemplate::parse(file_name),
            directory,
            formatter: Box::new(OutputTemplateFormatter::default()),
            file_size_limit_bytes: Some(DEFAULT_FILE_SIZE_LIMIT_BYTES),
            retained_file_count_limit: Some(DEFAULT_RETAINED_FILE_COUNT_LIMIT),
            buffered: false,
            shared: true,
            current: None,
            buffer: String::with_capacity(256),
        })
    }

    #[must_use]
    pub fn with_formatter<F: TextFormatter + 'static>(mut self, formatter: F) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    /// `None` disables size-based sequencing; the smallest limit is one byte
    #[must_use]
    pub fn with_file_size_limit(mut self, limit: Option<u64>) -> Self {
        self.file_size_limit_bytes = limit.map(|limit| limit.max(1));
        self
    }

    /// `None` keeps every file
    #[must_use]
    pub fn with_retained_file_count_limit(mut self, limit: Option<usize>) -> Self {
        self.retained_file_count_limit = limit;
        self
    }

    /// When false, every event is flushed to disk immediately
    ///
    /// Buffering and sharing exclude each other: enabling buffering turns
    /// sharing off.
    #[must_use]
    pub fn with_buffered(mut self, buffered: bool) -> Self {
        self.buffered = buffered;
        if buffered {
            self.shared = false;
        }
        self
    }

    /// When true, each write holds an exclusive lock on the file so several
    /// processes can share it
    ///
    /// A shared file is flushed before the lock is released, so enabling
    /// sharing turns buffering off.
    #[must_use]
    pub fn with_shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        if shared {
            self.buffered = false;
        }
        self
    }

    pub fn is_buffered(&self) -> bool {
        self.buffered
    }

    pub fn is_shared(&self) -> bool {
        self.shared
    }

    pub fn interval(&self) -> RollingInterval {
        self.template.interval
    }

    /// Path of the file currently written, if any
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|file| file.path.as_path())
    }

    /// Files produced by this sink's format, newest first
    fn existing_files(&self) -> Result<Vec<(String, u32, PathBuf)>> {
        let entries = fs::read_dir(&self.directory).map_err(|e| {
            LoggerError::io_operation(
                "list log directory",
                format!("Failed to read '{}'", self.directory.display()),
                e,
            )
        })?;

        let mut files: Vec<(String, u32, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                let (key, sequence) = self.template.matches(name.to_str()?)?;
                Some((key, sequence, entry.path()))
            })
            .collect();

        files.sort_by(|a, b| (&b.0, b.1).cmp(&(&a.0, a.1)));
        Ok(files)
    }

    fn open(&self, key: &str, sequence: u32) -> Result<OpenFile> {
        let path = self.directory.join(self.template.file_name(key, sequence));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                LoggerError::file_sink(path.display().to_string(), format!("Failed to open: {}", e))
            })?;

        let size = file
            .metadata()
            .map_err(|e| {
                LoggerError::file_sink(
                    path.display().to_string(),
                    format!("Cannot access file metadata: {}", e),
                )
            })?
            .len();

        Ok(OpenFile {
            key: key.to_string(),
            sequence,
            path,
            writer: BufWriter::new(file),
            size,
        })
    }

    /// An empty file is never full, so every file takes at least one event
    fn is_full(&self, file: &OpenFile) -> bool {
        file.size > 0 && self.file_size_limit_bytes.is_some_and(|limit| file.size >= limit)
    }

    /// Open the latest file for a period, continuing past full ones
    fn open_for_period(&self, key: &str) -> Result<OpenFile> {
        let mut sequence = self
            .existing_files()?
            .into_iter()
            .filter(|(existing, _, _)| existing == key)
            .map(|(_, sequence, _)| sequence)
            .max()
            .unwrap_or(0);

        loop {
            let file = self.open(key, sequence)?;
            if !self.is_full(&file) {
                return Ok(file);
            }
            sequence += 1;
        }
    }

    fn close_current(&mut self) -> Result<()> {
        if let Some(mut file) = self.current.take() {
            file.writer.flush().map_err(|e| {
                LoggerError::file_sink(
                    file.path.display().to_string(),
                    format!("Failed to flush before rolling: {}", e),
                )
            })?;
        }
        Ok(())
    }

    /// Delete the oldest files beyond the retention limit
    fn apply_retention(&self) -> Result<()> {
        let Some(limit) = self.retained_file_count_limit else {
            return Ok(());
        };

        let current = self.current_path();
        let mut failures = Vec::new();
        for (_, _, path) in self.existing_files()?.into_iter().skip(limit.max(1)) {
            if Some(path.as_path()) == current {
                continue;
            }
            if let Err(e) = fs::remove_file(&path) {
                failures.push(format!("{}: {}", path.display(), e));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(LoggerError::file_sink(
                self.directory.display().to_string(),
                format!("Failed to remove old log files: {}", failures.join(", ")),
            ))
        }
    }

    fn write_buffer(&mut self) -> Result<()> {
        let shared = self.shared;
        let buffered = self.buffered;
        let file = self
            .current
            .as_mut()
            .ok_or_else(|| LoggerError::writer("File writer not initialized"))?;
        let bytes = self.buffer.as_bytes();

        if shared {
            write_locked(file, bytes)?;
        } else {
            file.writer.write_all(bytes)?;
            if !buffered {
                file.writer.flush()?;
            }
        }

        file.size += bytes.len() as u64;
        Ok(())
    }
}

#[cfg(feature = "file")]
fn write_locked(file: &mut OpenFile, bytes: &[u8]) -> Result<()> {
    file.writer.get_ref().lock_exclusive().map_err(|e| {
        LoggerError::file_sink(file.path.display().to_string(), format!("Failed to lock: {}", e))
    })?;
    let written = file
        .writer
        .write_all(bytes)
        .and_then(|()| file.writer.flush());
    let unlocked = file.writer.get_ref().unlock();
    written?;
    unlocked?;
    Ok(())
}

#[cfg(not(feature = "file"))]
fn write_locked(file: &mut OpenFile, bytes: &[u8]) -> Result<()> {
    file.writer.write_all(bytes)?;
    file.writer.flush()?;
    Ok(())
}

impl Sink for RollingFileSink {
    fn emit(&mut self, event: &LogEvent) -> Result<()> {
        let key = self.template.interval.key(event.timestamp());
        let mut rolled = false;

        let period_changed = self.current.as_ref().map_or(true, |file| file.key != key);
        if period_changed {
            self.close_current()?;
            self.current = Some(self.open_for_period(&key)?);
            rolled = true;
        } else if let Some(next) = self
            .current
            .as_ref()
            .filter(|file| self.is_full(file))
            .map(|file| file.sequence + 1)
        {
            self.close_current()?;
            self.current = Some(self.open(&key, next)?);
            rolled = true;
        }

        self.buffer.clear();
        self.formatter.format(event, &mut self.buffer);
        self.write_buffer()?;

        if rolled {
            self.apply_retention()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(file) = self.current.as_mut() {
            file.writer.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "rolling_file"
    }
}

impl Drop for RollingFileSink {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed
        let _ = self.flush();
    }
}
