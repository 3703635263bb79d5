/*============================================================
  Synavera Project: Syn-Vigil
  Module: synvigil_core::logger
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Provide structured, append-only logging utilities for
    Syn-Vigil-Core operations.

  Security / Safety Notes:
    Log lines carry repository slugs, versions, and status
    codes only; release notes bodies are never logged.

  Dependencies:
    std::fs::File, std::sync::Mutex, sha2 for integrity hashing.

  Operational Scope:
    Used by runtime components to emit RFC-3339 UTC stamped
    log entries. The session digest is accumulated as entries
    are written and sealed into a sibling `.hash` file on
    finalize.

  Revision History:
    2025-06-12 COD  Established logging module for Syn-Vigil-Core.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Append-only logging with UTC timestamps
    - Deterministic formatting for auditability
    - Graceful error propagation on I/O failures
============================================================*/

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::error::{Result, VigilError};

/// Structured log level for Syn-Vigil-Core events.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
        }
    }
}

struct LogSink {
    writer: BufWriter<File>,
    hasher: Sha256,
}

/// Shared logger that emits append-only entries in Synavera format.
pub struct Logger {
    sink: Option<Mutex<LogSink>>,
    path: Option<PathBuf>,
    verbose: bool,
}

impl Logger {
    /// Build a logger that writes to stderr and optionally to a file.
    pub fn new(path: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let sink = match path {
            Some(ref file_path) => {
                if let Some(parent) = file_path.parent() {
                    std::fs::create_dir_all(parent).map_err(|err| {
                        VigilError::Filesystem(format!(
                            "Failed to create log directory {}: {err}",
                            parent.display()
                        ))
                    })?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(file_path)
                    .map_err(|err| {
                        VigilError::Filesystem(format!(
                            "Failed to open log file {}: {err}",
                            file_path.display()
                        ))
                    })?;
                Some(Mutex::new(LogSink {
                    writer: BufWriter::new(file),
                    hasher: Sha256::new(),
                }))
            }
            None => None,
        };

        Ok(Self {
            sink,
            path,
            verbose,
        })
    }

    /// Logger without a backing file; stderr only.
    #[allow(dead_code)]
    pub fn stderr_only(verbose: bool) -> Self {
        Self {
            sink: None,
            path: None,
            verbose,
        }
    }

    /// Emit a log entry with the given level, code, and message.
    pub fn log<S: AsRef<str>>(&self, level: LogLevel, code: &str, message: S) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let payload = format!(
            "{timestamp} [{}] [{}] {}",
            level.as_str(),
            code,
            message.as_ref()
        );

        if self.verbose || level == LogLevel::Error || level == LogLevel::Warn {
            eprintln!("{payload}");
        }

        if let Some(sink) = &self.sink {
            if let Ok(mut guard) = sink.lock() {
                let line = format!("{payload}\n");
                guard.hasher.update(line.as_bytes());
                if guard.writer.write_all(line.as_bytes()).is_err() {
                    eprintln!("{timestamp} [ERROR] [LOGGER] Failed to write to log file");
                } else if guard.writer.flush().is_err() {
                    eprintln!("{timestamp} [WARN] [LOGGER] Failed to flush log writer");
                }
            }
        }
    }

    /// Convenience wrapper for `INFO` level events.
    pub fn info<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Info, code, message);
    }

    /// Convenience wrapper for `WARN` level events.
    pub fn warn<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Warn, code, message);
    }

    /// Convenience wrapper for `ERROR` level events.
    pub fn error<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Error, code, message);
    }

    /// Convenience wrapper for `DEBUG` level events.
    pub fn debug<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Debug, code, message);
    }

    /// Seal the session digest alongside the log file.
    pub fn finalize(&self) -> Result<()> {
        let (Some(sink), Some(path)) = (&self.sink, &self.path) else {
            return Ok(());
        };
        let digest = {
            let mut guard = sink
                .lock()
                .map_err(|_| VigilError::Runtime("Logger sink poisoned".into()))?;
            guard.writer.flush().map_err(|err| {
                VigilError::Filesystem(format!("Failed to flush log writer: {err}"))
            })?;
            guard.hasher.clone().finalize()
        };

        let mut hash_os = path.as_os_str().to_os_string();
        hash_os.push(".hash");
        let hash_path = PathBuf::from(hash_os);
        let mut file = File::create(&hash_path).map_err(|err| {
            VigilError::Filesystem(format!(
                "Failed to create hash file {}: {err}",
                hash_path.display()
            ))
        })?;
        writeln!(
            file,
            "{:x}  {}",
            digest,
            path.file_name().unwrap_or_default().to_string_lossy()
        )
        .map_err(|err| {
            VigilError::Filesystem(format!(
                "Failed to write hash file {}: {err}",
                hash_path.display()
            ))
        })?;
        Ok(())
    }
}
