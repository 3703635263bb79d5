/*============================================================
  Synavera Project: Syn-Vigil
  Module: synvigil_core::error
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Centralise Syn-Vigil-Core error types to provide consistent
    diagnostics and exit semantics.

  Security / Safety Notes:
    Error contexts carry only public endpoint URLs and status
    codes; no credentials exist in this system to leak.

  Dependencies:
    thiserror for ergonomic error definitions.

  Operational Scope:
    Used across modules to propagate recoverable failures and
    consolidate exit codes for the binary entry point. Fetch
    failures additionally fold into the persisted UpdateInfo
    record via their Display form.

  Revision History:
    2025-06-12 COD  Established shared error definitions.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit error taxonomy with actionable context
    - No silent failure paths
    - Stable exit codes for operational tooling
============================================================*/

use std::io;
use std::process::ExitCode;

use thiserror::Error;

/// Result alias for Syn-Vigil-Core operations.
pub type Result<T> = std::result::Result<T, VigilError>;

/// Enumerates high-level error domains surfaced by Syn-Vigil-Core.
#[derive(Debug, Error)]
pub enum VigilError {
    #[error("Configuration: {0}")]
    Config(String),
    #[error("Network: {0}")]
    Network(String),
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,
    #[error("Repository or release not found. Check repository name.")]
    ReleaseNotFound,
    #[error("HTTP {status}: unexpected response from release endpoint")]
    UnexpectedStatus { status: u16 },
    #[error("Serialization: {0}")]
    Serialization(String),
    #[error("Filesystem: {0}")]
    Filesystem(String),
    #[error("Runtime: {0}")]
    Runtime(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl VigilError {
    /// Map error category to a deterministic exit code.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            VigilError::Config(_) => ExitCode::from(20),
            VigilError::Network(_) => ExitCode::from(30),
            VigilError::Serialization(_) => ExitCode::from(31),
            VigilError::RateLimited => ExitCode::from(32),
            VigilError::ReleaseNotFound => ExitCode::from(33),
            VigilError::UnexpectedStatus { .. } => ExitCode::from(34),
            VigilError::Filesystem(_) => ExitCode::from(40),
            VigilError::Io(_) => ExitCode::from(41),
            VigilError::Runtime(_) => ExitCode::from(50),
        }
    }
}
