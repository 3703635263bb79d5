/*============================================================
  Synavera Project: Syn-Vigil
  Module: synvigil_core::store
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Define the persisted UpdateInfo record and the key-value
    store capability that holds exactly one such record.

  Security / Safety Notes:
    State is written to operator-controlled paths; no
    privileged operations are performed.

  Dependencies:
    serde for JSON serialization, tokio for async file I/O.

  Operational Scope:
    Every check overwrites the single record (success or
    failure); the control channel reads it back on demand.
    No history is retained.

  Revision History:
    2025-06-12 COD  Authored state store and record model.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Single source of truth for check outcomes
    - Stable on-disk field names across releases
    - Capability trait seam for test doubles
============================================================*/

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VigilError};
use crate::release::ReleaseAsset;

/// Outcome of the most recent update check. Exactly one record exists
/// at a time; `available == true` implies `version` is set, and a set
/// `error` implies `available == false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfo {
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<ReleaseAsset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<String>,
    pub current_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UpdateInfo {
    /// Record for a check that found a newer release.
    pub fn newer(
        version: String,
        url: String,
        release_notes: Option<String>,
        assets: Vec<ReleaseAsset>,
        last_checked: String,
        current_version: String,
    ) -> Self {
        Self {
            available: true,
            version: Some(version),
            url: Some(url),
            release_notes,
            assets,
            last_checked: Some(last_checked),
            current_version,
            error: None,
        }
    }

    /// Record for a check that found nothing newer.
    pub fn current(last_checked: String, current_version: String) -> Self {
        Self {
            available: false,
            version: None,
            url: None,
            release_notes: None,
            assets: Vec::new(),
            last_checked: Some(last_checked),
            current_version,
            error: None,
        }
    }

    /// Record for a failed check; the failure text is data, not an error.
    pub fn failed(error: String, last_checked: String, current_version: String) -> Self {
        Self {
            available: false,
            version: None,
            url: None,
            release_notes: None,
            assets: Vec::new(),
            last_checked: Some(last_checked),
            current_version,
            error: Some(error),
        }
    }

    /// Synthesized record returned before any check has run.
    pub fn unchecked(current_version: String) -> Self {
        Self {
            available: false,
            version: None,
            url: None,
            release_notes: None,
            assets: Vec::new(),
            last_checked: None,
            current_version,
            error: None,
        }
    }
}

/// Process-wide persistence for the single UpdateInfo record.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self) -> Result<Option<UpdateInfo>>;
    async fn save(&self, info: &UpdateInfo) -> Result<()>;
}

/// Store backed by a single pretty-printed JSON document on disk.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load(&self) -> Result<Option<UpdateInfo>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(VigilError::Filesystem(format!(
                    "Failed to read state file {}: {err}",
                    self.path.display()
                )))
            }
        };
        let info = serde_json::from_str(&raw).map_err(|err| {
            VigilError::Serialization(format!(
                "Failed to decode state file {}: {err}",
                self.path.display()
            ))
        })?;
        Ok(Some(info))
    }

    async fn save(&self, info: &UpdateInfo) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|err| {
                VigilError::Filesystem(format!(
                    "Failed to create state directory {}: {err}",
                    parent.display()
                ))
            })?;
        }
        let payload = serde_json::to_string_pretty(info).map_err(|err| {
            VigilError::Serialization(format!("Failed to encode UpdateInfo: {err}"))
        })?;
        tokio::fs::write(&self.path, payload).await.map_err(|err| {
            VigilError::Filesystem(format!(
                "Failed to write state file {}: {err}",
                self.path.display()
            ))
        })
    }
}

/// In-memory store for unit tests.
#[cfg(test)]
pub struct MemoryStore {
    record: tokio::sync::Mutex<Option<UpdateInfo>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self {
            record: tokio::sync::Mutex::new(None),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self) -> Result<Option<UpdateInfo>> {
        Ok(self.record.lock().await.clone())
    }

    async fn save(&self, info: &UpdateInfo) -> Result<()> {
        *self.record.lock().await = Some(info.clone());
        Ok(())
    }
}
