/*============================================================
  Synavera Project: Syn-Vigil
  Module: synvigil_core::config
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Load and validate Syn-Vigil-Core configuration from TOML,
    supplying defaults for watch cadence, storage, control
    socket, and notification behaviour.

  Security / Safety Notes:
    Configuration holds no secrets; the watched endpoint is a
    public, unauthenticated release API.

  Dependencies:
    serde + toml for parsing, dirs for user directory defaults.

  Operational Scope:
    Resolved once at startup; CLI flags override individual
    fields after load.

  Revision History:
    2025-06-12 COD  Authored configuration layer.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit defaults over hidden fallbacks
    - Validation at the boundary, not at point of use
    - Operator-overridable paths for all artefacts
============================================================*/

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, VigilError};

const APP_DIR: &str = "syn-vigil";
const DEFAULT_API_BASE: &str = "https://api.github.com";
const DEFAULT_RELEASES_HOST: &str = "https://github.com";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_INTERVAL_SECS: u64 = 3600;

/// Top-level configuration document.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VigilConfig {
    pub watch: WatchConfig,
    pub storage: StorageConfig,
    pub control: ControlConfig,
    pub notify: NotifyConfig,
}

/// Which repository to watch and how often.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Repository slug in `owner/name` form.
    pub repository: Option<String>,
    /// Installed version to compare against; defaults to this
    /// binary's own package version when absent.
    pub current_version: Option<String>,
    pub api_base_url: String,
    pub releases_host: String,
    pub timeout: u64,
    pub interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            repository: None,
            current_version: None,
            api_base_url: DEFAULT_API_BASE.to_string(),
            releases_host: DEFAULT_RELEASES_HOST.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            interval_secs: DEFAULT_INTERVAL_SECS,
        }
    }
}

/// Where the persisted UpdateInfo record lives.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub state_path: Option<PathBuf>,
}

/// Control socket placement.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlConfig {
    pub socket_path: Option<PathBuf>,
}

/// Notification behaviour.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    pub enabled: bool,
    /// Open the releases page in the default browser when an
    /// update notification fires.
    pub open_release_page: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            open_release_page: false,
        }
    }
}

impl VigilConfig {
    /// Load configuration from an explicit path, or from the default
    /// location when none is given. A missing default file yields the
    /// built-in defaults; a missing explicit file is an error.
    pub fn load_from_optional_path(path: Option<&Path>) -> Result<Self> {
        let (resolved, required) = match path {
            Some(explicit) => (explicit.to_path_buf(), true),
            None => (default_config_path(), false),
        };

        if !resolved.exists() {
            if required {
                return Err(VigilError::Config(format!(
                    "Configuration file {} does not exist",
                    resolved.display()
                )));
            }
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&resolved).map_err(|err| {
            VigilError::Filesystem(format!(
                "Failed to read configuration {}: {err}",
                resolved.display()
            ))
        })?;
        toml::from_str(&raw).map_err(|err| {
            VigilError::Config(format!(
                "Failed to parse configuration {}: {err}",
                resolved.display()
            ))
        })
    }

    /// Resolved state-file path for the persisted UpdateInfo record.
    pub fn state_path(&self) -> PathBuf {
        self.storage
            .state_path
            .clone()
            .unwrap_or_else(|| app_data_dir().join("update_info.json"))
    }

    /// Resolved control-socket path.
    pub fn socket_path(&self) -> PathBuf {
        self.control
            .socket_path
            .clone()
            .unwrap_or_else(|| runtime_dir().join("control.sock"))
    }

    /// Directory for session log files.
    pub fn log_dir(&self) -> PathBuf {
        app_data_dir().join("logs")
    }
}

/// Split a repository slug into `(owner, name)`, rejecting malformed input.
pub fn parse_repository_slug(slug: &str) -> Result<(String, String)> {
    let mut parts = slug.splitn(2, '/');
    let owner = parts.next().unwrap_or_default().trim();
    let name = parts.next().unwrap_or_default().trim();
    if owner.is_empty() || name.is_empty() {
        return Err(VigilError::Config(format!(
            "Repository `{slug}` is not in owner/name form"
        )));
    }
    Ok((owner.to_string(), name.to_string()))
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn runtime_dir() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(app_data_dir)
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_no_file() {
        let config = VigilConfig::default();
        assert_eq!(config.watch.api_base_url, DEFAULT_API_BASE);
        assert_eq!(config.watch.interval_secs, 3600);
        assert!(config.notify.enabled);
        assert!(!config.notify.open_release_page);
    }

    #[test]
    fn parses_full_document() {
        let raw = r#"
            [watch]
            repository = "Synavera-Discorporated/Syn-Vigil"
            interval_secs = 600
            timeout = 5

            [storage]
            state_path = "/tmp/vigil/update_info.json"

            [notify]
            enabled = false
        "#;
        let config: VigilConfig = toml::from_str(raw).unwrap();
        assert_eq!(
            config.watch.repository.as_deref(),
            Some("Synavera-Discorporated/Syn-Vigil")
        );
        assert_eq!(config.watch.interval_secs, 600);
        assert_eq!(config.watch.timeout, 5);
        assert_eq!(
            config.state_path(),
            PathBuf::from("/tmp/vigil/update_info.json")
        );
        assert!(!config.notify.enabled);
    }

    #[test]
    fn slug_validation() {
        assert!(parse_repository_slug("owner/name").is_ok());
        assert!(parse_repository_slug("owner").is_err());
        assert!(parse_repository_slug("/name").is_err());
        assert!(parse_repository_slug("owner/").is_err());
        let (owner, name) = parse_repository_slug("nnostrovskiy/release").unwrap();
        assert_eq!(owner, "nnostrovskiy");
        assert_eq!(name, "release");
    }

    #[test]
    fn explicit_missing_path_errors() {
        let err =
            VigilConfig::load_from_optional_path(Some(Path::new("/nonexistent/vigil.toml")))
                .unwrap_err();
        assert!(matches!(err, VigilError::Config(_)));
    }
}
