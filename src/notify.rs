/*============================================================
  Synavera Project: Syn-Vigil
  Module: synvigil_core::notify
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Present "update available" notifications to the operator.

  Security / Safety Notes:
    Only the version string and the public releases URL are
    surfaced; release notes stay in the persisted record.

  Dependencies:
    open for launching the releases page in a browser.

  Operational Scope:
    Fired by the checker exactly when a newer release is
    detected. Environments without a presentation surface use
    the silent implementation; notification delivery is
    best-effort and never fails a check.

  Revision History:
    2025-06-12 COD  Authored notification capability.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Capability trait seam for test doubles
    - Best-effort side effects outside the core flow
============================================================*/

/// Presentation capability for update announcements.
pub trait Notifier: Send + Sync {
    /// Announce that `version` is available at `releases_url`.
    fn notify_update(&self, version: &str, releases_url: &str);
}

/// Notifier that writes a banner to stderr and optionally opens the
/// releases page in the default browser.
pub struct ConsoleNotifier {
    open_release_page: bool,
}

impl ConsoleNotifier {
    pub fn new(open_release_page: bool) -> Self {
        Self { open_release_page }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify_update(&self, version: &str, releases_url: &str) {
        eprintln!("[Syn-Vigil-Core] Update available");
        eprintln!("[Syn-Vigil-Core] Version {version} is ready to download");
        eprintln!("[Syn-Vigil-Core] Releases: {releases_url}");
        if self.open_release_page {
            // Best-effort; headless hosts simply stay on the banner.
            let _ = open::that(releases_url);
        }
    }
}

/// No-op notifier for environments without a presentation surface,
/// or when notifications are disabled.
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify_update(&self, _version: &str, _releases_url: &str) {}
}

/// Test double that records every announcement.
#[cfg(test)]
pub struct RecordingNotifier {
    pub announcements: std::sync::Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            announcements: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn notify_update(&self, version: &str, releases_url: &str) {
        self.announcements
            .lock()
            .expect("announcement log poisoned")
            .push((version.to_string(), releases_url.to_string()));
    }
}
