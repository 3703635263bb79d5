/*============================================================
  Synavera Project: Syn-Vigil
  Module: synvigil_core::checker
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Decide whether the watched repository has published a
    release newer than the installed version, persist the
    outcome, and announce updates.

  Security / Safety Notes:
    Consumes public release metadata only; failures are folded
    into the persisted record rather than propagated.

  Dependencies:
    Injected ReleaseSource, StateStore, and Notifier
    capabilities; chrono for check timestamps.

  Operational Scope:
    Invoked at startup, on the recurring schedule, and by
    control-socket requests. A check never returns an error to
    its trigger; concurrent triggers short-circuit on the
    in-flight guard and receive the last stored record.

  Revision History:
    2025-06-12 COD  Authored update checker core.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Failures become data, never uncaught propagation
    - Single writer discipline for the persisted record
    - Capability injection over ambient globals
============================================================*/

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::logger::Logger;
use crate::notify::Notifier;
use crate::release::ReleaseSource;
use crate::store::{StateStore, UpdateInfo};
use crate::version::{extract_version, is_newer_version};

/// Owns current-version knowledge and drives the check workflow.
pub struct UpdateChecker {
    current_version: String,
    releases_url: String,
    source: Box<dyn ReleaseSource>,
    store: Box<dyn StateStore>,
    notifier: Box<dyn Notifier>,
    logger: Arc<Logger>,
    in_flight: Mutex<()>,
}

impl UpdateChecker {
    pub fn new(
        current_version: String,
        releases_url: String,
        source: Box<dyn ReleaseSource>,
        store: Box<dyn StateStore>,
        notifier: Box<dyn Notifier>,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            current_version,
            releases_url,
            source,
            store,
            notifier,
            logger,
            in_flight: Mutex::new(()),
        }
    }

    /// The installed version this checker compares against.
    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    /// Run one update check and return the resulting record.
    ///
    /// Every failure along the way — fetch, decode, persistence — is
    /// converted into an UpdateInfo carrying `error`; the caller always
    /// receives a record, never an Err. A trigger that arrives while a
    /// prior check is still running does not race the write: it returns
    /// the last stored record immediately.
    pub async fn check_for_updates(&self) -> UpdateInfo {
        let _guard = match self.in_flight.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                self.logger
                    .debug("BUSY", "Check already in flight; serving stored record");
                return self.stored_update_info().await;
            }
        };

        let stamp = check_stamp();
        match self.run_check(&stamp).await {
            Ok(info) => info,
            Err(err) => {
                self.logger
                    .warn("CHECK", format!("Update check failed: {err}"));
                let info =
                    UpdateInfo::failed(err.to_string(), stamp, self.current_version.clone());
                if let Err(store_err) = self.store.save(&info).await {
                    self.logger.error(
                        "STATE",
                        format!("Failed to persist failure record: {store_err}"),
                    );
                }
                info
            }
        }
    }

    async fn run_check(&self, stamp: &str) -> Result<UpdateInfo> {
        self.logger.info(
            "CHECK",
            format!("Checking for releases newer than {}", self.current_version),
        );

        let release = self.source.latest_release().await?;
        self.logger
            .debug("RELEASE", format!("Latest release tag `{}`", release.tag_name));

        let latest = extract_version(&release.tag_name);
        let info = if is_newer_version(&latest, &self.current_version) {
            let info = UpdateInfo::newer(
                latest.clone(),
                release.html_url,
                release.body,
                release.assets,
                stamp.to_string(),
                self.current_version.clone(),
            );
            self.store.save(&info).await?;
            self.logger.info(
                "UPDATE",
                format!("Update available: {} -> {latest}", self.current_version),
            );
            self.notifier.notify_update(&latest, &self.releases_url);
            info
        } else {
            let info = UpdateInfo::current(stamp.to_string(), self.current_version.clone());
            self.store.save(&info).await?;
            self.logger.info(
                "CURRENT",
                format!("Installed version {} is up to date", self.current_version),
            );
            info
        };

        Ok(info)
    }

    /// Return the last persisted record without performing a check.
    ///
    /// Before any check has run (or when the state file is unreadable)
    /// a default `{available: false}` record is synthesized.
    pub async fn stored_update_info(&self) -> UpdateInfo {
        match self.store.load().await {
            Ok(Some(info)) => info,
            Ok(None) => UpdateInfo::unchecked(self.current_version.clone()),
            Err(err) => {
                self.logger
                    .warn("STATE", format!("Failed to load stored record: {err}"));
                UpdateInfo::unchecked(self.current_version.clone())
            }
        }
    }
}

fn check_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::error::VigilError;
    use crate::notify::RecordingNotifier;
    use crate::release::{ReleaseAsset, ReleaseMetadata};
    use crate::store::MemoryStore;

    const RELEASES_URL: &str = "https://github.com/nnostrovskiy/release/releases";

    enum StubOutcome {
        Succeed(ReleaseMetadata),
        RateLimited,
        NotFound,
        Status(u16),
        Network(String),
    }

    struct StubSource {
        outcome: StubOutcome,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn new(outcome: StubOutcome) -> Self {
            Self {
                outcome,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ReleaseSource for StubSource {
        async fn latest_release(&self) -> Result<ReleaseMetadata> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                StubOutcome::Succeed(release) => Ok(release.clone()),
                StubOutcome::RateLimited => Err(VigilError::RateLimited),
                StubOutcome::NotFound => Err(VigilError::ReleaseNotFound),
                StubOutcome::Status(status) => {
                    Err(VigilError::UnexpectedStatus { status: *status })
                }
                StubOutcome::Network(message) => Err(VigilError::Network(message.clone())),
            }
        }
    }

    /// Source that blocks until released, to exercise the in-flight guard.
    struct GatedSource {
        gate: Arc<tokio::sync::Notify>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ReleaseSource for GatedSource {
        async fn latest_release(&self) -> Result<ReleaseMetadata> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(release_with_tag("v9.9.9"))
        }
    }

    fn release_with_tag(tag: &str) -> ReleaseMetadata {
        ReleaseMetadata {
            tag_name: tag.to_string(),
            html_url: format!("{RELEASES_URL}/tag/{tag}"),
            body: Some("Bug fixes".to_string()),
            assets: vec![ReleaseAsset {
                name: "release.zip".to_string(),
                browser_download_url: format!("{RELEASES_URL}/download/{tag}/release.zip"),
                size: Some(2048),
            }],
        }
    }

    fn checker_with(
        source: Box<dyn ReleaseSource>,
        installed: &str,
    ) -> (Arc<UpdateChecker>, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let checker = Arc::new(UpdateChecker::new(
            installed.to_string(),
            RELEASES_URL.to_string(),
            source,
            Box::new(MemoryStore::new()),
            Box::new(NotifierHandle(notifier.clone())),
            Arc::new(Logger::stderr_only(false)),
        ));
        (checker, notifier)
    }

    struct NotifierHandle(Arc<RecordingNotifier>);

    impl Notifier for NotifierHandle {
        fn notify_update(&self, version: &str, releases_url: &str) {
            self.0.notify_update(version, releases_url);
        }
    }

    #[tokio::test]
    async fn newer_release_yields_available_record_and_notification() {
        let source = Box::new(StubSource::new(StubOutcome::Succeed(release_with_tag(
            "v1.4.0",
        ))));
        let (checker, notifier) = checker_with(source, "1.3.0");

        let info = checker.check_for_updates().await;
        assert!(info.available);
        assert_eq!(info.version.as_deref(), Some("1.4.0"));
        assert_eq!(info.current_version, "1.3.0");
        assert_eq!(info.release_notes.as_deref(), Some("Bug fixes"));
        assert_eq!(info.assets.len(), 1);
        assert!(info.error.is_none());
        assert!(info.last_checked.is_some());

        let announcements = notifier.announcements.lock().unwrap();
        assert_eq!(
            announcements.as_slice(),
            &[("1.4.0".to_string(), RELEASES_URL.to_string())]
        );

        // The returned record is also the persisted one.
        assert_eq!(checker.stored_update_info().await, info);
    }

    #[tokio::test]
    async fn equal_version_yields_not_available_without_error() {
        let source = Box::new(StubSource::new(StubOutcome::Succeed(release_with_tag(
            "v1.3.0",
        ))));
        let (checker, notifier) = checker_with(source, "1.3.0");

        let info = checker.check_for_updates().await;
        assert!(!info.available);
        assert!(info.error.is_none());
        assert!(info.version.is_none());
        assert_eq!(info.current_version, "1.3.0");
        assert!(notifier.announcements.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn older_release_is_not_an_update() {
        let source = Box::new(StubSource::new(StubOutcome::Succeed(release_with_tag(
            "v1.2.9",
        ))));
        let (checker, _) = checker_with(source, "1.3.0");
        assert!(!checker.check_for_updates().await.available);
    }

    #[tokio::test]
    async fn tag_without_numeric_triple_is_not_newer() {
        let source = Box::new(StubSource::new(StubOutcome::Succeed(release_with_tag(
            "latest",
        ))));
        let (checker, notifier) = checker_with(source, "1.3.0");

        let info = checker.check_for_updates().await;
        assert!(!info.available);
        assert!(info.error.is_none());
        assert!(notifier.announcements.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rate_limited_fetch_folds_into_record() {
        let source = Box::new(StubSource::new(StubOutcome::RateLimited));
        let (checker, notifier) = checker_with(source, "1.3.0");

        let info = checker.check_for_updates().await;
        assert!(!info.available);
        assert_eq!(
            info.error.as_deref(),
            Some("Rate limit exceeded. Please try again later.")
        );
        assert!(notifier.announcements.lock().unwrap().is_empty());
        assert_eq!(checker.stored_update_info().await, info);
    }

    #[tokio::test]
    async fn missing_repository_folds_into_record() {
        let source = Box::new(StubSource::new(StubOutcome::NotFound));
        let (checker, _) = checker_with(source, "1.3.0");

        let info = checker.check_for_updates().await;
        assert!(!info.available);
        assert_eq!(
            info.error.as_deref(),
            Some("Repository or release not found. Check repository name.")
        );
    }

    #[tokio::test]
    async fn unexpected_status_carries_the_code() {
        let source = Box::new(StubSource::new(StubOutcome::Status(502)));
        let (checker, _) = checker_with(source, "1.3.0");

        let info = checker.check_for_updates().await;
        let error = info.error.unwrap();
        assert!(error.contains("502"), "error was: {error}");
    }

    #[tokio::test]
    async fn network_failure_folds_into_record() {
        let source = Box::new(StubSource::new(StubOutcome::Network(
            "connection refused".to_string(),
        )));
        let (checker, _) = checker_with(source, "1.3.0");

        let info = checker.check_for_updates().await;
        assert!(!info.available);
        assert!(info.error.unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn stored_record_defaults_before_first_check() {
        let source = Box::new(StubSource::new(StubOutcome::Succeed(release_with_tag(
            "v1.4.0",
        ))));
        let (checker, _) = checker_with(source, "1.3.0");

        let info = checker.stored_update_info().await;
        assert!(!info.available);
        assert!(info.last_checked.is_none());
        assert_eq!(info.current_version, "1.3.0");
    }

    #[tokio::test]
    async fn concurrent_trigger_short_circuits_on_in_flight_guard() {
        let gate = Arc::new(tokio::sync::Notify::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let source = Box::new(GatedSource {
            gate: gate.clone(),
            calls: calls.clone(),
        });
        let (checker, _) = checker_with(source, "1.3.0");

        let first = tokio::spawn({
            let checker = checker.clone();
            async move { checker.check_for_updates().await }
        });
        // Let the first check reach the gate.
        while calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let second = checker.check_for_updates().await;
        assert!(!second.available, "overlapping trigger must not fetch");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        gate.notify_one();
        let first = first.await.unwrap();
        assert!(first.available);
        assert_eq!(first.version.as_deref(), Some("9.9.9"));
    }
}
