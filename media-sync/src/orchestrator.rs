//! # Sync Orchestrator
//!
//! Pull-based synchronization of remote providers into the catalog. A sync
//! run lists the provider's files, diffs them against what the catalog
//! already holds for that provider, and imports only the new items through
//! the regular import pipeline (so dedup, compensation, and thumbnails all
//! apply).
//!
//! At most one run per provider is in flight at a time. Runs stop
//! cooperatively: `cancel` flips a token that the run checks between items,
//! so an in-progress item always completes or compensates fully before the
//! run winds down.

use crate::error::{Result, SyncError};
use crate::status::{SyncReport, SyncState, SyncStatus};
use chrono::Utc;
use media_ingest::{ImportOptions, ImportOutcome, MediaImportPipeline};
use media_providers::ProviderFactory;
use media_store::{MediaRepository, ProviderConfigRepository};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

struct ActiveRun {
    token: CancellationToken,
}

/// Drives sync runs and tracks their state per provider.
pub struct SyncOrchestrator {
    factory: Arc<ProviderFactory>,
    pipeline: Arc<MediaImportPipeline>,
    media: Arc<dyn MediaRepository>,
    configs: Arc<dyn ProviderConfigRepository>,
    active: Mutex<HashMap<String, ActiveRun>>,
    last_reports: Mutex<HashMap<String, SyncReport>>,
}

impl SyncOrchestrator {
    pub fn new(
        factory: Arc<ProviderFactory>,
        pipeline: Arc<MediaImportPipeline>,
        media: Arc<dyn MediaRepository>,
        configs: Arc<dyn ProviderConfigRepository>,
    ) -> Self {
        Self {
            factory,
            pipeline,
            media,
            configs,
            active: Mutex::new(HashMap::new()),
            last_reports: Mutex::new(HashMap::new()),
        }
    }

    /// Run a sync for one provider and wait for its report.
    #[instrument(skip(self))]
    pub async fn sync_now(&self, provider_id: &str) -> Result<SyncReport> {
        let token = self.begin(provider_id).await?;
        self.run_to_completion(provider_id, token).await
    }

    /// Start a sync in the background; returns once the run is registered.
    #[instrument(skip(self))]
    pub async fn start_sync(self: &Arc<Self>, provider_id: &str) -> Result<()> {
        let token = self.begin(provider_id).await?;
        let this = Arc::clone(self);
        let id = provider_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = this.run_to_completion(&id, token).await {
                warn!(provider_id = %id, "Background sync failed: {}", e);
            }
        });
        Ok(())
    }

    /// Ask a running sync to stop. Returns whether a run was active.
    ///
    /// The run finishes its current item before winding down; observe
    /// completion through [`status`](Self::status).
    pub async fn cancel(&self, provider_id: &str) -> bool {
        match self.active.lock().await.get(provider_id) {
            Some(run) => {
                info!(provider_id, "Cancelling sync");
                run.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Current state and most recent report for a provider.
    pub async fn status(&self, provider_id: &str) -> SyncStatus {
        let state = match self.active.lock().await.get(provider_id) {
            Some(run) if run.token.is_cancelled() => SyncState::Cancelling,
            Some(_) => SyncState::Running,
            None => SyncState::Idle,
        };

        SyncStatus {
            provider_id: provider_id.to_string(),
            state,
            last_report: self.last_reports.lock().await.get(provider_id).cloned(),
        }
    }

    /// Sync every enabled remote provider, sequentially.
    ///
    /// A provider whose run fails or is already running is skipped; the
    /// remaining providers still sync.
    #[instrument(skip(self))]
    pub async fn sync_all(&self) -> Result<Vec<SyncReport>> {
        let configs = self.configs.list_enabled().await?;
        let mut reports = Vec::new();

        for config in configs {
            if !config.provider_type.is_remote() {
                continue;
            }
            match self.sync_now(&config.id).await {
                Ok(report) => reports.push(report),
                Err(SyncError::AlreadyRunning { provider_id }) => {
                    info!(provider_id, "Sync already in flight, skipping");
                }
                Err(e) => warn!(provider_id = %config.id, "Sync failed: {}", e),
            }
        }

        Ok(reports)
    }

    /// Register a run, enforcing one run per provider.
    async fn begin(&self, provider_id: &str) -> Result<CancellationToken> {
        let mut active = self.active.lock().await;
        if active.contains_key(provider_id) {
            return Err(SyncError::AlreadyRunning {
                provider_id: provider_id.to_string(),
            });
        }

        let token = CancellationToken::new();
        active.insert(
            provider_id.to_string(),
            ActiveRun {
                token: token.clone(),
            },
        );
        Ok(token)
    }

    async fn run_to_completion(
        &self,
        provider_id: &str,
        token: CancellationToken,
    ) -> Result<SyncReport> {
        let result = self.run_sync(provider_id, &token).await;
        self.active.lock().await.remove(provider_id);

        let report = result?;
        self.configs
            .set_last_sync(provider_id, report.finished_at)
            .await?;
        self.last_reports
            .lock()
            .await
            .insert(provider_id.to_string(), report.clone());
        Ok(report)
    }

    async fn run_sync(&self, provider_id: &str, token: &CancellationToken) -> Result<SyncReport> {
        let provider = self.factory.resolve(provider_id).await?;
        let mut report = SyncReport::new(provider_id);

        let files = provider.list_files(None).await?;
        let existing: HashSet<String> = self
            .media
            .list_provider_file_ids(provider_id)
            .await?
            .into_iter()
            .collect();

        let candidates = files
            .iter()
            .filter(|f| !f.is_folder && !existing.contains(&f.id));

        for file in candidates {
            if token.is_cancelled() {
                info!(provider_id, "Sync cancelled, stopping between items");
                report.cancelled = true;
                break;
            }

            match self
                .pipeline
                .import_remote(provider.as_ref(), file, &ImportOptions::default())
                .await
            {
                Ok(ImportOutcome::Imported(_)) => report.imported += 1,
                Ok(ImportOutcome::Duplicate(_)) => report.duplicates += 1,
                Err(e) => {
                    warn!(provider_id, file = %file.name, "Sync import failed: {}", e);
                    report.failed += 1;
                    report.failures.push(format!("{}: {}", file.name, e));
                }
            }
        }

        report.finished_at = Utc::now();
        info!(
            provider_id,
            imported = report.imported,
            duplicates = report.duplicates,
            failed = report.failed,
            cancelled = report.cancelled,
            "Sync run finished"
        );
        Ok(report)
    }
}
