//! Content ingestion: refresh every pillar's news items, write results
//! back to the store, and leave one audit record per run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::IngestionConfig;
use crate::database::PillarStore;
use crate::models::{IngestionRun, Result, RunStatus};
use crate::refresh::RefreshPort;

#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Another run holds the guard; nothing was done.
    AlreadyRunning,
    /// The store returned no pillars; no audit record is written.
    NoPillars,
    Finished(IngestionRun),
}

#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// The external workflow accepted the trigger and owns the run.
    Delegated,
    Local(RunOutcome),
}

pub struct IngestionOrchestrator {
    store: Arc<dyn PillarStore>,
    refresh: Arc<dyn RefreshPort>,
    http: reqwest::Client,
    config: IngestionConfig,
    run_guard: Mutex<()>,
    // Passive mirror of the guard so status polls never contend with
    // the try_lock that enforces run exclusivity.
    running: AtomicBool,
}

struct RunningFlag<'a>(&'a AtomicBool);

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl IngestionOrchestrator {
    pub fn new(
        store: Arc<dyn PillarStore>,
        refresh: Arc<dyn RefreshPort>,
        config: IngestionConfig,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.webhook_timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            store,
            refresh,
            http,
            config,
            run_guard: Mutex::new(()),
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Refresh all pillars sequentially. Returns without an audit
    /// record when nothing could even be attempted.
    pub async fn run(&self) -> Result<RunOutcome> {
        let _guard = match self.run_guard.try_lock() {
            Ok(g) => g,
            Err(_) => {
                warn!("⏳ Ingestion already in progress, skipping");
                return Ok(RunOutcome::AlreadyRunning);
            }
        };
        self.running.store(true, Ordering::SeqCst);
        let _running = RunningFlag(&self.running);

        let pillars = self.store.list_pillars().await?;
        if pillars.is_empty() {
            warn!("No pillars configured, nothing to ingest");
            return Ok(RunOutcome::NoPillars);
        }

        let total = pillars.len();
        info!("🚀 Starting ingestion run over {} pillar(s)", total);

        let mut success_count = 0usize;
        let mut failed_count = 0usize;

        for (i, pillar) in pillars.iter().enumerate() {
            let category = pillar.name.to_lowercase().replace(' ', "_");

            match self
                .refresh
                .refresh_content(&category, self.config.items_per_pillar)
                .await
            {
                Ok(items) if items.is_empty() => {
                    warn!("Refresh for '{}' returned no items", pillar.name);
                    failed_count += 1;
                }
                Ok(items) => {
                    match self
                        .store
                        .replace_pillar_items(&pillar.id, &items, Utc::now())
                        .await
                    {
                        Ok(()) => {
                            info!("✅ Updated pillar '{}' with {} items", pillar.name, items.len());
                            success_count += 1;
                        }
                        Err(e) => {
                            error!("Failed to store items for '{}': {}", pillar.name, e);
                            failed_count += 1;
                        }
                    }
                }
                Err(e) => {
                    error!("Refresh for '{}' failed: {}", pillar.name, e);
                    failed_count += 1;
                }
            }

            if i < total - 1 && self.config.pillar_delay_seconds > 0 {
                let jitter = fastrand::u64(0..=250);
                tokio::time::sleep(Duration::from_millis(
                    self.config.pillar_delay_seconds * 1000 + jitter,
                ))
                .await;
            }
        }

        let status = if failed_count == 0 {
            RunStatus::Success
        } else if success_count == 0 {
            RunStatus::Failed
        } else {
            RunStatus::Partial
        };

        let record = IngestionRun {
            id: Uuid::new_v4().to_string(),
            job_name: self.config.job_name.clone(),
            status,
            total_entities: total,
            success_count,
            failed_count,
            created_at: Utc::now(),
        };
        self.store.append_ingestion_run(&record).await?;

        info!(
            "📊 Ingestion finished: {} ok, {} failed ({})",
            success_count,
            failed_count,
            status.as_str()
        );
        Ok(RunOutcome::Finished(record))
    }

    /// Preferred entry point for scheduled fires: trigger the external
    /// workflow when one is configured, run locally otherwise or when
    /// the webhook does not accept the trigger.
    pub async fn dispatch(&self) -> Result<DispatchOutcome> {
        let webhook_url = self.config.workflow_webhook_url.trim();
        if webhook_url.is_empty() {
            let outcome = self.run().await?;
            return Ok(DispatchOutcome::Local(outcome));
        }

        let payload = json!({
            "trigger": "scheduled",
            "timestamp": Utc::now().to_rfc3339(),
            "source": "backend-scheduler",
        });

        match self.http.post(webhook_url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                info!("✅ Workflow webhook accepted the trigger");
                Ok(DispatchOutcome::Delegated)
            }
            Ok(response) => {
                warn!(
                    "Workflow webhook rejected the trigger (HTTP {}), running locally",
                    response.status()
                );
                Ok(DispatchOutcome::Local(self.run().await?))
            }
            Err(e) => {
                warn!("Workflow webhook unreachable ({}), running locally", e);
                Ok(DispatchOutcome::Local(self.run().await?))
            }
        }
    }
}
