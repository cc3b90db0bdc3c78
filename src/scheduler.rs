//! Daily scheduler that fires the ingestion dispatch at a fixed UTC
//! wall-clock time.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::SchedulerConfig;
use crate::ingestion::IngestionOrchestrator;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub running: bool,
    pub job_name: String,
    pub next_run: Option<String>,
}

pub struct IngestionScheduler {
    orchestrator: Arc<IngestionOrchestrator>,
    config: SchedulerConfig,
    job_name: String,
    handle: Mutex<Option<JoinHandle<()>>>,
    next_fire: Arc<std::sync::Mutex<Option<DateTime<Utc>>>>,
}

/// First wall-clock occurrence of hour:minute strictly after `after`.
pub fn next_fire_time(after: DateTime<Utc>, hour: u32, minute: u32) -> DateTime<Utc> {
    let today = after
        .date_naive()
        .and_hms_opt(hour, minute, 0)
        .and_then(|naive| Utc.from_local_datetime(&naive).single())
        .unwrap_or(after);

    if today > after {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

/// Whether a fire that was scheduled for `scheduled` may still run at
/// `now`. A wake-up too far past the mark is skipped instead of fired.
pub fn within_grace(scheduled: DateTime<Utc>, now: DateTime<Utc>, grace_seconds: u64) -> bool {
    now >= scheduled && (now - scheduled).num_seconds() as u64 <= grace_seconds
}

impl IngestionScheduler {
    pub fn new(
        orchestrator: Arc<IngestionOrchestrator>,
        config: SchedulerConfig,
        job_name: String,
    ) -> Self {
        Self {
            orchestrator,
            config,
            job_name,
            handle: Mutex::new(None),
            next_fire: Arc::new(std::sync::Mutex::new(None)),
        }
    }

    /// Spawn the fire loop. Calling start on a running scheduler is a
    /// no-op.
    pub async fn start(&self) {
        let mut handle = self.handle.lock().await;
        if handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false) {
            warn!("Scheduler already running, ignoring start");
            return;
        }

        let orchestrator = self.orchestrator.clone();
        let config = self.config.clone();
        let next_fire = self.next_fire.clone();

        info!(
            "⏰ Scheduler started: daily at {:02}:{:02} UTC",
            config.fire_hour, config.fire_minute
        );

        *handle = Some(tokio::spawn(async move {
            loop {
                let now = Utc::now();
                let target = next_fire_time(now, config.fire_hour, config.fire_minute);
                if let Ok(mut slot) = next_fire.lock() {
                    *slot = Some(target);
                }

                let wait = (target - now).num_milliseconds().max(0) as u64;
                tokio::time::sleep(Duration::from_millis(wait)).await;

                let woke_at = Utc::now();
                if !within_grace(target, woke_at, config.misfire_grace_seconds) {
                    warn!(
                        "Missed fire at {} by more than the grace window, skipping",
                        target
                    );
                    continue;
                }

                info!("⏰ Scheduled fire at {}", target);
                if let Err(e) = orchestrator.dispatch().await {
                    error!("Scheduled ingestion failed: {}", e);
                }
            }
        }));
    }

    /// Abort the fire loop; a run already in flight is not interrupted
    /// at the store level but its task is dropped. Idempotent.
    pub async fn stop(&self) {
        let mut handle = self.handle.lock().await;
        if let Some(task) = handle.take() {
            task.abort();
            info!("🛑 Scheduler stopped");
        }
        if let Ok(mut slot) = self.next_fire.lock() {
            *slot = None;
        }
    }

    pub async fn status(&self) -> SchedulerStatus {
        let handle = self.handle.lock().await;
        let running = handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false);
        let next_run = if running {
            self.next_fire
                .lock()
                .ok()
                .and_then(|slot| *slot)
                .map(|dt| dt.to_rfc3339())
        } else {
            None
        };

        SchedulerStatus {
            running,
            job_name: self.job_name.clone(),
            next_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn fire_time_rolls_to_next_day_after_the_mark() {
        let after = at(2026, 3, 10, 0, 0, 0);
        let next = next_fire_time(after, 0, 0);
        assert_eq!(next, at(2026, 3, 11, 0, 0, 0));
    }

    #[test]
    fn fire_time_later_today_when_before_the_mark() {
        let after = at(2026, 3, 10, 14, 30, 0);
        let next = next_fire_time(after, 18, 15);
        assert_eq!(next, at(2026, 3, 10, 18, 15, 0));
        assert_eq!(next.hour(), 18);
    }

    #[test]
    fn fire_time_midnight_from_late_evening() {
        let after = at(2026, 3, 10, 23, 59, 59);
        let next = next_fire_time(after, 0, 0);
        assert_eq!(next, at(2026, 3, 11, 0, 0, 0));
    }

    #[test]
    fn grace_window_bounds() {
        let scheduled = at(2026, 3, 10, 0, 0, 0);
        assert!(within_grace(scheduled, scheduled, 3600));
        assert!(within_grace(scheduled, at(2026, 3, 10, 0, 59, 59), 3600));
        assert!(within_grace(scheduled, at(2026, 3, 10, 1, 0, 0), 3600));
        assert!(!within_grace(scheduled, at(2026, 3, 10, 1, 0, 1), 3600));
        // waking before the mark never fires
        assert!(!within_grace(scheduled, at(2026, 3, 9, 23, 59, 0), 3600));
    }
}
