use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::OtpConfig;
use crate::state::SharedState;

/// Counts from one maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub expired_codes: usize,
    pub cleared_markers: u64,
}

/// Drops expired OTP entries and clears reset markers that outlived them.
pub async fn purge_once(state: &SharedState) -> Result<PurgeReport> {
    let now = Utc::now();
    let expired_codes = state.verification.otp_store().purge_expired(now).await;
    let cleared_markers = state
        .credentials
        .clear_expired_pending_resets(now)
        .await?;

    metrics::gauge!("clubdesk_pending_otps")
        .set(state.verification.otp_store().pending().await as f64);

    Ok(PurgeReport {
        expired_codes,
        cleared_markers,
    })
}

async fn run_purge(state: &SharedState) {
    let start = std::time::Instant::now();
    match purge_once(state).await {
        Ok(report) => {
            if report.expired_codes > 0 || report.cleared_markers > 0 {
                info!(
                    event = "job_finished",
                    job_name = "purge_otps",
                    expired_codes = report.expired_codes,
                    cleared_markers = report.cleared_markers,
                    duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "Expired OTPs purged"
                );
            }
        }
        Err(e) => {
            error!(event = "job_failed", job_name = "purge_otps", error = %e, "OTP purge failed");
        }
    }
}

pub struct Scheduler {
    state: Arc<SharedState>,
    config: OtpConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(state: Arc<SharedState>, config: OtpConfig) -> Self {
        Self {
            state,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        *self.running.write().await = true;
        info!("Starting OTP purge scheduler");

        if let Some(cron_expr) = &self.config.purge_cron {
            self.run_with_cron(cron_expr).await
        } else {
            self.run_with_interval().await
        }
    }

    pub async fn stop(&self) {
        *self.running.write().await = false;
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        let state = Arc::clone(&self.state);
        let running = Arc::clone(&self.running);
        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let state = Arc::clone(&state);
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                run_purge(&state).await;
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;
        info!("OTP purge running with cron: {}", cron_expr);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    async fn run_with_interval(&self) -> Result<()> {
        let every = self.config.purge_interval_seconds.max(1);
        info!("OTP purge running every {}s", every);

        let mut ticker = interval(Duration::from_secs(every));
        loop {
            ticker.tick().await;
            if !*self.running.read().await {
                break;
            }
            run_purge(&self.state).await;
        }

        Ok(())
    }
}
