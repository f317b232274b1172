//! Scheduled quality passes with alerting.
//!
//! [`QualityMonitor`] is a two-state machine (stopped, running). While
//! running, one spawned task loops: run a pass, raise alerts, roll up daily
//! trends, publish the outcome, then wait. A failed pass waits the shorter
//! retry backoff instead of the check interval. Cancellation only interrupts
//! the wait, so an in-flight pass always finishes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use gridwatch_core::alerting::{evaluate_alerts, TableAlertInput};
use gridwatch_core::trends::PeriodType;
use gridwatch_core::types::Timestamp;
use gridwatch_db::models::quality_issue::CreateQualityIssue;
use gridwatch_events::event_types::{
    QUALITY_ALERT_RAISED, QUALITY_CHECK_COMPLETED, QUALITY_CHECK_FAILED,
    QUALITY_MONITOR_STATE_CHANGED,
};
use gridwatch_events::{DomainEvent, EventBus};
use serde::Serialize;
use serde_json::json;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::MonitorConfig;
use crate::engine::quality_service::QualityCheckResult;
use crate::engine::{QualityError, QualityService};

/// Outcome of the most recent pass, scheduled or manual.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastPass {
    pub checked_at: Timestamp,
    /// `None` when the pass failed.
    pub overall_score: Option<f64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitoringStatus {
    pub is_running: bool,
    pub check_interval_minutes: u64,
    pub alert_threshold: f64,
    pub last_check_at: Option<Timestamp>,
    pub last_overall_score: Option<f64>,
    pub last_error: Option<String>,
}

/// Result of [`QualityMonitor::run_immediate_check`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImmediateCheckOutcome {
    Completed {
        overall_score: f64,
        timestamp: Timestamp,
        result: Box<QualityCheckResult>,
    },
    Failed {
        error: String,
        timestamp: Timestamp,
    },
}

struct MonitorTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct QualityMonitor {
    service: Arc<QualityService>,
    event_bus: Arc<EventBus>,
    config: MonitorConfig,
    running: AtomicBool,
    task: Mutex<Option<MonitorTask>>,
    last_pass: watch::Sender<Option<LastPass>>,
}

impl QualityMonitor {
    pub fn new(service: Arc<QualityService>, event_bus: Arc<EventBus>, config: MonitorConfig) -> Self {
        let (last_pass, _) = watch::channel(None);
        Self {
            service,
            event_bus,
            config,
            running: AtomicBool::new(false),
            task: Mutex::new(None),
            last_pass,
        }
    }

    /// Spawn the scheduling loop. Returns `false` if it was already running.
    pub async fn start_monitoring(self: &Arc<Self>) -> bool {
        let mut task = self.task.lock().await;
        if task.is_some() {
            tracing::info!("Quality monitor already running");
            return false;
        }

        let cancel = CancellationToken::new();
        let monitor = Arc::clone(self);
        let token = cancel.clone();
        let handle = tokio::spawn(async move { monitor.run(token).await });

        *task = Some(MonitorTask { cancel, handle });
        self.running.store(true, Ordering::SeqCst);

        tracing::info!(
            interval_minutes = self.config.check_interval_minutes(),
            alert_threshold = self.config.alert_threshold,
            "Quality monitor started"
        );
        self.publish_state(true);
        true
    }

    /// Cancel the loop and wait for it to exit. Returns `false` if it was
    /// not running.
    pub async fn stop_monitoring(&self) -> bool {
        let mut task = self.task.lock().await;
        let Some(MonitorTask { cancel, handle }) = task.take() else {
            return false;
        };

        cancel.cancel();
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Quality monitor task ended abnormally");
        }
        self.running.store(false, Ordering::SeqCst);

        tracing::info!("Quality monitor stopped");
        self.publish_state(false);
        true
    }

    /// Current state. Never waits on a running pass.
    pub async fn get_monitoring_status(&self) -> MonitoringStatus {
        let last = self.last_pass.borrow().clone();
        MonitoringStatus {
            is_running: self.running.load(Ordering::SeqCst),
            check_interval_minutes: self.config.check_interval_minutes(),
            alert_threshold: self.config.alert_threshold,
            last_check_at: last.as_ref().map(|p| p.checked_at),
            last_overall_score: last.as_ref().and_then(|p| p.overall_score),
            last_error: last.and_then(|p| p.error),
        }
    }

    /// Observe pass outcomes as they are recorded.
    #[cfg(test)]
    pub(crate) fn subscribe(&self) -> watch::Receiver<Option<LastPass>> {
        self.last_pass.subscribe()
    }

    /// Run one pass now, regardless of whether the schedule is running.
    pub async fn run_immediate_check(&self) -> ImmediateCheckOutcome {
        match self.execute_pass().await {
            Ok(result) => ImmediateCheckOutcome::Completed {
                overall_score: result.overall_score,
                timestamp: result.checked_at,
                result: Box::new(result),
            },
            Err(e) => ImmediateCheckOutcome::Failed {
                error: e.to_string(),
                timestamp: Utc::now(),
            },
        }
    }

    async fn run(&self, cancel: CancellationToken) {
        loop {
            let wait = match self.execute_pass().await {
                Ok(_) => self.config.check_interval,
                Err(_) => self.config.retry_backoff,
            };
            if !sleep_or_cancel(&cancel, wait).await {
                tracing::debug!("Quality monitor loop exiting");
                break;
            }
        }
    }

    /// One pass plus its follow-up work. Only the pass itself can fail;
    /// alert and trend failures are logged.
    async fn execute_pass(&self) -> Result<QualityCheckResult, QualityError> {
        match self.service.run_comprehensive_quality_check().await {
            Ok(result) => {
                let alerts = self.raise_alerts(&result).await;

                if let Err(e) = self
                    .service
                    .compute_trends(PeriodType::Daily, result.checked_at)
                    .await
                {
                    tracing::warn!(error = %e, "Daily trend roll-up failed");
                }

                self.event_bus.publish(
                    DomainEvent::new(QUALITY_CHECK_COMPLETED).with_payload(result.event_payload()),
                );
                self.last_pass.send_replace(Some(LastPass {
                    checked_at: result.checked_at,
                    overall_score: Some(result.overall_score),
                    error: None,
                }));

                tracing::info!(
                    overall_score = result.overall_score,
                    alerts,
                    "Quality check completed"
                );
                Ok(result)
            }
            Err(e) => {
                let timestamp = Utc::now();
                tracing::error!(error = %e, "Quality check failed");
                self.event_bus.publish(DomainEvent::new(QUALITY_CHECK_FAILED).with_payload(
                    json!({ "error": e.to_string(), "timestamp": timestamp }),
                ));
                self.last_pass.send_replace(Some(LastPass {
                    checked_at: timestamp,
                    overall_score: None,
                    error: Some(e.to_string()),
                }));
                Err(e)
            }
        }
    }

    /// Persist and publish threshold alerts. Returns how many were stored.
    async fn raise_alerts(&self, result: &QualityCheckResult) -> usize {
        let inputs: Vec<TableAlertInput<'_>> = result
            .tables
            .iter()
            .map(|t| TableAlertInput {
                table_name: &t.table_name,
                completeness: t.scores.completeness_score,
                accuracy: t.scores.accuracy_score,
            })
            .collect();

        let mut raised = 0;
        for draft in evaluate_alerts(result.overall_score, self.config.alert_threshold, &inputs) {
            tracing::warn!(
                table = %draft.table_name,
                severity = draft.severity.as_str(),
                description = %draft.description,
                "Quality alert"
            );
            match self.service.create_issue(&CreateQualityIssue::from(&draft)).await {
                Ok(issue) => {
                    raised += 1;
                    self.event_bus.publish(
                        DomainEvent::new(QUALITY_ALERT_RAISED)
                            .with_table(issue.table_name.clone())
                            .with_payload(json!(issue)),
                    );
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        table = %draft.table_name,
                        "Failed to store quality alert"
                    );
                }
            }
        }
        raised
    }

    fn publish_state(&self, is_running: bool) {
        self.event_bus.publish(
            DomainEvent::new(QUALITY_MONITOR_STATE_CHANGED)
                .with_payload(json!({ "is_running": is_running })),
        );
    }
}

/// Sleep for `wait`. Returns `false` if `cancel` fired first.
async fn sleep_or_cancel(cancel: &CancellationToken, wait: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(wait) => true,
    }
}
