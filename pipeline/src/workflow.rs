//! Workflow run context
//!
//! One [`WorkflowRun`] exists per request, owned exclusively by the
//! orchestrator and discarded once the result is returned. It carries the
//! per-stage bookkeeping and the run metrics that are logged at stage
//! boundaries — an explicit context object, not a process-wide counter.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::Stage;
use uuid::Uuid;

/// Overall status of a workflow run
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Degraded,
    Failed,
}

/// Terminal status of one stage attempt chain
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Live data, within budget
    Succeeded,
    /// Completed on fallback data
    SucceededFallback,
    /// Canceled at its time cap; contributed no result
    TimedOut,
    /// Failed after the retry; contributed no result
    Failed,
}

/// Record of one stage's execution within a run
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub status: StageStatus,
    pub elapsed: Duration,
    pub retried: bool,
}

/// Counters updated at stage boundaries
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunMetrics {
    pub stages_run: u32,
    pub fallbacks: u32,
    pub retries: u32,
    pub timeouts: u32,
    pub failures: u32,
}

/// Execution context for a single request
#[derive(Debug)]
pub struct WorkflowRun {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub status: RunStatus,
    pub reports: Vec<StageReport>,
    pub metrics: RunMetrics,
}

impl WorkflowRun {
    /// Create a pending run
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            status: RunStatus::Pending,
            reports: Vec::new(),
            metrics: RunMetrics::default(),
        }
    }

    /// Record a stage report and update the run metrics
    pub fn record(&mut self, report: StageReport) {
        self.metrics.stages_run += 1;
        if report.retried {
            self.metrics.retries += 1;
        }
        match report.status {
            StageStatus::SucceededFallback => self.metrics.fallbacks += 1,
            StageStatus::TimedOut => self.metrics.timeouts += 1,
            StageStatus::Failed => self.metrics.failures += 1,
            StageStatus::Succeeded => {}
        }
        self.reports.push(report);
    }

    /// Whether any stage was canceled at its time cap
    pub fn any_timeout(&self) -> bool {
        self.reports
            .iter()
            .any(|r| r.status == StageStatus::TimedOut)
    }
}

impl Default for WorkflowRun {
    fn default() -> Self {
        Self::new()
    }
}
