//! Submit a render task and poll it to a terminal state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::counter;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::application::error::MockupError;
use crate::application::ports::MockupApi;
use crate::config::TaskSettings;
use crate::domain::{MatchKind, RenderResult, RenderTask, TaskMockup, TaskStatus, TaskSubmission};

const TARGET: &str = "application::orchestrator";
const METRIC_TASK: &str = "mockup_task_total";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_POLL_ATTEMPTS: u32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_POLL_ATTEMPTS,
        }
    }
}

impl From<&TaskSettings> for PollConfig {
    fn from(settings: &TaskSettings) -> Self {
        Self {
            interval: settings.poll_interval,
            max_attempts: settings.poll_attempts.get(),
        }
    }
}

/// Mockup picked from a completed task, tagged with how well it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockupLookup<'a> {
    Exact(&'a TaskMockup),
    PlacementOnly(&'a TaskMockup),
    FirstAvailable(&'a TaskMockup),
}

impl<'a> MockupLookup<'a> {
    pub fn mockup(&self) -> &'a TaskMockup {
        match self {
            MockupLookup::Exact(mockup)
            | MockupLookup::PlacementOnly(mockup)
            | MockupLookup::FirstAvailable(mockup) => mockup,
        }
    }

    pub fn kind(&self) -> MatchKind {
        match self {
            MockupLookup::Exact(_) => MatchKind::Exact,
            MockupLookup::PlacementOnly(_) => MatchKind::PlacementOnly,
            MockupLookup::FirstAvailable(_) => MatchKind::FirstAvailable,
        }
    }
}

/// Best mockup for `variant_id`: placement and style, then placement alone,
/// then whatever the renderer produced first. `None` when the variant has no
/// mockups at all.
pub fn select_mockup<'a>(
    task: &'a RenderTask,
    variant_id: u64,
    placement: &str,
    style_id: Option<u64>,
) -> Option<MockupLookup<'a>> {
    let mockups = task.mockups_for(variant_id);
    let same_placement = |mockup: &&TaskMockup| mockup.placement == placement;

    if let Some(mockup) = mockups
        .iter()
        .filter(same_placement)
        .find(|mockup| style_id.is_none() || mockup.style_id == style_id)
    {
        return Some(MockupLookup::Exact(mockup));
    }
    if let Some(mockup) = mockups.iter().find(same_placement) {
        return Some(MockupLookup::PlacementOnly(mockup));
    }
    mockups.first().map(MockupLookup::FirstAvailable)
}

/// Drives one render task from submission to a usable asset URL.
#[derive(Clone)]
pub struct TaskOrchestrator {
    api: Arc<dyn MockupApi>,
    config: PollConfig,
}

impl TaskOrchestrator {
    pub fn new(api: Arc<dyn MockupApi>, config: PollConfig) -> Self {
        Self { api, config }
    }

    pub async fn render(&self, submission: &TaskSubmission) -> Result<RenderResult, MockupError> {
        let started_at = Instant::now();
        let task_id = match self.api.submit_task(submission).await {
            Ok(Some(task_id)) => task_id,
            Ok(None) => {
                record_outcome("submission_failed");
                return Err(MockupError::TaskSubmission {
                    message: "render service returned no task id".to_string(),
                });
            }
            Err(err) => {
                record_outcome("submission_failed");
                return Err(err);
            }
        };

        let task = self.poll(&task_id).await?;
        let Some(lookup) = select_mockup(
            &task,
            submission.variant_id,
            &submission.placement,
            submission.style_id,
        ) else {
            record_outcome("result_missing");
            return Err(MockupError::TaskResultMissing {
                task_id,
                variant_id: submission.variant_id,
            });
        };

        let mockup = lookup.mockup();
        let match_kind = lookup.kind();
        if match_kind != MatchKind::Exact {
            warn!(
                target = TARGET,
                op = "orchestrator::select",
                result = "fallback",
                task_id = %task_id,
                match_kind = ?match_kind,
                requested_placement = %submission.placement,
                requested_style = ?submission.style_id,
                placement = %mockup.placement,
                style_id = ?mockup.style_id,
                "Render task returned a mockup for a different placement or style"
            );
        }

        record_outcome("completed");
        info!(
            target = TARGET,
            op = "orchestrator::render",
            result = "completed",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            task_id = %task_id,
            variant_id = submission.variant_id,
            placement = %mockup.placement,
            style_id = ?mockup.style_id,
            "Render task completed"
        );

        Ok(RenderResult {
            asset_url: mockup.asset_url.clone(),
            variant_id: submission.variant_id,
            placement: mockup.placement.clone(),
            style_id: mockup.style_id,
            technique: submission.technique,
            match_kind,
            cached: false,
        })
    }

    async fn poll(&self, task_id: &str) -> Result<RenderTask, MockupError> {
        for attempt in 1..=self.config.max_attempts {
            sleep(self.config.interval).await;
            let task = self.api.fetch_task(task_id).await?;
            match task.status {
                TaskStatus::Completed => return Ok(task),
                TaskStatus::Failed => {
                    record_outcome("failed");
                    warn!(
                        target = TARGET,
                        op = "orchestrator::poll",
                        result = "failed",
                        task_id,
                        attempt,
                        reasons = ?task.failure_reasons,
                        "Render task failed"
                    );
                    return Err(MockupError::TaskFailed {
                        task_id: task.task_id,
                        reasons: task.failure_reasons,
                    });
                }
                TaskStatus::Pending => {}
            }
        }

        record_outcome("timeout");
        warn!(
            target = TARGET,
            op = "orchestrator::poll",
            result = "timeout",
            task_id,
            attempts = self.config.max_attempts,
            "Render task did not finish within the polling budget"
        );
        Err(MockupError::TaskTimeout {
            task_id: task_id.to_string(),
            attempts: self.config.max_attempts,
        })
    }
}

fn record_outcome(outcome: &'static str) {
    counter!(METRIC_TASK, "outcome" => outcome).increment(1);
}
