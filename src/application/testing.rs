//! In-memory renderer used by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::error::MockupError;
use crate::application::ports::MockupApi;
use crate::domain::{
    RenderTask, StyleDescriptor, TaskMockup, TaskStatus, TaskSubmission, VariantMockups,
};

pub(crate) fn style(style_id: u64, placements: &[&str]) -> StyleDescriptor {
    StyleDescriptor {
        style_id,
        category_name: format!("category-{style_id}"),
        view_name: "front".to_string(),
        placements: placements.iter().map(|p| p.to_string()).collect(),
    }
}

#[derive(Default)]
pub(crate) struct FakeApi {
    pub styles: Option<Vec<StyleDescriptor>>,
    /// Combinations whose task ends in `failed`.
    pub failing: HashSet<(Option<u64>, String)>,
    /// Pending responses served before a task completes.
    pub pending_polls: u32,
    /// Replaces the mockups a completed task reports.
    pub mockups_override: Option<Vec<TaskMockup>>,
    pub omit_task_id: bool,
    pub(crate) state: Mutex<FakeState>,
}

#[derive(Default)]
pub(crate) struct FakeState {
    submissions: Vec<TaskSubmission>,
    polls: HashMap<String, u32>,
    style_requests: u32,
}

impl FakeApi {
    pub fn with_styles(styles: Vec<StyleDescriptor>) -> Self {
        Self {
            styles: Some(styles),
            ..Default::default()
        }
    }

    pub fn fail(mut self, style_id: Option<u64>, placement: &str) -> Self {
        self.failing.insert((style_id, placement.to_string()));
        self
    }

    pub fn submissions(&self) -> Vec<TaskSubmission> {
        self.state.lock().expect("fake state").submissions.clone()
    }

    pub fn total_polls(&self) -> u32 {
        self.state.lock().expect("fake state").polls.values().sum()
    }

    pub fn style_requests(&self) -> u32 {
        self.state.lock().expect("fake state").style_requests
    }
}

pub(crate) fn asset_url(task_id: &str) -> String {
    format!("https://cdn.example/mockups/{task_id}.png")
}

#[async_trait]
impl MockupApi for FakeApi {
    async fn submit_task(&self, submission: &TaskSubmission) -> Result<Option<String>, MockupError> {
        let mut state = self.state.lock().expect("fake state");
        state.submissions.push(submission.clone());
        if self.omit_task_id {
            return Ok(None);
        }
        Ok(Some(format!("task-{}", state.submissions.len())))
    }

    async fn fetch_task(&self, task_id: &str) -> Result<RenderTask, MockupError> {
        let mut state = self.state.lock().expect("fake state");
        let index: usize = task_id
            .trim_start_matches("task-")
            .parse()
            .expect("fake task id");
        let submission = state.submissions[index - 1].clone();
        let polls = state.polls.entry(task_id.to_string()).or_default();
        *polls += 1;
        if *polls <= self.pending_polls {
            return Ok(RenderTask::pending(task_id));
        }

        let mut task = RenderTask::pending(task_id);
        if self
            .failing
            .contains(&(submission.style_id, submission.placement.clone()))
        {
            task.status = TaskStatus::Failed;
            task.failure_reasons = vec!["Design exceeds print area".to_string()];
            return Ok(task);
        }

        task.status = TaskStatus::Completed;
        let mockups = self.mockups_override.clone().unwrap_or_else(|| {
            vec![TaskMockup {
                placement: submission.placement.clone(),
                style_id: submission.style_id,
                asset_url: asset_url(task_id),
            }]
        });
        task.results.push(VariantMockups {
            variant_id: submission.variant_id,
            mockups,
        });
        Ok(task)
    }

    async fn product_styles(&self, product_id: u64) -> Result<Vec<StyleDescriptor>, MockupError> {
        self.state.lock().expect("fake state").style_requests += 1;
        self.styles.clone().ok_or_else(|| MockupError::Api {
            operation: "styles.list",
            status: 404,
            code: Some(404),
            message: format!("product {product_id} not found"),
        })
    }
}
