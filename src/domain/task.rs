use serde::{Deserialize, Serialize};

use super::geometry::PlacementGeometry;
use super::technique::Technique;

/// Everything needed to submit one render job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSubmission {
    pub product_id: u64,
    /// Variant whose mockup is extracted once the task completes.
    pub variant_id: u64,
    pub design_url: String,
    pub placement: String,
    pub technique: Technique,
    pub style_id: Option<u64>,
    pub geometry: Option<PlacementGeometry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Anything the renderer reports that is neither completed nor failed is
    /// still in progress from our point of view.
    pub fn from_wire(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "completed" => TaskStatus::Completed,
            "failed" => TaskStatus::Failed,
            _ => TaskStatus::Pending,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskStatus::Pending)
    }
}

/// One rendered image inside a completed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMockup {
    pub placement: String,
    pub style_id: Option<u64>,
    pub asset_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantMockups {
    pub variant_id: u64,
    pub mockups: Vec<TaskMockup>,
}

/// Local view of a remote render task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderTask {
    pub task_id: String,
    pub status: TaskStatus,
    pub results: Vec<VariantMockups>,
    pub failure_reasons: Vec<String>,
}

impl RenderTask {
    pub fn pending(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Pending,
            results: Vec::new(),
            failure_reasons: Vec::new(),
        }
    }

    pub fn mockups_for(&self, variant_id: u64) -> &[TaskMockup] {
        self.results
            .iter()
            .find(|variant| variant.variant_id == variant_id)
            .map(|variant| variant.mockups.as_slice())
            .unwrap_or_default()
    }
}
