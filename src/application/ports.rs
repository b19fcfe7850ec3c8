//! Seams between the engine and the rendering service.

use async_trait::async_trait;

use crate::application::error::MockupError;
use crate::domain::{RenderTask, StyleDescriptor, TaskSubmission};

/// Operations the engine needs from the remote renderer.
#[async_trait]
pub trait MockupApi: Send + Sync {
    /// Create a render task. `Ok(None)` means the service accepted the request
    /// but returned no task identifier.
    async fn submit_task(&self, submission: &TaskSubmission) -> Result<Option<String>, MockupError>;

    async fn fetch_task(&self, task_id: &str) -> Result<RenderTask, MockupError>;

    async fn product_styles(&self, product_id: u64) -> Result<Vec<StyleDescriptor>, MockupError>;
}
