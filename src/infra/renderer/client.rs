use std::time::Instant;

use async_trait::async_trait;
use tracing::info;

use crate::application::error::MockupError;
use crate::application::ports::MockupApi;
use crate::domain::{RenderTask, StyleDescriptor, TaskSubmission};

use super::transport::RateLimitedTransport;
use super::wire::{CreateTaskBody, StylesBody, TaskCreatedBody, TaskStatusBody};

const TARGET: &str = "infra::renderer::client";

/// [`MockupApi`] over the rendering service's REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpMockupApi {
    transport: RateLimitedTransport,
    format: String,
}

impl HttpMockupApi {
    pub fn new(transport: RateLimitedTransport, format: impl Into<String>) -> Self {
        Self {
            transport,
            format: format.into(),
        }
    }
}

#[async_trait]
impl MockupApi for HttpMockupApi {
    async fn submit_task(&self, submission: &TaskSubmission) -> Result<Option<String>, MockupError> {
        const OP: &str = "tasks.create";
        let started_at = Instant::now();
        let url = self.transport.endpoint(OP, "tasks", &[])?;
        let body = CreateTaskBody::from_submission(&self.format, submission);
        let created: TaskCreatedBody = self.transport.post_json(OP, url, &body).await?;
        let task_id = created.into_task_id();

        info!(
            target = TARGET,
            op = OP,
            result = if task_id.is_some() { "ok" } else { "missing_id" },
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            product_id = submission.product_id,
            variant_id = submission.variant_id,
            placement = %submission.placement,
            technique = %submission.technique,
            style_id = ?submission.style_id,
            task_id = ?task_id,
            "Render task submitted"
        );
        Ok(task_id)
    }

    async fn fetch_task(&self, task_id: &str) -> Result<RenderTask, MockupError> {
        const OP: &str = "tasks.fetch";
        let url = self.transport.endpoint(OP, "tasks", &[("id", task_id)])?;
        let body: TaskStatusBody = self.transport.get_json(OP, url).await?;
        Ok(body.into_task(task_id))
    }

    async fn product_styles(&self, product_id: u64) -> Result<Vec<StyleDescriptor>, MockupError> {
        const OP: &str = "styles.list";
        let started_at = Instant::now();
        let path = format!("products/{product_id}/styles");
        let url = self.transport.endpoint(OP, &path, &[])?;
        let body: StylesBody = self.transport.get_json(OP, url).await?;
        let styles: Vec<StyleDescriptor> = body.styles.into_iter().map(Into::into).collect();

        info!(
            target = TARGET,
            op = OP,
            result = "ok",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            product_id,
            styles = styles.len(),
            "Product styles fetched"
        );
        Ok(styles)
    }
}
