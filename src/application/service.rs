use std::sync::Arc;

use tracing::info;

use crate::application::batch::{BatchConfig, BatchCoordinator};
use crate::application::error::MockupError;
use crate::application::orchestrator::{PollConfig, TaskOrchestrator};
use crate::application::ports::MockupApi;
use crate::application::resolver::resolve_technique;
use crate::cache::{ResultCache, request_key};
use crate::domain::{
    BatchRequest, BatchResult, MatchKind, RenderRequest, RenderResult, StyleDescriptor,
    TaskSubmission, Technique,
};

const TARGET: &str = "application::service";

/// Entry point for callers that need mockups.
#[derive(Clone)]
pub struct MockupService {
    api: Arc<dyn MockupApi>,
    cache: Arc<dyn ResultCache>,
    orchestrator: TaskOrchestrator,
    batch: BatchCoordinator,
}

impl MockupService {
    pub fn new(
        api: Arc<dyn MockupApi>,
        cache: Arc<dyn ResultCache>,
        poll: PollConfig,
        batch: BatchConfig,
    ) -> Self {
        let orchestrator = TaskOrchestrator::new(Arc::clone(&api), poll);
        let batch = BatchCoordinator::new(
            Arc::clone(&api),
            Arc::clone(&cache),
            orchestrator.clone(),
            batch,
        );
        Self {
            api,
            cache,
            orchestrator,
            batch,
        }
    }

    /// Technique a request renders with once defaults are applied.
    pub fn technique_for(request: &RenderRequest) -> Technique {
        resolve_technique(
            &request.placement,
            request.product_type.as_deref().unwrap_or_default(),
            request.technique,
        )
    }

    /// Render one mockup, serving it from cache when an identical render
    /// completed recently.
    pub async fn generate_single(
        &self,
        request: &RenderRequest,
    ) -> Result<RenderResult, MockupError> {
        let technique = Self::technique_for(request);
        let key = request_key(request, technique);

        if let Some(asset_url) = self.cache.get(&key) {
            info!(
                target = TARGET,
                op = "service::generate_single",
                result = "cache_hit",
                variant_id = request.variant_id,
                placement = %request.placement,
                technique = %technique,
                "Mockup served from cache"
            );
            return Ok(RenderResult {
                asset_url,
                variant_id: request.variant_id,
                placement: request.placement.clone(),
                style_id: request.style_id,
                technique,
                match_kind: MatchKind::Exact,
                cached: true,
            });
        }

        let submission = TaskSubmission {
            product_id: request.product_id,
            variant_id: request.variant_id,
            design_url: request.design_url.clone(),
            placement: request.placement.clone(),
            technique,
            style_id: request.style_id,
            geometry: request.geometry,
        };
        let result = self.orchestrator.render(&submission).await?;
        if result.honors_request() {
            self.cache.put(&key, &result.asset_url);
        }
        Ok(result)
    }

    /// Drop any cached result for `request` and render it again.
    pub async fn regenerate(&self, request: &RenderRequest) -> Result<RenderResult, MockupError> {
        let key = request_key(request, Self::technique_for(request));
        self.cache.invalidate(&key);
        info!(
            target = TARGET,
            op = "service::regenerate",
            result = "invalidated",
            variant_id = request.variant_id,
            placement = %request.placement,
            "Cached mockup invalidated for manual retry"
        );
        self.generate_single(request).await
    }

    pub async fn generate_batch(&self, request: &BatchRequest) -> Result<BatchResult, MockupError> {
        self.batch.generate(request).await
    }

    /// Styles offered for a product. Never cached.
    pub async fn product_styles(
        &self,
        product_id: u64,
    ) -> Result<Vec<StyleDescriptor>, MockupError> {
        self.api.product_styles(product_id).await
    }
}
