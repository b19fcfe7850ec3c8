//! Render every compatible style and placement of a product.
//!
//! Combinations run one after another in enumeration order. A failing
//! combination is recorded and the batch moves on; only style discovery can
//! abort the whole run.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::counter;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::application::error::MockupError;
use crate::application::orchestrator::TaskOrchestrator;
use crate::application::ports::MockupApi;
use crate::application::resolver::{compatible_placements, resolve_style_scoped};
use crate::cache::{ResultCache, generate_key};
use crate::config::BatchSettings;
use crate::domain::{
    BatchFailure, BatchMockup, BatchRequest, BatchResult, StyleDescriptor, TaskSubmission,
    Technique,
};

const TARGET: &str = "application::batch";
const METRIC_COMBINATION: &str = "mockup_batch_combination_total";
const DEFAULT_INTER_REQUEST_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Pause between consecutive task submissions. Cache hits do not count.
    pub inter_request_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            inter_request_delay: DEFAULT_INTER_REQUEST_DELAY,
        }
    }
}

impl From<&BatchSettings> for BatchConfig {
    fn from(settings: &BatchSettings) -> Self {
        Self {
            inter_request_delay: settings.inter_request_delay,
        }
    }
}

/// One (style, placement) pair scheduled for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combination {
    pub style_id: u64,
    pub placement: String,
    pub technique: Technique,
}

/// Cross product of styles and their placements usable with `technique`, in
/// style order then placement order.
pub fn plan_combinations(styles: &[StyleDescriptor], technique: Technique) -> Vec<Combination> {
    styles
        .iter()
        .flat_map(|style| {
            compatible_placements(technique, &style.placements)
                .into_iter()
                .map(move |placement| Combination {
                    style_id: style.style_id,
                    technique: resolve_style_scoped(&placement, technique),
                    placement,
                })
        })
        .collect()
}

#[derive(Clone)]
pub struct BatchCoordinator {
    api: Arc<dyn MockupApi>,
    cache: Arc<dyn ResultCache>,
    orchestrator: TaskOrchestrator,
    config: BatchConfig,
}

impl BatchCoordinator {
    pub fn new(
        api: Arc<dyn MockupApi>,
        cache: Arc<dyn ResultCache>,
        orchestrator: TaskOrchestrator,
        config: BatchConfig,
    ) -> Self {
        Self {
            api,
            cache,
            orchestrator,
            config,
        }
    }

    pub async fn generate(&self, request: &BatchRequest) -> Result<BatchResult, MockupError> {
        let started_at = Instant::now();
        let styles = self
            .api
            .product_styles(request.product_id)
            .await
            .map_err(|source| MockupError::StyleDiscovery {
                product_id: request.product_id,
                source: Box::new(source),
            })?;

        let combinations = plan_combinations(&styles, request.technique);
        if combinations.is_empty() {
            info!(
                target = TARGET,
                op = "batch::generate",
                result = "no_compatible_combinations",
                product_id = request.product_id,
                technique = %request.technique,
                styles = styles.len(),
                "No style offers a placement for the requested technique"
            );
            return Ok(BatchResult::no_compatible_combinations(request.technique));
        }

        let mut succeeded = Vec::new();
        let mut failures = Vec::new();
        let mut submitted = false;

        for combination in &combinations {
            let key = generate_key(
                request.variant_id,
                &request.design_url,
                &combination.placement,
                request.geometry.as_ref(),
                Some(combination.style_id),
                Some(combination.technique),
            );

            if let Some(asset_url) = self.cache.get(&key) {
                record_outcome("cache_hit");
                succeeded.push(BatchMockup {
                    style_id: combination.style_id,
                    placement: combination.placement.clone(),
                    asset_url,
                    cached: true,
                });
                continue;
            }

            if submitted && !self.config.inter_request_delay.is_zero() {
                sleep(self.config.inter_request_delay).await;
            }
            submitted = true;

            let submission = TaskSubmission {
                product_id: request.product_id,
                variant_id: request.variant_id,
                design_url: request.design_url.clone(),
                placement: combination.placement.clone(),
                technique: combination.technique,
                style_id: Some(combination.style_id),
                geometry: request.geometry,
            };

            match self.orchestrator.render(&submission).await {
                Ok(result) => {
                    if result.honors_request() {
                        self.cache.put(&key, &result.asset_url);
                    }
                    record_outcome("rendered");
                    succeeded.push(BatchMockup {
                        style_id: result.style_id.unwrap_or(combination.style_id),
                        placement: result.placement,
                        asset_url: result.asset_url,
                        cached: false,
                    });
                }
                Err(err) => {
                    record_outcome("failed");
                    warn!(
                        target = TARGET,
                        op = "batch::combination",
                        result = "failed",
                        product_id = request.product_id,
                        style_id = combination.style_id,
                        placement = %combination.placement,
                        error_kind = err.kind(),
                        error = %err,
                        "Batch combination failed; continuing"
                    );
                    failures.push(BatchFailure {
                        style_id: combination.style_id,
                        placement: combination.placement.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        let result = BatchResult::from_parts(request.technique, succeeded, failures);
        info!(
            target = TARGET,
            op = "batch::generate",
            result = ?result.outcome,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            product_id = request.product_id,
            variant_id = request.variant_id,
            technique = %request.technique,
            attempted = result.attempted,
            failed = result.failed,
            "Batch generation finished"
        );
        Ok(result)
    }
}

fn record_outcome(outcome: &'static str) {
    counter!(METRIC_COMBINATION, "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::orchestrator::PollConfig;
    use crate::application::testing::{FakeApi, style};
    use crate::cache::{CacheConfig, MemoryResultCache};
    use crate::domain::BatchOutcome;

    fn request(technique: Technique) -> BatchRequest {
        BatchRequest {
            product_id: 71,
            variant_id: 4012,
            design_url: "https://cdn.example/design.png".to_string(),
            technique,
            geometry: None,
        }
    }

    fn coordinator(api: Arc<FakeApi>, cache: Arc<MemoryResultCache>) -> BatchCoordinator {
        let orchestrator = TaskOrchestrator::new(api.clone(), PollConfig::default());
        BatchCoordinator::new(api, cache, orchestrator, BatchConfig::default())
    }

    fn cache() -> Arc<MemoryResultCache> {
        Arc::new(MemoryResultCache::new(CacheConfig::default()))
    }

    #[test]
    fn plan_filters_and_orders_combinations() {
        let styles = vec![
            style(1, &["front", "embroidery_chest_left", "back", "front"]),
            style(2, &["default"]),
            style(3, &["sleeve_left"]),
        ];
        let plan = plan_combinations(&styles, Technique::DirectToGarment);
        let pairs: Vec<(u64, &str)> = plan
            .iter()
            .map(|c| (c.style_id, c.placement.as_str()))
            .collect();
        assert_eq!(pairs, vec![(1, "front"), (1, "back"), (3, "sleeve_left")]);
        assert!(
            plan.iter()
                .all(|c| c.technique == Technique::DirectToGarment)
        );
    }

    #[test]
    fn plan_keeps_embroidery_codes_for_embroidery() {
        let styles = vec![style(5, &["front", "embroidery_chest_left", "embroidery_back"])];
        let plan = plan_combinations(&styles, Technique::Embroidery);
        assert_eq!(plan.len(), 2);
        assert!(plan.iter().all(|c| c.technique == Technique::Embroidery));
    }

    #[tokio::test(start_paused = true)]
    async fn partial_failure_keeps_going() {
        let styles = vec![
            style(1, &["front", "back"]),
            style(2, &["front", "back", "sleeve_left"]),
        ];
        let api = Arc::new(FakeApi::with_styles(styles).fail(Some(2), "front"));
        let batch = coordinator(api.clone(), cache());

        let result = batch
            .generate(&request(Technique::DirectToGarment))
            .await
            .expect("batch");

        assert_eq!(result.attempted, 5);
        assert_eq!(result.failed, 1);
        assert_eq!(result.succeeded.len(), 4);
        assert_eq!(result.outcome, BatchOutcome::Partial);
        assert_eq!(result.failures[0].style_id, 2);
        assert_eq!(result.failures[0].placement, "front");
        assert!(result.failures[0].reason.contains("Design exceeds print area"));
        assert_eq!(api.submissions().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn no_compatible_combinations_is_not_an_error() {
        let api = Arc::new(FakeApi::with_styles(vec![style(1, &["front", "back"])]));
        let batch = coordinator(api.clone(), cache());

        let result = batch
            .generate(&request(Technique::Embroidery))
            .await
            .expect("batch");

        assert_eq!(result.attempted, 0);
        assert_eq!(result.outcome, BatchOutcome::NoCompatibleCombinations);
        assert!(!result.has_compatible_combinations());
        assert!(api.submissions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn style_discovery_failure_is_fatal() {
        let api = Arc::new(FakeApi::default());
        let batch = coordinator(api, cache());

        let err = batch
            .generate(&request(Technique::DirectToGarment))
            .await
            .expect_err("fatal");
        assert!(matches!(
            err,
            MockupError::StyleDiscovery {
                product_id: 71,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn cached_combinations_skip_submission_and_delay() {
        let api = Arc::new(FakeApi::with_styles(vec![style(1, &["front", "back"])]));
        let cache = cache();
        let key = generate_key(
            4012,
            "https://cdn.example/design.png",
            "front",
            None,
            Some(1),
            Some(Technique::DirectToGarment),
        );
        cache.put(&key, "https://cdn.example/cached.png");
        let batch = coordinator(api.clone(), cache.clone());
        let begin = tokio::time::Instant::now();

        let result = batch
            .generate(&request(Technique::DirectToGarment))
            .await
            .expect("batch");

        assert_eq!(result.outcome, BatchOutcome::AllSucceeded);
        assert!(result.succeeded[0].cached);
        assert_eq!(result.succeeded[0].asset_url, "https://cdn.example/cached.png");
        assert!(!result.succeeded[1].cached);
        assert_eq!(api.submissions().len(), 1);
        // One poll interval, no inter-submission delay.
        assert_eq!(begin.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn submissions_are_spaced_and_results_cached() {
        let api = Arc::new(FakeApi::with_styles(vec![style(1, &["front", "back", "sleeve_left"])]));
        let cache = cache();
        let batch = coordinator(api.clone(), cache.clone());
        let begin = tokio::time::Instant::now();

        let first = batch
            .generate(&request(Technique::DirectToGarment))
            .await
            .expect("batch");
        assert_eq!(first.outcome, BatchOutcome::AllSucceeded);
        assert_eq!(begin.elapsed(), Duration::from_secs(3 * 2 + 2));

        let second = batch
            .generate(&request(Technique::DirectToGarment))
            .await
            .expect("batch");
        assert!(second.succeeded.iter().all(|mockup| mockup.cached));
        assert_eq!(api.submissions().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_results_are_not_cached() {
        let mut api = FakeApi::with_styles(vec![style(1, &["front"])]);
        api.mockups_override = Some(vec![crate::domain::TaskMockup {
            placement: "front".to_string(),
            style_id: Some(99),
            asset_url: "https://cdn.example/other-style.png".to_string(),
        }]);
        let api = Arc::new(api);
        let cache = cache();
        let batch = coordinator(api.clone(), cache.clone());

        let result = batch
            .generate(&request(Technique::DirectToGarment))
            .await
            .expect("batch");

        assert_eq!(result.succeeded[0].style_id, 99);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn every_combination_failing_is_all_failed() {
        let api = Arc::new(
            FakeApi::with_styles(vec![style(1, &["front", "back"])])
                .fail(Some(1), "front")
                .fail(Some(1), "back"),
        );
        let batch = coordinator(api, cache());

        let result = batch
            .generate(&request(Technique::DirectToGarment))
            .await
            .expect("batch");
        assert_eq!(result.outcome, BatchOutcome::AllFailed);
        assert_eq!(result.attempted, 2);
        assert!(result.succeeded.is_empty());
    }
}
