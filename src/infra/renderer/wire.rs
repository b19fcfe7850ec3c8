//! JSON bodies exchanged with the rendering API.

use serde::{Deserialize, Serialize};

use crate::domain::{
    InchGeometry, RenderTask, StyleDescriptor, TaskMockup, TaskStatus, TaskSubmission, Technique,
    VariantMockups,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateTaskBody<'a> {
    pub format: &'a str,
    pub products: Vec<TaskProductBody<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskProductBody<'a> {
    pub product_id: u64,
    pub variant_ids: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_id: Option<u64>,
    pub placements: Vec<PlacementBody<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PlacementBody<'a> {
    pub placement: &'a str,
    pub technique: Technique,
    pub layers: Vec<LayerBody<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LayerBody<'a> {
    pub url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<InchGeometry>,
}

impl<'a> CreateTaskBody<'a> {
    pub fn from_submission(format: &'a str, submission: &'a TaskSubmission) -> Self {
        let layer = LayerBody {
            url: &submission.design_url,
            position: submission.geometry.map(|geometry| geometry.to_inches()),
        };
        Self {
            format,
            products: vec![TaskProductBody {
                product_id: submission.product_id,
                variant_ids: vec![submission.variant_id],
                style_id: submission.style_id,
                placements: vec![PlacementBody {
                    placement: &submission.placement,
                    technique: submission.technique,
                    layers: vec![layer],
                }],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskCreatedBody {
    #[serde(default)]
    pub task_id: Option<String>,
}

impl TaskCreatedBody {
    /// Blank identifiers are treated as missing.
    pub fn into_task_id(self) -> Option<String> {
        self.task_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskStatusBody {
    pub status: String,
    #[serde(default)]
    pub results_by_variant: Vec<VariantResultBody>,
    #[serde(default)]
    pub failure_reasons: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VariantResultBody {
    pub variant_id: u64,
    #[serde(default)]
    pub mockups: Vec<MockupBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MockupBody {
    pub placement: String,
    #[serde(default)]
    pub style_id: Option<u64>,
    pub mockup_url: String,
}

impl TaskStatusBody {
    pub fn into_task(self, task_id: &str) -> RenderTask {
        RenderTask {
            task_id: task_id.to_string(),
            status: TaskStatus::from_wire(&self.status),
            results: self
                .results_by_variant
                .into_iter()
                .map(|variant| VariantMockups {
                    variant_id: variant.variant_id,
                    mockups: variant
                        .mockups
                        .into_iter()
                        .map(|mockup| TaskMockup {
                            placement: mockup.placement,
                            style_id: mockup.style_id,
                            asset_url: mockup.mockup_url,
                        })
                        .collect(),
                })
                .collect(),
            failure_reasons: self.failure_reasons,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StylesBody {
    #[serde(default)]
    pub styles: Vec<StyleBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StyleBody {
    pub style_id: u64,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub view_name: String,
    #[serde(default)]
    pub placements: Vec<String>,
}

impl From<StyleBody> for StyleDescriptor {
    fn from(body: StyleBody) -> Self {
        Self {
            style_id: body.style_id,
            category_name: body.category_name,
            view_name: body.view_name,
            placements: body.placements,
        }
    }
}

/// Error payload of non-success responses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Falls back to the raw text when the body is not the documented shape.
    pub fn parse(raw: &str) -> Self {
        let mut body: ErrorBody = serde_json::from_str(raw).unwrap_or_default();
        if body.message.as_deref().is_none_or(str::is_empty) {
            let trimmed = raw.trim();
            body.message = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
        body
    }

    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::PlacementGeometry;

    fn submission() -> TaskSubmission {
        TaskSubmission {
            product_id: 71,
            variant_id: 4012,
            design_url: "https://cdn.example/design.png".to_string(),
            placement: "front".to_string(),
            technique: Technique::DirectToGarment,
            style_id: None,
            geometry: Some(PlacementGeometry::new(1800, 2400, 150, 300)),
        }
    }

    #[test]
    fn task_body_converts_geometry_to_inches() {
        let submission = submission();
        let body = CreateTaskBody::from_submission("png", &submission);
        let value = serde_json::to_value(&body).expect("serialize");

        assert_eq!(
            value,
            json!({
                "format": "png",
                "products": [{
                    "productId": 71,
                    "variantIds": [4012],
                    "placements": [{
                        "placement": "front",
                        "technique": "direct-to-garment",
                        "layers": [{
                            "url": "https://cdn.example/design.png",
                            "position": {"width": 12, "height": 16, "top": 1, "left": 2}
                        }]
                    }]
                }]
            })
        );
    }

    #[test]
    fn task_body_carries_style_when_requested() {
        let mut submission = submission();
        submission.style_id = Some(9);
        submission.geometry = None;
        let value =
            serde_json::to_value(CreateTaskBody::from_submission("jpg", &submission)).expect("json");

        assert_eq!(value["products"][0]["styleId"], json!(9));
        assert!(value["products"][0]["placements"][0]["layers"][0]
            .get("position")
            .is_none());
    }

    #[test]
    fn blank_task_id_is_missing() {
        let body: TaskCreatedBody = serde_json::from_str(r#"{"taskId":"  "}"#).expect("json");
        assert_eq!(body.into_task_id(), None);
        let body: TaskCreatedBody = serde_json::from_str("{}").expect("json");
        assert_eq!(body.into_task_id(), None);
    }

    #[test]
    fn status_body_maps_to_task() {
        let body: TaskStatusBody = serde_json::from_value(json!({
            "status": "completed",
            "resultsByVariant": [{
                "variantId": 4012,
                "mockups": [{"placement": "front", "styleId": 3, "mockupUrl": "https://cdn.example/m.png"}]
            }]
        }))
        .expect("json");
        let task = body.into_task("task-1");

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.mockups_for(4012)[0].style_id, Some(3));
        assert!(task.failure_reasons.is_empty());
    }

    #[test]
    fn error_body_falls_back_to_raw_text() {
        let parsed = ErrorBody::parse(r#"{"code":400,"message":"Invalid placement"}"#);
        assert_eq!(parsed.code, Some(400));
        assert_eq!(parsed.message.as_deref(), Some("Invalid placement"));

        let parsed = ErrorBody::parse("Bad Gateway");
        assert_eq!(parsed.code, None);
        assert_eq!(parsed.message_or("x"), "Bad Gateway");

        assert_eq!(ErrorBody::parse("").message_or("HTTP 500"), "HTTP 500");
    }
}
