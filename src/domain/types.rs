use serde::{Deserialize, Serialize};

use super::geometry::PlacementGeometry;
use super::technique::Technique;

/// One mockup render: a design composited onto one variant at one placement.
///
/// Two requests are interchangeable exactly when every field is equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderRequest {
    pub product_id: u64,
    pub variant_id: u64,
    /// Publicly reachable URL of the design asset.
    pub design_url: String,
    /// Renderer placement code such as `front` or `embroidery_chest_left`.
    pub placement: String,
    /// Explicit technique; resolved from placement and product type when absent.
    #[serde(default)]
    pub technique: Option<Technique>,
    /// Human product type label (e.g. `t-shirt`, `mug`) used for the default technique.
    #[serde(default)]
    pub product_type: Option<String>,
    /// Presentation style (flat-lay, on-model, hanger...).
    #[serde(default)]
    pub style_id: Option<u64>,
    #[serde(default)]
    pub geometry: Option<PlacementGeometry>,
}

impl RenderRequest {
    pub fn new(
        product_id: u64,
        variant_id: u64,
        design_url: impl Into<String>,
        placement: impl Into<String>,
    ) -> Self {
        Self {
            product_id,
            variant_id,
            design_url: design_url.into(),
            placement: placement.into(),
            technique: None,
            product_type: None,
            style_id: None,
            geometry: None,
        }
    }

    pub fn with_product_type(mut self, product_type: impl Into<String>) -> Self {
        self.product_type = Some(product_type.into());
        self
    }

    pub fn with_style(mut self, style_id: u64) -> Self {
        self.style_id = Some(style_id);
        self
    }
}

/// Every style and placement combination of one product under one technique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub product_id: u64,
    pub variant_id: u64,
    pub design_url: String,
    pub technique: Technique,
    #[serde(default)]
    pub geometry: Option<PlacementGeometry>,
}

/// Presentation style offered by the renderer for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDescriptor {
    pub style_id: u64,
    pub category_name: String,
    pub view_name: String,
    /// Placement codes this style can render for the product.
    pub placements: Vec<String>,
}

/// How the returned mockup relates to what was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchKind {
    /// Placement and (when requested) style both matched.
    Exact,
    /// Placement matched but the renderer used a different style.
    PlacementOnly,
    /// Neither matched; the first mockup produced for the variant was used.
    FirstAvailable,
}

/// Rendered mockup handed back to callers.
///
/// `placement` and `style_id` describe what the renderer actually produced,
/// which can differ from the request unless `match_kind` is [`MatchKind::Exact`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderResult {
    pub asset_url: String,
    pub variant_id: u64,
    pub placement: String,
    pub style_id: Option<u64>,
    pub technique: Technique,
    pub match_kind: MatchKind,
    pub cached: bool,
}

impl RenderResult {
    pub fn honors_request(&self) -> bool {
        self.match_kind == MatchKind::Exact
    }
}
