//! Cache key definitions.
//!
//! Keys are content-addressed: every input that changes the rendered image is
//! folded into a SHA-256 digest, and the readable components are kept as a
//! prefix so keys stay greppable in logs.

use sha2::{Digest, Sha256};

use crate::domain::{PlacementGeometry, RenderRequest, Technique};

const KEY_NAMESPACE: &str = "mockup";
/// Unit separator; cannot appear in URLs, placement codes or numbers.
const FIELD_SEPARATOR: char = '\u{1f}';
const DIGEST_HEX_LEN: usize = 32;
const ABSENT: &str = "-";

/// Build the cache key for one render.
///
/// Identical inputs always produce the same key; changing any field, including
/// whether an optional field is present at all, produces a different key.
pub fn generate_key(
    variant_id: u64,
    design_url: &str,
    placement: &str,
    geometry: Option<&PlacementGeometry>,
    style_id: Option<u64>,
    technique: Option<Technique>,
) -> String {
    let style = style_id.map(|id| id.to_string());
    let technique_name = technique.map(Technique::as_str);
    let geometry_field = geometry.map(|g| format!("{}x{}@{},{}", g.width, g.height, g.top, g.left));

    let fields = [
        format!("variant={variant_id}"),
        format!("design={design_url}"),
        format!("placement={placement}"),
        optional_field("geometry", geometry_field.as_deref()),
        optional_field("style", style.as_deref()),
        optional_field("technique", technique_name),
    ];
    let digest = hash_fields(&fields);

    format!(
        "{KEY_NAMESPACE}:{variant_id}:{placement}:{}:{}:{digest}",
        style.as_deref().unwrap_or(ABSENT),
        technique_name.unwrap_or(ABSENT),
    )
}

/// Key for a single render request once its technique has been resolved.
pub fn request_key(request: &RenderRequest, technique: Technique) -> String {
    generate_key(
        request.variant_id,
        &request.design_url,
        &request.placement,
        request.geometry.as_ref(),
        request.style_id,
        Some(technique),
    )
}

fn optional_field(name: &str, value: Option<&str>) -> String {
    match value {
        Some(value) => format!("{name}+{value}"),
        None => format!("{name}~"),
    }
}

fn hash_fields(fields: &[String]) -> String {
    let mut hasher = Sha256::new();
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            let mut separator = [0u8; 4];
            hasher.update(FIELD_SEPARATOR.encode_utf8(&mut separator).as_bytes());
        }
        hasher.update(field.as_bytes());
    }
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(DIGEST_HEX_LEN);
    digest
}
