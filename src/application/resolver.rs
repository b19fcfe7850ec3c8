//! Technique and placement decisions.
//!
//! Single renders resolve their technique with a precedence chain that accepts
//! loosely named placement codes from third-party catalogs. Batch generation
//! instead filters style placements through explicit per-technique allow-lists.

use crate::domain::Technique;

/// Standard garment placements printable with direct-to-garment.
const DIRECT_TO_GARMENT_PLACEMENTS: &[&str] = &[
    "front",
    "back",
    "front_large",
    "back_large",
    "sleeve_left",
    "sleeve_right",
    "label_inside",
    "label_outside",
];

const SUBLIMATION_PLACEMENTS: &[&str] = &["default", "front", "back"];

const EMBROIDERY_MARKERS: &[&str] = &["embroidery"];

const FILM_MARKERS: &[&str] = &["dtf", "dtfilm"];

const HEADWEAR_LABELS: &[&str] = &[
    "hat", "cap", "beanie", "visor", "snapback", "trucker", "headwear",
];

const DRINKWARE_LABELS: &[&str] = &[
    "mug", "tumbler", "bottle", "cup", "drinkware", "glass", "stein",
];

/// Broad product family used for the default technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductKind {
    Apparel,
    Headwear,
    Drinkware,
}

impl ProductKind {
    /// Classify a free-form product type label. Unknown labels are apparel.
    pub fn classify(label: &str) -> Self {
        let tokens = label_tokens(label);
        if tokens.iter().any(|token| matches_label(token, HEADWEAR_LABELS)) {
            ProductKind::Headwear
        } else if tokens.iter().any(|token| matches_label(token, DRINKWARE_LABELS)) {
            ProductKind::Drinkware
        } else {
            ProductKind::Apparel
        }
    }

    pub fn default_technique(self) -> Technique {
        match self {
            ProductKind::Apparel => Technique::DirectToGarment,
            ProductKind::Headwear => Technique::FilmTransfer,
            ProductKind::Drinkware => Technique::DigitalSublimation,
        }
    }
}

/// Pick the technique for one render. Never fails: an explicit technique wins,
/// then a technique encoded in the placement code, then the product default.
pub fn resolve_technique(
    placement: &str,
    product_type: &str,
    explicit: Option<Technique>,
) -> Technique {
    if let Some(technique) = explicit {
        return technique;
    }
    derive_from_placement(placement)
        .unwrap_or_else(|| ProductKind::classify(product_type).default_technique())
}

/// Resolve against a placement list already filtered to `selected`. The
/// placement code is authoritative; the product default never applies here.
pub fn resolve_style_scoped(placement: &str, selected: Technique) -> Technique {
    derive_from_placement(placement).unwrap_or(selected)
}

/// Technique implied by the placement code itself, if any.
pub fn derive_from_placement(placement: &str) -> Option<Technique> {
    let code = placement.to_ascii_lowercase();
    if code.contains("embroidery") {
        Some(Technique::Embroidery)
    } else if code.contains("dtf") || code.contains("film") {
        Some(Technique::FilmTransfer)
    } else if code.contains("default") {
        Some(Technique::DigitalSublimation)
    } else {
        None
    }
}

/// Allow-list check used when enumerating batch combinations.
pub fn placement_allowed(technique: Technique, placement: &str) -> bool {
    let code = placement.trim().to_ascii_lowercase();
    match technique {
        Technique::DirectToGarment => DIRECT_TO_GARMENT_PLACEMENTS.contains(&code.as_str()),
        Technique::DigitalSublimation => SUBLIMATION_PLACEMENTS.contains(&code.as_str()),
        Technique::Embroidery => has_marker(&code, EMBROIDERY_MARKERS),
        Technique::FilmTransfer => has_marker(&code, FILM_MARKERS),
    }
}

/// Placements usable with `technique`, in input order, without duplicates.
pub fn compatible_placements(technique: Technique, placements: &[String]) -> Vec<String> {
    let mut compatible: Vec<String> = Vec::new();
    for placement in placements {
        if placement_allowed(technique, placement) && !compatible.contains(placement) {
            compatible.push(placement.clone());
        }
    }
    compatible
}

fn has_marker(code: &str, markers: &[&str]) -> bool {
    code.split('_').any(|segment| markers.contains(&segment))
}

fn label_tokens(label: &str) -> Vec<String> {
    label
        .to_ascii_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn matches_label(token: &str, labels: &[&str]) -> bool {
    labels.contains(&token)
        || token
            .strip_suffix('s')
            .is_some_and(|singular| labels.contains(&singular))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_technique_always_wins() {
        for technique in Technique::ALL {
            assert_eq!(
                resolve_technique("embroidery_front_dtf_default", "mug", Some(technique)),
                technique
            );
        }
    }

    #[test]
    fn derives_technique_from_placement_code() {
        assert_eq!(
            resolve_technique("embroidery_front", "t-shirt", None),
            Technique::Embroidery
        );
        assert_eq!(
            resolve_technique("front_dtf_hat", "hat", None),
            Technique::FilmTransfer
        );
        assert_eq!(
            resolve_technique("default", "mug", None),
            Technique::DigitalSublimation
        );
        assert_eq!(
            resolve_technique("front", "t-shirt", None),
            Technique::DirectToGarment
        );
    }

    #[test]
    fn falls_back_to_product_defaults() {
        assert_eq!(
            resolve_technique("front", "Trucker Hat", None),
            Technique::FilmTransfer
        );
        assert_eq!(
            resolve_technique("front", "White glossy mugs", None),
            Technique::DigitalSublimation
        );
        assert_eq!(
            resolve_technique("front", "", None),
            Technique::DirectToGarment
        );
        assert_eq!(
            resolve_technique("front", "capri leggings", None),
            Technique::DirectToGarment
        );
    }

    #[test]
    fn style_scoped_resolution_skips_product_defaults() {
        assert_eq!(
            resolve_style_scoped("front", Technique::DigitalSublimation),
            Technique::DigitalSublimation
        );
        assert_eq!(
            resolve_style_scoped("embroidery_chest_left", Technique::Embroidery),
            Technique::Embroidery
        );
    }

    #[test]
    fn allow_lists_are_exact_not_substring() {
        assert!(placement_allowed(Technique::DirectToGarment, "front"));
        assert!(!placement_allowed(Technique::DirectToGarment, "front_dtf_hat"));
        assert!(!placement_allowed(Technique::DirectToGarment, "frontal"));

        assert!(placement_allowed(Technique::Embroidery, "embroidery_chest_left"));
        assert!(!placement_allowed(Technique::Embroidery, "embroiderylike"));

        assert!(placement_allowed(Technique::FilmTransfer, "front_dtf_hat"));
        assert!(placement_allowed(Technique::FilmTransfer, "dtfilm_back"));
        assert!(!placement_allowed(Technique::FilmTransfer, "filmstrip"));

        assert!(placement_allowed(Technique::DigitalSublimation, "default"));
        assert!(placement_allowed(Technique::DigitalSublimation, "back"));
        assert!(!placement_allowed(Technique::DigitalSublimation, "sleeve_left"));
    }

    #[test]
    fn compatible_placements_keep_order_and_drop_duplicates() {
        let placements = vec![
            "back".to_string(),
            "embroidery_front".to_string(),
            "front".to_string(),
            "back".to_string(),
        ];
        assert_eq!(
            compatible_placements(Technique::DirectToGarment, &placements),
            vec!["back".to_string(), "front".to_string()]
        );
        assert!(compatible_placements(Technique::FilmTransfer, &placements).is_empty());
    }
}
