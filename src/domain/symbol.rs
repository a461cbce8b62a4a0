//! Detections and user-facing care symbols.
//!
//! A [`Detection`] is the transient output of the post-processor: one
//! qualifying anchor with its resolved symbol. Enrichment maps detections
//! 1:1 into [`CareSymbol`] records carrying the catalog's display data, in
//! a deterministic order.

use crate::domain::catalog::{Category, SymbolCatalog, PLACEHOLDER_ICON, UNKNOWN_DESCRIPTION};
use serde::Serialize;

/// An axis-aligned rectangle in model input space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    /// Creates a bounding box from its edges.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Box area; zero for degenerate boxes.
    pub fn area(&self) -> f32 {
        let width = (self.right - self.left).max(0.0);
        let height = (self.bottom - self.top).max(0.0);
        width * height
    }

    /// Intersection-over-union overlap ratio with another box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);

        if right <= left || bottom <= top {
            return 0.0;
        }

        let intersection = (right - left) * (bottom - top);
        let union = self.area() + other.area() - intersection;
        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }

    /// Whether the box has positive extent and finite coordinates.
    pub fn is_valid(&self) -> bool {
        self.right > self.left
            && self.bottom > self.top
            && self.left.is_finite()
            && self.top.is_finite()
            && self.right.is_finite()
            && self.bottom.is_finite()
    }
}

/// One qualifying anchor produced by the post-processor.
///
/// Never mutated; discarded once mapped to a [`CareSymbol`].
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Box in model input space.
    pub bounding_box: BoundingBox,
    /// Resolved symbol key from the catalog.
    pub symbol_key: &'static str,
    /// Treatment family of the resolved symbol.
    pub category: Category,
    /// Winning-class probability at this anchor, in `[0, 1]`.
    pub confidence: f32,
}

/// A user-facing care symbol, derived from a detection or a manual pick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CareSymbol {
    /// Stable symbol identifier.
    pub key: String,
    /// Treatment family.
    pub category: Category,
    /// Display glyph.
    pub icon: String,
    /// Human-readable instruction.
    pub description: String,
    /// Detection confidence; 1.0 for manually chosen symbols.
    pub confidence: f32,
}

impl CareSymbol {
    /// Builds a care symbol for a key at the given confidence.
    ///
    /// Unknown keys map to the placeholder glyph and description instead of
    /// failing; one bad item never discards the rest of a batch. The key's
    /// category falls back to [`Category::Washing`] only when the key is
    /// unknown, which post-processing never produces.
    pub fn from_key(key: &str, confidence: f32, catalog: &SymbolCatalog) -> Self {
        match catalog.lookup(key) {
            Some(info) => Self {
                key: info.key.to_string(),
                category: info.category,
                icon: info.icon.to_string(),
                description: info.description.to_string(),
                confidence,
            },
            None => Self {
                key: key.to_string(),
                category: Category::Washing,
                icon: PLACEHOLDER_ICON.to_string(),
                description: UNKNOWN_DESCRIPTION.to_string(),
                confidence,
            },
        }
    }

    /// Builds a manually selected symbol. Manual selection is definitionally
    /// certain, so the confidence is 1.0.
    pub fn manual(key: &str, catalog: &SymbolCatalog) -> Self {
        Self::from_key(key, 1.0, catalog)
    }
}

/// Sorts symbols by (fixed category order ascending, confidence descending),
/// stable under equal keys.
fn sort_symbols(symbols: &mut [CareSymbol]) {
    symbols.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| b.confidence.total_cmp(&a.confidence))
    });
}

/// Maps detections into enriched, deterministically ordered care symbols.
pub fn enrich(detections: &[Detection], catalog: &SymbolCatalog) -> Vec<CareSymbol> {
    let mut symbols: Vec<CareSymbol> = detections
        .iter()
        .map(|detection| CareSymbol::from_key(detection.symbol_key, detection.confidence, catalog))
        .collect();
    sort_symbols(&mut symbols);
    symbols
}

/// Re-runs the catalog mapping over already-enriched symbols.
///
/// Idempotent: applying this to the output of [`enrich`] yields identical
/// output. Used by the manual path to build the final set from selected keys.
pub fn enrich_symbols(symbols: &[CareSymbol], catalog: &SymbolCatalog) -> Vec<CareSymbol> {
    let mut enriched: Vec<CareSymbol> = symbols
        .iter()
        .map(|symbol| CareSymbol::from_key(&symbol.key, symbol.confidence, catalog))
        .collect();
    sort_symbols(&mut enriched);
    enriched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(key: &'static str, category: Category, confidence: f32) -> Detection {
        Detection {
            bounding_box: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            symbol_key: key,
            category,
            confidence,
        }
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let b = BoundingBox::new(200.0, 200.0, 300.0, 300.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn degenerate_boxes_are_invalid() {
        assert!(!BoundingBox::new(10.0, 10.0, 10.0, 20.0).is_valid());
        assert!(!BoundingBox::new(0.0, 0.0, f32::NAN, 10.0).is_valid());
        assert!(BoundingBox::new(0.0, 0.0, 1.0, 1.0).is_valid());
    }

    #[test]
    fn enrich_sorts_by_category_then_confidence() {
        let catalog = SymbolCatalog::global();
        let detections = vec![
            detection("iron_150", Category::Ironing, 0.85),
            detection("wash_30", Category::Washing, 0.7),
            detection("hand_wash", Category::Washing, 0.95),
            detection("no_bleach", Category::Bleaching, 0.92),
        ];

        let symbols = enrich(&detections, catalog);
        let keys: Vec<&str> = symbols.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["hand_wash", "wash_30", "no_bleach", "iron_150"]);
    }

    #[test]
    fn enrich_is_idempotent() {
        let catalog = SymbolCatalog::global();
        let detections = vec![
            detection("wash_30", Category::Washing, 0.9),
            detection("tumble_dry_low", Category::Drying, 0.91),
            detection("no_iron", Category::Ironing, 0.6),
        ];

        let once = enrich(&detections, catalog);
        let twice = enrich_symbols(&once, catalog);
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_key_maps_to_placeholder() {
        let catalog = SymbolCatalog::global();
        let symbol = CareSymbol::from_key("wash_upside_down", 0.5, catalog);
        assert_eq!(symbol.icon, PLACEHOLDER_ICON);
        assert_eq!(symbol.description, UNKNOWN_DESCRIPTION);
        assert_eq!(symbol.key, "wash_upside_down");
    }

    #[test]
    fn manual_symbols_have_full_confidence() {
        let catalog = SymbolCatalog::global();
        let symbol = CareSymbol::manual("line_dry", catalog);
        assert_eq!(symbol.confidence, 1.0);
        assert_eq!(symbol.category, Category::Drying);
    }
}
