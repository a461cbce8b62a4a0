//! Detection post-processing.
//!
//! Turns the model's raw per-anchor output into non-overlapping labeled
//! detections: box decoding from normalized center/size into input-pixel
//! edges, winning-class selection, confidence thresholding, class-index
//! resolution through the symbol catalog, and class-aware non-maximum
//! suppression.

use crate::core::errors::{CareLabelError, CareResult};
use crate::core::Tensor3D;
use crate::domain::catalog::SymbolCatalog;
use crate::domain::symbol::{BoundingBox, Detection};
use ndarray::{Array2, ArrayView3, Axis};
use tracing::debug;

/// Number of box-coordinate slots preceding the class scores in each
/// prediction row: `[center_x, center_y, width, height, scores...]`.
pub const BOX_SLOTS: usize = 4;

/// Raw model predictions in per-anchor row layout.
///
/// The model emits `[1, 4+num_classes, num_anchors]`; this type holds the
/// transposed `[num_anchors, 4+num_classes]` view the decoder consumes. The
/// transpose is mandatory and easy to get backwards, so it lives in one
/// place and is covered by shape fixtures.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPredictions {
    rows: Array2<f32>,
}

impl RawPredictions {
    /// Builds predictions from a raw output tensor as extracted from the
    /// session: `shape` and flat `data` in model-native layout.
    pub fn from_model_output(shape: &[i64], data: &[f32]) -> CareResult<Self> {
        if shape.len() != 3 {
            return Err(CareLabelError::invalid_input(format!(
                "expected 3D model output [1, features, anchors], got {}D with shape {:?}",
                shape.len(),
                shape
            )));
        }

        let batch = shape[0] as usize;
        let features = shape[1] as usize;
        let anchors = shape[2] as usize;

        if batch != 1 {
            return Err(CareLabelError::invalid_input(format!(
                "expected batch size 1, got {batch}"
            )));
        }

        if features <= BOX_SLOTS {
            return Err(CareLabelError::invalid_input(format!(
                "model output has {features} features per anchor, need more than {BOX_SLOTS}"
            )));
        }

        let view = ArrayView3::from_shape((batch, features, anchors), data)
            .map_err(|e| CareLabelError::post_processing("reshaping raw model output", e))?;
        Ok(Self::from_tensor_view(view))
    }

    /// Builds predictions from an owned model output tensor.
    pub fn from_tensor(tensor: &Tensor3D) -> Self {
        Self::from_tensor_view(tensor.view())
    }

    fn from_tensor_view(view: ArrayView3<f32>) -> Self {
        // [1, features, anchors] -> [anchors, features]
        let rows = view.index_axis(Axis(0), 0).t().to_owned();
        Self { rows }
    }

    /// Reconstructs the model-native `[1, features, anchors]` layout.
    ///
    /// Transposing twice reproduces the original tensor; tests rely on this
    /// to pin the orientation.
    pub fn to_model_layout(&self) -> Tensor3D {
        self.rows.t().to_owned().insert_axis(Axis(0))
    }

    /// Number of anchors in the output.
    pub fn num_anchors(&self) -> usize {
        self.rows.shape()[0]
    }

    /// Values per anchor row (`4 + num_classes`).
    pub fn feature_dim(&self) -> usize {
        self.rows.shape()[1]
    }

    fn row(&self, anchor: usize) -> ndarray::ArrayView1<f32> {
        self.rows.row(anchor)
    }
}

/// Converts raw predictions into deduplicated detections.
#[derive(Debug, Clone)]
pub struct DetectionPostProcessor {
    input_size: u32,
    num_classes: usize,
    confidence_threshold: f32,
    nms_iou_threshold: f32,
    max_detections: usize,
}

impl DetectionPostProcessor {
    /// Creates a post-processor for the given model contract and thresholds.
    pub fn new(
        input_size: u32,
        num_classes: usize,
        confidence_threshold: f32,
        nms_iou_threshold: f32,
        max_detections: usize,
    ) -> Self {
        Self {
            input_size,
            num_classes,
            confidence_threshold,
            nms_iou_threshold,
            max_detections,
        }
    }

    /// Decodes, thresholds, and deduplicates raw predictions.
    ///
    /// Per anchor: decode the normalized center/size box into input-pixel
    /// edges, pick the class with the maximum score, keep the candidate if
    /// that score exceeds the confidence threshold and the class index
    /// resolves in the catalog. Unresolved indices are dropped silently.
    /// Overlapping candidates for the same symbol are then collapsed to the
    /// single highest-confidence one.
    ///
    /// Zero detections is a valid outcome, not an error.
    pub fn process(
        &self,
        raw: &RawPredictions,
        catalog: &SymbolCatalog,
    ) -> CareResult<Vec<Detection>> {
        let expected = BOX_SLOTS + self.num_classes;
        if raw.feature_dim() != expected {
            return Err(CareLabelError::invalid_input(format!(
                "model output has {} features per anchor, expected {} (4 box + {} classes)",
                raw.feature_dim(),
                expected,
                self.num_classes
            )));
        }

        let mut candidates = Vec::new();
        let scale = self.input_size as f32;

        for anchor in 0..raw.num_anchors() {
            let row = raw.row(anchor);

            let (class_index, score) = row
                .iter()
                .skip(BOX_SLOTS)
                .enumerate()
                .fold((0usize, 0.0f32), |(best_idx, best), (idx, &value)| {
                    if value > best {
                        (idx, value)
                    } else {
                        (best_idx, best)
                    }
                });

            if score <= self.confidence_threshold {
                continue;
            }

            let Some(info) = catalog.resolve_class(class_index) else {
                continue;
            };

            let cx = row[0];
            let cy = row[1];
            let w = row[2];
            let h = row[3];

            let bounding_box = BoundingBox::new(
                (cx - w / 2.0) * scale,
                (cy - h / 2.0) * scale,
                (cx + w / 2.0) * scale,
                (cy + h / 2.0) * scale,
            );

            if !bounding_box.is_valid() {
                continue;
            }

            candidates.push(Detection {
                bounding_box,
                symbol_key: info.key,
                category: info.category,
                confidence: score,
            });
        }

        let kept = self.apply_nms(candidates);
        debug!(
            anchors = raw.num_anchors(),
            detections = kept.len(),
            threshold = self.confidence_threshold,
            "post-processing complete"
        );
        Ok(kept)
    }

    /// Class-aware non-maximum suppression.
    ///
    /// Candidates sharing a symbol key whose boxes overlap at or above the
    /// IoU threshold collapse to the highest-confidence one. Output is
    /// capped at `max_detections`.
    fn apply_nms(&self, candidates: Vec<Detection>) -> Vec<Detection> {
        if candidates.is_empty() {
            return candidates;
        }

        let mut indices: Vec<usize> = (0..candidates.len()).collect();
        indices.sort_by(|&a, &b| candidates[b].confidence.total_cmp(&candidates[a].confidence));

        let mut suppressed = vec![false; candidates.len()];
        let mut keep = Vec::new();

        for &i in &indices {
            if suppressed[i] {
                continue;
            }

            keep.push(i);
            if keep.len() >= self.max_detections {
                break;
            }

            for &j in &indices {
                if i != j
                    && !suppressed[j]
                    && candidates[i].symbol_key == candidates[j].symbol_key
                {
                    let iou = candidates[i].bounding_box.iou(&candidates[j].bounding_box);
                    if iou >= self.nms_iou_threshold {
                        suppressed[j] = true;
                    }
                }
            }
        }

        keep.sort_unstable();
        keep.into_iter().map(|i| candidates[i].clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ProcessingStage;
    use crate::domain::catalog::Category;
    use ndarray::Array3;
    use std::collections::BTreeSet;

    const NUM_CLASSES: usize = 31;
    const FEATURES: usize = BOX_SLOTS + NUM_CLASSES;

    /// One synthetic anchor: a centered box plus a single hot class score.
    struct Anchor {
        cx: f32,
        cy: f32,
        w: f32,
        h: f32,
        class: usize,
        score: f32,
    }

    fn fixture(anchors: &[Anchor]) -> Tensor3D {
        let mut tensor = Array3::zeros((1, FEATURES, anchors.len()));
        for (a, anchor) in anchors.iter().enumerate() {
            tensor[[0, 0, a]] = anchor.cx;
            tensor[[0, 1, a]] = anchor.cy;
            tensor[[0, 2, a]] = anchor.w;
            tensor[[0, 3, a]] = anchor.h;
            tensor[[0, BOX_SLOTS + anchor.class, a]] = anchor.score;
        }
        tensor
    }

    fn postprocessor(confidence_threshold: f32) -> DetectionPostProcessor {
        DetectionPostProcessor::new(640, NUM_CLASSES, confidence_threshold, 0.45, 100)
    }

    #[test]
    fn transpose_is_involutive() {
        let tensor = fixture(&[
            Anchor { cx: 0.5, cy: 0.5, w: 0.2, h: 0.2, class: 16, score: 0.9 },
            Anchor { cx: 0.1, cy: 0.8, w: 0.1, h: 0.3, class: 20, score: 0.4 },
        ]);

        let raw = RawPredictions::from_tensor(&tensor);
        assert_eq!(raw.num_anchors(), 2);
        assert_eq!(raw.feature_dim(), FEATURES);
        assert_eq!(raw.to_model_layout(), tensor);
    }

    #[test]
    fn from_model_output_checks_shape() {
        let data = vec![0.0f32; FEATURES * 3];
        assert!(RawPredictions::from_model_output(&[1, FEATURES as i64, 3], &data).is_ok());
        assert!(RawPredictions::from_model_output(&[2, FEATURES as i64, 3], &data).is_err());
        assert!(RawPredictions::from_model_output(&[FEATURES as i64, 3], &data).is_err());
        assert!(RawPredictions::from_model_output(&[1, 2, 3], &data[..6]).is_err());
    }

    #[test]
    fn truncated_output_data_is_a_post_processing_error() {
        // Shape claims 3 anchors but the flat buffer holds only one row.
        let data = vec![0.0f32; FEATURES];
        let error =
            RawPredictions::from_model_output(&[1, FEATURES as i64, 3], &data).unwrap_err();
        assert!(matches!(
            error,
            CareLabelError::Processing {
                kind: ProcessingStage::PostProcessing,
                ..
            }
        ));
    }

    #[test]
    fn single_hot_anchor_yields_one_wash_30_detection() {
        let tensor = fixture(&[
            Anchor { cx: 0.5, cy: 0.5, w: 0.25, h: 0.25, class: 16, score: 0.9 },
            Anchor { cx: 0.2, cy: 0.2, w: 0.1, h: 0.1, class: 3, score: 0.2 },
        ]);

        let detections = postprocessor(0.25)
            .process(&RawPredictions::from_tensor(&tensor), SymbolCatalog::global())
            .unwrap();

        assert_eq!(detections.len(), 1);
        let detection = &detections[0];
        assert_eq!(detection.symbol_key, "wash_30");
        assert_eq!(detection.category, Category::Washing);
        assert!((detection.confidence - 0.9).abs() < 1e-6);

        // (0.5 - 0.125) * 640 = 240, (0.5 + 0.125) * 640 = 400
        assert!((detection.bounding_box.left - 240.0).abs() < 1e-3);
        assert!((detection.bounding_box.top - 240.0).abs() < 1e-3);
        assert!((detection.bounding_box.right - 400.0).abs() < 1e-3);
        assert!((detection.bounding_box.bottom - 400.0).abs() < 1e-3);
    }

    #[test]
    fn zero_confidence_output_yields_empty_list() {
        let tensor = Array3::zeros((1, FEATURES, 64));
        let detections = postprocessor(0.25)
            .process(&RawPredictions::from_tensor(&tensor), SymbolCatalog::global())
            .unwrap();
        assert!(detections.is_empty());
    }

    #[test]
    fn thresholding_is_monotonic() {
        let anchors: Vec<Anchor> = (0..12)
            .map(|i| Anchor {
                cx: 0.05 + 0.08 * i as f32,
                cy: 0.5,
                w: 0.05,
                h: 0.05,
                class: i % NUM_CLASSES,
                score: 0.1 + 0.07 * i as f32,
            })
            .collect();
        let tensor = fixture(&anchors);
        let catalog = SymbolCatalog::global();

        let loose: BTreeSet<&str> = postprocessor(0.2)
            .process(&RawPredictions::from_tensor(&tensor), catalog)
            .unwrap()
            .iter()
            .map(|d| d.symbol_key)
            .collect();
        let strict: BTreeSet<&str> = postprocessor(0.6)
            .process(&RawPredictions::from_tensor(&tensor), catalog)
            .unwrap()
            .iter()
            .map(|d| d.symbol_key)
            .collect();

        assert!(strict.is_subset(&loose));
        assert!(strict.len() < loose.len());
    }

    #[test]
    fn nms_collapses_same_symbol_overlaps_to_highest_confidence() {
        // Two anchors firing on the same physical symbol: same class, boxes
        // offset slightly, IoU well above 0.45.
        let tensor = fixture(&[
            Anchor { cx: 0.50, cy: 0.50, w: 0.20, h: 0.20, class: 16, score: 0.75 },
            Anchor { cx: 0.51, cy: 0.50, w: 0.20, h: 0.20, class: 16, score: 0.90 },
        ]);

        let detections = postprocessor(0.25)
            .process(&RawPredictions::from_tensor(&tensor), SymbolCatalog::global())
            .unwrap();

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].symbol_key, "wash_30");
        assert!((detections[0].confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn nms_keeps_overlapping_boxes_of_different_symbols() {
        // Same overlap geometry, different classes: both survive.
        let tensor = fixture(&[
            Anchor { cx: 0.50, cy: 0.50, w: 0.20, h: 0.20, class: 16, score: 0.75 },
            Anchor { cx: 0.51, cy: 0.50, w: 0.20, h: 0.20, class: 20, score: 0.90 },
        ]);

        let detections = postprocessor(0.25)
            .process(&RawPredictions::from_tensor(&tensor), SymbolCatalog::global())
            .unwrap();
        assert_eq!(detections.len(), 2);
    }

    #[test]
    fn rejects_feature_dim_mismatch() {
        let tensor = Array3::zeros((1, 10, 4));
        let result = postprocessor(0.25)
            .process(&RawPredictions::from_tensor(&tensor), SymbolCatalog::global());
        assert!(result.is_err());
    }

    #[test]
    fn max_detections_caps_output() {
        let anchors: Vec<Anchor> = (0..8)
            .map(|i| Anchor {
                // Spread boxes apart so NMS does not collapse them.
                cx: 0.06 + 0.12 * i as f32,
                cy: 0.5,
                w: 0.05,
                h: 0.05,
                class: i,
                score: 0.9,
            })
            .collect();
        let tensor = fixture(&anchors);

        let processor = DetectionPostProcessor::new(640, NUM_CLASSES, 0.25, 0.45, 3);
        let detections = processor
            .process(&RawPredictions::from_tensor(&tensor), SymbolCatalog::global())
            .unwrap();
        assert_eq!(detections.len(), 3);
    }
}
