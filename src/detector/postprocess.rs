use ndarray::{ArrayViewD, Axis};
use rayon::prelude::*;

use crate::common::{DetBox, Detection};
use crate::data::DetectConfig;
use crate::detector::nms::nms;

/// Anchors with objectness below this are rejected before anything else is
/// computed. The vast majority of the ~21k anchors die here; doing the cheap
/// test first is what keeps postprocessing off the frame-time budget.
const OBJECTNESS_FLOOR: f32 = 0.01;

/// Decodes the raw model output into suppressed, normalized detections.
///
/// The tensor is `[1, anchors, attrs]` with each row laid out as
/// `[cx, cy, w, h, objectness, class scores...]`, box coordinates in pixel
/// units of the resized (`input_size`²) frame. Rows surviving the confidence
/// gate are converted to corner form, normalized to `[0, 1]`, clamped, and
/// run through greedy NMS.
pub fn process_predictions(output: &ArrayViewD<f32>, config: &DetectConfig) -> Vec<Detection> {
    let shape = output.shape();
    if shape.len() < 3 || shape[2] < 5 {
        log::warn!("Unexpected model output shape {shape:?}, dropping frame");
        return Vec::new();
    }
    let (anchors, attrs) = (shape[1], shape[2]);

    let preds = match output.to_shape((shape[0] * anchors, attrs)) {
        Ok(p) => p,
        Err(e) => {
            log::warn!("Failed to reshape model output: {e}");
            return Vec::new();
        }
    };

    let input_size = config.input_size as f32;
    let mut boxes: Vec<Detection> = preds
        .axis_iter(Axis(0))
        .into_par_iter()
        .filter_map(|row| {
            let objectness = row[4];
            if objectness < OBJECTNESS_FLOOR {
                return None;
            }

            // class_id = argmax over the class-score slots; confidence is
            // objectness scaled by the winning class score.
            let (class_id, class_score) = if attrs > 5 {
                row.iter()
                    .skip(5)
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(i, &s)| (i, s))?
            } else {
                (0, 1.0)
            };

            let confidence = objectness * class_score;
            if confidence < config.conf_threshold {
                return None;
            }

            let bbox = DetBox::from_cxcy_wh(
                row[0] / input_size,
                row[1] / input_size,
                row[2] / input_size,
                row[3] / input_size,
            )
            .clamped();
            if bbox.is_degenerate() {
                return None;
            }

            Some(Detection::new(class_id, bbox, confidence))
        })
        .collect();

    nms(&mut boxes, config.iou_threshold);
    boxes.truncate(config.max_detections);
    boxes
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, ArrayD, IxDyn};

    /// Builds a `[1, anchors, 7]` output tensor from rows of
    /// `(cx, cy, w, h, obj, cls0, cls1)` in 1024-pixel units.
    fn output_from(rows: &[[f32; 7]]) -> ArrayD<f32> {
        let mut out = Array3::<f32>::zeros((1, rows.len(), 7));
        for (i, row) in rows.iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                out[[0, i, j]] = *v;
            }
        }
        out.into_dyn()
    }

    fn config() -> DetectConfig {
        DetectConfig::default()
    }

    #[test]
    fn low_objectness_anchors_are_prefiltered() {
        // High class score but objectness under the floor: must not survive.
        let out = output_from(&[[512.0, 512.0, 200.0, 200.0, 0.005, 0.99, 0.1]]);
        assert!(process_predictions(&out.view(), &config()).is_empty());
    }

    #[test]
    fn confidence_is_objectness_times_best_class() {
        let out = output_from(&[[512.0, 512.0, 200.0, 200.0, 0.8, 0.25, 0.5]]);
        let dets = process_predictions(&out.view(), &config());
        assert_eq!(dets.len(), 1);
        assert!((dets[0].confidence - 0.4).abs() < 1e-6);
        assert_eq!(dets[0].class_id, 1);
    }

    #[test]
    fn boxes_are_normalized_and_clamped() {
        // Box centered near the right edge, overshooting the frame.
        let out = output_from(&[[1000.0, 512.0, 200.0, 200.0, 0.9, 0.9, 0.1]]);
        let dets = process_predictions(&out.view(), &config());
        assert_eq!(dets.len(), 1);
        let b = dets[0].bbox;
        assert!(b.x2 <= 1.0 && b.x1 >= 0.0);
        assert!((b.x1 - (1000.0 - 100.0) / 1024.0).abs() < 1e-4);
    }

    #[test]
    fn degenerate_boxes_are_discarded() {
        // 5px wide at 1024 input size: normalized width < 0.01.
        let out = output_from(&[[512.0, 512.0, 5.0, 200.0, 0.9, 0.9, 0.1]]);
        assert!(process_predictions(&out.view(), &config()).is_empty());
    }

    #[test]
    fn threshold_filtering_is_monotonic() {
        // A spread of confidences; lowering the threshold can only add boxes.
        let rows: Vec<[f32; 7]> = (0..12)
            .map(|i| {
                let conf = 0.05 + i as f32 * 0.08;
                let cx = 60.0 + i as f32 * 80.0;
                [cx, 512.0, 60.0, 60.0, conf, 1.0, 0.0]
            })
            .collect();
        let out = output_from(&rows);

        let loose = process_predictions(&out.view(), &config().with_conf_threshold(0.10));
        let strict = process_predictions(&out.view(), &config().with_conf_threshold(0.40));
        assert!(loose.len() >= strict.len());
        for d in &strict {
            assert!(
                loose.iter().any(|l| l.bbox == d.bbox),
                "strict-threshold detection missing from loose-threshold set"
            );
        }
    }

    #[test]
    fn result_is_truncated_to_max_detections() {
        let rows: Vec<[f32; 7]> = (0..40)
            .map(|i| {
                let cx = 30.0 + (i % 8) as f32 * 120.0;
                let cy = 30.0 + (i / 8) as f32 * 180.0;
                [cx, cy, 50.0, 50.0, 0.9, 1.0, 0.0]
            })
            .collect();
        let out = output_from(&rows);
        let dets = process_predictions(&out.view(), &config().with_max_detections(10));
        assert_eq!(dets.len(), 10);
    }

    #[test]
    fn post_nms_detections_do_not_overlap_past_threshold() {
        let rows: Vec<[f32; 7]> = (0..20)
            .map(|i| {
                let off = 400.0 + i as f32 * 10.0;
                [off, off, 180.0, 180.0, 0.5 + i as f32 * 0.02, 1.0, 0.0]
            })
            .collect();
        let out = output_from(&rows);
        let dets = process_predictions(&out.view(), &config());
        for a in 0..dets.len() {
            for b in (a + 1)..dets.len() {
                assert!(dets[a].bbox.iou(&dets[b].bbox) <= config().iou_threshold);
            }
        }
    }

    #[test]
    fn malformed_output_yields_no_detections() {
        let out = ArrayD::<f32>::zeros(IxDyn(&[1, 4]));
        assert!(process_predictions(&out.view(), &config()).is_empty());
    }
}
