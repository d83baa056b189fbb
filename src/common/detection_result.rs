use serde::{Deserialize, Serialize};

use crate::common::Detection;

/// Bubble count at or above which a frame counts as dialogue-heavy.
const DIALOGUE_COUNT: usize = 3;
/// Coverage above which a frame counts as dialogue-heavy.
const DIALOGUE_COVERAGE: f32 = 0.15;
/// Action panels have at most one bubble and almost no text coverage.
const ACTION_COVERAGE: f32 = 0.05;

/// The outcome of one detection pass over a single frame.
///
/// Carries the surviving (post-NMS) detections in confidence order plus the
/// source frame dimensions, so an empty result is still meaningful to
/// callers that remap coordinates. The text-density metrics are derived on
/// demand rather than stored.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub detections: Vec<Detection>,
    pub inference_time_ms: u64,
    pub img_width: u32,
    pub img_height: u32,
}

impl DetectionResult {
    pub fn new(
        detections: Vec<Detection>,
        inference_time_ms: u64,
        img_width: u32,
        img_height: u32,
    ) -> Self {
        Self {
            detections,
            inference_time_ms,
            img_width,
            img_height,
        }
    }

    /// A well-formed result with zero detections, used on every failure path
    /// so callers never have to handle an error per frame.
    pub fn empty(img_width: u32, img_height: u32) -> Self {
        Self {
            detections: Vec::new(),
            inference_time_ms: 0,
            img_width,
            img_height,
        }
    }

    pub fn bubble_count(&self) -> usize {
        self.detections.len()
    }

    /// Sum of normalized bubble areas, clamped to 1. Overlap past the NMS
    /// threshold has already been suppressed, so the sum is a fair coverage
    /// estimate.
    pub fn total_coverage(&self) -> f32 {
        self.detections
            .iter()
            .map(|d| d.area())
            .sum::<f32>()
            .clamp(0.0, 1.0)
    }

    pub fn average_confidence(&self) -> f32 {
        if self.detections.is_empty() {
            return 0.0;
        }
        self.detections.iter().map(|d| d.confidence).sum::<f32>()
            / self.detections.len() as f32
    }

    /// Scalar text-density signal in `[0, 1]`.
    ///
    /// Count contributes 30% (saturating at 10 bubbles), coverage 70%
    /// (saturating at half the frame).
    pub fn text_density_score(&self) -> f32 {
        let count_factor = (self.bubble_count() as f32 / 10.0).clamp(0.0, 1.0);
        let area_factor = (self.total_coverage() * 2.0).clamp(0.0, 1.0);
        (0.3 * count_factor + 0.7 * area_factor).clamp(0.0, 1.0)
    }

    pub fn is_dialogue_heavy(&self) -> bool {
        self.bubble_count() >= DIALOGUE_COUNT || self.total_coverage() > DIALOGUE_COVERAGE
    }

    pub fn is_action_panel(&self) -> bool {
        self.bubble_count() <= 1 && self.total_coverage() < ACTION_COVERAGE
    }
}
