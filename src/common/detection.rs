use serde::{Deserialize, Serialize};

use crate::common::DetBox;
use crate::detector::nms::Nms;

/// One model-predicted speech-bubble region with its class and confidence.
#[derive(Default, Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Detection {
    pub class_id: usize,
    pub bbox: DetBox,
    pub confidence: f32,
}

impl Nms for Detection {
    fn iou(&self, other: &Self) -> f32 {
        self.bbox.iou(&other.bbox)
    }

    fn confidence(&self) -> f32 {
        self.confidence
    }
}

impl Detection {
    pub fn new(class_id: usize, bbox: DetBox, confidence: f32) -> Self {
        Self {
            class_id,
            bbox,
            confidence,
        }
    }

    pub fn with_bbox(mut self, bbox: DetBox) -> Self {
        self.bbox = bbox;
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_class_id(mut self, class_id: usize) -> Self {
        self.class_id = class_id;
        self
    }

    /// Normalized fraction of the frame this detection covers.
    pub fn area(&self) -> f32 {
        self.bbox.area()
    }

    /// True when the bubble's center sits in the upper half of the frame.
    pub fn in_top_half(&self) -> bool {
        self.bbox.cy() < 0.5
    }

    /// True when the bubble's center sits in the lower half of the frame.
    pub fn in_bottom_half(&self) -> bool {
        self.bbox.cy() >= 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_flags_split_on_center() {
        let top = Detection::new(0, DetBox::new(0.1, 0.1, 0.3, 0.3), 0.9);
        let bottom = Detection::new(0, DetBox::new(0.1, 0.6, 0.3, 0.9), 0.9);
        assert!(top.in_top_half());
        assert!(!top.in_bottom_half());
        assert!(bottom.in_bottom_half());
    }
}
