use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in coordinates normalized to the source frame,
/// so every component lives in `[0, 1]` regardless of the frame resolution.
#[derive(Default, Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct DetBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl DetBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Builds a box from center-form `(cx, cy, w, h)` coordinates.
    pub fn from_cxcy_wh(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        }
    }

    /// Returns the width of the bounding box.
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    /// Returns the height of the bounding box.
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Returns the center x-coordinate of the bounding box.
    pub fn cx(&self) -> f32 {
        (self.x1 + self.x2) / 2.0
    }

    /// Returns the center y-coordinate of the bounding box.
    pub fn cy(&self) -> f32 {
        (self.y1 + self.y2) / 2.0
    }

    /// Computes the area of the bounding box.
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Clamps every coordinate into `[0, 1]`.
    pub fn clamped(&self) -> Self {
        Self {
            x1: self.x1.clamp(0.0, 1.0),
            y1: self.y1.clamp(0.0, 1.0),
            x2: self.x2.clamp(0.0, 1.0),
            y2: self.y2.clamp(0.0, 1.0),
        }
    }

    /// A box is degenerate when either normalized extent collapses below 1%
    /// of the frame. Such boxes are detector noise and are discarded.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.01 || self.height() <= 0.01
    }

    /// Computes the intersection area between this bounding box and another.
    pub fn intersect(&self, other: &DetBox) -> f32 {
        let left = self.x1.max(other.x1);
        let right = self.x2.min(other.x2);
        let top = self.y1.max(other.y1);
        let bottom = self.y2.min(other.y2);
        (right - left).max(0.0) * (bottom - top).max(0.0)
    }

    /// Computes the union area between this bounding box and another.
    pub fn union(&self, other: &DetBox) -> f32 {
        self.area() + other.area() - self.intersect(other)
    }

    /// Intersection over union. Returns 0 when the union area is 0.
    pub fn iou(&self, other: &DetBox) -> f32 {
        let union = self.union(other);
        if union <= 0.0 {
            return 0.0;
        }
        self.intersect(other) / union
    }

    /// Scales normalized coordinates back to pixel coordinates.
    pub fn to_pixels(&self, frame_width: u32, frame_height: u32) -> (i32, i32, i32, i32) {
        (
            (self.x1 * frame_width as f32).round() as i32,
            (self.y1 * frame_height as f32).round() as i32,
            (self.x2 * frame_width as f32).round() as i32,
            (self.y2 * frame_height as f32).round() as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iou_with_self_is_one() {
        let b = DetBox::new(0.1, 0.1, 0.5, 0.5);
        assert!((b.iou(&b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = DetBox::new(0.0, 0.0, 0.2, 0.2);
        let b = DetBox::new(0.5, 0.5, 0.9, 0.9);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn iou_of_empty_boxes_is_zero() {
        let a = DetBox::new(0.3, 0.3, 0.3, 0.3);
        assert_eq!(a.iou(&a), 0.0);
    }

    #[test]
    fn center_form_round_trip() {
        let b = DetBox::from_cxcy_wh(0.5, 0.5, 0.2, 0.4);
        assert!((b.cx() - 0.5).abs() < 1e-6);
        assert!((b.cy() - 0.5).abs() < 1e-6);
        assert!((b.width() - 0.2).abs() < 1e-6);
        assert!((b.height() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn clamp_pulls_overshoot_back_into_unit_square() {
        let b = DetBox::new(-0.1, 0.2, 1.4, 0.8).clamped();
        assert_eq!(b.x1, 0.0);
        assert_eq!(b.x2, 1.0);
    }
}
