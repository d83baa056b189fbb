/// Anything that can go through greedy non-maximum suppression.
pub trait Nms {
    fn iou(&self, other: &Self) -> f32;
    fn confidence(&self) -> f32;
}

/// Greedy NMS: sorts by confidence descending, then drops every box whose
/// IoU with an already-kept box exceeds `iou_threshold`. Operates in place.
pub fn nms<T: Nms>(boxes: &mut Vec<T>, iou_threshold: f32) {
    boxes.sort_by(|b1, b2| {
        b2.confidence()
            .partial_cmp(&b1.confidence())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut kept = 0;
    for index in 0..boxes.len() {
        let mut drop = false;
        for prev in 0..kept {
            if boxes[prev].iou(&boxes[index]) > iou_threshold {
                drop = true;
                break;
            }
        }
        if !drop {
            boxes.swap(kept, index);
            kept += 1;
        }
    }
    boxes.truncate(kept);
}
