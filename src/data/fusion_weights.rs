use serde::{Deserialize, Serialize};

/// How the two signal families are blended: text density vs. image
/// complexity. Invariant: the two weights sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub text_weight: f32,
    pub image_weight: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            text_weight: 0.5,
            image_weight: 0.5,
        }
    }
}

impl FusionWeights {
    /// Builds normalized weights from two non-negative raw scores. Falls
    /// back to the 50/50 default when both scores are zero or non-finite.
    pub fn normalized(raw_text: f32, raw_image: f32) -> Self {
        let sum = raw_text + raw_image;
        if !sum.is_finite() || sum <= 0.0 {
            return Self::default();
        }
        Self {
            text_weight: raw_text / sum,
            image_weight: raw_image / sum,
        }
    }

    /// Weighted blend of a text-density score and a complexity score.
    pub fn fuse(&self, text_density: f32, image_complexity: f32) -> f32 {
        self.text_weight * text_density + self.image_weight * image_complexity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_weights_sum_to_one() {
        let w = FusionWeights::normalized(0.9, 0.6);
        assert!((w.text_weight + w.image_weight - 1.0).abs() < 1e-6);
        assert!(w.text_weight > w.image_weight);
    }

    #[test]
    fn zero_raw_scores_fall_back_to_even_split() {
        assert_eq!(FusionWeights::normalized(0.0, 0.0), FusionWeights::default());
        assert_eq!(FusionWeights::normalized(f32::NAN, 0.5), FusionWeights::default());
    }
}
