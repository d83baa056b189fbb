use anyhow::Result;

/// Input resolution the comic text detector was exported with. Not
/// configurable; the ONNX graph has a fixed spatial shape.
pub const MODEL_INPUT_SIZE: u32 = 1024;

/// Options controlling one detector instance.
///
/// Construct via a preset (`DetectConfig::default()`, `turbo()`, ...) or the
/// builder methods, then hand to `BubbleDetector::new`, which validates it.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectConfig {
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
    pub input_size: u32,
    pub use_gpu: bool,
    /// Path to the onnxruntime dynamic library. Empty means the loader's
    /// default search path.
    pub ort_lib_path: String,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            conf_threshold: 0.15,
            iou_threshold: 0.45,
            max_detections: 50,
            input_size: MODEL_INPUT_SIZE,
            use_gpu: false,
            ort_lib_path: String::new(),
        }
    }
}

impl DetectConfig {
    pub fn new() -> Self {
        Default::default()
    }

    /// Higher threshold, fewer boxes. For low-end hosts.
    pub fn turbo() -> Self {
        Self {
            conf_threshold: 0.25,
            iou_threshold: 0.50,
            max_detections: 20,
            ..Default::default()
        }
    }

    pub fn fast() -> Self {
        Self {
            conf_threshold: 0.20,
            max_detections: 30,
            ..Default::default()
        }
    }

    /// Lower threshold, more boxes. Catches faint hand-lettered bubbles at
    /// the cost of postprocess time.
    pub fn accurate() -> Self {
        Self {
            conf_threshold: 0.10,
            max_detections: 100,
            ..Default::default()
        }
    }

    /// Near-zero threshold, for inspecting raw model output.
    pub fn debug() -> Self {
        Self {
            conf_threshold: 0.01,
            max_detections: 200,
            ..Default::default()
        }
    }

    pub fn from_preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" => Some(Self::default()),
            "turbo" => Some(Self::turbo()),
            "fast" => Some(Self::fast()),
            "accurate" => Some(Self::accurate()),
            "debug" => Some(Self::debug()),
            _ => None,
        }
    }

    pub fn with_conf_threshold(mut self, threshold: f32) -> Self {
        self.conf_threshold = threshold;
        self
    }

    pub fn with_iou_threshold(mut self, threshold: f32) -> Self {
        self.iou_threshold = threshold;
        self
    }

    pub fn with_max_detections(mut self, n: usize) -> Self {
        self.max_detections = n;
        self
    }

    pub fn with_use_gpu(mut self, use_gpu: bool) -> Self {
        self.use_gpu = use_gpu;
        self
    }

    pub fn with_ort_lib_path(mut self, path: &str) -> Self {
        self.ort_lib_path = path.to_string();
        self
    }

    /// Rejects malformed configurations up front, so per-frame calls never
    /// have to re-check them.
    pub fn validate(&self) -> Result<()> {
        if !self.conf_threshold.is_finite() || !(0.0..=1.0).contains(&self.conf_threshold) {
            anyhow::bail!("confidence threshold must be within [0, 1], got {}", self.conf_threshold);
        }
        if !self.iou_threshold.is_finite() || !(0.0..=1.0).contains(&self.iou_threshold) {
            anyhow::bail!("IoU threshold must be within [0, 1], got {}", self.iou_threshold);
        }
        if self.max_detections == 0 {
            anyhow::bail!("max_detections must be at least 1");
        }
        if self.input_size == 0 {
            anyhow::bail!("input_size must be non-zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_resolve_by_name() {
        assert_eq!(DetectConfig::from_preset("turbo"), Some(DetectConfig::turbo()));
        assert_eq!(DetectConfig::from_preset("ACCURATE"), Some(DetectConfig::accurate()));
        assert!(DetectConfig::from_preset("warp").is_none());
    }

    #[test]
    fn preset_thresholds_match_documented_values() {
        assert_eq!(DetectConfig::default().conf_threshold, 0.15);
        assert_eq!(DetectConfig::turbo().conf_threshold, 0.25);
        assert_eq!(DetectConfig::turbo().iou_threshold, 0.50);
        assert_eq!(DetectConfig::turbo().max_detections, 20);
        assert_eq!(DetectConfig::fast().max_detections, 30);
        assert_eq!(DetectConfig::accurate().max_detections, 100);
        assert_eq!(DetectConfig::debug().conf_threshold, 0.01);
        assert!(!DetectConfig::default().use_gpu);
    }

    #[test]
    fn validate_rejects_out_of_range_thresholds() {
        assert!(DetectConfig::default().with_conf_threshold(1.5).validate().is_err());
        assert!(DetectConfig::default().with_conf_threshold(f32::NAN).validate().is_err());
        assert!(DetectConfig::default().with_iou_threshold(-0.1).validate().is_err());
        assert!(DetectConfig::default().with_max_detections(0).validate().is_err());
        assert!(DetectConfig::default().validate().is_ok());
    }
}
