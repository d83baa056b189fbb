use std::time::Instant;

use anyhow::Result;
use image::{DynamicImage, GenericImageView};
use ort::{GraphOptimizationLevel, Session};
use parking_lot::{Mutex, RwLock};

use crate::common::{DetectionResult, ModelStatus};
use crate::data::{DetectConfig, ModelAssets, MODEL_CANDIDATES};
use crate::detector::{process_image, process_predictions};

struct LoadedModel {
    session: Session,
    input_name: String,
    output_name: String,
}

/// Speech-bubble detector around a comic-text-detection ONNX model.
///
/// `detect` never fails: every per-frame problem is logged and answered with
/// an empty, well-formed result so the scroll loop above is unaffected.
pub struct BubbleDetector {
    config: DetectConfig,
    status: RwLock<ModelStatus>,
    /// Single-writer guard: concurrent `initialize` calls collapse into one
    /// in-flight load; the rest block and then read the settled status.
    init_lock: Mutex<()>,
    model: Mutex<Option<LoadedModel>>,
}

impl BubbleDetector {
    pub fn new(config: DetectConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            status: RwLock::new(ModelStatus::NotLoaded),
            init_lock: Mutex::new(()),
            model: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &DetectConfig {
        &self.config
    }

    /// Poll-based status accessor.
    pub fn status(&self) -> ModelStatus {
        *self.status.read()
    }

    /// Resolves and loads the model. Returns the resulting status; callers
    /// arriving after initialization has settled get the cached status
    /// without a second load.
    pub fn initialize(&self, assets: &dyn ModelAssets) -> ModelStatus {
        let _guard = self.init_lock.lock();
        let current = *self.status.read();
        if current.is_settled() {
            return current;
        }

        *self.status.write() = ModelStatus::Loading;
        let status = match self.load_model(assets) {
            Ok(status) => status,
            Err(e) => {
                log::error!("Model initialization failed: {e:#}");
                ModelStatus::Error
            }
        };
        *self.status.write() = status;
        log::info!("Detector initialized: {}", status.as_str());
        status
    }

    fn load_model(&self, assets: &dyn ModelAssets) -> Result<ModelStatus> {
        let mut resolved = None;
        for candidate in MODEL_CANDIDATES {
            match assets.fetch(candidate)? {
                Some(bytes) => {
                    log::info!("Resolved model asset: {candidate} ({} bytes)", bytes.len());
                    resolved = Some(bytes);
                    break;
                }
                None => log::debug!("Model asset not present: {candidate}"),
            }
        }
        let bytes = match resolved {
            Some(bytes) => bytes,
            None => return Ok(ModelStatus::NotAvailable),
        };

        if self.config.ort_lib_path.is_empty() {
            ort::init().commit()?;
        } else {
            ort::init_from(&self.config.ort_lib_path).commit()?;
        }

        // GPU and NPU execution providers benchmark slower than plain CPU
        // for this model's single-frame 1024x1024 workload; the runtime
        // stays on the CPU provider regardless of `use_gpu`.
        if self.config.use_gpu {
            log::warn!("use_gpu requested, running on CPU for this model shape");
        }

        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(threads)?
            .commit_from_memory(&bytes)?;

        let input_name = session.inputs[0].name.clone();
        let output_name = session.outputs[0].name.clone();
        *self.model.lock() = Some(LoadedModel {
            session,
            input_name,
            output_name,
        });

        Ok(ModelStatus::Ready)
    }

    /// Runs one detection pass. On any failure the status flips to `Error`
    /// and an empty result carrying the frame dimensions comes back; the
    /// next frame retries.
    pub fn detect(&self, image: &DynamicImage) -> DetectionResult {
        let (img_width, img_height) = image.dimensions();
        if !self.status().allows_detection() {
            return DetectionResult::empty(img_width, img_height);
        }

        match self.run_inference(image) {
            Ok(result) => {
                // A clean pass after a transient failure counts as recovery.
                if self.status() == ModelStatus::Error {
                    *self.status.write() = ModelStatus::Ready;
                }
                result
            }
            Err(e) => {
                log::warn!("Inference failed, returning empty result: {e:#}");
                *self.status.write() = ModelStatus::Error;
                DetectionResult::empty(img_width, img_height)
            }
        }
    }

    fn run_inference(&self, image: &DynamicImage) -> Result<DetectionResult> {
        let mut guard = self.model.lock();
        let model = guard
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("No model session loaded"))?;

        let (img_width, img_height, input) = process_image(image, self.config.input_size);

        let started = Instant::now();
        let outputs = model
            .session
            .run(ort::inputs![model.input_name.as_str() => input.view()]?)?;
        let inference_time_ms = started.elapsed().as_millis() as u64;

        let output = outputs[model.output_name.as_str()].try_extract_tensor::<f32>()?;
        let detections = process_predictions(&output, &self.config);
        log::trace!(
            "Frame {}x{}: {} bubbles in {}ms",
            img_width,
            img_height,
            detections.len(),
            inference_time_ms
        );

        Ok(DetectionResult::new(
            detections,
            inference_time_ms,
            img_width,
            img_height,
        ))
    }

    /// Frees the native inference session. Idempotent; a released detector
    /// reports `NotLoaded` and can be initialized again.
    pub fn release(&self) {
        let had_session = self.model.lock().take().is_some();
        *self.status.write() = ModelStatus::NotLoaded;
        if had_session {
            log::info!("Inference session released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DirAssets;

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = DetectConfig::default().with_conf_threshold(2.0);
        assert!(BubbleDetector::new(config).is_err());
    }

    #[test]
    fn missing_assets_settle_as_not_available() {
        let detector = BubbleDetector::new(DetectConfig::default()).unwrap();
        let assets = DirAssets::new(std::env::temp_dir().join("panelpace_empty_assets"));
        assert_eq!(detector.initialize(&assets), ModelStatus::NotAvailable);
        // Re-initializing returns the cached status.
        assert_eq!(detector.initialize(&assets), ModelStatus::NotAvailable);

        let frame = DynamicImage::new_rgb8(640, 1200);
        let result = detector.detect(&frame);
        assert!(result.detections.is_empty());
        assert_eq!((result.img_width, result.img_height), (640, 1200));
    }

    #[test]
    fn errored_detector_still_attempts_the_next_frame() {
        let detector = BubbleDetector::new(DetectConfig::default()).unwrap();
        let frame = DynamicImage::new_rgb8(320, 480);

        // A detector whose load failed mid-way: settled as Error, no session.
        *detector.status.write() = ModelStatus::Error;
        let result = detector.detect(&frame);
        assert!(result.detections.is_empty());
        assert_eq!((result.img_width, result.img_height), (320, 480));
        // The attempt ran and failed again; the status must stay Error (a
        // retryable state), never regress to an unsettled one.
        assert_eq!(detector.status(), ModelStatus::Error);
        assert!(detector.status().allows_detection());

        // Repeated frames keep retrying without wedging.
        let again = detector.detect(&frame);
        assert!(again.detections.is_empty());
        assert_eq!(detector.status(), ModelStatus::Error);
    }

    #[test]
    fn inference_failure_flips_ready_to_error() {
        let detector = BubbleDetector::new(DetectConfig::default()).unwrap();
        // Ready with no loaded session: the inference attempt must fail and
        // record the transient error instead of skipping.
        *detector.status.write() = ModelStatus::Ready;
        let result = detector.detect(&DynamicImage::new_rgb8(100, 100));
        assert!(result.detections.is_empty());
        assert_eq!(detector.status(), ModelStatus::Error);
    }

    #[test]
    fn release_is_idempotent() {
        let detector = BubbleDetector::new(DetectConfig::default()).unwrap();
        detector.release();
        detector.release();
        assert_eq!(detector.status(), ModelStatus::NotLoaded);
    }
}
