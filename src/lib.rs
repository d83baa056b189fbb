//! panelpace: the decision core of a comic auto-scroller.
//!
//! Fuses speech-bubble detections, panel-gutter segmentation, text density
//! and visual complexity into scroll timing/distance commands, and learns
//! the fusion weights from observed user corrections. Frame capture, swipe
//! gestures, model assets and settings persistence are supplied by the host
//! through the traits in [`session`] and [`data`].

pub mod common;
pub mod control;
pub mod data;
pub mod detector;
pub mod learning;
pub mod session;
pub mod signals;

pub use common::{
    ComicCategory, ContentCategory, DetBox, Detection, DetectionResult, ModelStatus, PanelRect,
    ScrollDirection,
};
pub use control::{AdaptiveController, Damping, FrameSignals};
pub use data::{
    DetectConfig, DirAssets, FusionWeights, JsonFileStore, MemoryStore, ModelAssets, ScrollPrefs,
    SettingsStore, UserAdjustment,
};
pub use detector::BubbleDetector;
pub use learning::SpeedLearner;
pub use session::{FrameSource, GestureExecutor, ScrollSession, SessionEvent};

pub type Result<T, E = anyhow::Error> = std::result::Result<T, E>;
