mod adjustment;
mod assets;
mod detect_config;
mod fusion_weights;
mod scroll_prefs;
mod store;

pub use adjustment::{AdjustmentRing, UserAdjustment};
pub use assets::{DirAssets, ModelAssets, MODEL_CANDIDATES};
pub use detect_config::DetectConfig;
pub use fusion_weights::FusionWeights;
pub use scroll_prefs::{DistanceStep, ScrollPrefs};
pub use store::{JsonFileStore, MemoryStore, SettingsStore};
