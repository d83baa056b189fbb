use serde::{Deserialize, Serialize};

use crate::common::ScrollDirection;
use crate::data::SettingsStore;

/// Settings-store keys for scroll preferences.
mod keys {
    pub const BASE_DELAY_MS: &str = "scroll.base_delay_ms";
    pub const DISTANCE_STEP: &str = "scroll.distance_step";
    pub const DIRECTION: &str = "scroll.direction";
    pub const RESPONSE_STRENGTH: &str = "scroll.response_strength";
    pub const SMART_PAUSE_STRENGTH: &str = "scroll.smart_pause_strength";
    pub const AUTO_PAUSE: &str = "scroll.auto_pause";
    pub const DECISION_INTERVAL_MS: &str = "scroll.decision_interval_ms";
}

/// Coarse user preference for how far one swipe travels.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceStep {
    Short,
    #[default]
    Medium,
    Long,
}

impl DistanceStep {
    pub fn pixels(&self) -> i32 {
        match self {
            DistanceStep::Short => 200,
            DistanceStep::Medium => 400,
            DistanceStep::Long => 600,
        }
    }

    pub fn from_str(step: &str) -> Option<Self> {
        match step.to_lowercase().as_str() {
            "short" => Some(DistanceStep::Short),
            "medium" => Some(DistanceStep::Medium),
            "long" => Some(DistanceStep::Long),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceStep::Short => "short",
            DistanceStep::Medium => "medium",
            DistanceStep::Long => "long",
        }
    }
}

/// User-facing scrolling preferences, loaded once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollPrefs {
    pub base_delay_ms: u64,
    pub distance_step: DistanceStep,
    pub direction: ScrollDirection,
    /// How strongly signals move the delay away from the base, in
    /// `[0.5, 2.0]`.
    pub response_strength: f32,
    /// How hard panel-boundary proximity brakes the scroll, in `[0, 1]`.
    pub smart_pause_strength: f32,
    pub auto_pause: bool,
    /// Cadence of the sensing loop, independent from the scroll cadence.
    pub decision_interval_ms: u64,
}

impl Default for ScrollPrefs {
    fn default() -> Self {
        Self {
            base_delay_ms: 1500,
            distance_step: DistanceStep::Medium,
            direction: ScrollDirection::Down,
            response_strength: 1.0,
            smart_pause_strength: 0.5,
            auto_pause: true,
            decision_interval_ms: 1500,
        }
    }
}

impl ScrollPrefs {
    /// Reads preferences from the store, falling back to per-field defaults
    /// for anything absent or mistyped, then clamps into valid ranges.
    pub fn load(store: &dyn SettingsStore) -> Self {
        let defaults = Self::default();
        let direction = ScrollDirection::from_str(
            &store.get_string(keys::DIRECTION, defaults.direction.as_str()),
        )
        .unwrap_or(defaults.direction);
        let distance_step = DistanceStep::from_str(
            &store.get_string(keys::DISTANCE_STEP, defaults.distance_step.as_str()),
        )
        .unwrap_or(defaults.distance_step);

        Self {
            base_delay_ms: store.get_u64(keys::BASE_DELAY_MS, defaults.base_delay_ms),
            distance_step,
            direction,
            response_strength: store.get_f32(keys::RESPONSE_STRENGTH, defaults.response_strength),
            smart_pause_strength: store
                .get_f32(keys::SMART_PAUSE_STRENGTH, defaults.smart_pause_strength),
            auto_pause: store.get_bool(keys::AUTO_PAUSE, defaults.auto_pause),
            decision_interval_ms: store
                .get_u64(keys::DECISION_INTERVAL_MS, defaults.decision_interval_ms),
        }
        .clamped()
    }

    pub fn save(&self, store: &dyn SettingsStore) -> anyhow::Result<()> {
        store.set_raw(keys::BASE_DELAY_MS, self.base_delay_ms.into())?;
        store.set_raw(keys::DISTANCE_STEP, self.distance_step.as_str().into())?;
        store.set_raw(keys::DIRECTION, self.direction.as_str().into())?;
        store.set_raw(keys::RESPONSE_STRENGTH, serde_json::json!(self.response_strength))?;
        store.set_raw(
            keys::SMART_PAUSE_STRENGTH,
            serde_json::json!(self.smart_pause_strength),
        )?;
        store.set_raw(keys::AUTO_PAUSE, self.auto_pause.into())?;
        store.set_raw(keys::DECISION_INTERVAL_MS, self.decision_interval_ms.into())?;
        Ok(())
    }

    pub fn clamped(mut self) -> Self {
        self.response_strength = self.response_strength.clamp(0.5, 2.0);
        self.smart_pause_strength = self.smart_pause_strength.clamp(0.0, 1.0);
        self.base_delay_ms = self.base_delay_ms.clamp(300, 8000);
        self.decision_interval_ms = self.decision_interval_ms.max(250);
        self
    }
}
