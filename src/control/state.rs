use std::collections::VecDeque;

use crate::common::ScrollDirection;
use crate::data::ScrollPrefs;

/// Number of density samples the rolling average looks back over.
const DENSITY_WINDOW: usize = 5;

/// Rolling controller state for one scrolling session.
///
/// Owned exclusively by `AdaptiveController`; reset to preference defaults
/// every time scrolling starts.
#[derive(Debug, Clone)]
pub struct AdaptiveState {
    density_history: VecDeque<f32>,
    pub current_delay_ms: u64,
    pub current_distance_px: i32,
    pub direction: ScrollDirection,
    pub last_bubble_count: usize,
    pub last_coverage: f32,
    pub last_complexity: f32,
    /// True once at least one detection cycle has completed, which is what
    /// switches the decision formulas from density-only to detection-based.
    pub detection_seen: bool,
}

impl AdaptiveState {
    pub fn from_prefs(prefs: &ScrollPrefs) -> Self {
        Self {
            density_history: VecDeque::with_capacity(DENSITY_WINDOW),
            current_delay_ms: prefs.base_delay_ms,
            current_distance_px: prefs.distance_step.pixels(),
            direction: prefs.direction,
            last_bubble_count: 0,
            last_coverage: 0.0,
            last_complexity: 0.0,
            detection_seen: false,
        }
    }

    pub fn push_density(&mut self, density: f32) {
        if self.density_history.len() == DENSITY_WINDOW {
            self.density_history.pop_front();
        }
        self.density_history.push_back(density.clamp(0.0, 1.0));
    }

    pub fn avg_density(&self) -> f32 {
        if self.density_history.is_empty() {
            return 0.0;
        }
        self.density_history.iter().sum::<f32>() / self.density_history.len() as f32
    }

    /// Current scroll speed in pixels per second.
    pub fn speed_px_per_sec(&self) -> f32 {
        self.current_distance_px as f32 / (self.current_delay_ms.max(1) as f32 / 1000.0)
    }
}
