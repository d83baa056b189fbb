use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::common::{ContentCategory, DetectionResult, PanelRect, ScrollDirection};
use crate::control::{AdaptiveState, Damping};
use crate::data::{FusionWeights, ScrollPrefs};

/// Hard bounds on the detection-based scroll delay.
const DELAY_FLOOR_MS: f32 = 300.0;
const DELAY_CEIL_MS: f32 = 5000.0;
/// Bounds on the emitted swipe distance.
const DISTANCE_FLOOR_PX: f32 = 100.0;
const DISTANCE_CEIL_PX: f32 = 800.0;
/// Boundary damping is considered at most this often.
const DAMPING_INTERVAL: Duration = Duration::from_millis(500);
/// A boundary closer than this triggers the pause-resume instead of a slowdown.
const PAUSE_PROXIMITY_PX: f32 = 20.0;
const PAUSE_DURATION: Duration = Duration::from_millis(300);
/// Maximum speed reduction near a boundary, before the pause strength scales it.
const MAX_BOUNDARY_BRAKE: f32 = 0.8;

/// Scalar signals distilled from one sensing cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSignals {
    pub bubble_count: usize,
    pub coverage: f32,
    pub text_density: f32,
    pub complexity: f32,
}

impl FrameSignals {
    pub fn from_result(result: &DetectionResult, complexity: f32) -> Self {
        Self {
            bubble_count: result.bubble_count(),
            coverage: result.total_coverage(),
            text_density: result.text_density_score(),
            complexity,
        }
    }

    /// Labels the frame for learning-sample partitioning, using the same
    /// cutoffs as the dialogue/action flags on `DetectionResult`.
    pub fn category(&self) -> ContentCategory {
        if self.bubble_count >= 3 || self.coverage > 0.15 {
            ContentCategory::DenseText
        } else if self.bubble_count <= 1 && self.coverage < 0.05 {
            ContentCategory::Action
        } else {
            ContentCategory::Balanced
        }
    }
}

/// Converts frame signals into scroll timing and distance commands.
///
/// Owns all rolling state; the session wraps it in a mutex and is the only
/// writer. Fusion weights and learned baselines are read once at start and
/// stay fixed for the session.
pub struct AdaptiveController {
    prefs: ScrollPrefs,
    weights: FusionWeights,
    state: AdaptiveState,
    learned_baselines: HashMap<ContentCategory, f32>,
    last_damping: Option<Instant>,
}

impl AdaptiveController {
    pub fn new(prefs: ScrollPrefs, weights: FusionWeights) -> Self {
        let prefs = prefs.clamped();
        let state = AdaptiveState::from_prefs(&prefs);
        Self {
            prefs,
            weights,
            state,
            learned_baselines: HashMap::new(),
            last_damping: None,
        }
    }

    pub fn prefs(&self) -> &ScrollPrefs {
        &self.prefs
    }

    pub fn weights(&self) -> &FusionWeights {
        &self.weights
    }

    pub fn state(&self) -> &AdaptiveState {
        &self.state
    }

    pub fn current_delay(&self) -> Duration {
        Duration::from_millis(self.state.current_delay_ms)
    }

    pub fn current_distance_px(&self) -> i32 {
        self.state.current_distance_px
    }

    pub fn direction(&self) -> ScrollDirection {
        self.state.direction
    }

    /// Resets rolling state to preference defaults. Called at session start.
    pub fn reset(&mut self) {
        self.state = AdaptiveState::from_prefs(&self.prefs);
        self.last_damping = None;
    }

    /// Installs the per-category mean speeds the learner has accumulated.
    /// Kept as a secondary signal only; the formulaic decision below does
    /// not blend against it.
    pub fn set_learned_baselines(&mut self, baselines: HashMap<ContentCategory, f32>) {
        self.learned_baselines = baselines;
    }

    pub fn learned_baseline(&self, category: ContentCategory) -> Option<f32> {
        self.learned_baselines.get(&category).copied()
    }

    /// Ingests one sensing cycle and recomputes delay and distance. With
    /// `None` (capture skipped or detector unavailable) the density-only
    /// fallback formulas run off the rolling average.
    pub fn update(&mut self, signals: Option<&FrameSignals>) {
        if let Some(s) = signals {
            self.state.push_density(self.fused_density(s));
            self.state.last_bubble_count = s.bubble_count;
            self.state.last_coverage = s.coverage;
            self.state.last_complexity = s.complexity;
            self.state.detection_seen = true;
        }

        self.state.current_delay_ms = self.decide_delay(signals);
        self.state.current_distance_px = self.decide_distance(signals);
        log::trace!(
            "Decision: delay={}ms distance={}px (detection_seen={})",
            self.state.current_delay_ms,
            self.state.current_distance_px,
            self.state.detection_seen
        );
    }

    /// Feeds the density history when detection is unavailable, using image
    /// complexity as the stand-in busy-ness signal. Does not mark a
    /// detection cycle as seen.
    pub fn observe_complexity(&mut self, complexity: f32) {
        self.state.push_density(complexity.clamp(0.0, 1.0));
        self.state.last_complexity = complexity;
    }

    fn fused_density(&self, signals: &FrameSignals) -> f32 {
        self.weights
            .fuse(signals.text_density, signals.complexity)
            .clamp(0.0, 1.0)
    }

    /// Next scroll delay in ms.
    pub fn decide_delay(&self, signals: Option<&FrameSignals>) -> u64 {
        let base = self.prefs.base_delay_ms as f32;
        let rs = self.prefs.response_strength;

        match signals {
            Some(s) => {
                let bubble_factor = match s.bubble_count {
                    c if c >= 5 => 2.5,
                    c if c >= 3 => 1.8,
                    c if c >= 1 => 1.3,
                    _ => 0.7,
                };
                let coverage_factor = if s.coverage > 0.3 {
                    2.0
                } else if s.coverage > 0.15 {
                    1.5
                } else if s.coverage > 0.05 {
                    1.1
                } else {
                    0.8
                };
                let combined = 0.6 * bubble_factor + 0.4 * coverage_factor;
                let adjusted = 1.0 + (combined - 1.0) * rs;
                (base * adjusted).clamp(DELAY_FLOOR_MS, DELAY_CEIL_MS) as u64
            }
            None => {
                let normalized = (self.state.avg_density() * 5.0).clamp(0.0, 1.0);
                let factor = 2.0 - normalized * rs * 1.5;
                let floor = DELAY_FLOOR_MS.max(500.0 / rs);
                let ceil = 8000f32.min(6000.0 * rs);
                (base / factor).clamp(floor, ceil) as u64
            }
        }
    }

    /// Next swipe distance in px. The text-weight direction is inverted
    /// relative to the delay: dense dialogue shortens the jump, action art
    /// lengthens it.
    pub fn decide_distance(&self, signals: Option<&FrameSignals>) -> i32 {
        let base = self.prefs.distance_step.pixels() as f32;
        let rs = self.prefs.response_strength;

        let factor = match signals {
            Some(s) => {
                let coverage_factor = if s.coverage > 0.3 {
                    0.5
                } else if s.coverage > 0.15 {
                    0.7
                } else if s.coverage > 0.05 {
                    0.9
                } else {
                    1.2
                };
                let count_factor = match s.bubble_count {
                    c if c >= 5 => 0.5,
                    c if c >= 3 => 0.75,
                    c if c >= 1 => 0.9,
                    _ => 1.2,
                };
                0.6 * coverage_factor + 0.4 * count_factor
            }
            None => 1.2 - (self.state.avg_density() * 5.0).clamp(0.0, 1.0) * 0.7,
        };

        let adjusted = 1.0 + (factor - 1.0) * rs;
        (base * adjusted).clamp(DISTANCE_FLOOR_PX, DISTANCE_CEIL_PX) as i32
    }

    /// Damps the scroll when the estimated position approaches a panel
    /// boundary in the travel direction. Rate-limited so back-to-back scroll
    /// ticks cannot oscillate between braking and full speed.
    pub fn boundary_adjustment(
        &mut self,
        panels: &[PanelRect],
        frame_width: u32,
        frame_height: u32,
        elapsed_in_frame: Duration,
        now: Instant,
    ) -> Damping {
        if let Some(last) = self.last_damping {
            if now.duration_since(last) < DAMPING_INTERVAL {
                return Damping::None;
            }
        }

        let direction = self.state.direction;
        let extent = direction.frame_extent(frame_width, frame_height) as f32;
        if extent <= 0.0 || panels.is_empty() {
            return Damping::None;
        }
        let window = extent / 3.0;

        let position =
            (elapsed_in_frame.as_secs_f32() * self.state.speed_px_per_sec()).min(extent);

        // Progress coordinate of each boundary along the travel direction;
        // for up/left travel the axis is mirrored.
        let mut nearest: Option<f32> = None;
        for panel in panels {
            let edge = panel.trailing_edge(direction) as f32;
            let coord = match direction {
                ScrollDirection::Down | ScrollDirection::Right => edge,
                ScrollDirection::Up | ScrollDirection::Left => extent - edge,
            };
            let ahead = coord - position;
            if ahead > 0.0 && ahead < window {
                nearest = Some(nearest.map_or(ahead, |n: f32| n.min(ahead)));
            }
        }

        let Some(distance) = nearest else {
            return Damping::None;
        };

        self.last_damping = Some(now);
        if distance < PAUSE_PROXIMITY_PX && self.prefs.auto_pause {
            return Damping::Pause(PAUSE_DURATION);
        }

        let proximity = 1.0 - distance / window;
        let brake = MAX_BOUNDARY_BRAKE * self.prefs.smart_pause_strength * proximity;
        Damping::SlowDown((1.0 - brake).max(1.0 - MAX_BOUNDARY_BRAKE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DistanceStep;

    fn signals(count: usize, coverage: f32) -> FrameSignals {
        FrameSignals {
            bubble_count: count,
            coverage,
            text_density: (coverage * 2.0).clamp(0.0, 1.0),
            complexity: 0.3,
        }
    }

    fn controller() -> AdaptiveController {
        AdaptiveController::new(ScrollPrefs::default(), FusionWeights::default())
    }

    #[test]
    fn dialogue_heavy_frame_slows_the_scroll() {
        // 6 bubbles, 40% coverage: bubble 2.5, coverage 2.0, combined 2.3.
        let c = controller();
        let delay = c.decide_delay(Some(&signals(6, 0.4)));
        // clamp(1500 * 2.3, 300, 5000), give or take float rounding.
        assert!((3449..=3451).contains(&delay), "got {delay}");
    }

    #[test]
    fn action_frame_speeds_up_and_jumps_further() {
        // 0 bubbles, no coverage: factors 0.7 / 0.8.
        let c = controller();
        let delay = c.decide_delay(Some(&signals(0, 0.0)));
        // clamp(1500 * (0.6*0.7 + 0.4*0.8), 300, 5000) = ~1110.
        assert!((1109..=1111).contains(&delay), "got {delay}");

        let distance = c.decide_distance(Some(&signals(0, 0.0)));
        // Inverted factor is 1.2 for an empty frame.
        assert!(distance as f32 >= 400.0 * 1.1);
    }

    #[test]
    fn extreme_signals_stay_clamped() {
        let c = controller();
        let delay = c.decide_delay(Some(&signals(1000, 1.0)));
        assert!((300..=5000).contains(&delay));
        let distance = c.decide_distance(Some(&signals(1000, 1.0)));
        assert!((100..=800).contains(&distance));
    }

    #[test]
    fn response_strength_scales_the_adjustment() {
        let mut prefs = ScrollPrefs::default();
        prefs.response_strength = 2.0;
        let strong = AdaptiveController::new(prefs, FusionWeights::default());
        let weak = controller();
        let s = signals(6, 0.4);
        assert!(strong.decide_delay(Some(&s)) > weak.decide_delay(Some(&s)));
    }

    #[test]
    fn density_fallback_respects_its_own_bounds() {
        let mut c = controller();
        for _ in 0..5 {
            c.state.push_density(1.0);
        }
        let busy = c.decide_delay(None);
        c.reset();
        let idle = c.decide_delay(None);
        assert!(busy > idle, "denser history must mean a longer delay");
        for d in [busy, idle] {
            assert!((500..=6000).contains(&d));
        }
    }

    #[test]
    fn update_with_no_signals_keeps_the_loop_running() {
        let mut c = controller();
        c.update(None);
        assert!(c.current_delay().as_millis() > 0);
        assert!(c.current_distance_px() > 0);
    }

    #[test]
    fn distance_shrinks_under_dense_dialogue() {
        let mut c = controller();
        c.update(Some(&signals(6, 0.4)));
        // Inverted factors: 0.6*0.5 + 0.4*0.5 = 0.5.
        assert_eq!(c.current_distance_px(), (400.0 * 0.5) as i32);
        assert!(c.state().detection_seen);
    }

    #[test]
    fn boundary_damping_never_stops_the_scroll() {
        let mut c = controller();
        c.update(Some(&signals(0, 0.0)));
        let panels = vec![PanelRect::new(0, 0, 1080, 700)];
        // Position ~0, boundary at 700 on a 1800px frame: within extent/3.
        let damping = c.boundary_adjustment(
            &panels,
            1080,
            1800,
            Duration::from_secs(1),
            Instant::now(),
        );
        match damping {
            Damping::SlowDown(f) => assert!(f > 0.0 && f <= 1.0),
            Damping::Pause(d) => assert!(d > Duration::ZERO),
            Damping::None => panic!("expected damping within the approach window"),
        }
    }

    #[test]
    fn boundary_damping_is_rate_limited() {
        let mut c = controller();
        c.update(Some(&signals(0, 0.0)));
        let panels = vec![PanelRect::new(0, 0, 1080, 700)];
        let now = Instant::now();
        let first = c.boundary_adjustment(&panels, 1080, 1800, Duration::from_secs(1), now);
        assert!(!first.is_none());
        let second = c.boundary_adjustment(
            &panels,
            1080,
            1800,
            Duration::from_secs(1),
            now + Duration::from_millis(100),
        );
        assert!(second.is_none());
        let third = c.boundary_adjustment(
            &panels,
            1080,
            1800,
            Duration::from_secs(1),
            now + Duration::from_millis(600),
        );
        assert!(!third.is_none());
    }

    #[test]
    fn imminent_boundary_pauses_when_auto_pause_is_on() {
        let mut c = controller();
        c.update(Some(&signals(0, 0.0)));
        // Speed is distance/delay px/s; pick elapsed so the estimated
        // position lands ~10px before the boundary at 700.
        let speed = c.state().speed_px_per_sec();
        let elapsed = Duration::from_secs_f32(690.0 / speed);
        let panels = vec![PanelRect::new(0, 0, 1080, 700)];
        let damping = c.boundary_adjustment(&panels, 1080, 1800, elapsed, Instant::now());
        assert_eq!(damping, Damping::Pause(Duration::from_millis(300)));
    }

    #[test]
    fn distant_boundaries_do_not_damp() {
        let mut c = controller();
        c.update(Some(&signals(0, 0.0)));
        // Boundary at 1700 on an 1800px frame, position ~0: outside extent/3.
        let panels = vec![PanelRect::new(0, 0, 1080, 1700)];
        let damping =
            c.boundary_adjustment(&panels, 1080, 1800, Duration::ZERO, Instant::now());
        assert!(damping.is_none());
    }

    #[test]
    fn frame_category_tracks_dialogue_and_action_cutoffs() {
        assert_eq!(signals(6, 0.4).category(), ContentCategory::DenseText);
        assert_eq!(signals(0, 0.0).category(), ContentCategory::Action);
        assert_eq!(signals(2, 0.1).category(), ContentCategory::Balanced);
    }

    #[test]
    fn learned_baseline_is_exposed_but_not_blended() {
        let mut c = controller();
        let mut baselines = HashMap::new();
        baselines.insert(ContentCategory::DenseText, 4200.0);
        c.set_learned_baselines(baselines);
        assert_eq!(c.learned_baseline(ContentCategory::DenseText), Some(4200.0));

        // The formulaic output must be unchanged by the baseline.
        let with = c.decide_delay(Some(&signals(6, 0.4)));
        let without = controller().decide_delay(Some(&signals(6, 0.4)));
        assert_eq!(with, without);
    }

    #[test]
    fn longer_distance_step_raises_the_jump() {
        let mut prefs = ScrollPrefs::default();
        prefs.distance_step = DistanceStep::Long;
        let long = AdaptiveController::new(prefs, FusionWeights::default());
        assert!(long.decide_distance(None) > controller().decide_distance(None));
    }
}
