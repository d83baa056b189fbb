use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::{Receiver, Sender};
use image::DynamicImage;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::common::{ComicCategory, ModelStatus, PanelRect, ScrollDirection};
use crate::control::{AdaptiveController, Damping, FrameSignals};
use crate::data::{ModelAssets, SettingsStore, UserAdjustment};
use crate::detector::BubbleDetector;
use crate::learning::SpeedLearner;
use crate::signals::{detect_panels, image_complexity};

/// Duration of one emitted swipe gesture.
const SWIPE_DURATION_MS: u64 = 300;
/// Events buffered for a slow (or absent) subscriber before being dropped.
const EVENT_BUFFER: usize = 64;

/// Supplies the most recent visible frame, or `None` when capture is not
/// currently active (the sensing loop skips that cycle).
pub trait FrameSource: Send + Sync {
    fn capture_frame(&self) -> Option<DynamicImage>;
}

/// Performs one directional swipe. Failures are logged by the session and
/// never abort the scroll loop.
pub trait GestureExecutor: Send + Sync {
    fn scroll(
        &self,
        direction: ScrollDirection,
        distance_px: i32,
        duration_ms: u64,
    ) -> Result<()>;
}

/// What the session reports to an (optional) subscriber, replacing the
/// original design's global status-listener list.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StatusChanged(ModelStatus),
    Swipe { distance_px: i32, delay_ms: u64 },
    Paused(Duration),
}

/// Latest sensed frame geometry, shared from the sensing loop to the scroll
/// loop for boundary damping.
#[derive(Debug, Default)]
struct Sensed {
    panels: Vec<PanelRect>,
    frame_width: u32,
    frame_height: u32,
    sensed_at: Option<Instant>,
}

/// One auto-scrolling session: owns the detector, the controller and the
/// learner, and drives the two periodic loops while running.
///
/// The sensing loop (fixed cadence) fully completes each
/// capture-detect-extract-update cycle before the next tick; the scroll loop
/// reads the controller's current delay/distance once per iteration, so a
/// decision takes effect on the next tick, never mid-sleep.
pub struct ScrollSession {
    detector: Arc<BubbleDetector>,
    controller: Arc<Mutex<AdaptiveController>>,
    learner: Arc<Mutex<SpeedLearner>>,
    frames: Arc<dyn FrameSource>,
    gestures: Arc<dyn GestureExecutor>,
    assets: Arc<dyn ModelAssets>,
    store: Arc<dyn SettingsStore>,
    comic_category: ComicCategory,
    sensed: Arc<Mutex<Sensed>>,
    running: Arc<AtomicBool>,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
}

impl ScrollSession {
    /// Builds a session from its collaborators. Preferences, fusion weights
    /// and adjustment history are loaded from the store here; they stay
    /// fixed until the next session is constructed.
    pub fn new(
        detector: BubbleDetector,
        frames: Arc<dyn FrameSource>,
        gestures: Arc<dyn GestureExecutor>,
        assets: Arc<dyn ModelAssets>,
        store: Arc<dyn SettingsStore>,
        comic_category: ComicCategory,
    ) -> Self {
        let prefs = crate::data::ScrollPrefs::load(store.as_ref());
        let learner = SpeedLearner::load(store.as_ref());
        let mut controller = AdaptiveController::new(prefs, learner.weights());
        controller.set_learned_baselines(learner.baselines(comic_category));

        let (events_tx, events_rx) = crossbeam_channel::bounded(EVENT_BUFFER);
        let (shutdown, _) = watch::channel(false);
        Self {
            detector: Arc::new(detector),
            controller: Arc::new(Mutex::new(controller)),
            learner: Arc::new(Mutex::new(learner)),
            frames,
            gestures,
            assets,
            store,
            comic_category,
            sensed: Arc::new(Mutex::new(Sensed::default())),
            running: Arc::new(AtomicBool::new(false)),
            shutdown,
            tasks: Mutex::new(Vec::new()),
            events_tx,
            events_rx,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn model_status(&self) -> ModelStatus {
        self.detector.status()
    }

    /// Subscribes to session events. Events are dropped, not queued without
    /// bound, when nobody drains them.
    pub fn events(&self) -> Receiver<SessionEvent> {
        self.events_rx.clone()
    }

    /// Starts both loops. Must be called within a tokio runtime. A second
    /// call while running is a no-op.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.shutdown.send(false);
        self.controller.lock().reset();

        let status = self.detector.initialize(self.assets.as_ref());
        self.emit(SessionEvent::StatusChanged(status));
        log::info!("Session starting with model {}", status.as_str());

        let mut tasks = self.tasks.lock();
        tasks.push(tokio::spawn(sensing_loop(
            self.detector.clone(),
            self.controller.clone(),
            self.learner.clone(),
            self.frames.clone(),
            self.sensed.clone(),
            self.comic_category,
            self.shutdown.subscribe(),
        )));
        tasks.push(tokio::spawn(scroll_loop(
            self.controller.clone(),
            self.gestures.clone(),
            self.sensed.clone(),
            self.events_tx.clone(),
            self.shutdown.subscribe(),
        )));
    }

    /// Stops both loops, persists the learner and releases the inference
    /// session. Idempotent.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.shutdown.send(true);
        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                log::warn!("Session task ended abnormally: {e}");
            }
        }
        if let Err(e) = self.learner.lock().save(self.store.as_ref()) {
            log::warn!("Failed to persist learning state: {e:#}");
        }
        self.detector.release();
        log::info!("Session stopped");
    }

    /// Records a manual speed override against the most recent signals. The
    /// learner folds it into the next weight refit.
    pub fn record_manual_override(&self, chosen_delay_ms: u64) {
        let controller = self.controller.lock();
        let state = controller.state();
        let adjustment = UserAdjustment {
            timestamp_ms: now_ms(),
            chosen_delay_ms,
            image_complexity: state.last_complexity,
            text_density: state.avg_density(),
            manual: true,
        };
        let category = FrameSignals {
            bubble_count: state.last_bubble_count,
            coverage: state.last_coverage,
            text_density: state.avg_density(),
            complexity: state.last_complexity,
        }
        .category();
        drop(controller);
        self.learner
            .lock()
            .record(self.comic_category, category, adjustment);
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events_tx.try_send(event);
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Fixed-cadence capture/detect/extract loop. Each cycle runs to completion
/// (the blocking work is awaited) before the next tick fires, so detection
/// cycles never overlap and late frames are simply never queued.
async fn sensing_loop(
    detector: Arc<BubbleDetector>,
    controller: Arc<Mutex<AdaptiveController>>,
    learner: Arc<Mutex<SpeedLearner>>,
    frames: Arc<dyn FrameSource>,
    sensed: Arc<Mutex<Sensed>>,
    comic_category: ComicCategory,
    mut shutdown: watch::Receiver<bool>,
) {
    let interval = controller.lock().prefs().decision_interval_ms;
    let mut ticker = tokio::time::interval(Duration::from_millis(interval));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        let Some(frame) = frames.capture_frame() else {
            log::trace!("No frame available, skipping sensing cycle");
            continue;
        };

        let detector = detector.clone();
        let cycle = tokio::task::spawn_blocking(move || {
            let result = if detector.status().allows_detection() {
                let result = detector.detect(&frame);
                // A transient inference failure flips the status to Error;
                // treat that cycle as detection-less rather than trusting
                // the empty placeholder result. The next frame retries, and
                // a clean pass restores Ready.
                (detector.status() == ModelStatus::Ready).then_some(result)
            } else {
                None
            };
            let complexity = image_complexity(&frame);
            let panels = detect_panels(&frame);
            let (w, h) = image::GenericImageView::dimensions(&frame);
            (result, complexity, panels, w, h)
        })
        .await;

        let (result, complexity, panels, width, height) = match cycle {
            Ok(outputs) => outputs,
            Err(e) => {
                // Keep the previous known-good decision rather than crash.
                log::warn!("Sensing cycle failed, reusing last decision: {e}");
                continue;
            }
        };

        {
            let mut sensed = sensed.lock();
            sensed.panels = panels;
            sensed.frame_width = width;
            sensed.frame_height = height;
            sensed.sensed_at = Some(Instant::now());
        }

        let mut controller = controller.lock();
        match result {
            Some(result) => {
                let signals = FrameSignals::from_result(&result, complexity);
                controller.update(Some(&signals));
                let adjustment = UserAdjustment {
                    timestamp_ms: now_ms(),
                    chosen_delay_ms: controller.state().current_delay_ms,
                    image_complexity: complexity,
                    text_density: signals.text_density,
                    manual: false,
                };
                let category = signals.category();
                drop(controller);
                learner.lock().record(comic_category, category, adjustment);
            }
            _ => {
                controller.observe_complexity(complexity);
                controller.update(None);
            }
        }
    }
}

/// Emits one swipe per iteration, sleeping for the controller's currently
/// decided delay. Delay and distance are read once at the top of every
/// iteration; a changed decision applies on the next tick.
async fn scroll_loop(
    controller: Arc<Mutex<AdaptiveController>>,
    gestures: Arc<dyn GestureExecutor>,
    sensed: Arc<Mutex<Sensed>>,
    events: Sender<SessionEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let (delay, mut distance, direction) = {
            let c = controller.lock();
            (c.current_delay(), c.current_distance_px(), c.direction())
        };

        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tokio::time::sleep(delay) => {}
        }

        let damping = {
            let geometry = sensed.lock();
            match geometry.sensed_at {
                Some(at) if !geometry.panels.is_empty() => controller.lock().boundary_adjustment(
                    &geometry.panels,
                    geometry.frame_width,
                    geometry.frame_height,
                    at.elapsed(),
                    Instant::now(),
                ),
                _ => Damping::None,
            }
        };

        match damping {
            Damping::Pause(pause) => {
                let _ = events.try_send(SessionEvent::Paused(pause));
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = tokio::time::sleep(pause) => {}
                }
            }
            Damping::SlowDown(factor) => {
                distance = ((distance as f32 * factor) as i32).max(1);
            }
            Damping::None => {}
        }

        if let Err(e) = gestures.scroll(direction, distance, SWIPE_DURATION_MS) {
            log::warn!("Swipe failed, continuing: {e:#}");
            continue;
        }
        let _ = events.try_send(SessionEvent::Swipe {
            distance_px: distance,
            delay_ms: delay.as_millis() as u64,
        });
    }
}
