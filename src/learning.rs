//! Speed-preference recalibration from observed adjustments.
//!
//! Not machine learning in the conventional sense: a plain linear-correlation
//! heuristic. Manual speed overrides are correlated (Pearson) against the
//! text-density and image-complexity signals seen at the time, and the two
//! fusion weights lean toward whichever signal tracks the user better.

use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::common::{ComicCategory, ContentCategory};
use crate::data::{AdjustmentRing, FusionWeights, SettingsStore, UserAdjustment};

/// Samples kept per (comic, content) partition; oldest evicted first.
pub const HISTORY_CAPACITY: usize = 100;
/// A comic category's baselines and weights are recomputed every N records.
const RECOMPUTE_EVERY: usize = 10;
/// Correlations are meaningless below this many manual samples.
const MIN_CORRELATION_SAMPLES: usize = 10;

const WEIGHTS_KEY: &str = "learning.fusion_weights";
const HISTORY_KEY: &str = "learning.adjustments";

#[derive(Debug, Serialize, Deserialize)]
struct StoredPartition {
    comic: ComicCategory,
    content: ContentCategory,
    ring: AdjustmentRing,
}

/// Records (signal, chosen-speed) samples and periodically refits the
/// per-category baselines and the fusion weights.
pub struct SpeedLearner {
    rings: HashMap<(ComicCategory, ContentCategory), AdjustmentRing>,
    recorded: HashMap<ComicCategory, usize>,
    baselines: HashMap<ComicCategory, HashMap<ContentCategory, f32>>,
    weights: FusionWeights,
}

impl Default for SpeedLearner {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeedLearner {
    pub fn new() -> Self {
        Self {
            rings: HashMap::new(),
            recorded: HashMap::new(),
            baselines: HashMap::new(),
            weights: FusionWeights::default(),
        }
    }

    pub fn weights(&self) -> FusionWeights {
        self.weights
    }

    /// Mean chosen delay per content category for one comic category, for
    /// the controller to consult as a secondary signal.
    pub fn baselines(&self, comic: ComicCategory) -> HashMap<ContentCategory, f32> {
        self.baselines.get(&comic).cloned().unwrap_or_default()
    }

    pub fn sample_count(&self, comic: ComicCategory, content: ContentCategory) -> usize {
        self.rings
            .get(&(comic, content))
            .map(AdjustmentRing::len)
            .unwrap_or(0)
    }

    /// Records one adjustment. Every `RECOMPUTE_EVERY`-th record for a comic
    /// category triggers a refit; returns true when that happened.
    pub fn record(
        &mut self,
        comic: ComicCategory,
        content: ContentCategory,
        adjustment: UserAdjustment,
    ) -> bool {
        self.rings
            .entry((comic, content))
            .or_insert_with(|| AdjustmentRing::new(HISTORY_CAPACITY))
            .push(adjustment);

        let counter = self.recorded.entry(comic).or_insert(0);
        *counter += 1;
        if *counter % RECOMPUTE_EVERY == 0 {
            self.recompute(comic);
            return true;
        }
        false
    }

    fn recompute(&mut self, comic: ComicCategory) {
        // Learned baselines: mean chosen delay per content category.
        let mut baselines = HashMap::new();
        for content in ContentCategory::all() {
            if let Some(ring) = self.rings.get(&(comic, content)) {
                if let Some(mean) = ring.mean_delay_ms() {
                    baselines.insert(content, mean);
                }
            }
        }
        self.baselines.insert(comic, baselines);

        // Fusion weights from manual samples only, pooled across content
        // categories of this comic category.
        let manual: Vec<&UserAdjustment> = self
            .rings
            .iter()
            .filter(|((c, _), _)| *c == comic)
            .flat_map(|(_, ring)| ring.manual())
            .collect();
        if manual.len() < MIN_CORRELATION_SAMPLES {
            log::debug!(
                "Only {} manual samples for {}, keeping weights",
                manual.len(),
                comic.as_str()
            );
            return;
        }

        let delays: Vec<f32> = manual.iter().map(|a| a.chosen_delay_ms as f32).collect();
        let text: Vec<f32> = manual.iter().map(|a| a.text_density).collect();
        let complexity: Vec<f32> = manual.iter().map(|a| a.image_complexity).collect();

        let r_text = pearson(&text, &delays).unwrap_or(0.0);
        let r_image = pearson(&complexity, &delays).unwrap_or(0.0);
        self.weights =
            FusionWeights::normalized(0.5 + 0.5 * r_text.abs(), 0.5 + 0.5 * r_image.abs());
        log::info!(
            "Refit weights for {}: text={:.3} image={:.3} (r_text={:.2}, r_image={:.2})",
            comic.as_str(),
            self.weights.text_weight,
            self.weights.image_weight,
            r_text,
            r_image
        );
    }

    /// Persists weights and per-partition history.
    pub fn save(&self, store: &dyn SettingsStore) -> Result<()> {
        store.set_raw(WEIGHTS_KEY, serde_json::to_value(self.weights)?)?;
        let partitions: Vec<StoredPartition> = self
            .rings
            .iter()
            .map(|((comic, content), ring)| StoredPartition {
                comic: *comic,
                content: *content,
                ring: ring.clone(),
            })
            .collect();
        store.set_raw(HISTORY_KEY, serde_json::to_value(partitions)?)?;
        Ok(())
    }

    /// Restores a learner from the store; missing or malformed entries just
    /// mean an empty history and default weights.
    pub fn load(store: &dyn SettingsStore) -> Self {
        let mut learner = Self::new();
        if let Some(weights) = store
            .get_raw(WEIGHTS_KEY)
            .and_then(|v| serde_json::from_value::<FusionWeights>(v).ok())
        {
            learner.weights = weights;
        }
        if let Some(partitions) = store
            .get_raw(HISTORY_KEY)
            .and_then(|v| serde_json::from_value::<Vec<StoredPartition>>(v).ok())
        {
            for p in partitions {
                let count = learner.recorded.entry(p.comic).or_insert(0);
                *count += p.ring.len();
                learner.rings.insert((p.comic, p.content), p.ring);
            }
        }
        learner
    }
}

/// Pearson correlation coefficient; `None` when either series has no
/// variance (the coefficient is undefined there).
fn pearson(xs: &[f32], ys: &[f32]) -> Option<f32> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let n_f = n as f32;
    let mean_x = xs[..n].iter().sum::<f32>() / n_f;
    let mean_y = ys[..n].iter().sum::<f32>() / n_f;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for i in 0..n {
        let dx = xs[i] - mean_x;
        let dy = ys[i] - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    let denom = (var_x * var_y).sqrt();
    if denom <= f32::EPSILON {
        return None;
    }
    Some(cov / denom)
}
