use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// One observed speed choice: either the controller's automatic decision or
/// a manual user override, together with the signals seen at that moment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserAdjustment {
    pub timestamp_ms: u64,
    /// The scroll delay the user (or controller) settled on, in ms.
    pub chosen_delay_ms: u64,
    pub image_complexity: f32,
    pub text_density: f32,
    /// Manual overrides carry real preference information; automatic samples
    /// only feed the baselines, never the correlations.
    pub manual: bool,
}

/// Fixed-capacity FIFO of adjustments. Once full, recording a new sample
/// evicts the oldest one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentRing {
    capacity: usize,
    samples: VecDeque<UserAdjustment>,
}

impl AdjustmentRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            samples: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn push(&mut self, sample: UserAdjustment) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserAdjustment> {
        self.samples.iter()
    }

    pub fn manual(&self) -> impl Iterator<Item = &UserAdjustment> {
        self.samples.iter().filter(|s| s.manual)
    }

    pub fn mean_delay_ms(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: u64 = self.samples.iter().map(|s| s.chosen_delay_ms).sum();
        Some(sum as f32 / self.samples.len() as f32)
    }
}

impl Default for AdjustmentRing {
    fn default() -> Self {
        Self::new(crate::learning::HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: u64, delay: u64) -> UserAdjustment {
        UserAdjustment {
            timestamp_ms: ts,
            chosen_delay_ms: delay,
            image_complexity: 0.4,
            text_density: 0.3,
            manual: false,
        }
    }

    #[test]
    fn ring_evicts_oldest_when_full() {
        let mut ring = AdjustmentRing::new(3);
        for i in 0..5 {
            ring.push(sample(i, 1000 + i));
        }
        assert_eq!(ring.len(), 3);
        let timestamps: Vec<u64> = ring.iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(timestamps, vec![2, 3, 4]);
    }

    #[test]
    fn mean_delay_over_recorded_samples() {
        let mut ring = AdjustmentRing::new(10);
        ring.push(sample(0, 1000));
        ring.push(sample(1, 2000));
        assert_eq!(ring.mean_delay_ms(), Some(1500.0));
        assert_eq!(AdjustmentRing::new(10).mean_delay_ms(), None);
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut ring = AdjustmentRing::new(0);
        ring.push(sample(0, 1000));
        ring.push(sample(1, 1200));
        assert_eq!(ring.len(), 1);
    }
}
