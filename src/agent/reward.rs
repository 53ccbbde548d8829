//! Shaped reward channels and their rolling averages

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Slots kept per reward channel
pub const REWARD_HISTORY_LEN: usize = 5;

/// Per-step shaped reward channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewardKind {
    ShotReward,
    SpinPenalty,
}

impl RewardKind {
    pub const ALL: [RewardKind; 2] = [RewardKind::ShotReward, RewardKind::SpinPenalty];

    pub fn index(self) -> usize {
        match self {
            RewardKind::ShotReward => 0,
            RewardKind::SpinPenalty => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RewardKind::ShotReward => "Shot Reward",
            RewardKind::SpinPenalty => "Spin Penalty",
        }
    }
}

/// Fixed-capacity FIFO of recent values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardHistory {
    values: VecDeque<f32>,
    capacity: usize,
}

impl Default for RewardHistory {
    fn default() -> Self {
        Self::with_capacity(REWARD_HISTORY_LEN)
    }
}

impl RewardHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "reward history needs at least one slot");
        Self {
            values: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Push a value, evicting the oldest when full
    pub fn push(&mut self, value: f32) {
        self.values.push_back(value);
        if self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    /// Arithmetic mean of the stored values, 0 when empty
    pub fn mean(&self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f32>() / self.values.len() as f32
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
