//! Per-agent match statistics
//!
//! Ball possession starts when one of the agent's figures releases the
//! ball and ends when an opponent touches it, a goal is scored, or the
//! ball stalls and gets auto-kicked.

use serde::{Deserialize, Serialize};

use super::reward::{RewardHistory, RewardKind};
use crate::sim::Timer;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStats {
    name: String,
    /// Goals scored in the current game
    goals_scored: u32,
    /// Lifetime goals scored by this agent
    total_goals_scored: u32,
    /// Lifetime goals on either side
    total_goals_count: u32,
    game_timer: Timer,
    ball_timer: Timer,
    rewards: [RewardHistory; 2],
}

impl AgentStats {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            goals_scored: 0,
            total_goals_scored: 0,
            total_goals_count: 0,
            game_timer: Timer::new(),
            ball_timer: Timer::new(),
            rewards: Default::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn goals_scored(&self) -> u32 {
        self.goals_scored
    }

    pub fn total_goals_scored(&self) -> u32 {
        self.total_goals_scored
    }

    pub fn total_goals_count(&self) -> u32 {
        self.total_goals_count
    }

    /// True while this agent's team holds the ball
    pub fn has_ball(&self) -> bool {
        self.ball_timer.is_running()
    }

    pub fn game_running(&self) -> bool {
        self.game_timer.is_running()
    }

    /// Average of the last few values on a reward channel
    pub fn reward(&self, kind: RewardKind) -> f32 {
        self.rewards[kind.index()].mean()
    }

    pub fn add_reward(&mut self, kind: RewardKind, value: f32) {
        self.rewards[kind.index()].push(value);
    }

    /// Ball possession ratio (0 - 1) for the current game
    pub fn ball_possession(&self, now: f64) -> f32 {
        (self.ball_timer.elapsed_total(now) / self.game_timer.elapsed_total(now).max(1.0)) as f32
    }

    /// Lifetime score rate (0 - 1)
    pub fn overall_score_rate(&self) -> f32 {
        self.total_goals_scored as f32 / (self.total_goals_count as f32).max(1.0)
    }

    /// New game: clears per-game counters, timers and reward histories,
    /// keeps lifetime totals
    pub fn reset(&mut self) {
        self.goals_scored = 0;
        self.game_timer.reset();
        self.ball_timer.reset();
        for history in &mut self.rewards {
            history.clear();
        }
    }

    pub fn on_goal(&mut self, now: f64, scored: bool) {
        self.game_timer.stop_interval(now);
        if self.has_ball() {
            self.ball_timer.stop_interval(now);
        }

        if scored {
            self.goals_scored += 1;
            self.total_goals_scored += 1;
        }
        self.total_goals_count += 1;
    }

    pub fn on_player_contact(&mut self, now: f64, own_team: bool) {
        if !self.game_timer.is_running() {
            self.game_timer.start_interval(now);
        }
        if self.has_ball() {
            self.ball_timer.stop_interval(now);
        }
        if own_team {
            self.ball_timer.start_interval(now);
        }
    }

    /// A stalled ball is a neutral break: the game segment and any
    /// possession end here
    pub fn on_auto_kick(&mut self, now: f64) {
        self.game_timer.stop_interval(now);
        if self.has_ball() {
            self.ball_timer.stop_interval(now);
        }
    }
}
