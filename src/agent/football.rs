//! The learning agent's side of the match
//!
//! One controller covers every configuration: planar or full ball
//! observations, optional shot reward, optional spin penalty and the
//! optional match-state text channel used for self-play.

use serde::{Deserialize, Serialize};

use super::observation;
use super::reward::RewardKind;
use super::stats::AgentStats;
use crate::settings::AgentSettings;
use crate::sim::{Ball, BallEvent, BallEventKind, BallEventListener, ContactState, EventMask, Team};

/// Match state reported on the text channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    Win,
    Loss,
    Play,
}

impl MatchResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchResult::Win => "win",
            MatchResult::Loss => "loss",
            MatchResult::Play => "play",
        }
    }
}

#[derive(Debug)]
pub struct FootballAgent {
    id: u32,
    stats: AgentStats,
    game_count: u32,
    team: Team,
    settings: AgentSettings,
    /// Reward accumulated since the last `take_reward`
    pending_reward: f32,
    match_result: MatchResult,
    opponent_id: Option<u32>,
}

impl FootballAgent {
    /// Ball events an agent listens to
    pub const EVENT_MASK: EventMask = EventMask::NONE
        .with(BallEventKind::AutoKick)
        .with(BallEventKind::PlayerContact)
        .with(BallEventKind::Goal);

    pub fn new(id: u32, team: Team, settings: &AgentSettings) -> Self {
        Self {
            id,
            stats: AgentStats::new(team.side().as_str()),
            game_count: 0,
            team,
            settings: settings.clamped(),
            pending_reward: 0.0,
            match_result: MatchResult::Play,
            opponent_id: None,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn stats(&self) -> &AgentStats {
        &self.stats
    }

    pub fn team(&self) -> &Team {
        &self.team
    }

    pub fn team_mut(&mut self) -> &mut Team {
        &mut self.team
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn game_count(&self) -> u32 {
        self.game_count
    }

    pub fn match_result(&self) -> MatchResult {
        self.match_result
    }

    /// Pair with the opponent agent for the match-state channel
    pub fn set_opponent_id(&mut self, id: u32) {
        self.opponent_id = Some(id);
    }

    /// Fraction of the episode done
    pub fn progress(step: u32, max_step: u32) -> f32 {
        if max_step == 0 {
            0.0
        } else {
            step as f32 / max_step as f32
        }
    }

    /// Start a new game
    pub fn agent_reset(&mut self) {
        self.game_count += 1;
        self.team.reset();
        self.stats.reset();
        self.match_result = MatchResult::Play;
    }

    /// Apply one decision step of rod actions
    pub fn agent_action(&mut self, actions: &[f32]) {
        self.team.step_update(actions);
    }

    pub fn add_reward(&mut self, reward: f32) {
        self.pending_reward += reward;
    }

    /// Reward accumulated since the previous call
    pub fn take_reward(&mut self) -> f32 {
        std::mem::take(&mut self.pending_reward)
    }

    /// Build this step's observation vector. Also books the shaped
    /// per-step rewards, so call it exactly once per decision step.
    pub fn collect_observations(&mut self, ball: &Ball, opponent: &Team) -> Vec<f32> {
        let obs = observation::encode(ball, &self.team, opponent, self.settings.ball_obs);

        if self.settings.shot_reward_enabled() {
            self.add_shot_reward(ball, opponent);
        }
        if self.settings.spin_penalty_enabled() {
            self.add_spin_penalty(self.team.spin_sum());
        }
        obs
    }

    /// "<opponent id>|<win|loss|play>" when the channel is enabled. Reading
    /// it reverts the reported state to play.
    pub fn text_observation(&mut self) -> Option<String> {
        if !self.settings.match_state_channel {
            return None;
        }
        let opponent = self.opponent_id?;
        let text = format!("{}|{}", opponent, self.match_result.as_str());
        self.match_result = MatchResult::Play;
        Some(text)
    }

    fn add_shot_reward(&mut self, ball: &Ball, opponent: &Team) {
        if self.stats.has_ball() {
            let delta = opponent.goal().pos - ball.pos;
            let reward = self.settings.shot_reward_multiplier * delta.normalize_or_zero().dot(ball.vel);
            self.stats.add_reward(RewardKind::ShotReward, reward);
            self.add_reward(reward);
        } else {
            self.stats.add_reward(RewardKind::ShotReward, 0.0);
        }
    }

    fn add_spin_penalty(&mut self, spin_sum: f32) {
        // 4 player rods
        let penalty = self.settings.max_spin_penalty * spin_sum * 0.25;
        self.stats.add_reward(RewardKind::SpinPenalty, -penalty);
        self.add_reward(-penalty);
    }

    fn on_goal(&mut self, now: f64, scored: bool) {
        self.stats.on_goal(now, scored);
        let reward = if scored {
            self.settings.goal_scored_reward
        } else {
            -self.settings.goal_conceded_penalty
        };
        self.add_reward(reward);
        self.match_result = if scored {
            MatchResult::Win
        } else {
            MatchResult::Loss
        };
    }
}

impl BallEventListener for FootballAgent {
    fn on_ball_event(&mut self, event: &BallEvent, now: f64) {
        match *event {
            BallEvent::AutoKick => self.stats.on_auto_kick(now),
            BallEvent::PlayerContact {
                state: ContactState::Exit,
                team,
                ..
            } => {
                let own = team == self.team.side();
                self.stats.on_player_contact(now, own);
            }
            BallEvent::Goal { defender, .. } => {
                let scored = defender != self.team.side();
                self.on_goal(now, scored);
            }
            _ => {}
        }
    }
}
