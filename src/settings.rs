//! Match settings
//!
//! Ball tuning and agent reward shaping, loadable from JSON.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// How the ball is presented to the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BallObsMode {
    /// Position & velocity on the XZ plane only
    Planar,
    /// Full 3D position & velocity
    #[default]
    Full,
}

impl BallObsMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BallObsMode::Planar => "Planar",
            BallObsMode::Full => "Full",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "planar" | "2d" => Some(BallObsMode::Planar),
            "full" | "3d" => Some(BallObsMode::Full),
            _ => None,
        }
    }

    /// Number of floats the ball block contributes to an observation
    pub fn ball_obs_len(&self) -> usize {
        use crate::consts::BALL_DECIMAL_PLACES;
        match self {
            // vx, vz, split(x), split(z)
            BallObsMode::Planar => 2 + 2 * BALL_DECIMAL_PLACES,
            // vx, vy, vz, split(x), y, split(z)
            BallObsMode::Full => 4 + 2 * BALL_DECIMAL_PLACES,
        }
    }
}

/// Ball controller tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BallSettings {
    /// Consecutive slow samples before an auto-kick
    pub idle_timeout: u32,
    /// Seconds between idle samples
    pub idle_sample_interval: f32,
    /// Speed below which a sample counts as idle
    pub velocity_threshold: f32,
    /// Auto-kick impulse magnitude
    pub kick_impulse: f32,
    pub ball_mass: f32,
    /// Balls further than this from centre are kicked back toward it
    pub center_radius: f32,
    /// Restitution applied on wall contact
    pub wall_bounce: f32,
    /// Delay between recentring and the first auto-kick (seconds)
    pub reset_kick_delay: f32,
    pub ball_diameter: f32,
    /// Half extents of the out-of-bounds watchdog box
    pub safety_half_extents: Vec3,
    /// Walls with |z| above this are end walls
    pub end_wall_z: f32,
}

impl Default for BallSettings {
    fn default() -> Self {
        Self {
            idle_timeout: 3,
            idle_sample_interval: 1.0,
            velocity_threshold: 0.1,
            kick_impulse: 0.25,
            ball_mass: 0.1,
            center_radius: 0.2,
            wall_bounce: 0.9,
            reset_kick_delay: 0.5,
            ball_diameter: 0.035,
            safety_half_extents: Vec3::new(0.4, 0.2, 0.75),
            end_wall_z: 0.5,
        }
    }
}

impl BallSettings {
    /// Clamp every value into a range the ball controller can run with.
    /// NaN falls to the lower bound.
    pub fn clamped(&self) -> Self {
        use crate::consts::{FIELD_WIDTH, SIM_DT};
        Self {
            idle_timeout: self.idle_timeout.max(1),
            // Sampling faster than the physics step is meaningless
            idle_sample_interval: self.idle_sample_interval.max(SIM_DT),
            velocity_threshold: self.velocity_threshold.max(0.0),
            kick_impulse: self.kick_impulse.max(0.0),
            ball_mass: self.ball_mass.max(MIN_BALL_MASS),
            center_radius: self.center_radius.max(0.0),
            wall_bounce: self.wall_bounce.max(0.0).min(1.0),
            reset_kick_delay: self.reset_kick_delay.max(0.0),
            ball_diameter: self.ball_diameter.max(0.0).min(FIELD_WIDTH * 0.5),
            safety_half_extents: self.safety_half_extents.abs(),
            end_wall_z: self.end_wall_z.max(0.0),
        }
    }
}

/// Lightest ball the impulse maths accepts (kg)
const MIN_BALL_MASS: f32 = 0.001;

/// Agent reward shaping & observation options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub ball_obs: BallObsMode,
    /// Reward for scoring a goal (0 - 1)
    pub goal_scored_reward: f32,
    /// Penalty for conceding a goal (0 - 1)
    pub goal_conceded_penalty: f32,
    /// Per step multiplier for rewarding shots (0 - 0.25), 0 -> disabled
    pub shot_reward_multiplier: f32,
    /// Maximum per step penalty for spinning rods (0 - 0.1), 0 -> disabled
    pub max_spin_penalty: f32,
    /// Emit the "<opponent>|<win|loss|play>" text observation
    pub match_state_channel: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            ball_obs: BallObsMode::Full,
            goal_scored_reward: 1.0,
            goal_conceded_penalty: 1.0,
            shot_reward_multiplier: 0.1,
            max_spin_penalty: 0.01,
            match_state_channel: false,
        }
    }
}

impl AgentSettings {
    /// Clamp every value into its documented range
    pub fn clamped(&self) -> Self {
        Self {
            goal_scored_reward: self.goal_scored_reward.clamp(0.0, 1.0),
            goal_conceded_penalty: self.goal_conceded_penalty.clamp(0.0, 1.0),
            shot_reward_multiplier: self.shot_reward_multiplier.clamp(0.0, 0.25),
            max_spin_penalty: self.max_spin_penalty.clamp(0.0, 0.1),
            ..self.clone()
        }
    }

    pub fn shot_reward_enabled(&self) -> bool {
        self.shot_reward_multiplier > 0.0
    }

    pub fn spin_penalty_enabled(&self) -> bool {
        self.max_spin_penalty > 0.0
    }

    /// Total observation length for this configuration
    pub fn observation_len(&self) -> usize {
        use crate::consts::{ROD_DECIMAL_PLACES, ROD_OBS_LEN, RODS_PER_TEAM};
        let own_rod = 2 + 2 * ROD_DECIMAL_PLACES;
        self.ball_obs.ball_obs_len() + RODS_PER_TEAM * own_rod + RODS_PER_TEAM * ROD_OBS_LEN
    }
}

/// Complete match settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// RNG seed for auto-kick directions
    pub seed: u64,
    pub ball: BallSettings,
    pub agent: AgentSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            ball: BallSettings::default(),
            agent: AgentSettings::default(),
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    return settings;
                }
                Err(err) => log::warn!("Invalid settings in {}: {}", path.display(), err),
            },
            Err(err) => log::info!("No settings at {} ({})", path.display(), err),
        }

        log::info!("Using default settings");
        Self::default()
    }
}
