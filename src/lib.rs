//! Foosball Sim - table football match core for reinforcement learning
//!
//! Core modules:
//! - `sim`: Deterministic simulation (clock, scheduling, ball, rods, contacts)
//! - `agent`: Agent statistics, rewards and observation encoding
//! - `settings`: Data-driven tuning for the ball and the agents

pub mod agent;
pub mod settings;
pub mod sim;

pub use agent::{AgentStats, FootballAgent, MatchResult, RewardKind};
pub use settings::{AgentSettings, BallObsMode, BallSettings, Settings};
pub use sim::{BallEvent, MatchState, Side};

use glam::Vec3;

/// Table calibration constants (measured on the physical table)
pub mod consts {
    /// Fixed physics timestep (50 Hz, matching the rigid-body default)
    pub const SIM_DT: f32 = 1.0 / 50.0;

    /// Playing field dimensions (metres)
    pub const FIELD_WIDTH: f32 = 0.762;
    pub const FIELD_LENGTH: f32 = 1.4224;
    /// Ball centre height when resting on the field
    pub const BALL_MIN_Y: f32 = 0.065;
    /// Usable vertical range of the ball centre
    pub const BALL_Y_RANGE: f32 = 0.11;

    /// Rod actuation gains
    pub const ROD_MOVE_GAIN: f32 = 1.0;
    pub const ROD_TURN_GAIN: f32 = 25.0;
    /// Rigid-body angular velocity cap
    pub const ROD_MAX_ANGULAR_VELOCITY: f32 = 25.0;
    /// Measured maximum linear rod velocity
    pub const ROD_MAX_VELOCITY: f32 = 3.4;

    /// Rods per team (Keeper, Defense, Midfield, Attack)
    pub const RODS_PER_TEAM: usize = 4;
    /// Actions per team step: (move, turn) per rod
    pub const ACTION_LEN: usize = RODS_PER_TEAM * 2;
    /// Normalized features per rod: velocity, spin, position, angle
    pub const ROD_OBS_LEN: usize = 4;

    /// Decimal places used when splitting ball and rod observations
    pub const BALL_DECIMAL_PLACES: usize = 4;
    pub const ROD_DECIMAL_PLACES: usize = 3;
}

/// Soft sign squashing into (-1, 1)
#[inline]
pub fn sigmoid(value: f32) -> f32 {
    value / (1.0 + value.abs())
}

/// Componentwise [`sigmoid`]
#[inline]
pub fn sigmoid_vec3(v: Vec3) -> Vec3 {
    Vec3::new(sigmoid(v.x), sigmoid(v.y), sigmoid(v.z))
}

/// Sign that treats zero as positive
#[inline]
pub fn sign(value: f32) -> f32 {
    if value >= 0.0 { 1.0 } else { -1.0 }
}

/// Integer power by squaring
pub fn pow_int(mut value: f32, mut exp: u32) -> f32 {
    let mut result = 1.0;
    while exp > 0 {
        if exp % 2 == 1 {
            result *= value;
        }
        exp >>= 1;
        value *= value;
    }
    result
}

/// Split a value into `n` normalized decimal places.
///
/// `0.12345` with `n = 3` gives `[0.1, 0.2, 0.345]`: every place but the
/// last is floored, the last keeps the remainder, and each is scaled back
/// by `1/10` with the input's sign. Trained policies depend on this exact
/// arithmetic.
pub fn split_decimal_places(value: f32, n: usize) -> Vec<f32> {
    let sign = sign(value);
    let value = value.abs();
    (1..=n)
        .map(|i| {
            let d = value * pow_int(10.0, i as u32) % 10.0;
            let d = if i == n { d } else { d.floor() };
            d * sign / 10.0
        })
        .collect()
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    angle.rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: &[f32], b: &[f32]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    #[test]
    fn test_split_decimal_places() {
        let split = split_decimal_places(0.12345, 3);
        assert!(approx(&split, &[0.1, 0.2, 0.345]), "{:?}", split);
    }

    #[test]
    fn test_split_decimal_places_negative() {
        let split = split_decimal_places(-0.12345, 3);
        assert!(approx(&split, &[-0.1, -0.2, -0.345]), "{:?}", split);
    }

    #[test]
    fn test_split_decimal_places_zero_and_one() {
        assert!(approx(&split_decimal_places(0.0, 4), &[0.0; 4]));
        // 1.0 carries no fractional digits
        assert!(approx(&split_decimal_places(1.0, 2), &[0.0, 0.0]));
    }

    #[test]
    fn test_pow_int() {
        assert_eq!(pow_int(10.0, 0), 1.0);
        assert_eq!(pow_int(10.0, 3), 1000.0);
        assert_eq!(pow_int(2.0, 5), 32.0);
    }

    #[test]
    fn test_sigmoid_bounds() {
        assert_eq!(sigmoid(0.0), 0.0);
        assert!((sigmoid(1.0) - 0.5).abs() < 1e-6);
        assert!((sigmoid(-3.0) + 0.75).abs() < 1e-6);
        assert!(sigmoid(1e6) < 1.0);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(540.0), 180.0);
    }
}
