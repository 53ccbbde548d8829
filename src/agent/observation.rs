//! Observation vector encoding
//!
//! Layout per agent, mirrored by the team sign so both teams see the table
//! as if attacking toward +z:
//! - ball block (planar: 10 floats, full: 12)
//! - own rods: velocity, spin, split(position, 3), split(angle, 3) (4 × 8)
//! - opponent rods: velocity, spin, position, angle (4 × 4)

use crate::consts::*;
use crate::settings::BallObsMode;
use crate::sim::{Ball, PlayerPosition, Team};
use crate::split_decimal_places;

/// Append the ball block
pub fn push_ball_obs(obs: &mut Vec<f32>, ball: &Ball, mode: BallObsMode, sign: f32) {
    match mode {
        BallObsMode::Planar => {
            let v = ball.normalized_velocity_2d() * sign;
            obs.push(v.x);
            obs.push(v.y);
            let p = ball.normalized_position_2d() * sign;
            obs.extend(split_decimal_places(p.x, BALL_DECIMAL_PLACES));
            obs.extend(split_decimal_places(p.y, BALL_DECIMAL_PLACES));
        }
        BallObsMode::Full => {
            let v = ball.normalized_velocity_3d();
            obs.push(v.x * sign);
            obs.push(v.y);
            obs.push(v.z * sign);
            let p = ball.normalized_position_3d();
            obs.extend(split_decimal_places(p.x * sign, BALL_DECIMAL_PLACES));
            obs.push(p.y);
            obs.extend(split_decimal_places(p.z * sign, BALL_DECIMAL_PLACES));
        }
    }
}

/// Append one own rod with decimal-split position and angle
pub fn push_own_rod_obs(obs: &mut Vec<f32>, rod: &PlayerPosition) {
    obs.push(rod.normalized_velocity());
    obs.push(rod.normalized_angular_velocity());
    obs.extend(split_decimal_places(rod.normalized_position(), ROD_DECIMAL_PLACES));
    obs.extend(split_decimal_places(rod.normalized_angle(), ROD_DECIMAL_PLACES));
}

/// Full observation vector for the agent controlling `own`
pub fn encode(ball: &Ball, own: &Team, opponent: &Team, mode: BallObsMode) -> Vec<f32> {
    let mut obs = Vec::with_capacity(mode.ball_obs_len() + 48);
    push_ball_obs(&mut obs, ball, mode, own.sign());
    for rod in own.rods() {
        push_own_rod_obs(&mut obs, rod);
    }
    obs.extend(opponent.normalized_obs());
    obs
}
