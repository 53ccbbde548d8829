//! Player rods
//!
//! A rod slides along its axis and spins around it. The physics
//! collaborator integrates the motion; this side maps control inputs to
//! velocity changes and projects the resulting state into normalized
//! observations.

use serde::{Deserialize, Serialize};

use super::events::{BodyId, RodPosition};
use crate::consts::*;

/// Physical rod layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RodSpec {
    /// Joint travel limit either side of the default position (metres)
    pub limit: f32,
    /// Figure bodies mounted on the rod
    pub players: Vec<BodyId>,
}

/// One rod (Keeper, Defense, Midfield or Attack)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerPosition {
    pub role: RodPosition,
    /// Offset along the rod axis, team-local frame
    pub position: f32,
    /// Linear velocity along the rod axis, world frame
    pub velocity: f32,
    /// Angular velocity around the rod axis, world frame
    pub angular_velocity: f32,
    /// Signed rod angle in degrees, world frame (0 = figures upright)
    pub angle: f32,
    players: Vec<BodyId>,
    /// Team orientation: +1, or -1 for the team rotated by 180°
    sign: f32,
    limit: f32,
    default_position: f32,
    default_angle: f32,
}

impl PlayerPosition {
    pub fn new(role: RodPosition, sign: f32, spec: &RodSpec) -> Self {
        Self {
            role,
            position: 0.0,
            velocity: 0.0,
            angular_velocity: 0.0,
            angle: 0.0,
            players: spec.players.clone(),
            sign,
            limit: spec.limit,
            default_position: 0.0,
            default_angle: 0.0,
        }
    }

    pub fn players(&self) -> &[BodyId] {
        &self.players
    }

    pub fn sign(&self) -> f32 {
        self.sign
    }

    pub fn limit(&self) -> f32 {
        self.limit
    }

    /// Move and turn the rod.
    ///
    /// `mv` and `turn` are normalized (-1/+1) and applied in the rod's local
    /// frame as instantaneous velocity changes.
    pub fn step_update(&mut self, mv: f32, turn: f32) {
        let mv = mv.clamp(-1.0, 1.0);
        let turn = turn.clamp(-1.0, 1.0);

        self.velocity += mv * ROD_MOVE_GAIN * self.sign;
        self.angular_velocity = (self.angular_velocity + turn * ROD_TURN_GAIN * self.sign)
            .clamp(-ROD_MAX_ANGULAR_VELOCITY, ROD_MAX_ANGULAR_VELOCITY);
    }

    /// Back to the default pose, at rest
    pub fn reset(&mut self) {
        self.position = self.default_position;
        self.angle = self.default_angle;
        self.velocity = 0.0;
        self.angular_velocity = 0.0;
    }

    /// Normalized rod angle (-1/+1)
    pub fn normalized_angle(&self) -> f32 {
        self.angle * self.sign / 180.0
    }

    /// Normalized rod position (-1/+1). Already team-local, so unsigned.
    pub fn normalized_position(&self) -> f32 {
        self.position / self.limit
    }

    /// Normalized rod velocity (-1/+1)
    pub fn normalized_velocity(&self) -> f32 {
        self.velocity * self.sign / ROD_MAX_VELOCITY
    }

    /// Normalized angular rod velocity (-1/+1)
    pub fn normalized_angular_velocity(&self) -> f32 {
        self.angular_velocity * self.sign / ROD_MAX_ANGULAR_VELOCITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rod(sign: f32) -> PlayerPosition {
        let spec = RodSpec {
            limit: 0.1,
            players: vec![BodyId(1), BodyId(2)],
        };
        PlayerPosition::new(RodPosition::Defense, sign, &spec)
    }

    #[test]
    fn test_step_update_applies_gains() {
        let mut r = rod(1.0);
        r.step_update(0.5, 0.2);
        assert_eq!(r.velocity, 0.5 * ROD_MOVE_GAIN);
        assert_eq!(r.angular_velocity, 0.2 * ROD_TURN_GAIN);
    }

    #[test]
    fn test_mirrored_rod_reads_same_as_forward() {
        let mut a = rod(1.0);
        let mut b = rod(-1.0);
        a.step_update(0.7, -0.4);
        b.step_update(0.7, -0.4);
        // World-frame motion is opposite...
        assert_eq!(a.velocity, -b.velocity);
        // ...but each team observes its own input
        assert_eq!(a.normalized_velocity(), b.normalized_velocity());
        assert_eq!(a.normalized_angular_velocity(), b.normalized_angular_velocity());
        assert!((a.normalized_velocity() - 0.7 / ROD_MAX_VELOCITY).abs() < 1e-6);
    }

    #[test]
    fn test_spin_is_capped() {
        let mut r = rod(1.0);
        r.step_update(0.0, 1.0);
        r.step_update(0.0, 1.0);
        assert_eq!(r.angular_velocity, ROD_MAX_ANGULAR_VELOCITY);
        assert_eq!(r.normalized_angular_velocity(), 1.0);
    }

    #[test]
    fn test_inputs_are_bounded() {
        let mut r = rod(1.0);
        r.step_update(5.0, 0.0);
        assert_eq!(r.velocity, ROD_MOVE_GAIN);
    }

    #[test]
    fn test_normalized_position_and_angle() {
        let mut r = rod(-1.0);
        r.position = 0.05;
        r.angle = 90.0;
        assert!((r.normalized_position() - 0.5).abs() < 1e-6);
        assert!((r.normalized_angle() + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_reset() {
        let mut r = rod(1.0);
        r.step_update(1.0, 1.0);
        r.position = 0.08;
        r.angle = 45.0;
        r.reset();
        assert_eq!(r.position, 0.0);
        assert_eq!(r.angle, 0.0);
        assert_eq!(r.velocity, 0.0);
        assert_eq!(r.angular_velocity, 0.0);
    }
}
