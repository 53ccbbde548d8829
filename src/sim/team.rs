//! Teams of four rods

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::events::{BodyId, RodPosition, Side};
use super::rod::{PlayerPosition, RodSpec};
use crate::consts::*;
use crate::normalize_degrees;

/// Goal defended by a team
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalRef {
    /// Trigger volume body
    pub body: BodyId,
    /// World position of the goal mouth centre
    pub pos: Vec3,
}

/// A team: Keeper, Defense, Midfield and Attack rods plus its goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    side: Side,
    /// +1, or -1 for the team rotated by 180° about the vertical axis.
    /// Fixed at construction.
    sign: f32,
    rods: Vec<PlayerPosition>,
    goal: GoalRef,
}

impl Team {
    /// Build a team from its world yaw (degrees) and rod layout, given in
    /// Keeper, Defense, Midfield, Attack order.
    pub fn new(side: Side, yaw_degrees: f32, goal: GoalRef, rods: &[RodSpec; RODS_PER_TEAM]) -> Self {
        let sign = if normalize_degrees(yaw_degrees) < 90.0 {
            1.0
        } else {
            -1.0
        };
        let rods = RodPosition::ALL
            .iter()
            .zip(rods)
            .map(|(&role, spec)| PlayerPosition::new(role, sign, spec))
            .collect();

        Self {
            side,
            sign,
            rods,
            goal,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn sign(&self) -> f32 {
        self.sign
    }

    pub fn goal(&self) -> GoalRef {
        self.goal
    }

    pub fn rods(&self) -> &[PlayerPosition] {
        &self.rods
    }

    /// Rod state is written back here by the physics collaborator
    pub fn rods_mut(&mut self) -> &mut [PlayerPosition] {
        &mut self.rods
    }

    pub fn rod(&self, role: RodPosition) -> &PlayerPosition {
        &self.rods[role.index()]
    }

    pub fn rod_mut(&mut self, role: RodPosition) -> &mut PlayerPosition {
        &mut self.rods[role.index()]
    }

    pub fn reset(&mut self) {
        for rod in &mut self.rods {
            rod.reset();
        }
    }

    /// Apply one step of actions: (move, turn) per rod in Keeper, Defense,
    /// Midfield, Attack order. Values past the first eight are ignored.
    pub fn step_update(&mut self, actions: &[f32]) {
        assert!(
            actions.len() >= ACTION_LEN,
            "team step needs {} actions, got {}",
            ACTION_LEN,
            actions.len()
        );
        for (rod, pair) in self.rods.iter_mut().zip(actions.chunks_exact(2)) {
            rod.step_update(pair[0], pair[1]);
        }
    }

    /// Velocity, angular velocity, position and angle per rod, in the same
    /// rod order as [`Team::step_update`]
    pub fn normalized_obs(&self) -> Vec<f32> {
        let mut obs = Vec::with_capacity(RODS_PER_TEAM * ROD_OBS_LEN);
        for rod in &self.rods {
            obs.push(rod.normalized_velocity());
            obs.push(rod.normalized_angular_velocity());
            obs.push(rod.normalized_position());
            obs.push(rod.normalized_angle());
        }
        obs
    }

    /// Sum of absolute normalized rod spins
    pub fn spin_sum(&self) -> f32 {
        self.rods
            .iter()
            .map(|r| r.normalized_angular_velocity().abs())
            .sum()
    }
}
