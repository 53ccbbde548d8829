//! Table geometry and body identity assignment
//!
//! The physics collaborator is handed the same body ids, so contact
//! notifications can be resolved through the classifier's lookup table.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::events::{BodyId, RodPosition, Side};
use super::rod::RodSpec;
use super::team::GoalRef;
use crate::consts::*;

/// Figure arrangement on one rod, team-local frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RodGeometry {
    pub role: RodPosition,
    /// Rod position along the table, own goal at -z
    pub z: f32,
    /// Distance between neighbouring figures
    pub spacing: f32,
    pub spec: RodSpec,
}

impl RodGeometry {
    /// Team-local x of each figure with the rod at its default position
    pub fn figure_offsets(&self) -> Vec<f32> {
        let n = self.spec.players.len();
        let mid = (n as f32 - 1.0) * 0.5;
        (0..n).map(|i| (i as f32 - mid) * self.spacing).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamLayout {
    pub side: Side,
    /// World yaw in degrees
    pub yaw: f32,
    pub goal: GoalRef,
    /// Keeper, Defense, Midfield, Attack
    pub rods: [RodGeometry; RODS_PER_TEAM],
}

impl TeamLayout {
    pub fn rod_specs(&self) -> [RodSpec; RODS_PER_TEAM] {
        self.rods.clone().map(|r| r.spec)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallLayout {
    pub body: BodyId,
    /// Wall centre, table frame
    pub position: Vec3,
}

/// Complete table: walls, goals, rods and figures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableLayout {
    pub walls: Vec<WallLayout>,
    pub teams: [TeamLayout; 2],
    /// Half width of the goal mouth
    pub goal_half_width: f32,
}

/// (figures, spacing, travel limit, team-local z) per rod role
const ROD_TABLE: [(usize, f32, f32, f32); RODS_PER_TEAM] = [
    (1, 0.0, 0.095, -0.525),
    (2, 0.238, 0.178, -0.375),
    (5, 0.118, 0.058, -0.075),
    (3, 0.208, 0.09, 0.225),
];

impl TableLayout {
    /// Regulation table: one side wall each along x, one end wall each
    /// along z, Red defending -z and Blue (rotated 180°) defending +z
    pub fn standard() -> Self {
        let mut next = 1u32;
        let mut alloc = || {
            let id = BodyId(next);
            next += 1;
            id
        };

        let half_w = FIELD_WIDTH * 0.5;
        let half_l = FIELD_LENGTH * 0.5;
        let walls = vec![
            WallLayout {
                body: alloc(),
                position: Vec3::new(half_w, 0.0, 0.0),
            },
            WallLayout {
                body: alloc(),
                position: Vec3::new(-half_w, 0.0, 0.0),
            },
            WallLayout {
                body: alloc(),
                position: Vec3::new(0.0, 0.0, half_l),
            },
            WallLayout {
                body: alloc(),
                position: Vec3::new(0.0, 0.0, -half_l),
            },
        ];

        let mut team = |side: Side| {
            let (yaw, goal_z) = match side {
                Side::Red => (0.0, -half_l),
                Side::Blue => (180.0, half_l),
            };
            let goal = GoalRef {
                body: alloc(),
                pos: Vec3::new(0.0, BALL_MIN_Y, goal_z),
            };
            let rods = RodPosition::ALL.map(|role| {
                let (figures, spacing, limit, z) = ROD_TABLE[role.index()];
                RodGeometry {
                    role,
                    z,
                    spacing,
                    spec: RodSpec {
                        limit,
                        players: (0..figures).map(|_| alloc()).collect(),
                    },
                }
            });
            TeamLayout {
                side,
                yaw,
                goal,
                rods,
            }
        };

        let teams = [team(Side::Red), team(Side::Blue)];
        Self {
            walls,
            teams,
            goal_half_width: 0.1,
        }
    }

    pub fn team(&self, side: Side) -> &TeamLayout {
        &self.teams[side.index()]
    }
}
