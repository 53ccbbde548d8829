//! Fixed timestep table tick
//!
//! A small kinematic stand-in for the rigid-body engine the match core
//! normally sits behind. It integrates the ball and the rods, detects wall,
//! figure and goal contacts, and reports them through the same entry points
//! the real physics callbacks use. Good enough for headless runs and tests,
//! not a model of real ball dynamics.

use std::collections::BTreeSet;

use glam::Vec3;

use super::collision::{Contact, reflect_velocity};
use super::events::{BodyId, Side};
use super::state::MatchState;
use crate::consts::*;
use crate::normalize_degrees;

/// Rolling friction, fraction of ball speed lost per second
const BALL_DAMPING: f32 = 0.3;
/// Rod drag per second
const ROD_DAMPING: f32 = 2.0;
const ROD_ANGULAR_DAMPING: f32 = 1.0;
/// Figure foot radius on the playing plane
const FIGURE_RADIUS: f32 = 0.03;
/// Foot distance from the rod axis
const FIGURE_LEVER: f32 = 0.08;
const FIGURE_RESTITUTION: f32 = 0.8;
/// Figures tilted further than this pass over the ball
const FIGURE_BLOCK_ANGLE: f32 = 45.0;
/// Separation, as a multiple of contact distance, that ends a figure contact
const FIGURE_RELEASE: f32 = 1.2;
/// Separation that ends a wall contact
const WALL_SKIN: f32 = 0.002;

/// Figure snapshot in the table frame
#[derive(Debug, Clone, Copy)]
struct Figure {
    body: BodyId,
    pos: Vec3,
    vel: Vec3,
    upright: bool,
}

/// Headless table physics
#[derive(Debug, Clone, Default)]
pub struct KinematicTable {
    touching_walls: BTreeSet<BodyId>,
    touching_figures: BTreeSet<BodyId>,
}

impl KinematicTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while the ball rests against `body`
    pub fn is_touching(&self, body: BodyId) -> bool {
        self.touching_walls.contains(&body) || self.touching_figures.contains(&body)
    }
}

/// Advance the match by one fixed timestep.
///
/// Runs the match clock and the ball's scheduled tasks first, then moves
/// everything and reports contacts at the new time.
pub fn tick(state: &mut MatchState, table: &mut KinematicTable, dt: f32) {
    state.tick(dt);

    integrate_rods(state, dt);
    integrate_ball(state, dt);

    if check_goal(state, table) {
        return;
    }
    resolve_walls(state, table);
    resolve_figures(state, table);
}

fn integrate_rods(state: &MatchState, dt: f32) {
    let linear_decay = (1.0 - ROD_DAMPING * dt).max(0.0);
    let angular_decay = (1.0 - ROD_ANGULAR_DAMPING * dt).max(0.0);

    for side in Side::BOTH {
        let mut agent = state.agent_mut(side);
        for rod in agent.team_mut().rods_mut() {
            // Position is team-local, velocity is not
            rod.position += rod.velocity * rod.sign() * dt;
            let limit = rod.limit();
            if rod.position.abs() >= limit {
                rod.position = rod.position.clamp(-limit, limit);
                rod.velocity = 0.0;
            }
            rod.angle = normalize_degrees(rod.angle + rod.angular_velocity.to_degrees() * dt + 180.0)
                - 180.0;

            rod.velocity *= linear_decay;
            rod.angular_velocity *= angular_decay;
        }
    }
}

fn integrate_ball(state: &mut MatchState, dt: f32) {
    let ball = state.ball_mut();
    ball.pos += ball.vel * dt;
    ball.vel *= (1.0 - BALL_DAMPING * dt).max(0.0);

    if ball.pos.y < BALL_MIN_Y {
        ball.pos.y = BALL_MIN_Y;
        ball.vel.y = ball.vel.y.max(0.0);
    }
}

/// Ball centre past the end line inside the goal mouth
fn check_goal(state: &mut MatchState, table: &mut KinematicTable) -> bool {
    let pos = state.ball().pos;
    let half_l = FIELD_LENGTH * 0.5;
    if pos.z.abs() <= half_l || pos.x.abs() >= state.layout().goal_half_width {
        return false;
    }

    let defender = if pos.z < 0.0 { Side::Red } else { Side::Blue };
    let goal = state.layout().team(defender).goal.body;
    state.on_trigger_enter(goal);

    // The ball was teleported; contacts end on the next overlap test
    table.touching_walls.clear();
    release_figures(state, table);
    true
}

fn release_figures(state: &mut MatchState, table: &mut KinematicTable) {
    let vel = state.ball().vel;
    for body in std::mem::take(&mut table.touching_figures) {
        state.on_collision_exit(&Contact::new(body, -vel));
    }
}

fn resolve_walls(state: &mut MatchState, table: &mut KinematicTable) {
    let radius = state.ball().settings().ball_diameter * 0.5;
    let goal_half_width = state.layout().goal_half_width;
    let walls: Vec<_> = state
        .layout()
        .walls
        .iter()
        .map(|w| (w.body, w.position, state.ball().classifier().wall_normal(w.position)))
        .collect();

    for (body, position, normal) in walls {
        let ball = state.ball();
        let is_end_wall = normal.z != 0.0;
        let open = is_end_wall && ball.pos.x.abs() < goal_half_width;
        let gap = (ball.pos - position).dot(normal) - radius;

        if gap <= 0.0 && !open {
            if table.touching_walls.insert(body) {
                let contact = Contact::new(body, -ball.vel);
                state.on_collision_enter(&contact);
            }
            // Push back onto the field
            state.ball_mut().pos -= normal * gap;
        } else if gap > WALL_SKIN && table.touching_walls.remove(&body) {
            let contact = Contact::new(body, -ball.vel);
            state.on_collision_exit(&contact);
        }
    }
}

fn figures(state: &MatchState) -> Vec<Figure> {
    let mut out = Vec::new();
    for side in Side::BOTH {
        let agent = state.agent(side);
        let team = agent.team();
        let sign = team.sign();
        let layout = state.layout().team(side);

        for (rod, geometry) in team.rods().iter().zip(&layout.rods) {
            let upright = rod.angle.abs() < FIGURE_BLOCK_ANGLE;
            let vel = Vec3::new(rod.velocity, 0.0, rod.angular_velocity * FIGURE_LEVER);
            for (&body, offset) in rod.players().iter().zip(geometry.figure_offsets()) {
                let pos = Vec3::new(
                    (offset + rod.position) * sign,
                    BALL_MIN_Y,
                    geometry.z * sign,
                );
                out.push(Figure {
                    body,
                    pos,
                    vel,
                    upright,
                });
            }
        }
    }
    out
}

fn resolve_figures(state: &mut MatchState, table: &mut KinematicTable) {
    let reach = FIGURE_RADIUS + state.ball().settings().ball_diameter * 0.5;

    for figure in figures(state) {
        let ball = state.ball();
        let mut offset = ball.pos - figure.pos;
        offset.y = 0.0;
        let dist = offset.length();

        if figure.upright && dist < reach {
            let normal = if dist > f32::EPSILON {
                offset / dist
            } else {
                Vec3::Z
            };
            let relative = ball.vel - figure.vel;
            let contact = Contact::new(figure.body, figure.vel - ball.vel);
            let entering = table.touching_figures.insert(figure.body);

            let ball = state.ball_mut();
            if relative.dot(normal) < 0.0 {
                ball.vel = reflect_velocity(relative, normal) * FIGURE_RESTITUTION + figure.vel;
            }
            ball.pos += normal * (reach - dist);

            if entering {
                state.on_collision_enter(&contact);
            }
        } else if (!figure.upright || dist > reach * FIGURE_RELEASE)
            && table.touching_figures.remove(&figure.body)
        {
            let contact = Contact::new(figure.body, figure.vel - ball.vel);
            state.on_collision_exit(&contact);
        }
    }
}
