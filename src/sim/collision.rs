//! Contact classification and wall response
//!
//! Raw physics notifications only carry a body id. The classifier owns an
//! identity table built once at match setup, mapping each body to what it
//! is on the table (player figure, wall, goal), and turns notifications
//! into [`BallEvent`]s without walking any scene hierarchy.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::events::{BallEvent, BodyId, ContactState, RodPosition, Side};
use crate::sign;

/// Raw collision notification from the physics collaborator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// The other body
    pub body: BodyId,
    /// Velocity of the other body relative to the ball
    pub relative_velocity: Vec3,
}

impl Contact {
    pub fn new(body: BodyId, relative_velocity: Vec3) -> Self {
        Self {
            body,
            relative_velocity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColliderTag {
    Player,
    Table,
    Goal,
}

/// What a registered body is
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Collider {
    /// A figure on a rod
    Player { rod: RodPosition, team: Side },
    /// A side or end wall at its local position
    Wall { position: Vec3 },
    /// Goal trigger volume, defended by `defender`
    Goal { defender: Side },
}

impl Collider {
    pub fn tag(&self) -> ColliderTag {
        match self {
            Collider::Player { .. } => ColliderTag::Player,
            Collider::Wall { .. } => ColliderTag::Table,
            Collider::Goal { .. } => ColliderTag::Goal,
        }
    }
}

/// Body id → collider lookup plus wall geometry rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactClassifier {
    colliders: HashMap<BodyId, Collider>,
    /// Walls with |z| above this are end walls
    end_wall_z: f32,
}

impl ContactClassifier {
    pub fn new(end_wall_z: f32) -> Self {
        Self {
            colliders: HashMap::new(),
            end_wall_z,
        }
    }

    pub fn register(&mut self, body: BodyId, collider: Collider) {
        if let Some(prev) = self.colliders.insert(body, collider) {
            log::warn!("Body {:?} re-registered ({:?} -> {:?})", body, prev, collider);
        }
    }

    pub fn register_player(&mut self, body: BodyId, rod: RodPosition, team: Side) {
        self.register(body, Collider::Player { rod, team });
    }

    pub fn register_wall(&mut self, body: BodyId, position: Vec3) {
        self.register(body, Collider::Wall { position });
    }

    pub fn register_goal(&mut self, body: BodyId, defender: Side) {
        self.register(body, Collider::Goal { defender });
    }

    pub fn lookup(&self, body: BodyId) -> Option<&Collider> {
        self.colliders.get(&body)
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Classify a solid contact. Goals are triggers and never classify here.
    pub fn classify_collision(&self, contact: &Contact, state: ContactState) -> Option<BallEvent> {
        let Some(collider) = self.lookup(contact.body) else {
            log::warn!("Contact with unregistered body {:?}", contact.body);
            return None;
        };

        match *collider {
            Collider::Player { rod, team } => Some(BallEvent::PlayerContact {
                state,
                player: contact.body,
                rod,
                team,
            }),
            Collider::Wall { position } => Some(BallEvent::TableContact {
                state,
                wall: contact.body,
                normal: self.wall_normal(position),
            }),
            Collider::Goal { .. } => None,
        }
    }

    /// Classify a trigger-volume entry
    pub fn classify_trigger(&self, body: BodyId) -> Option<BallEvent> {
        match self.lookup(body) {
            Some(&Collider::Goal { defender }) => Some(BallEvent::Goal {
                goal: body,
                defender,
            }),
            Some(_) => None,
            None => {
                log::warn!("Trigger with unregistered body {:?}", body);
                None
            }
        }
    }

    /// Normal of a wall at `position`, pointing into the field
    pub fn wall_normal(&self, position: Vec3) -> Vec3 {
        if position.z.abs() > self.end_wall_z {
            Vec3::new(0.0, 0.0, -sign(position.z))
        } else {
            Vec3::new(-sign(position.x), 0.0, 0.0)
        }
    }
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec3, normal: Vec3) -> Vec3 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Ball velocity after bouncing off a wall.
///
/// The incoming velocity is the negated relative velocity of the contact;
/// the result replaces whatever bounce the physics engine computed.
pub fn wall_bounce_velocity(relative_velocity: Vec3, normal: Vec3, bounce: f32) -> Vec3 {
    reflect_velocity(-relative_velocity, normal) * bounce
}
