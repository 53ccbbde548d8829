//! Deterministic simulation module
//!
//! Match logic lives here. It stays deterministic:
//! - Simulation time only, passed in explicitly
//! - Seeded RNG only
//! - Stable listener and body ordering
//! - No rendering or platform dependencies

pub mod ball;
pub mod collision;
pub mod events;
pub mod layout;
pub mod rod;
pub mod schedule;
pub mod state;
pub mod team;
pub mod tick;
pub mod timer;

pub use ball::{Ball, BallState, BallTask};
pub use collision::{
    Collider, ColliderTag, Contact, ContactClassifier, reflect_velocity, wall_bounce_velocity,
};
pub use events::{
    BallEvent, BallEventKind, BallEventListener, BodyId, ContactState, EventBus, EventMask,
    RodPosition, Side, SubscriptionId,
};
pub use layout::{RodGeometry, TableLayout, TeamLayout, WallLayout};
pub use rod::{PlayerPosition, RodSpec};
pub use schedule::Scheduler;
pub use state::MatchState;
pub use team::{GoalRef, Team};
pub use tick::{KinematicTable, tick};
pub use timer::{SimClock, Timer};
