//! Ball controller
//!
//! Owns the ball's kinematic state as last synced from the physics
//! collaborator, the idle → auto-kick state machine, the out-of-bounds
//! watchdog and the event bus every ball listener subscribes to.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collision::{Contact, ContactClassifier, wall_bounce_velocity};
use super::events::{
    BallEvent, BallEventListener, BodyId, ContactState, EventBus, EventMask, SubscriptionId,
};
use super::schedule::Scheduler;
use crate::consts::*;
use crate::settings::BallSettings;
use crate::{sigmoid, sigmoid_vec3};

/// Deferred ball tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallTask {
    /// Kick the ball into play
    AutoKick,
    /// Periodic idle sample
    CheckVelocity,
}

/// Ball motion status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallState {
    /// Centred and waiting for the scheduled kick
    AwaitingKick,
    /// In play, last idle sample was fast enough
    Moving,
    /// In play, `samples` consecutive slow samples so far
    Idle { samples: u32 },
}

/// The ball
pub struct Ball {
    /// Local position (table frame)
    pub pos: Vec3,
    pub vel: Vec3,
    pub angular_vel: Vec3,
    default_pos: Vec3,
    idle_count: u32,
    /// Reachable half extents of the ball centre
    half_width: f32,
    half_length: f32,
    kick_count: u32,
    settings: BallSettings,
    rng: Pcg32,
    schedule: Scheduler<BallTask>,
    classifier: ContactClassifier,
    events: EventBus,
}

impl std::fmt::Debug for Ball {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ball")
            .field("pos", &self.pos)
            .field("vel", &self.vel)
            .field("idle_count", &self.idle_count)
            .field("events", &self.events)
            .finish()
    }
}

impl Ball {
    /// Settings are clamped into their working ranges first
    pub fn new(settings: &BallSettings, default_pos: Vec3, seed: u64) -> Self {
        let settings = settings.clamped();
        let d = settings.ball_diameter;
        Self {
            pos: default_pos,
            vel: Vec3::ZERO,
            angular_vel: Vec3::ZERO,
            default_pos,
            idle_count: 0,
            half_width: (FIELD_WIDTH - d) * 0.5,
            half_length: (FIELD_LENGTH - d) * 0.5,
            kick_count: 0,
            classifier: ContactClassifier::new(settings.end_wall_z),
            settings,
            rng: Pcg32::seed_from_u64(seed),
            schedule: Scheduler::new(),
            events: EventBus::new(),
        }
    }

    pub fn settings(&self) -> &BallSettings {
        &self.settings
    }

    pub fn default_pos(&self) -> Vec3 {
        self.default_pos
    }

    pub fn classifier(&self) -> &ContactClassifier {
        &self.classifier
    }

    /// Identity table for colliders, filled once at match setup
    pub fn classifier_mut(&mut self) -> &mut ContactClassifier {
        &mut self.classifier
    }

    pub fn subscribe<L>(&mut self, listener: &Rc<RefCell<L>>, mask: EventMask) -> SubscriptionId
    where
        L: BallEventListener + 'static,
    {
        self.events.subscribe(listener, mask)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn idle_count(&self) -> u32 {
        self.idle_count
    }

    /// Auto-kicks performed since creation
    pub fn kick_count(&self) -> u32 {
        self.kick_count
    }

    pub fn is_scheduled(&self, task: BallTask) -> bool {
        self.schedule.is_scheduled(task)
    }

    pub fn state(&self) -> BallState {
        if self.schedule.is_scheduled(BallTask::AutoKick) {
            BallState::AwaitingKick
        } else if self.idle_count > 0 {
            BallState::Idle {
                samples: self.idle_count,
            }
        } else {
            BallState::Moving
        }
    }

    /// Episode reset: announce, then recentre
    pub fn reset(&mut self, now: f64) {
        self.emit(BallEvent::Reset, now);
        self.recentre(now);
    }

    /// Put the ball back on the centre spot at rest and schedule a kick
    pub fn recentre(&mut self, now: f64) {
        self.pos = self.default_pos;
        self.vel = Vec3::ZERO;
        self.angular_vel = Vec3::ZERO;

        self.schedule.cancel_all();
        self.schedule
            .schedule_once(BallTask::AutoKick, now + f64::from(self.settings.reset_kick_delay));
    }

    /// Apply an instantaneous impulse
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.vel += impulse / self.settings.ball_mass;
    }

    /// Run due tasks, then the out-of-bounds watchdog. Call once per tick.
    pub fn update(&mut self, now: f64) {
        while let Some(task) = self.schedule.pop_due(now) {
            match task {
                BallTask::AutoKick => self.auto_kick(now),
                BallTask::CheckVelocity => self.check_velocity(now),
            }
        }

        if !self.in_bounds() {
            log::warn!("Ball out of bounds {:?}", self.pos);
            self.recentre(now);
        }
    }

    pub fn in_bounds(&self) -> bool {
        let ext = self.settings.safety_half_extents;
        let p = self.pos.abs();
        p.x <= ext.x && p.y <= ext.y && p.z <= ext.z
    }

    fn auto_kick(&mut self, now: f64) {
        self.emit(BallEvent::AutoKick, now);

        let p = self.random_in_unit_disk();
        // Kick outward from centre
        let mut dir = Vec3::new(p.x, 0.0, p.y);

        let offset = self.pos - self.default_pos;
        let flat = Vec3::new(offset.x, 0.0, offset.z);
        if flat.length() > self.settings.center_radius {
            // Kick toward a random spot inside the centre radius
            let target = p * self.settings.center_radius;
            dir = Vec3::new(target.x, 0.0, target.y) - flat;
        }

        self.apply_impulse(dir.normalize_or_zero() * self.settings.kick_impulse);
        self.kick_count += 1;
        log::debug!("Auto-kick #{} from {:?}", self.kick_count, self.pos);

        self.idle_count = 0;
        self.schedule.cancel_all();
        let interval = f64::from(self.settings.idle_sample_interval);
        self.schedule
            .schedule_repeating(BallTask::CheckVelocity, now + interval, interval);
    }

    fn check_velocity(&mut self, now: f64) {
        if self.vel.length() < self.settings.velocity_threshold {
            self.idle_count += 1;
            if self.idle_count >= self.settings.idle_timeout {
                self.auto_kick(now);
            }
        } else {
            self.idle_count = 0;
        }
    }

    fn random_in_unit_disk(&mut self) -> Vec2 {
        loop {
            let p = Vec2::new(
                self.rng.random_range(-1.0f32..=1.0),
                self.rng.random_range(-1.0f32..=1.0),
            );
            if p.length_squared() <= 1.0 {
                return p;
            }
        }
    }

    fn emit(&mut self, event: BallEvent, now: f64) {
        self.events.dispatch(&event, now);
    }

    pub fn on_collision_enter(&mut self, contact: &Contact, now: f64) -> Option<BallEvent> {
        self.on_collision(contact, ContactState::Enter, now)
    }

    pub fn on_collision_exit(&mut self, contact: &Contact, now: f64) -> Option<BallEvent> {
        self.on_collision(contact, ContactState::Exit, now)
    }

    fn on_collision(
        &mut self,
        contact: &Contact,
        state: ContactState,
        now: f64,
    ) -> Option<BallEvent> {
        let event = self.classifier.classify_collision(contact, state)?;
        self.emit(event.clone(), now);

        if let BallEvent::TableContact {
            state: ContactState::Enter,
            normal,
            ..
        } = event
        {
            // Replaces the physics engine's own bounce
            self.vel =
                wall_bounce_velocity(contact.relative_velocity, normal, self.settings.wall_bounce);
        }
        Some(event)
    }

    /// Trigger volume entry; a goal recentres the ball
    pub fn on_trigger_enter(&mut self, body: BodyId, now: f64) -> Option<BallEvent> {
        let event = self.classifier.classify_trigger(body)?;
        if let BallEvent::Goal { defender, .. } = event {
            log::debug!("Goal against {}", defender.as_str());
        }
        self.emit(event.clone(), now);
        self.recentre(now);
        Some(event)
    }

    /// Position on the XZ plane, normalized to -1/+1
    pub fn normalized_position_2d(&self) -> Vec2 {
        Vec2::new(self.pos.x / self.half_width, self.pos.z / self.half_length)
    }

    /// Position in 3D, normalized to -1/+1
    pub fn normalized_position_3d(&self) -> Vec3 {
        Vec3::new(
            self.pos.x / self.half_width,
            ((self.pos.y - BALL_MIN_Y) / BALL_Y_RANGE) * 2.0 - 1.0,
            self.pos.z / self.half_length,
        )
    }

    /// Velocity on the XZ plane, squashed to -1/+1
    pub fn normalized_velocity_2d(&self) -> Vec2 {
        Vec2::new(sigmoid(self.vel.x), sigmoid(self.vel.z))
    }

    pub fn normalized_velocity_3d(&self) -> Vec3 {
        sigmoid_vec3(self.vel)
    }
}
