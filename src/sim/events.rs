//! Ball events and the listener registry
//!
//! Events are dispatched synchronously: every listener has seen an event
//! before the emitting call returns. Listeners are held weakly, so a
//! dropped listener is skipped and pruned instead of dangling.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Table side a team plays on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Red,
    Blue,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Red, Side::Blue];

    pub fn opponent(self) -> Side {
        match self {
            Side::Red => Side::Blue,
            Side::Blue => Side::Red,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::Red => 0,
            Side::Blue => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Red => "red",
            Side::Blue => "blue",
        }
    }
}

/// Rod role, in fixed action/observation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RodPosition {
    Keeper,
    Defense,
    Midfield,
    Attack,
}

impl RodPosition {
    pub const ALL: [RodPosition; 4] = [
        RodPosition::Keeper,
        RodPosition::Defense,
        RodPosition::Midfield,
        RodPosition::Attack,
    ];

    pub fn index(self) -> usize {
        match self {
            RodPosition::Keeper => 0,
            RodPosition::Defense => 1,
            RodPosition::Midfield => 2,
            RodPosition::Attack => 3,
        }
    }
}

/// Physics body identifier handed out by the physics collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactState {
    Enter,
    Exit,
}

/// Semantic ball event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BallEvent {
    /// Episode reset recentred the ball
    Reset,
    /// A stalled (or freshly centred) ball is kicked back into play
    AutoKick,
    /// Ball entered the goal defended by `defender`
    Goal { goal: BodyId, defender: Side },
    PlayerContact {
        state: ContactState,
        player: BodyId,
        rod: RodPosition,
        team: Side,
    },
    /// Wall contact; `normal` points from the wall into the field
    TableContact {
        state: ContactState,
        wall: BodyId,
        normal: Vec3,
    },
}

/// Discriminant of [`BallEvent`], used for subscription masks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BallEventKind {
    Reset,
    AutoKick,
    Goal,
    PlayerContact,
    TableContact,
}

impl BallEvent {
    pub fn kind(&self) -> BallEventKind {
        match self {
            BallEvent::Reset => BallEventKind::Reset,
            BallEvent::AutoKick => BallEventKind::AutoKick,
            BallEvent::Goal { .. } => BallEventKind::Goal,
            BallEvent::PlayerContact { .. } => BallEventKind::PlayerContact,
            BallEvent::TableContact { .. } => BallEventKind::TableContact,
        }
    }
}

/// Set of event kinds a listener wants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMask(u8);

impl EventMask {
    pub const NONE: EventMask = EventMask(0);
    pub const ALL: EventMask = EventMask(0b1_1111);

    const fn bit(kind: BallEventKind) -> u8 {
        match kind {
            BallEventKind::Reset => 1,
            BallEventKind::AutoKick => 1 << 1,
            BallEventKind::Goal => 1 << 2,
            BallEventKind::PlayerContact => 1 << 3,
            BallEventKind::TableContact => 1 << 4,
        }
    }

    pub const fn with(self, kind: BallEventKind) -> EventMask {
        EventMask(self.0 | Self::bit(kind))
    }

    pub fn of(kinds: &[BallEventKind]) -> EventMask {
        kinds.iter().fold(Self::NONE, |mask, &k| mask.with(k))
    }

    pub fn contains(self, kind: BallEventKind) -> bool {
        self.0 & Self::bit(kind) != 0
    }
}

/// Receiver of ball events. `now` is the simulation time of the event.
pub trait BallEventListener {
    fn on_ball_event(&mut self, event: &BallEvent, now: f64);
}

/// Handle returned by [`EventBus::subscribe`]. Ids are never reused, so a
/// stale handle can not remove a later subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    mask: EventMask,
    listener: Weak<RefCell<dyn BallEventListener>>,
}

/// Ordered listener registry owned by an event emitter
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for the kinds in `mask`. The bus keeps a weak
    /// reference; the caller keeps ownership.
    pub fn subscribe<L>(&mut self, listener: &Rc<RefCell<L>>, mask: EventMask) -> SubscriptionId
    where
        L: BallEventListener + 'static,
    {
        let shared: Rc<RefCell<dyn BallEventListener>> = listener.clone();
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            mask,
            listener: Rc::downgrade(&shared),
        });
        log::debug!("Subscribed listener {:?}", id);
        id
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        let removed = self.subscribers.len() != before;
        if removed {
            log::debug!("Unsubscribed listener {:?}", id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver `event` to every interested listener in registration order.
    ///
    /// A listener that is already borrowed (re-entrant dispatch) is skipped
    /// with a warning. Dropped listeners are pruned whatever their mask.
    /// Neither stops delivery to the rest.
    pub fn dispatch(&mut self, event: &BallEvent, now: f64) {
        let kind = event.kind();
        let mut dead = false;

        for sub in &self.subscribers {
            let Some(listener) = sub.listener.upgrade() else {
                dead = true;
                continue;
            };
            if !sub.mask.contains(kind) {
                continue;
            }
            match listener.try_borrow_mut() {
                Ok(mut l) => l.on_ball_event(event, now),
                Err(_) => log::warn!("Listener {:?} busy, skipped {:?}", sub.id, kind),
            }
        }

        if dead {
            self.subscribers.retain(|s| s.listener.strong_count() > 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<BallEventKind>,
    }

    impl BallEventListener for Recorder {
        fn on_ball_event(&mut self, event: &BallEvent, _now: f64) {
            self.seen.push(event.kind());
        }
    }

    #[test]
    fn test_mask_filters_kinds() {
        let mut bus = EventBus::new();
        let rec = Rc::new(RefCell::new(Recorder::default()));
        bus.subscribe(&rec, EventMask::NONE.with(BallEventKind::Goal));

        bus.dispatch(&BallEvent::AutoKick, 0.0);
        bus.dispatch(
            &BallEvent::Goal {
                goal: BodyId(1),
                defender: Side::Red,
            },
            0.0,
        );
        assert_eq!(rec.borrow().seen, vec![BallEventKind::Goal]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut bus = EventBus::new();
        let rec = Rc::new(RefCell::new(Recorder::default()));
        let id = bus.subscribe(&rec, EventMask::ALL);
        bus.dispatch(&BallEvent::Reset, 0.0);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.dispatch(&BallEvent::Reset, 0.0);
        assert_eq!(rec.borrow().seen.len(), 1);
    }

    #[test]
    fn test_dropped_listener_is_pruned() {
        let mut bus = EventBus::new();
        let keep = Rc::new(RefCell::new(Recorder::default()));
        {
            let gone = Rc::new(RefCell::new(Recorder::default()));
            bus.subscribe(&gone, EventMask::ALL);
        }
        bus.subscribe(&keep, EventMask::ALL);
        assert_eq!(bus.len(), 2);

        bus.dispatch(&BallEvent::AutoKick, 0.0);
        assert_eq!(bus.len(), 1);
        assert_eq!(keep.borrow().seen, vec![BallEventKind::AutoKick]);
    }

    #[test]
    fn test_dropped_listener_pruned_on_unrelated_event() {
        let mut bus = EventBus::new();
        {
            let gone = Rc::new(RefCell::new(Recorder::default()));
            bus.subscribe(&gone, EventMask::NONE.with(BallEventKind::Reset));
        }
        assert_eq!(bus.len(), 1);
        bus.dispatch(&BallEvent::AutoKick, 0.0);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_busy_listener_does_not_block_others() {
        let mut bus = EventBus::new();
        let busy = Rc::new(RefCell::new(Recorder::default()));
        let other = Rc::new(RefCell::new(Recorder::default()));
        bus.subscribe(&busy, EventMask::ALL);
        bus.subscribe(&other, EventMask::ALL);

        let _guard = busy.borrow_mut();
        bus.dispatch(&BallEvent::Reset, 0.0);
        assert_eq!(other.borrow().seen, vec![BallEventKind::Reset]);
    }

    #[test]
    fn test_side_opponent() {
        assert_eq!(Side::Red.opponent(), Side::Blue);
        assert_eq!(Side::Blue.opponent().index(), 0);
    }
}
