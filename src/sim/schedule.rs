//! Cancelable deferred tasks keyed by purpose
//!
//! At most one pending entry exists per task kind: scheduling a kind that
//! is already pending replaces it, so two auto-kicks can never overlap.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Scheduled<K> {
    kind: K,
    at: f64,
    /// Re-arm interval for repeating tasks
    every: Option<f64>,
}

/// Per-owner task schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scheduler<K> {
    pending: Vec<Scheduled<K>>,
}

impl<K> Default for Scheduler<K> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<K: Copy + PartialEq> Scheduler<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `kind` once at time `at`
    pub fn schedule_once(&mut self, kind: K, at: f64) {
        self.cancel(kind);
        self.pending.push(Scheduled {
            kind,
            at,
            every: None,
        });
    }

    /// Fire `kind` at `first_at`, then every `interval` seconds until cancelled
    pub fn schedule_repeating(&mut self, kind: K, first_at: f64, interval: f64) {
        assert!(interval > 0.0, "repeat interval must be positive");
        self.cancel(kind);
        self.pending.push(Scheduled {
            kind,
            at: first_at,
            every: Some(interval),
        });
    }

    /// Cancel a pending task. Cancelling an absent task is a no-op.
    pub fn cancel(&mut self, kind: K) {
        self.pending.retain(|s| s.kind != kind);
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_scheduled(&self, kind: K) -> bool {
        self.pending.iter().any(|s| s.kind == kind)
    }

    /// Next firing time of `kind`, if pending
    pub fn next_fire(&self, kind: K) -> Option<f64> {
        self.pending.iter().find(|s| s.kind == kind).map(|s| s.at)
    }

    /// Remove and return the earliest task due at `now`.
    ///
    /// Repeating tasks are re-armed before being returned. Callers loop on
    /// this so that a task fired earlier in the same poll can cancel or
    /// replace the ones after it.
    pub fn pop_due(&mut self, now: f64) -> Option<K> {
        let (idx, _) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, s)| s.at <= now)
            .min_by(|(_, a), (_, b)| a.at.total_cmp(&b.at))?;

        let kind = self.pending[idx].kind;
        match self.pending[idx].every {
            Some(every) => self.pending[idx].at += every,
            None => {
                self.pending.remove(idx);
            }
        }
        Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Task {
        Kick,
        Check,
    }

    #[test]
    fn test_once_fires_once() {
        let mut sched = Scheduler::new();
        sched.schedule_once(Task::Kick, 0.5);
        assert_eq!(sched.pop_due(0.4), None);
        assert_eq!(sched.pop_due(0.5), Some(Task::Kick));
        assert_eq!(sched.pop_due(10.0), None);
        assert!(!sched.is_scheduled(Task::Kick));
    }

    #[test]
    fn test_repeating_rearms() {
        let mut sched = Scheduler::new();
        sched.schedule_repeating(Task::Check, 1.0, 1.0);
        assert_eq!(sched.pop_due(1.0), Some(Task::Check));
        assert_eq!(sched.pop_due(1.0), None);
        assert_eq!(sched.next_fire(Task::Check), Some(2.0));
        assert_eq!(sched.pop_due(2.0), Some(Task::Check));
    }

    #[test]
    fn test_reschedule_replaces_pending() {
        let mut sched = Scheduler::new();
        sched.schedule_once(Task::Kick, 0.5);
        sched.schedule_once(Task::Kick, 2.0);
        assert_eq!(sched.pop_due(1.0), None);
        assert_eq!(sched.pop_due(2.0), Some(Task::Kick));
        assert_eq!(sched.pop_due(5.0), None);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut sched = Scheduler::new();
        sched.schedule_once(Task::Kick, 0.5);
        sched.cancel(Task::Kick);
        sched.cancel(Task::Kick);
        sched.cancel(Task::Check);
        assert_eq!(sched.pop_due(1.0), None);
    }

    #[test]
    fn test_due_tasks_come_out_in_time_order() {
        let mut sched = Scheduler::new();
        sched.schedule_repeating(Task::Check, 0.8, 1.0);
        sched.schedule_once(Task::Kick, 0.3);
        assert_eq!(sched.pop_due(1.0), Some(Task::Kick));
        assert_eq!(sched.pop_due(1.0), Some(Task::Check));
        assert_eq!(sched.pop_due(1.0), None);
    }
}
