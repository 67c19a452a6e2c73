//! Cooperative scheduler for delayed, cancellable actions.
//!
//! An `Action` is a unit of delayed work: a kind and label for display, a
//! duration in ticks, and a completion callback. The owner drives time by
//! calling `advance`; every action whose due tick has been reached is removed
//! from the queue and its callback runs exactly once against the context
//! passed in.
//!
//! Pending actions are keyed by `(due_tick, seq)`, so iteration order equals
//! firing order and actions due on the same tick fire in enqueue order.

use crate::error::Result;
use crate::types::ActionKind;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Completion callback. Receives the scheduler owner's context.
pub type Completion<C> = Box<dyn FnOnce(&mut C) -> Result<()>>;

// ---------------------------------------------------------------------------
// Request / handle
// ---------------------------------------------------------------------------

/// What a caller hands to `Scheduler::enqueue`.
pub struct ActionRequest<C> {
    pub kind: ActionKind,
    pub label: String,
    pub duration_ticks: u64,
    pub on_complete: Completion<C>,
}

impl<C> ActionRequest<C> {
    pub fn new(
        kind: ActionKind,
        label: impl Into<String>,
        duration_ticks: u64,
        on_complete: impl FnOnce(&mut C) -> Result<()> + 'static,
    ) -> Self {
        Self {
            kind,
            label: label.into(),
            duration_ticks,
            on_complete: Box::new(on_complete),
        }
    }
}

/// Opaque reference to an enqueued action, only good for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionHandle(Uuid);

impl std::fmt::Display for ActionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

struct Action<C> {
    id: Uuid,
    kind: ActionKind,
    label: String,
    duration_ticks: u64,
    created_at: u64,
    on_complete: Completion<C>,
}

/// Read-only view of a pending action.
#[derive(Debug, Clone, Serialize)]
pub struct ActionInfo {
    pub kind: ActionKind,
    pub label: String,
    pub duration_ticks: u64,
    pub created_at: u64,
    pub due_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    Failed(String),
}

/// Record of an action that fired during `advance`.
#[derive(Debug, Clone)]
pub struct FiredAction {
    pub handle: ActionHandle,
    pub kind: ActionKind,
    pub label: String,
    pub fired_at: u64,
    pub outcome: ActionOutcome,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

pub struct Scheduler<C> {
    now: u64,
    seq: u64,
    pending: BTreeMap<(u64, u64), Action<C>>,
    index: HashMap<Uuid, (u64, u64)>,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self {
            now: 0,
            seq: 0,
            pending: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    /// Current tick.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Queue an action. It never fires inside this call, even with a zero
    /// duration; the earliest it can fire is the next `advance`.
    pub fn enqueue(&mut self, request: ActionRequest<C>) -> ActionHandle {
        let id = Uuid::new_v4();
        let due_at = self.now.saturating_add(request.duration_ticks);
        let key = (due_at, self.seq);
        self.seq += 1;

        tracing::debug!(
            action = %request.kind,
            label = %request.label,
            ticks = request.duration_ticks,
            due_at,
            "action enqueued"
        );

        self.pending.insert(
            key,
            Action {
                id,
                kind: request.kind,
                label: request.label,
                duration_ticks: request.duration_ticks,
                created_at: self.now,
                on_complete: request.on_complete,
            },
        );
        self.index.insert(id, key);
        ActionHandle(id)
    }

    /// Drop a pending action. Returns false if it already fired, was already
    /// cancelled, or never existed.
    pub fn cancel(&mut self, handle: ActionHandle) -> bool {
        let Some(key) = self.index.remove(&handle.0) else {
            return false;
        };
        match self.pending.remove(&key) {
            Some(action) => {
                tracing::debug!(action = %action.kind, label = %action.label, "action cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, handle: ActionHandle) -> bool {
        self.index.contains_key(&handle.0)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Ticks left before `handle` fires, if it is still pending.
    pub fn remaining(&self, handle: ActionHandle) -> Option<u64> {
        self.index
            .get(&handle.0)
            .map(|(due, _)| due.saturating_sub(self.now))
    }

    /// Pending actions in firing order.
    pub fn pending(&self) -> Vec<ActionInfo> {
        self.pending
            .iter()
            .map(|((due_at, _), a)| ActionInfo {
                kind: a.kind,
                label: a.label.clone(),
                duration_ticks: a.duration_ticks,
                created_at: a.created_at,
                due_at: *due_at,
            })
            .collect()
    }

    /// Move time forward by `ticks` and fire every action now due.
    ///
    /// A callback error is logged and reported in the returned record; the
    /// action still counts as complete and is never retried.
    pub fn advance(&mut self, ctx: &mut C, ticks: u64) -> Vec<FiredAction> {
        self.now = self.now.saturating_add(ticks);
        let mut fired = Vec::new();

        while let Some((&key, _)) = self.pending.first_key_value() {
            if key.0 > self.now {
                break;
            }
            let Some((_, action)) = self.pending.pop_first() else {
                break;
            };
            self.index.remove(&action.id);

            let outcome = match (action.on_complete)(ctx) {
                Ok(()) => {
                    tracing::debug!(action = %action.kind, label = %action.label, "action fired");
                    ActionOutcome::Completed
                }
                Err(e) => {
                    tracing::error!(
                        action = %action.kind,
                        label = %action.label,
                        error = %e,
                        "action completion failed"
                    );
                    ActionOutcome::Failed(e.to_string())
                }
            };

            fired.push(FiredAction {
                handle: ActionHandle(action.id),
                kind: action.kind,
                label: action.label,
                fired_at: self.now,
                outcome,
            });
        }

        fired
    }

    /// Fast-forward until nothing is pending.
    pub fn run_until_idle(&mut self, ctx: &mut C) -> Vec<FiredAction> {
        match self.pending.last_key_value() {
            Some((&(last_due, _), _)) => {
                let ticks = last_due.saturating_sub(self.now);
                self.advance(ctx, ticks)
            }
            None => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BreachError;

    fn counter(label: &str, ticks: u64) -> ActionRequest<Vec<String>> {
        let label = label.to_string();
        let tag = label.clone();
        ActionRequest::new(ActionKind::Scan, label, ticks, move |log: &mut Vec<String>| {
            log.push(tag);
            Ok(())
        })
    }

    #[test]
    fn fires_exactly_once_and_not_early() {
        let mut sched = Scheduler::new();
        let mut log = Vec::new();
        sched.enqueue(counter("a", 3));

        assert!(sched.advance(&mut log, 2).is_empty());
        assert!(log.is_empty());

        let fired = sched.advance(&mut log, 1);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].fired_at, 3);
        assert_eq!(log, vec!["a"]);

        sched.advance(&mut log, 10);
        assert_eq!(log, vec!["a"]);
    }

    #[test]
    fn cancel_after_fire_returns_false() {
        let mut sched = Scheduler::new();
        let mut log = Vec::new();
        let h = sched.enqueue(counter("a", 1));
        sched.advance(&mut log, 1);
        assert!(!sched.cancel(h));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn cancel_before_fire_suppresses_callback() {
        let mut sched = Scheduler::new();
        let mut log = Vec::new();
        let h = sched.enqueue(counter("a", 2));
        assert!(sched.is_pending(h));
        assert!(sched.cancel(h));
        assert!(!sched.cancel(h));
        sched.advance(&mut log, 5);
        assert!(log.is_empty());
        assert!(sched.is_idle());
    }

    #[test]
    fn zero_duration_waits_for_next_advance() {
        let mut sched = Scheduler::new();
        let mut log = Vec::new();
        sched.enqueue(counter("now", 0));
        assert!(log.is_empty());
        sched.advance(&mut log, 0);
        assert_eq!(log, vec!["now"]);
    }

    #[test]
    fn independent_timers_fire_in_due_order() {
        let mut sched = Scheduler::new();
        let mut log = Vec::new();
        sched.enqueue(counter("slow", 5));
        sched.enqueue(counter("fast", 1));
        sched.enqueue(counter("mid", 3));
        sched.enqueue(counter("mid2", 3));
        assert_eq!(sched.pending_count(), 4);

        let fired = sched.run_until_idle(&mut log);
        assert_eq!(fired.len(), 4);
        assert_eq!(log, vec!["fast", "mid", "mid2", "slow"]);
        assert_eq!(sched.now(), 5);
    }

    #[test]
    fn failing_callback_is_still_completed() {
        let mut sched: Scheduler<u32> = Scheduler::new();
        let mut calls = 0u32;
        let h = sched.enqueue(ActionRequest::new(ActionKind::Crack, "boom", 1, |n: &mut u32| {
            *n += 1;
            Err(BreachError::FileSystemMissing("boom".into()))
        }));

        let fired = sched.advance(&mut calls, 1);
        assert!(matches!(fired[0].outcome, ActionOutcome::Failed(_)));
        assert!(!sched.is_pending(h));
        assert!(!sched.cancel(h));
        sched.advance(&mut calls, 1);
        assert_eq!(calls, 1);
    }

    #[test]
    fn remaining_counts_down() {
        let mut sched = Scheduler::new();
        let mut log = Vec::new();
        let h = sched.enqueue(counter("a", 4));
        assert_eq!(sched.remaining(h), Some(4));
        sched.advance(&mut log, 3);
        assert_eq!(sched.remaining(h), Some(1));
        sched.advance(&mut log, 1);
        assert_eq!(sched.remaining(h), None);
    }
}
