//! Hold-progress state machine
//!
//! Each binding moves through `Idle -> Instant` (no hold duration) or
//! `Idle -> Advancing -> Complete` (with a hold duration), and back to `Idle`
//! the moment its key is released.
//!
//! Timers are owned through a [`TickScheduler`]. Every scheduled tick carries a
//! [`TickTag`] naming the configuration generation, the key and a per-press
//! serial. A tick whose tag no longer matches the live slot is stale and is
//! dropped, so a tick that was already queued when its key was released can
//! never move progress.

use crate::binding::{Binding, PROGRESS_STEPS};
use crate::key::KeyId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::debug;

pub const PROGRESS_MAX: u8 = PROGRESS_STEPS as u8;

/// Per-binding hold state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoldPhase {
    #[default]
    Idle,
    /// Pressed, no hold duration: progress is 100 immediately
    Instant,
    /// Pressed, ticking towards 100
    Advancing,
    /// Reached 100 while still held; ticking has stopped
    Complete,
}

/// What happens to progress once a hold completes while the key stays down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionPolicy {
    /// Stay at 100 until release
    #[default]
    Hold,
    /// Drop back to 0 until release
    Reset,
}

/// Identifies the timer a tick came from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TickTag {
    pub generation: u64,
    pub key: KeyId,
    pub serial: u64,
}

/// Source of periodic ticks
pub trait TickScheduler {
    type Handle;

    /// Start delivering `tag` every `period`, first delivery after one period.
    fn schedule(&mut self, tag: TickTag, period: Duration) -> Self::Handle;

    /// Stop a timer. No tick for it may be delivered after this returns,
    /// except ones already queued, which the engine rejects by tag.
    fn cancel(&mut self, handle: Self::Handle);
}

/// Result of feeding one tick to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick did not belong to a live timer and was ignored
    Stale,
    /// Progress moved to the given value
    Advanced(u8),
    /// Progress reached 100 and the timer was stopped
    Completed,
}

impl TickOutcome {
    pub fn changed(self) -> bool {
        !matches!(self, TickOutcome::Stale)
    }
}

struct ActiveTicker<H> {
    serial: u64,
    handle: H,
}

struct Slot<H> {
    phase: HoldPhase,
    progress: u8,
    ticker: Option<ActiveTicker<H>>,
}

/// Drives hold progress for every pressed binding
pub struct HoldProgressEngine<S: TickScheduler> {
    scheduler: S,
    policy: CompletionPolicy,
    generation: u64,
    next_serial: u64,
    slots: HashMap<KeyId, Slot<S::Handle>>,
}

impl<S: TickScheduler> HoldProgressEngine<S> {
    pub fn new(scheduler: S, policy: CompletionPolicy) -> Self {
        Self {
            scheduler,
            policy,
            generation: 0,
            next_serial: 0,
            slots: HashMap::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn policy(&self) -> CompletionPolicy {
        self.policy
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Drop all state of the current generation and start a new one.
    pub fn begin_generation(&mut self) -> u64 {
        self.cancel_all();
        self.generation += 1;
        debug!("Progress generation {}", self.generation);
        self.generation
    }

    /// Key of `binding` went down. Returns whether visible state changed.
    ///
    /// A press for a key that is not idle is ignored, so auto-repeat never
    /// restarts a running hold.
    pub fn press(&mut self, binding: &Binding) -> bool {
        if self.phase(&binding.key) != HoldPhase::Idle {
            return false;
        }
        // One tick stream per key: whatever was left behind goes first
        if let Some(old) = self.slots.remove(&binding.key) {
            if let Some(ticker) = old.ticker {
                self.scheduler.cancel(ticker.handle);
            }
        }

        let slot = match binding.hold {
            None => {
                debug!("{}: instant", binding.key);
                Slot {
                    phase: HoldPhase::Instant,
                    progress: PROGRESS_MAX,
                    ticker: None,
                }
            }
            Some(hold) => {
                self.next_serial += 1;
                let tag = TickTag {
                    generation: self.generation,
                    key: binding.key.clone(),
                    serial: self.next_serial,
                };
                let period = hold.tick_period();
                debug!(
                    "{}: holding for {}ms, tick every {:?}",
                    binding.key,
                    hold.as_millis(),
                    period
                );
                let handle = self.scheduler.schedule(tag, period);
                Slot {
                    phase: HoldPhase::Advancing,
                    progress: 0,
                    ticker: Some(ActiveTicker {
                        serial: self.next_serial,
                        handle,
                    }),
                }
            }
        };

        self.slots.insert(binding.key.clone(), slot);
        true
    }

    /// Key went up: progress returns to 0 and any pending tick is cancelled.
    pub fn release(&mut self, key: &KeyId) -> bool {
        let Some(slot) = self.slots.remove(key) else {
            return false;
        };
        if let Some(ticker) = slot.ticker {
            self.scheduler.cancel(ticker.handle);
        }
        debug!("{key}: released at {}", slot.progress);
        true
    }

    /// Advance the slot named by `tag` by one step.
    pub fn tick(&mut self, tag: &TickTag) -> TickOutcome {
        if tag.generation != self.generation {
            return TickOutcome::Stale;
        }
        let Some(slot) = self.slots.get_mut(&tag.key) else {
            return TickOutcome::Stale;
        };
        let live = matches!(&slot.ticker, Some(t) if t.serial == tag.serial);
        if !live || slot.phase != HoldPhase::Advancing {
            return TickOutcome::Stale;
        }

        slot.progress = (slot.progress + 1).min(PROGRESS_MAX);
        if slot.progress < PROGRESS_MAX {
            return TickOutcome::Advanced(slot.progress);
        }

        slot.phase = HoldPhase::Complete;
        if self.policy == CompletionPolicy::Reset {
            slot.progress = 0;
        }
        if let Some(ticker) = slot.ticker.take() {
            self.scheduler.cancel(ticker.handle);
        }
        debug!("{}: hold complete", tag.key);
        TickOutcome::Completed
    }

    /// Cancel every timer and forget all progress.
    pub fn cancel_all(&mut self) {
        for (_, slot) in self.slots.drain() {
            if let Some(ticker) = slot.ticker {
                self.scheduler.cancel(ticker.handle);
            }
        }
    }

    pub fn progress(&self, key: &KeyId) -> u8 {
        self.slots.get(key).map(|s| s.progress).unwrap_or(0)
    }

    pub fn phase(&self, key: &KeyId) -> HoldPhase {
        self.slots.get(key).map(|s| s.phase).unwrap_or_default()
    }

    /// Number of timers currently scheduled
    pub fn active_timers(&self) -> usize {
        self.slots.values().filter(|s| s.ticker.is_some()).count()
    }
}

impl<S: TickScheduler> Drop for HoldProgressEngine<S> {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// Scheduler that never fires on its own.
///
/// Timers are only recorded; the owner delivers ticks by reading
/// [`ManualScheduler::live_tag`] and passing the tag to the engine. Useful for
/// hosts that advance progress from their own frame clock, and for tests.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_handle: u64,
    live: BTreeMap<u64, (TickTag, Duration)>,
    cancelled: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live timers as `(tag, period)`
    pub fn live(&self) -> impl Iterator<Item = (&TickTag, Duration)> {
        self.live.values().map(|(tag, period)| (tag, *period))
    }

    pub fn live_tag(&self, key: &KeyId) -> Option<TickTag> {
        self.live
            .values()
            .find(|(tag, _)| &tag.key == key)
            .map(|(tag, _)| tag.clone())
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn cancelled_count(&self) -> usize {
        self.cancelled
    }
}

impl TickScheduler for ManualScheduler {
    type Handle = u64;

    fn schedule(&mut self, tag: TickTag, period: Duration) -> u64 {
        self.next_handle += 1;
        self.live.insert(self.next_handle, (tag, period));
        self.next_handle
    }

    fn cancel(&mut self, handle: u64) {
        if self.live.remove(&handle).is_some() {
            self.cancelled += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(policy: CompletionPolicy) -> HoldProgressEngine<ManualScheduler> {
        let mut engine = HoldProgressEngine::new(ManualScheduler::new(), policy);
        engine.begin_generation();
        engine
    }

    fn held(key: &str, ms: u64) -> Binding {
        Binding::new(key, key).with_hold_ms(ms)
    }

    fn live_tag(engine: &HoldProgressEngine<ManualScheduler>, key: &str) -> TickTag {
        engine
            .scheduler()
            .live_tag(&KeyId::new(key))
            .expect("timer should be live")
    }

    #[test]
    fn test_instant_binding_snaps_to_100() {
        let mut engine = engine(CompletionPolicy::Hold);
        let b = Binding::new("F2", "Inventory");
        assert!(engine.press(&b));
        assert_eq!(engine.phase(&b.key), HoldPhase::Instant);
        assert_eq!(engine.progress(&b.key), 100);
        assert_eq!(engine.scheduler().live_count(), 0);

        assert!(engine.release(&b.key));
        assert_eq!(engine.phase(&b.key), HoldPhase::Idle);
        assert_eq!(engine.progress(&b.key), 0);
    }

    #[test]
    fn test_hold_advances_in_exactly_100_steps() {
        let mut engine = engine(CompletionPolicy::Hold);
        let b = held("F1", 1000);
        engine.press(&b);
        let tag = live_tag(&engine, "F1");
        assert_eq!(
            engine.scheduler().live().next().map(|(_, p)| p),
            Some(Duration::from_millis(10))
        );

        let mut seen = Vec::new();
        loop {
            match engine.tick(&tag) {
                TickOutcome::Advanced(p) => seen.push(p),
                TickOutcome::Completed => break,
                TickOutcome::Stale => panic!("live tick rejected"),
            }
        }
        assert_eq!(seen, (1..100).collect::<Vec<u8>>());
        assert_eq!(engine.progress(&b.key), 100);
        assert_eq!(engine.phase(&b.key), HoldPhase::Complete);
        assert_eq!(engine.active_timers(), 0);
        assert_eq!(engine.scheduler().live_count(), 0);

        // Late ticks from the finished timer never overshoot
        assert_eq!(engine.tick(&tag), TickOutcome::Stale);
        assert_eq!(engine.progress(&b.key), 100);
    }

    #[test]
    fn test_reset_policy_drops_to_zero_on_completion() {
        let mut engine = engine(CompletionPolicy::Reset);
        let b = held("e", 100);
        engine.press(&b);
        let tag = live_tag(&engine, "e");
        for _ in 0..99 {
            engine.tick(&tag);
        }
        assert_eq!(engine.tick(&tag), TickOutcome::Completed);
        assert_eq!(engine.progress(&b.key), 0);
        assert_eq!(engine.phase(&b.key), HoldPhase::Complete);

        // Still held: repeats do not re-advance
        assert!(!engine.press(&b));
        assert_eq!(engine.scheduler().live_count(), 0);
    }

    #[test]
    fn test_repeat_press_does_not_restart_timer() {
        let mut engine = engine(CompletionPolicy::Hold);
        let b = held("F1", 1000);
        engine.press(&b);
        let tag = live_tag(&engine, "F1");
        for _ in 0..30 {
            engine.tick(&tag);
        }
        assert!(!engine.press(&b));
        assert!(!engine.press(&b));
        assert_eq!(engine.progress(&b.key), 30);
        assert_eq!(engine.scheduler().live_count(), 1);
        assert_eq!(live_tag(&engine, "F1"), tag);
    }

    #[test]
    fn test_release_mid_hold_cancels_and_rejects_late_tick() {
        let mut engine = engine(CompletionPolicy::Hold);
        let b = held("F1", 1000);
        engine.press(&b);
        let tag = live_tag(&engine, "F1");
        for _ in 0..42 {
            engine.tick(&tag);
        }
        assert!(engine.release(&b.key));
        assert_eq!(engine.progress(&b.key), 0);
        assert_eq!(engine.scheduler().live_count(), 0);
        assert_eq!(engine.scheduler().cancelled_count(), 1);

        // A tick already queued before the release
        assert_eq!(engine.tick(&tag), TickOutcome::Stale);
        assert_eq!(engine.progress(&b.key), 0);

        // Pressing again starts a fresh timer; the old tag stays dead
        engine.press(&b);
        let fresh = live_tag(&engine, "F1");
        assert_ne!(fresh.serial, tag.serial);
        assert_eq!(engine.tick(&tag), TickOutcome::Stale);
        assert_eq!(engine.tick(&fresh), TickOutcome::Advanced(1));
    }

    #[test]
    fn test_new_generation_invalidates_everything() {
        let mut engine = engine(CompletionPolicy::Hold);
        engine.press(&held("a", 500));
        engine.press(&held("b", 500));
        let tag = live_tag(&engine, "a");
        engine.tick(&tag);

        engine.begin_generation();
        assert_eq!(engine.scheduler().live_count(), 0);
        assert_eq!(engine.progress(&KeyId::new("a")), 0);
        assert_eq!(engine.tick(&tag), TickOutcome::Stale);
    }

    #[test]
    fn test_independent_keys() {
        let mut engine = engine(CompletionPolicy::Hold);
        engine.press(&held("a", 1000));
        engine.press(&held("b", 2000));
        let a = live_tag(&engine, "a");
        let b = live_tag(&engine, "b");
        for _ in 0..10 {
            engine.tick(&a);
        }
        engine.tick(&b);
        assert_eq!(engine.progress(&KeyId::new("a")), 10);
        assert_eq!(engine.progress(&KeyId::new("b")), 1);

        engine.release(&KeyId::new("a"));
        assert_eq!(engine.tick(&b), TickOutcome::Advanced(2));
        assert_eq!(engine.active_timers(), 1);
    }

    #[test]
    fn test_drop_cancels_timers() {
        // Observed through a scheduler that counts into shared state
        use std::cell::Cell;
        use std::rc::Rc;

        struct Counting(Rc<Cell<usize>>);
        impl TickScheduler for Counting {
            type Handle = ();
            fn schedule(&mut self, _tag: TickTag, _period: Duration) {}
            fn cancel(&mut self, _handle: ()) {
                self.0.set(self.0.get() + 1);
            }
        }

        let cancels = Rc::new(Cell::new(0));
        {
            let mut engine =
                HoldProgressEngine::new(Counting(Rc::clone(&cancels)), CompletionPolicy::Hold);
            engine.press(&held("a", 100));
            engine.press(&held("b", 100));
        }
        assert_eq!(cancels.get(), 2);
    }
}
