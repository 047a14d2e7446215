//! HUD state: current configuration generation, pressed keys and progress
//!
//! Key listeners are registered once by the caller and feed [`Hud::key_down`]
//! and [`Hud::key_up`] for the whole process lifetime. Bindings are looked up
//! against the current generation on every event, so replacing the
//! configuration never drops pressed state for keys that are still held.

use crate::binding::Binding;
use crate::key::KeyId;
use crate::message::{HostMessage, KeyInputs};
use crate::overlay::{compose, OverlaySnapshot};
use crate::position::PlacementDescriptor;
use crate::progress::{CompletionPolicy, HoldProgressEngine, TickScheduler, TickTag};
use crate::tracker::KeyPressTracker;
use tracing::{debug, info};

pub struct Hud<S: TickScheduler> {
    default_placement: PlacementDescriptor,
    placement: PlacementDescriptor,
    bindings: Vec<Binding>,
    /// Overlay shown and keys captured
    visible: bool,
    tracker: KeyPressTracker,
    engine: HoldProgressEngine<S>,
}

impl<S: TickScheduler> Hud<S> {
    /// A hidden HUD with no bindings
    pub fn new(
        scheduler: S,
        policy: CompletionPolicy,
        default_placement: PlacementDescriptor,
    ) -> Self {
        Self {
            placement: default_placement.clone(),
            default_placement,
            bindings: Vec::new(),
            visible: false,
            tracker: KeyPressTracker::new(),
            engine: HoldProgressEngine::new(scheduler, policy),
        }
    }

    /// Apply a host message. Always changes what is on screen.
    pub fn apply(&mut self, msg: HostMessage) {
        match msg {
            HostMessage::SetKeyInputs(inputs) => self.set_key_inputs(inputs),
            HostMessage::Hide => self.hide(),
        }
    }

    /// Replace bindings and placement wholesale and show the overlay.
    pub fn set_key_inputs(&mut self, inputs: KeyInputs) {
        self.bindings = inputs.inputs;
        self.placement = inputs
            .position
            .unwrap_or_else(|| self.default_placement.clone());
        let generation = self.engine.begin_generation();

        if !self.visible {
            self.visible = true;
            debug!("Key capture active");
        }

        // Held keys stay held; those bound in the new list start a fresh hold
        for key in self.tracker.iter() {
            if let Some(binding) = self.bindings.iter().find(|b| &b.key == key) {
                self.engine.press(binding);
            }
        }

        info!(
            "Key inputs updated (generation {generation}): {} binding(s) at {:?}",
            self.bindings.len(),
            self.placement
        );
    }

    /// Hide the overlay, stop capturing keys and drop all progress.
    pub fn hide(&mut self) {
        if self.visible {
            debug!("Key capture inactive");
        }
        self.visible = false;
        self.tracker.clear();
        self.engine.begin_generation();
    }

    /// Release every resource; the HUD can be shown again afterwards.
    pub fn teardown(&mut self) {
        self.hide();
        self.bindings.clear();
    }

    /// Raw key-down. Returns whether the overlay needs a redraw.
    pub fn key_down(&mut self, key: &KeyId) -> bool {
        if !self.visible || !self.tracker.press(key) {
            return false;
        }
        match self.bindings.iter().find(|b| &b.key == key) {
            Some(binding) => self.engine.press(binding),
            None => false,
        }
    }

    /// Raw key-up. Returns whether the overlay needs a redraw.
    pub fn key_up(&mut self, key: &KeyId) -> bool {
        if !self.tracker.release(key) {
            return false;
        }
        self.engine.release(key);
        self.is_bound(key)
    }

    /// Progress tick from the scheduler. Returns whether anything moved.
    pub fn tick(&mut self, tag: &TickTag) -> bool {
        self.engine.tick(tag).changed()
    }

    /// Render-ready state, or `None` while hidden
    pub fn snapshot(&self) -> Option<OverlaySnapshot> {
        self.visible
            .then(|| compose(&self.bindings, &self.tracker, &self.engine, &self.placement))
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_bound(&self, key: &KeyId) -> bool {
        self.bindings.iter().any(|b| &b.key == key)
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn placement(&self) -> &PlacementDescriptor {
        &self.placement
    }

    pub fn pressed(&self) -> &KeyPressTracker {
        &self.tracker
    }

    pub fn engine(&self) -> &HoldProgressEngine<S> {
        &self.engine
    }

    pub fn generation(&self) -> u64 {
        self.engine.generation()
    }
}
