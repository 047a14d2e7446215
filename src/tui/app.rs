//! TUI application state

use crate::input::{is_quit, KeySignal, ReleaseFallback};
use crate::ticker::TokioTicker;
use crossterm::event::{Event, KeyEvent};
use keyhud_core::{HostMessage, Hud, TickScheduler, TickTag};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, trace};

/// Main application state
pub struct App<S: TickScheduler = TokioTicker> {
    /// Bindings, pressed keys and hold progress
    pub hud: Hud<S>,
    /// Socket the host writes to, shown while waiting
    pub socket_path: PathBuf,
    /// Synthesized releases for terminals without release events
    pub fallback: Option<ReleaseFallback>,
    /// Should quit
    pub should_quit: bool,
    /// Screen out of date
    dirty: bool,
}

impl<S: TickScheduler> App<S> {
    pub fn new(hud: Hud<S>, socket_path: PathBuf, fallback: Option<ReleaseFallback>) -> Self {
        Self {
            hud,
            socket_path,
            fallback,
            should_quit: false,
            dirty: true,
        }
    }

    /// Whether a redraw is due; clears the flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::Key(key) => self.handle_key_event(key, now),
            Event::Resize(..) => self.dirty = true,
            _ => {}
        }
    }

    pub fn handle_key_event(&mut self, event: KeyEvent, now: Instant) {
        if is_quit(&event) {
            debug!("Quit requested");
            self.should_quit = true;
            return;
        }
        let Some(signal) = KeySignal::from_event(&event) else {
            return;
        };
        trace!("{:?}", signal);

        if let Some(fallback) = self.fallback.as_mut() {
            fallback.observe(&signal, now);
        }
        let changed = match &signal {
            KeySignal::Down(key) => self.hud.key_down(key),
            KeySignal::Up(key) => self.hud.key_up(key),
        };
        self.dirty |= changed;
    }

    pub fn handle_host_message(&mut self, msg: HostMessage) {
        self.hud.apply(msg);
        if !self.hud.is_visible() {
            if let Some(fallback) = self.fallback.as_mut() {
                fallback.clear();
            }
        }
        self.dirty = true;
    }

    pub fn handle_tick(&mut self, tag: &TickTag) {
        self.dirty |= self.hud.tick(tag);
    }

    /// Release keys the terminal stopped repeating
    pub fn expire_fallback(&mut self, now: Instant) {
        let Some(fallback) = self.fallback.as_mut() else {
            return;
        };
        for key in fallback.expired(now) {
            trace!("Synthesized release for {}", key);
            self.dirty |= self.hud.key_up(&key);
        }
    }
}
