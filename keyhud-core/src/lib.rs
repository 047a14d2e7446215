//! keyhud core
//!
//! Pure state for the key prompt HUD: the positional layout algebra, the
//! pressed-key tracker, the hold-progress state machine and the composer that
//! turns them into a render-ready snapshot. No I/O and no async runtime; timers
//! are reached through the [`TickScheduler`] trait.

pub mod binding;
pub mod error;
pub mod hud;
pub mod key;
pub mod message;
pub mod overlay;
pub mod position;
pub mod progress;
pub mod tracker;

pub use binding::{Binding, HoldDuration, PROGRESS_STEPS};
pub use error::HudError;
pub use hud::Hud;
pub use key::KeyId;
pub use message::{HostMessage, KeyInputs, HIDE_KEY_INPUTS, SET_KEY_INPUTS};
pub use overlay::{compose, OverlayRow, OverlaySnapshot};
pub use position::{
    resolve, AnchorOffsets, AnchorPreset, ExplicitPlacement, Offset, PlacementDescriptor, Point,
    ResolvedPlacement, Size, Transform,
};
pub use progress::{
    CompletionPolicy, HoldPhase, HoldProgressEngine, ManualScheduler, TickOutcome, TickScheduler,
    TickTag, PROGRESS_MAX,
};
pub use tracker::KeyPressTracker;
