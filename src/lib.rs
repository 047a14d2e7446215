//! keyhud: a key prompt HUD for the terminal
//!
//! A host program tells the HUD which keys to advertise over a Unix socket;
//! the HUD shows them as key caps, highlights them while held and fills a
//! progress bar for bindings that must be held to activate.

pub mod config;
pub mod host;
pub mod input;
pub mod ticker;
pub mod tui;

pub use keyhud_core as core;
