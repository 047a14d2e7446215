//! Terminal front end for the HUD
//!
//! Draws the prompt box over an otherwise empty alternate screen and turns
//! terminal events into HUD key signals.

pub mod app;
pub mod render;

pub use app::App;
