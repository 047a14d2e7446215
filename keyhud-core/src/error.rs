//! HUD error types

use thiserror::Error;

/// Errors raised while decoding host input
#[derive(Error, Debug)]
pub enum HudError {
    /// Message was not valid JSON or did not match the expected shape
    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),

    /// Envelope carried an action this HUD does not understand
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Action requires a `data` payload but none was given
    #[error("Missing data for action {0}")]
    MissingData(String),

    /// Offset string with an unsupported unit or number
    #[error("Invalid offset: {0:?}")]
    InvalidOffset(String),

    /// Position is neither a known preset nor an offset record
    #[error("Invalid placement: {0}")]
    InvalidPlacement(String),

    /// Binding entry is missing required fields
    #[error("Invalid binding: {0}")]
    InvalidBinding(String),
}
