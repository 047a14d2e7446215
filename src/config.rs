//! Settings file
//!
//! TOML at `~/.config/keyhud/config.toml`. Every field is optional; a missing
//! file means defaults. Only process behaviour lives here, never HUD state.

use keyhud_core::{CompletionPolicy, PlacementDescriptor};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SOCKET_NAME: &str = "keyhud.sock";

/// Longer than common auto-repeat delays (X11 660 ms, most desktops 500 to
/// 660 ms) so a held key is not released before its first repeat arrives.
pub const DEFAULT_RELEASE_FALLBACK_MS: u64 = 1000;

/// keyhud settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HudConfig {
    /// Unix socket the host writes messages to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,
    /// Completed holds stay at 100 (`hold`) or drop to 0 (`reset`)
    pub on_complete: CompletionPolicy,
    /// Release a key after this long without press/repeat events when the
    /// terminal cannot report releases. Must exceed the OS auto-repeat delay,
    /// or held keys are released and pressed again before the first repeat
    /// and long holds never complete. 0 disables.
    pub release_fallback_ms: u64,
    /// Placement used when the host sends none or an invalid one
    pub default_position: PlacementDescriptor,
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            on_complete: CompletionPolicy::Hold,
            release_fallback_ms: DEFAULT_RELEASE_FALLBACK_MS,
            default_position: PlacementDescriptor::default(),
        }
    }
}

impl HudConfig {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keyhud")
            .join("config.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: HudConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn socket_path(&self) -> PathBuf {
        self.socket_path.clone().unwrap_or_else(default_socket_path)
    }

    pub fn release_fallback(&self) -> Option<Duration> {
        (self.release_fallback_ms > 0).then(|| Duration::from_millis(self.release_fallback_ms))
    }
}

/// `$XDG_RUNTIME_DIR/keyhud.sock`, or the temp dir when there is no runtime dir
pub fn default_socket_path() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(SOCKET_NAME)
}

/// Log file used while the terminal UI owns the screen
pub fn default_log_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("keyhud")
        .join("keyhud.log")
}
