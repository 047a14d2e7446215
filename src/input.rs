//! Terminal key capture
//!
//! The terminal is the key source. Press and release events need the kitty
//! keyboard protocol; terminals without it only send presses plus OS
//! auto-repeat, so a [`ReleaseFallback`] releases keys that went quiet.

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags, ModifierKeyCode,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{cursor, execute};
use keyhud_core::KeyId;
use std::collections::HashMap;
use std::io::{self, stdout};
use std::time::{Duration, Instant};
use tracing::debug;

/// Raw mode, alternate screen and keyboard enhancement for as long as it lives
pub struct TerminalCapture {
    enhanced: bool,
}

impl TerminalCapture {
    pub fn acquire() -> io::Result<Self> {
        enable_raw_mode()?;
        // From here on Drop undoes whatever succeeded
        let mut capture = Self { enhanced: false };
        execute!(stdout(), EnterAlternateScreen, cursor::Hide)?;

        if matches!(supports_keyboard_enhancement(), Ok(true)) {
            capture.enhanced = execute!(
                stdout(),
                PushKeyboardEnhancementFlags(
                    KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                        | KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                )
            )
            .is_ok();
        }
        debug!("Keyboard enhancement: {}", capture.enhanced);
        Ok(capture)
    }

    /// Whether the terminal promised press/repeat/release events
    pub fn reports_releases(&self) -> bool {
        self.enhanced
    }
}

impl Drop for TerminalCapture {
    fn drop(&mut self) {
        if self.enhanced {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = execute!(stdout(), cursor::Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// A terminal key event reduced to what the HUD consumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySignal {
    Down(KeyId),
    Up(KeyId),
}

impl KeySignal {
    pub fn from_event(event: &KeyEvent) -> Option<Self> {
        let key = key_id(event.code)?;
        Some(match event.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => KeySignal::Down(key),
            KeyEventKind::Release => KeySignal::Up(key),
        })
    }

    pub fn key(&self) -> &KeyId {
        match self {
            KeySignal::Down(key) | KeySignal::Up(key) => key,
        }
    }
}

/// Ctrl+C quits even though raw mode swallows SIGINT
pub fn is_quit(event: &KeyEvent) -> bool {
    event.kind == KeyEventKind::Press
        && event.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(event.code, KeyCode::Char('c') | KeyCode::Char('C'))
}

/// Host-style key name for a terminal key code
pub fn key_id(code: KeyCode) -> Option<KeyId> {
    let name = match code {
        KeyCode::Char(c) => return Some(KeyId::new(c.encode_utf8(&mut [0; 4]))),
        KeyCode::F(n) => return Some(KeyId::new(&format!("F{n}"))),
        KeyCode::Enter => "Enter",
        KeyCode::Esc => "Escape",
        KeyCode::Tab | KeyCode::BackTab => "Tab",
        KeyCode::Backspace => "Backspace",
        KeyCode::Delete => "Delete",
        KeyCode::Insert => "Insert",
        KeyCode::Home => "Home",
        KeyCode::End => "End",
        KeyCode::PageUp => "PageUp",
        KeyCode::PageDown => "PageDown",
        KeyCode::Up => "ArrowUp",
        KeyCode::Down => "ArrowDown",
        KeyCode::Left => "ArrowLeft",
        KeyCode::Right => "ArrowRight",
        KeyCode::CapsLock => "CapsLock",
        KeyCode::ScrollLock => "ScrollLock",
        KeyCode::NumLock => "NumLock",
        KeyCode::PrintScreen => "PrintScreen",
        KeyCode::Pause => "Pause",
        KeyCode::Menu => "ContextMenu",
        KeyCode::Modifier(modifier) => match modifier {
            ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => "Shift",
            ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => "Control",
            ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => "Alt",
            ModifierKeyCode::LeftSuper
            | ModifierKeyCode::RightSuper
            | ModifierKeyCode::LeftMeta
            | ModifierKeyCode::RightMeta
            | ModifierKeyCode::LeftHyper
            | ModifierKeyCode::RightHyper => "Meta",
            ModifierKeyCode::IsoLevel3Shift | ModifierKeyCode::IsoLevel5Shift => return None,
        },
        _ => return None,
    };
    Some(KeyId::new(name))
}

/// Synthesizes releases for terminals that never send them.
///
/// A held key keeps producing repeat presses; once a key has been quiet for
/// `timeout` it is considered released. Seeing a real release event proves
/// the terminal reports them and turns the fallback off for good.
#[derive(Debug)]
pub struct ReleaseFallback {
    timeout: Duration,
    last_seen: HashMap<KeyId, Instant>,
    disabled: bool,
}

impl ReleaseFallback {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_seen: HashMap::new(),
            disabled: false,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.disabled
    }

    /// Record a signal from the terminal
    pub fn observe(&mut self, signal: &KeySignal, now: Instant) {
        match signal {
            KeySignal::Down(key) if !self.disabled => {
                self.last_seen.insert(key.clone(), now);
            }
            KeySignal::Down(_) => {}
            KeySignal::Up(_) => {
                if !self.disabled {
                    debug!("Terminal reports key releases, release fallback off");
                }
                self.disabled = true;
                self.last_seen.clear();
            }
        }
    }

    /// Keys quiet for longer than the timeout, removed from tracking
    pub fn expired(&mut self, now: Instant) -> Vec<KeyId> {
        let timeout = self.timeout;
        let mut expired = Vec::new();
        self.last_seen.retain(|key, seen| {
            let keep = now.saturating_duration_since(*seen) < timeout;
            if !keep {
                expired.push(key.clone());
            }
            keep
        });
        expired
    }

    pub fn clear(&mut self) {
        self.last_seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, kind)
    }

    #[test]
    fn test_key_names_match_host_spelling() {
        assert_eq!(key_id(KeyCode::F(1)), Some(KeyId::new("F1")));
        assert_eq!(key_id(KeyCode::Char(' ')), Some(KeyId::new(" ")));
        assert_eq!(key_id(KeyCode::Char('E')), Some(KeyId::new("e")));
        assert_eq!(key_id(KeyCode::Up), Some(KeyId::new("ArrowUp")));
        assert_eq!(key_id(KeyCode::Esc), Some(KeyId::new("Escape")));
        assert_eq!(
            key_id(KeyCode::Modifier(ModifierKeyCode::RightShift)),
            Some(KeyId::new("Shift"))
        );
        assert_eq!(key_id(KeyCode::Null), None);
    }

    #[test]
    fn test_event_kinds() {
        let f1 = KeyId::new("F1");
        assert_eq!(
            KeySignal::from_event(&event(KeyCode::F(1), KeyEventKind::Press)),
            Some(KeySignal::Down(f1.clone()))
        );
        assert_eq!(
            KeySignal::from_event(&event(KeyCode::F(1), KeyEventKind::Repeat)),
            Some(KeySignal::Down(f1.clone()))
        );
        assert_eq!(
            KeySignal::from_event(&event(KeyCode::F(1), KeyEventKind::Release)),
            Some(KeySignal::Up(f1))
        );
    }

    #[test]
    fn test_ctrl_c_quits() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(is_quit(&ctrl_c));
        assert!(!is_quit(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
    }

    #[test]
    fn test_fallback_releases_quiet_keys() {
        let mut fallback = ReleaseFallback::new(Duration::from_millis(600));
        let start = Instant::now();
        let e = KeySignal::Down(KeyId::new("e"));

        fallback.observe(&e, start);
        // Auto-repeat keeps the key alive
        fallback.observe(&e, start + Duration::from_millis(500));
        assert!(fallback.expired(start + Duration::from_millis(900)).is_empty());

        assert_eq!(
            fallback.expired(start + Duration::from_millis(1100)),
            vec![KeyId::new("e")]
        );
        assert!(fallback.expired(start + Duration::from_millis(5000)).is_empty());
    }

    #[test]
    fn test_real_release_disables_fallback() {
        let mut fallback = ReleaseFallback::new(Duration::from_millis(100));
        let start = Instant::now();
        let key = KeyId::new("F1");

        fallback.observe(&KeySignal::Down(key.clone()), start);
        fallback.observe(&KeySignal::Up(key.clone()), start);
        assert!(!fallback.is_active());

        fallback.observe(&KeySignal::Down(key), start);
        assert!(fallback.expired(start + Duration::from_secs(1)).is_empty());
    }
}
