//! Key identifiers
//!
//! Keys are named the way the host names them: web `KeyboardEvent.key`
//! spellings such as `"F1"`, `"Enter"`, `"ArrowUp"` or `" "` for the space bar.
//! Every identifier is normalized on construction so that the host's binding
//! list and the terminal's key events compare equal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named keys with their accepted aliases (matched case-insensitively).
const NAMED_KEYS: &[(&str, &[&str])] = &[
    ("Enter", &["return"]),
    ("Escape", &["esc"]),
    ("Tab", &[]),
    ("Backspace", &[]),
    ("Delete", &["del"]),
    ("Insert", &["ins"]),
    ("Home", &[]),
    ("End", &[]),
    ("PageUp", &["pgup"]),
    ("PageDown", &["pgdn"]),
    ("ArrowUp", &["up"]),
    ("ArrowDown", &["down"]),
    ("ArrowLeft", &["left"]),
    ("ArrowRight", &["right"]),
    ("CapsLock", &[]),
    ("ScrollLock", &[]),
    ("NumLock", &[]),
    ("PrintScreen", &["print"]),
    ("Pause", &[]),
    ("ContextMenu", &["menu"]),
    ("Shift", &[]),
    ("Control", &["ctrl"]),
    ("Alt", &[]),
    ("Meta", &["super", "win"]),
];

/// Space bar, spelled the way the host spells it.
pub const SPACE: &str = " ";

/// A normalized key identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct KeyId(String);

impl KeyId {
    pub fn new(raw: &str) -> Self {
        Self(normalize(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text for the on-screen key cap (`"Space"`, `"E"`, `"F1"`)
    pub fn cap_label(&self) -> String {
        if self.0 == SPACE {
            return "Space".to_string();
        }
        let mut chars = self.0.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => c.to_uppercase().collect(),
            _ => self.0.clone(),
        }
    }
}

fn normalize(raw: &str) -> String {
    if raw == SPACE {
        return SPACE.to_string();
    }
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("space") || trimmed.eq_ignore_ascii_case("spacebar") {
        return SPACE.to_string();
    }

    let mut chars = trimmed.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return c.to_lowercase().collect();
    }

    if let Some(num) = trimmed
        .strip_prefix('F')
        .or_else(|| trimmed.strip_prefix('f'))
    {
        if let Ok(n) = num.parse::<u8>() {
            if (1..=24).contains(&n) {
                return format!("F{n}");
            }
        }
    }

    for (name, aliases) in NAMED_KEYS {
        if name.eq_ignore_ascii_case(trimmed)
            || aliases.iter().any(|a| a.eq_ignore_ascii_case(trimmed))
        {
            return (*name).to_string();
        }
    }

    trimmed.to_string()
}

impl From<&str> for KeyId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for KeyId {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<KeyId> for String {
    fn from(key: KeyId) -> Self {
        key.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_letters_ignore_case() {
        assert_eq!(KeyId::new("E"), KeyId::new("e"));
        assert_eq!(KeyId::new("e").cap_label(), "E");
    }

    #[test]
    fn test_function_keys() {
        assert_eq!(KeyId::new("f1").as_str(), "F1");
        assert_eq!(KeyId::new("F12").as_str(), "F12");
        // Not a function key
        assert_eq!(KeyId::new("F99").as_str(), "F99");
    }

    #[test]
    fn test_aliases() {
        assert_eq!(KeyId::new("esc"), KeyId::new("Escape"));
        assert_eq!(KeyId::new("up"), KeyId::new("ArrowUp"));
        assert_eq!(KeyId::new("RETURN"), KeyId::new("Enter"));
        assert_eq!(KeyId::new("space").as_str(), SPACE);
        assert_eq!(KeyId::new(" ").cap_label(), "Space");
    }

    #[test]
    fn test_serde_normalizes() {
        let key: KeyId = serde_json::from_str("\"pgup\"").unwrap();
        assert_eq!(key.as_str(), "PageUp");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"PageUp\"");
    }
}
