//! Pressed-key tracking

use crate::key::KeyId;
use std::collections::HashSet;

/// Keys currently held down, each at most once
#[derive(Debug, Default, Clone)]
pub struct KeyPressTracker {
    pressed: HashSet<KeyId>,
}

impl KeyPressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key-down. Returns `false` if the key was already held, which
    /// is how auto-repeat signals are absorbed.
    pub fn press(&mut self, key: &KeyId) -> bool {
        if self.pressed.contains(key) {
            return false;
        }
        self.pressed.insert(key.clone())
    }

    /// Record a key-up. Returns `false` if the key was not held.
    pub fn release(&mut self, key: &KeyId) -> bool {
        self.pressed.remove(key)
    }

    pub fn contains(&self, key: &KeyId) -> bool {
        self.pressed.contains(key)
    }

    pub fn len(&self) -> usize {
        self.pressed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyId> {
        self.pressed.iter()
    }

    pub fn clear(&mut self) {
        self.pressed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_is_idempotent() {
        let mut tracker = KeyPressTracker::new();
        let f1 = KeyId::new("F1");
        assert!(tracker.press(&f1));
        assert!(!tracker.press(&f1));
        assert!(!tracker.press(&KeyId::new("f1")));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_release_non_member_is_noop() {
        let mut tracker = KeyPressTracker::new();
        assert!(!tracker.release(&KeyId::new("e")));
        assert!(tracker.is_empty());

        tracker.press(&KeyId::new("e"));
        tracker.press(&KeyId::new("q"));
        assert!(tracker.release(&KeyId::new("E")));
        assert!(!tracker.contains(&KeyId::new("e")));
        assert!(tracker.contains(&KeyId::new("q")));
    }
}
