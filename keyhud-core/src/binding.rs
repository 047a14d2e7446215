//! Key bindings shown in the prompt list

use crate::error::HudError;
use crate::key::KeyId;
use serde::Deserialize;
use serde_json::Value;
use std::num::NonZeroU64;
use std::time::Duration;

/// Number of ticks that make up a full hold.
pub const PROGRESS_STEPS: u32 = 100;

/// How long a key must stay pressed before its action activates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HoldDuration(NonZeroU64);

impl HoldDuration {
    /// `None` for zero, which means "activate instantly"
    pub fn from_millis(ms: u64) -> Option<Self> {
        NonZeroU64::new(ms).map(Self)
    }

    pub fn as_millis(&self) -> u64 {
        self.0.get()
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.0.get())
    }

    /// Interval between progress ticks: 100 ticks span the whole hold.
    pub fn tick_period(&self) -> Duration {
        self.as_duration() / PROGRESS_STEPS
    }
}

/// One prompt entry: a key, its label and icon, and an optional hold time
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub key: KeyId,
    pub label: String,
    pub icon: String,
    pub hold: Option<HoldDuration>,
}

impl Binding {
    pub fn new(key: impl Into<KeyId>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            icon: String::new(),
            hold: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_hold_ms(mut self, ms: u64) -> Self {
        self.hold = HoldDuration::from_millis(ms);
        self
    }

    /// Decode one entry of the host's `inputs` array.
    ///
    /// Only `key` is required. `label` and `icon` default to empty when missing
    /// or not a string, and a `delay` that is missing, zero, negative or not a
    /// number means no hold.
    pub fn from_value(value: Value) -> Result<Self, HudError> {
        #[derive(Deserialize)]
        struct RawBinding {
            key: Option<String>,
            #[serde(default)]
            label: Option<Value>,
            #[serde(default)]
            icon: Option<Value>,
            #[serde(default)]
            delay: Option<Value>,
        }

        let raw: RawBinding = serde_json::from_value(value)?;
        let key = raw
            .key
            .map(|k| KeyId::new(&k))
            .filter(|k| !k.is_empty())
            .ok_or_else(|| HudError::InvalidBinding("missing key".to_string()))?;

        let hold = raw.delay.as_ref().and_then(|delay| {
            let ms = delay_millis(delay);
            if ms.is_none() && !delay.is_null() {
                tracing::warn!("Binding {key}: ignoring invalid delay {delay}");
            }
            ms.and_then(HoldDuration::from_millis)
        });

        let label = text_field(&key, "label", raw.label);
        let icon = text_field(&key, "icon", raw.icon);
        Ok(Self {
            key,
            label,
            icon,
            hold,
        })
    }
}

/// String field that falls back to empty when absent or of the wrong type.
fn text_field(key: &KeyId, name: &str, value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => {
            tracing::warn!("Binding {key}: ignoring invalid {name} {other}");
            String::new()
        }
    }
}

/// Hold time in whole milliseconds; fractional values round, with a 1 ms floor.
fn delay_millis(delay: &Value) -> Option<u64> {
    let ms = match delay {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !ms.is_finite() || ms <= 0.0 {
        return None;
    }
    Some(ms.round().max(1.0) as u64)
}
