//! Host configuration messages
//!
//! The host sends one JSON object per message:
//!
//! ```json
//! {"action": "SET_KEY_INPUTS", "data": {"position": "middle-bottom", "inputs": [...]}}
//! {"action": "HIDE_KEY_INPUTS"}
//! ```
//!
//! A bare `{"position": ..., "inputs": [...]}` payload is read as
//! `SET_KEY_INPUTS`. Decoding is lenient below the envelope: a field that does
//! not parse is logged and left at its default, and only an entry without a
//! usable key is dropped as a whole.

use crate::binding::Binding;
use crate::error::HudError;
use crate::position::PlacementDescriptor;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

pub const SET_KEY_INPUTS: &str = "SET_KEY_INPUTS";
pub const HIDE_KEY_INPUTS: &str = "HIDE_KEY_INPUTS";

/// Payload of `SET_KEY_INPUTS`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyInputs {
    /// `None` when absent or unrecognized; the HUD's default applies
    pub position: Option<PlacementDescriptor>,
    /// Bindings in display order, unique by key
    pub inputs: Vec<Binding>,
}

impl KeyInputs {
    pub fn new(position: impl Into<PlacementDescriptor>, inputs: Vec<Binding>) -> Self {
        Self {
            position: Some(position.into()),
            inputs,
        }
    }

    /// The prompt list shown before any host message arrives in demo mode.
    pub fn demo() -> Self {
        Self {
            position: None,
            inputs: vec![
                Binding::new("F1", "Open Menu")
                    .with_icon("fa fa-bars")
                    .with_hold_ms(1000),
                Binding::new("F2", "Open Inventory").with_icon("fa fa-box"),
            ],
        }
    }

    pub fn from_value(data: Value) -> Result<Self, HudError> {
        #[derive(Deserialize)]
        struct RawPayload {
            #[serde(default)]
            position: Option<Value>,
            #[serde(default)]
            inputs: Vec<Value>,
        }

        let raw: RawPayload = serde_json::from_value(data)?;

        let position = match raw.position {
            None | Some(Value::Null) => None,
            Some(value) => match serde_json::from_value::<PlacementDescriptor>(value.clone()) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("Ignoring position {value}: {e}");
                    None
                }
            },
        };

        let mut seen = HashSet::new();
        let mut inputs = Vec::with_capacity(raw.inputs.len());
        for (index, entry) in raw.inputs.into_iter().enumerate() {
            match Binding::from_value(entry) {
                Ok(binding) if seen.insert(binding.key.clone()) => inputs.push(binding),
                Ok(binding) => warn!("Ignoring input #{index}: duplicate key {}", binding.key),
                Err(e) => warn!("Ignoring input #{index}: {e}"),
            }
        }

        Ok(Self { position, inputs })
    }
}

/// A decoded host message
#[derive(Debug, Clone, PartialEq)]
pub enum HostMessage {
    SetKeyInputs(KeyInputs),
    Hide,
}

impl HostMessage {
    pub fn decode(text: &str) -> Result<Self, HudError> {
        #[derive(Deserialize)]
        struct Envelope {
            action: String,
            #[serde(default)]
            data: Option<Value>,
        }

        let value: Value = serde_json::from_str(text)?;
        if value.get("action").is_none() && value.get("inputs").is_some() {
            return Ok(HostMessage::SetKeyInputs(KeyInputs::from_value(value)?));
        }

        let envelope: Envelope = serde_json::from_value(value)?;
        match envelope.action.as_str() {
            SET_KEY_INPUTS => {
                let data = envelope
                    .data
                    .ok_or_else(|| HudError::MissingData(envelope.action.clone()))?;
                Ok(HostMessage::SetKeyInputs(KeyInputs::from_value(data)?))
            }
            HIDE_KEY_INPUTS => Ok(HostMessage::Hide),
            _ => Err(HudError::UnknownAction(envelope.action)),
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            HostMessage::SetKeyInputs(_) => SET_KEY_INPUTS,
            HostMessage::Hide => HIDE_KEY_INPUTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{AnchorPreset, Offset, Transform};

    #[test]
    fn test_decode_set_key_inputs() {
        let msg = HostMessage::decode(
            r#"{"action":"SET_KEY_INPUTS","data":{"position":"middle-bottom",
                "inputs":[{"key":"F1","label":"Open Menu","icon":"bars","delay":1000}]}}"#,
        )
        .unwrap();
        let HostMessage::SetKeyInputs(inputs) = msg else {
            panic!("Expected SetKeyInputs");
        };
        assert_eq!(
            inputs.position,
            Some(PlacementDescriptor::Preset(AnchorPreset::MiddleBottom))
        );
        assert_eq!(inputs.inputs.len(), 1);
        assert_eq!(inputs.inputs[0].label, "Open Menu");
    }

    #[test]
    fn test_decode_bare_payload() {
        let msg = HostMessage::decode(r#"{"inputs":[{"key":"e","label":"Use"}]}"#).unwrap();
        assert_eq!(msg.action(), SET_KEY_INPUTS);
    }

    #[test]
    fn test_decode_hide() {
        assert_eq!(
            HostMessage::decode(r#"{"action":"HIDE_KEY_INPUTS"}"#).unwrap(),
            HostMessage::Hide
        );
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            HostMessage::decode("not json"),
            Err(HudError::Json(_))
        ));
        assert!(matches!(
            HostMessage::decode(r#"{"action":"REBOOT"}"#),
            Err(HudError::UnknownAction(a)) if a == "REBOOT"
        ));
        assert!(matches!(
            HostMessage::decode(r#"{"action":"SET_KEY_INPUTS"}"#),
            Err(HudError::MissingData(_))
        ));
    }

    #[test]
    fn test_bad_fields_degrade() {
        let msg = HostMessage::decode(
            r#"{"action":"SET_KEY_INPUTS","data":{"position":"center","inputs":[
                {"key":"F1","label":"A"},
                {"label":"no key"},
                {"key":"f1","label":"duplicate"},
                {"key":"F2","label":"B","delay":-3}
            ]}}"#,
        )
        .unwrap();
        let HostMessage::SetKeyInputs(inputs) = msg else {
            panic!("Expected SetKeyInputs");
        };
        assert_eq!(inputs.position, None);
        let labels: Vec<_> = inputs.inputs.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["A", "B"]);
        assert_eq!(inputs.inputs[1].hold, None);
    }

    #[test]
    fn test_bad_field_keeps_the_rest_of_its_record() {
        let msg = HostMessage::decode(
            r#"{"position":{"top":"3em","left":10,"transform":"translateY(-50%)"},
                "inputs":[{"key":"F1","label":5,"delay":1000},{"key":"F2","label":"B"}]}"#,
        )
        .unwrap();
        let HostMessage::SetKeyInputs(inputs) = msg else {
            panic!("Expected SetKeyInputs");
        };
        let Some(PlacementDescriptor::Explicit(explicit)) = inputs.position else {
            panic!("Expected explicit placement, got {:?}", inputs.position);
        };
        assert_eq!(explicit.top, None);
        assert_eq!(explicit.left, Some(Offset::Px(10.0)));
        assert_eq!(
            explicit.transform,
            Some(Transform::Translate(Offset::ZERO, Offset::Percent(-50.0)))
        );

        let keys: Vec<_> = inputs.inputs.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, ["F1", "F2"]);
        assert_eq!(inputs.inputs[0].label, "");
        assert_eq!(inputs.inputs[0].hold.map(|h| h.as_millis()), Some(1000));
    }

    #[test]
    fn test_position_preset_ignores_case() {
        let msg = HostMessage::decode(r#"{"position":"Bottom-Right","inputs":[]}"#).unwrap();
        let HostMessage::SetKeyInputs(inputs) = msg else {
            panic!("Expected SetKeyInputs");
        };
        assert_eq!(
            inputs.position,
            Some(PlacementDescriptor::Preset(AnchorPreset::BottomRight))
        );
    }

    #[test]
    fn test_demo_inputs() {
        let demo = KeyInputs::demo();
        assert_eq!(demo.inputs.len(), 2);
        assert_eq!(demo.inputs[0].hold.map(|h| h.as_millis()), Some(1000));
        assert_eq!(demo.inputs[1].hold, None);
    }
}
