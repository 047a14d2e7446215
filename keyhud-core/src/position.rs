//! Placement descriptors and the position resolver
//!
//! A placement is either one of eight named anchor presets or an explicit
//! record of edge offsets plus an optional transform. [`resolve`] turns either
//! form into anchor offsets and a transform; [`ResolvedPlacement::origin`]
//! turns that into a concrete top-left cell inside a viewport.

use crate::error::HudError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Named anchor presets: four corners and four edge midpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorPreset {
    TopRight,
    MiddleRight,
    BottomRight,
    TopLeft,
    MiddleLeft,
    BottomLeft,
    MiddleBottom,
    MiddleTop,
}

impl AnchorPreset {
    pub const ALL: &'static [AnchorPreset] = &[
        AnchorPreset::TopRight,
        AnchorPreset::MiddleRight,
        AnchorPreset::BottomRight,
        AnchorPreset::TopLeft,
        AnchorPreset::MiddleLeft,
        AnchorPreset::BottomLeft,
        AnchorPreset::MiddleBottom,
        AnchorPreset::MiddleTop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorPreset::TopRight => "top-right",
            AnchorPreset::MiddleRight => "middle-right",
            AnchorPreset::BottomRight => "bottom-right",
            AnchorPreset::TopLeft => "top-left",
            AnchorPreset::MiddleLeft => "middle-left",
            AnchorPreset::BottomLeft => "bottom-left",
            AnchorPreset::MiddleBottom => "middle-bottom",
            AnchorPreset::MiddleTop => "middle-top",
        }
    }
}

impl FromStr for AnchorPreset {
    type Err = HudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnchorPreset::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| HudError::InvalidPlacement(format!("unknown preset \"{s}\"")))
    }
}

impl<'de> Deserialize<'de> for AnchorPreset {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for AnchorPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A length along one axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(into = "String")]
pub enum Offset {
    /// Absolute cells (one CSS pixel is one terminal cell)
    Px(f64),
    /// Percentage of the reference extent
    Percent(f64),
    /// Percentage of the viewport height
    Vh(f64),
    /// Percentage of the viewport width
    Vw(f64),
}

impl Offset {
    pub const ZERO: Offset = Offset::Px(0.0);

    /// Convert to cells. `extent` is what a percentage refers to.
    pub fn to_cells(self, extent: f64, viewport: Size) -> f64 {
        match self {
            Offset::Px(v) => v,
            Offset::Percent(p) => extent * p / 100.0,
            Offset::Vh(v) => f64::from(viewport.height) * v / 100.0,
            Offset::Vw(v) => f64::from(viewport.width) * v / 100.0,
        }
    }
}

impl FromStr for Offset {
    type Err = HudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse = |num: &str| {
            num.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| HudError::InvalidOffset(s.to_string()))
        };

        if let Some(num) = s.strip_suffix('%') {
            Ok(Offset::Percent(parse(num)?))
        } else if let Some(num) = s.strip_suffix("px") {
            Ok(Offset::Px(parse(num)?))
        } else if let Some(num) = s.strip_suffix("vh") {
            Ok(Offset::Vh(parse(num)?))
        } else if let Some(num) = s.strip_suffix("vw") {
            Ok(Offset::Vw(parse(num)?))
        } else {
            Ok(Offset::Px(parse(s)?))
        }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Offset::Px(v) if *v == 0.0 => f.write_str("0"),
            Offset::Px(v) => write!(f, "{v}px"),
            Offset::Percent(v) => write!(f, "{v}%"),
            Offset::Vh(v) => write!(f, "{v}vh"),
            Offset::Vw(v) => write!(f, "{v}vw"),
        }
    }
}

impl From<Offset> for String {
    fn from(offset: Offset) -> Self {
        offset.to_string()
    }
}

impl<'de> Deserialize<'de> for Offset {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OffsetRepr {
            Number(f64),
            Text(String),
        }

        match OffsetRepr::deserialize(d)? {
            OffsetRepr::Number(v) if v.is_finite() => Ok(Offset::Px(v)),
            OffsetRepr::Number(v) => Err(serde::de::Error::custom(format!(
                "offset is not finite: {v}"
            ))),
            OffsetRepr::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Transform applied after anchoring
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    /// `translate(x, y)`; percentages refer to the overlay's own size
    Translate(Offset, Offset),
    /// Any other transform, passed through verbatim and laid out as identity
    Other(String),
}

impl Transform {
    pub const IDENTITY: Transform = Transform::Translate(Offset::ZERO, Offset::ZERO);

    /// Parse a CSS-style transform string. Never fails: unknown forms are kept.
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        if s.eq_ignore_ascii_case("none") || s.is_empty() {
            return Transform::IDENTITY;
        }

        let call = |name: &str| -> Option<Vec<Offset>> {
            let head = s.get(..name.len())?;
            if !head.eq_ignore_ascii_case(name) {
                return None;
            }
            let args = s[name.len()..].trim().strip_prefix('(')?.strip_suffix(')')?;
            args.split(',')
                .map(|a| a.parse::<Offset>().ok())
                .collect::<Option<Vec<_>>>()
        };

        // translateX/Y must be tried before translate, which is their prefix
        if let Some([x]) = call("translatex").as_deref() {
            return Transform::Translate(*x, Offset::ZERO);
        }
        if let Some([y]) = call("translatey").as_deref() {
            return Transform::Translate(Offset::ZERO, *y);
        }
        match call("translate").as_deref() {
            Some([x]) => Transform::Translate(*x, Offset::ZERO),
            Some([x, y]) => Transform::Translate(*x, *y),
            _ => Transform::Other(s.to_string()),
        }
    }

    /// Translation in cells for an overlay of the given size
    fn shift(&self, overlay: Size, viewport: Size) -> (f64, f64) {
        match self {
            Transform::Translate(x, y) => (
                x.to_cells(f64::from(overlay.width), viewport),
                y.to_cells(f64::from(overlay.height), viewport),
            ),
            Transform::Other(_) => (0.0, 0.0),
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Translate(x, y) => write!(f, "translate({x}, {y})"),
            Transform::Other(s) => f.write_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Transform {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(Transform::parse(&raw))
    }
}

impl Serialize for Transform {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

/// Explicit edge offsets; absent edges are unconstrained
///
/// Fields are decoded one by one: an offset or transform that does not parse
/// is logged and left unset without discarding the rest of the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplicitPlacement {
    #[serde(
        default,
        deserialize_with = "lenient_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub top: Option<Offset>,
    #[serde(
        default,
        deserialize_with = "lenient_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub right: Option<Offset>,
    #[serde(
        default,
        deserialize_with = "lenient_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub bottom: Option<Offset>,
    #[serde(
        default,
        deserialize_with = "lenient_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub left: Option<Offset>,
    #[serde(
        default,
        deserialize_with = "lenient_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub transform: Option<Transform>,
}

fn lenient_field<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    match Value::deserialize(d)? {
        Value::Null => Ok(None),
        value => match serde_json::from_value::<T>(value.clone()) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(e) => {
                warn!("Ignoring placement field {value}: {e}");
                Ok(None)
            }
        },
    }
}

/// Where the overlay sits: a named preset or an explicit record, never both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlacementDescriptor {
    Preset(AnchorPreset),
    Explicit(ExplicitPlacement),
}

impl Default for PlacementDescriptor {
    fn default() -> Self {
        PlacementDescriptor::Preset(AnchorPreset::MiddleBottom)
    }
}

impl From<AnchorPreset> for PlacementDescriptor {
    fn from(preset: AnchorPreset) -> Self {
        PlacementDescriptor::Preset(preset)
    }
}

/// Resolved edge offsets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnchorOffsets {
    pub top: Option<Offset>,
    pub right: Option<Offset>,
    pub bottom: Option<Offset>,
    pub left: Option<Offset>,
}

/// Terminal cell size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: u16,
    pub height: u16,
}

impl Size {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Top-left cell of the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: u16,
    pub y: u16,
}

/// Output of [`resolve`]
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPlacement {
    pub anchor: AnchorOffsets,
    pub transform: Option<Transform>,
}

impl ResolvedPlacement {
    /// Top-left cell for an overlay of size `overlay` inside `viewport`.
    ///
    /// Start edges (left/top) win over end edges (right/bottom). The result is
    /// clamped so the overlay stays on screen whenever it fits.
    pub fn origin(&self, viewport: Size, overlay: Size) -> Point {
        let (dx, dy) = self
            .transform
            .as_ref()
            .map(|t| t.shift(overlay, viewport))
            .unwrap_or((0.0, 0.0));

        let x = axis_origin(
            self.anchor.left,
            self.anchor.right,
            viewport.width,
            overlay.width,
            viewport,
        ) + dx;
        let y = axis_origin(
            self.anchor.top,
            self.anchor.bottom,
            viewport.height,
            overlay.height,
            viewport,
        ) + dy;

        Point {
            x: clamp_axis(x, viewport.width, overlay.width),
            y: clamp_axis(y, viewport.height, overlay.height),
        }
    }
}

fn axis_origin(
    start: Option<Offset>,
    end: Option<Offset>,
    extent: u16,
    len: u16,
    viewport: Size,
) -> f64 {
    let extent_f = f64::from(extent);
    match (start, end) {
        (Some(start), _) => start.to_cells(extent_f, viewport),
        (None, Some(end)) => extent_f - end.to_cells(extent_f, viewport) - f64::from(len),
        (None, None) => 0.0,
    }
}

fn clamp_axis(pos: f64, extent: u16, len: u16) -> u16 {
    let max = f64::from(extent.saturating_sub(len));
    pos.round().clamp(0.0, max) as u16
}

/// Map a placement descriptor to anchor offsets and a transform.
///
/// Total and pure: every preset has a fixed answer and explicit records pass
/// through unchanged.
pub fn resolve(descriptor: &PlacementDescriptor) -> ResolvedPlacement {
    let preset = match descriptor {
        PlacementDescriptor::Explicit(explicit) => {
            return ResolvedPlacement {
                anchor: AnchorOffsets {
                    top: explicit.top,
                    right: explicit.right,
                    bottom: explicit.bottom,
                    left: explicit.left,
                },
                transform: explicit.transform.clone(),
            };
        }
        PlacementDescriptor::Preset(preset) => *preset,
    };

    let zero = Some(Offset::ZERO);
    let half = Some(Offset::Percent(50.0));
    let mut anchor = AnchorOffsets::default();
    let transform = match preset {
        AnchorPreset::TopRight => {
            anchor.top = zero;
            anchor.right = zero;
            Transform::IDENTITY
        }
        AnchorPreset::MiddleRight => {
            anchor.top = half;
            anchor.right = zero;
            Transform::Translate(Offset::ZERO, Offset::Percent(-50.0))
        }
        AnchorPreset::BottomRight => {
            anchor.bottom = zero;
            anchor.right = zero;
            Transform::IDENTITY
        }
        AnchorPreset::TopLeft => {
            anchor.top = zero;
            anchor.left = zero;
            Transform::IDENTITY
        }
        AnchorPreset::MiddleLeft => {
            anchor.top = half;
            anchor.left = zero;
            Transform::Translate(Offset::ZERO, Offset::Percent(-50.0))
        }
        AnchorPreset::BottomLeft => {
            anchor.bottom = zero;
            anchor.left = zero;
            Transform::IDENTITY
        }
        AnchorPreset::MiddleBottom => {
            anchor.bottom = zero;
            anchor.left = half;
            Transform::Translate(Offset::Percent(-50.0), Offset::ZERO)
        }
        AnchorPreset::MiddleTop => {
            anchor.top = zero;
            anchor.left = half;
            Transform::Translate(Offset::Percent(-50.0), Offset::ZERO)
        }
    };

    ResolvedPlacement {
        anchor,
        transform: Some(transform),
    }
}
