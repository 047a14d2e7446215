//! Render-ready projection of the HUD state

use crate::binding::{Binding, HoldDuration};
use crate::key::KeyId;
use crate::position::{resolve, PlacementDescriptor, ResolvedPlacement};
use crate::progress::{HoldPhase, HoldProgressEngine, TickScheduler};
use crate::tracker::KeyPressTracker;

/// One prompt row
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayRow {
    pub key: KeyId,
    pub label: String,
    pub icon: String,
    pub hold: Option<HoldDuration>,
    pub pressed: bool,
    pub progress: u8,
    pub phase: HoldPhase,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySnapshot {
    pub placement: ResolvedPlacement,
    /// Rows in configuration order, which is the stacking order on screen
    pub rows: Vec<OverlayRow>,
}

/// Pair every binding with its pressed flag and progress.
pub fn compose<S: TickScheduler>(
    bindings: &[Binding],
    pressed: &KeyPressTracker,
    engine: &HoldProgressEngine<S>,
    placement: &PlacementDescriptor,
) -> OverlaySnapshot {
    let rows = bindings
        .iter()
        .map(|b| OverlayRow {
            key: b.key.clone(),
            label: b.label.clone(),
            icon: b.icon.clone(),
            hold: b.hold,
            pressed: pressed.contains(&b.key),
            progress: engine.progress(&b.key),
            phase: engine.phase(&b.key),
        })
        .collect();

    OverlaySnapshot {
        placement: resolve(placement),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::AnchorPreset;
    use crate::progress::{CompletionPolicy, ManualScheduler};

    #[test]
    fn test_compose_keeps_order_and_state() {
        let bindings = vec![
            Binding::new("q", "Quit"),
            Binding::new("F1", "Open Menu").with_hold_ms(1000),
            Binding::new("e", "Use"),
        ];
        let mut tracker = KeyPressTracker::new();
        let mut engine = HoldProgressEngine::new(ManualScheduler::new(), CompletionPolicy::Hold);

        tracker.press(&KeyId::new("F1"));
        engine.press(&bindings[1]);
        let tag = engine.scheduler().live_tag(&KeyId::new("F1")).unwrap();
        engine.tick(&tag);
        engine.tick(&tag);

        let placement = PlacementDescriptor::Preset(AnchorPreset::TopLeft);
        let snap = compose(&bindings, &tracker, &engine, &placement);

        let keys: Vec<_> = snap.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["q", "F1", "e"]);
        assert!(!snap.rows[0].pressed);
        assert!(snap.rows[1].pressed);
        assert_eq!(snap.rows[1].progress, 2);
        assert_eq!(snap.rows[1].phase, HoldPhase::Advancing);
        assert_eq!(snap.rows[2].progress, 0);
        assert_eq!(snap.placement, resolve(&placement));
    }

    #[test]
    fn test_compose_is_a_pure_projection() {
        let bindings = vec![Binding::new("F2", "Inventory")];
        let tracker = KeyPressTracker::new();
        let engine = HoldProgressEngine::new(ManualScheduler::new(), CompletionPolicy::Hold);
        let placement = PlacementDescriptor::default();
        let a = compose(&bindings, &tracker, &engine, &placement);
        let b = compose(&bindings, &tracker, &engine, &placement);
        assert_eq!(a, b);
    }
}
