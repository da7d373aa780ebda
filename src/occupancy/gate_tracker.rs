// src/occupancy/gate_tracker.rs
//
// Gates open when any vehicle enters their detection zone. Unlike spots there
// is no carried-over evidence: the open/closed flag is rebuilt from the
// current detections every frame and OR-reduced over all of them.

use crate::geometry::{overlap_ratio, Rect};
use crate::regions::{Gate, GateRole};
use tracing::debug;

/// A gate went from closed to open on this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateOpening {
    pub gate: usize,
    pub role: GateRole,
    /// First detection (detector order) found inside the zone
    pub vehicle: Rect,
}

pub struct GateTracker {
    gates: Vec<Gate>,
    zones: Vec<Rect>,
    open: Vec<bool>,
    threshold: f32,
}

impl GateTracker {
    pub fn new(gates: Vec<Gate>, max_distance: i32, threshold: f32) -> Self {
        let zones = gates.iter().map(|g| g.detection_zone(max_distance)).collect();
        let open = vec![false; gates.len()];
        Self {
            gates,
            zones,
            open,
            threshold,
        }
    }

    pub fn update(&mut self, detections: &[Rect]) -> Vec<GateOpening> {
        let mut openings = Vec::new();

        for ((gate, zone), open) in self
            .gates
            .iter()
            .zip(&self.zones)
            .zip(self.open.iter_mut())
        {
            let trigger = detections
                .iter()
                .find(|det| overlap_ratio(det, zone) > self.threshold)
                .copied();

            match (trigger, *open) {
                (Some(vehicle), false) => {
                    debug!("{} opened by {}", gate.role.label(), vehicle);
                    openings.push(GateOpening {
                        gate: gate.index,
                        role: gate.role,
                        vehicle,
                    });
                }
                (None, true) => debug!("{} closed", gate.role.label()),
                _ => {}
            }

            *open = trigger.is_some();
        }

        openings
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn zones(&self) -> &[Rect] {
        &self.zones
    }

    pub fn open_states(&self) -> &[bool] {
        &self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_and_exit() -> Vec<Gate> {
        vec![
            Gate {
                index: 0,
                role: GateRole::Entry,
                rect: Rect::new(100, 100, 20, 40),
            },
            Gate {
                index: 1,
                role: GateRole::Exit,
                rect: Rect::new(400, 100, 20, 40),
            },
        ]
    }

    #[test]
    fn test_entry_zone_reaches_backwards() {
        let mut t = GateTracker::new(entry_and_exit(), 20, 0.01);

        // Left of the entry gate, inside the 20px extension only
        let approaching = Rect::new(82, 110, 10, 10);
        assert_eq!(overlap_ratio(&approaching, &entry_and_exit()[0].rect), 0.0);

        let openings = t.update(&[approaching]);
        assert_eq!(openings.len(), 1);
        assert_eq!(openings[0].role, GateRole::Entry);
        assert_eq!(t.open_states(), &[true, false]);
    }

    #[test]
    fn test_far_vehicle_keeps_gates_closed() {
        let mut t = GateTracker::new(entry_and_exit(), 20, 0.01);
        assert!(t.update(&[Rect::new(60, 110, 10, 10)]).is_empty());
        assert!(t.update(&[Rect::new(250, 300, 30, 30)]).is_empty());
        assert_eq!(t.open_states(), &[false, false]);
    }

    #[test]
    fn test_exit_zone_reaches_forwards() {
        let mut t = GateTracker::new(entry_and_exit(), 20, 0.01);
        // Right of the exit gate, inside its extension
        let leaving = Rect::new(425, 110, 10, 10);
        let openings = t.update(&[leaving]);
        assert_eq!(
            openings,
            vec![GateOpening {
                gate: 1,
                role: GateRole::Exit,
                vehicle: leaving
            }]
        );
        // Same distance to the left of the exit gate is outside
        let mut t = GateTracker::new(entry_and_exit(), 20, 0.01);
        assert!(t.update(&[Rect::new(385, 110, 10, 10)]).is_empty());
    }

    #[test]
    fn test_open_fires_once_until_closed() {
        let mut t = GateTracker::new(entry_and_exit(), 20, 0.01);
        let car = Rect::new(100, 110, 10, 10);
        assert_eq!(t.update(&[car]).len(), 1);
        assert!(t.update(&[car]).is_empty());
        assert!(t.update(&[car.translated(3, 0)]).is_empty());
        assert!(t.update(&[]).is_empty());
        assert!(!t.open_states()[0]);
        assert_eq!(t.update(&[car]).len(), 1);
    }

    #[test]
    fn test_any_detection_keeps_gate_open() {
        let mut t = GateTracker::new(entry_and_exit(), 20, 0.01);
        let inside = Rect::new(100, 110, 10, 10);
        let outside = Rect::new(600, 400, 10, 10);

        t.update(&[inside]);
        // The vehicle inside the zone comes first, then one far away: the
        // later detection must not close the gate again.
        assert!(t.update(&[inside, outside]).is_empty());
        assert!(t.update(&[outside, inside]).is_empty());
        assert!(t.open_states()[0]);
    }

    #[test]
    fn test_trigger_is_first_qualifying_detection() {
        let mut t = GateTracker::new(entry_and_exit(), 20, 0.01);
        let outside = Rect::new(600, 400, 10, 10);
        let a = Rect::new(90, 110, 10, 10);
        let b = Rect::new(105, 110, 10, 10);
        let openings = t.update(&[outside, a, b]);
        assert_eq!(openings.len(), 1);
        assert_eq!(openings[0].vehicle, a);
    }
}
