// src/occupancy/spot_tracker.rs
//
// Per-spot occupancy with edge-triggered transitions.
//
// Each frame, every spot takes the FIRST detection (in detector order) that
// covers more than `threshold` of the spot. There is no best-match search and
// no identity tracking: a spot is occupied by "some car" this frame or it is
// not. Only Unoccupied -> Occupied and Occupied -> Unoccupied produce a
// transition; a drifting bbox on an occupied spot just refreshes the stored
// rectangle.
//
// A frame with no detections is a frame where nothing matches, so every
// occupied spot vacates. Detections from earlier frames are never reused.

use crate::geometry::{overlap_ratio, Rect};
use crate::regions::ParkingSpot;
use tracing::debug;

use super::state::SpotState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpotTransition {
    Occupied { spot: usize, vehicle: Rect },
    Vacated { spot: usize },
}

pub struct SpotTracker {
    spots: Vec<ParkingSpot>,
    states: Vec<SpotState>,
    threshold: f32,
}

impl SpotTracker {
    pub fn new(spots: Vec<ParkingSpot>, threshold: f32) -> Self {
        let states = vec![SpotState::Unoccupied; spots.len()];
        Self {
            spots,
            states,
            threshold,
        }
    }

    /// Advance one frame. Transitions come out in spot index order.
    pub fn update(&mut self, detections: &[Rect]) -> Vec<SpotTransition> {
        let mut transitions = Vec::new();

        for (spot, state) in self.spots.iter().zip(self.states.iter_mut()) {
            let matched = detections
                .iter()
                .find(|det| overlap_ratio(&spot.rect, det) > self.threshold)
                .copied();

            match (matched, *state) {
                (Some(vehicle), SpotState::Unoccupied) => {
                    debug!("Spot {} occupied by {}", spot.index + 1, vehicle);
                    *state = SpotState::Occupied(vehicle);
                    transitions.push(SpotTransition::Occupied {
                        spot: spot.index,
                        vehicle,
                    });
                }
                (Some(vehicle), SpotState::Occupied(_)) => {
                    *state = SpotState::Occupied(vehicle);
                }
                (None, SpotState::Occupied(_)) => {
                    debug!("Spot {} vacated", spot.index + 1);
                    *state = SpotState::Unoccupied;
                    transitions.push(SpotTransition::Vacated { spot: spot.index });
                }
                (None, SpotState::Unoccupied) => {}
            }
        }

        transitions
    }

    pub fn spots(&self) -> &[ParkingSpot] {
        &self.spots
    }

    pub fn states(&self) -> &[SpotState] {
        &self.states
    }

    pub fn occupied_count(&self) -> usize {
        self.states.iter().filter(|s| s.is_occupied()).count()
    }
}
