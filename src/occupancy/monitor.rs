// src/occupancy/monitor.rs
//
// Owns the whole occupancy state of one video: spot tracker, gate tracker and
// the optional plate reader. One `process` call per frame; plates are read
// synchronously, exactly once per transition that wants one.

use crate::geometry::Rect;
use crate::plate::{PlateReader, PlateReading};
use crate::regions::{Gate, ParkingSpot, RegionSet};
use crate::types::OccupancyConfig;
use opencv::core::Mat;
use tracing::info;

use super::gate_tracker::GateTracker;
use super::spot_tracker::{SpotTracker, SpotTransition};
use super::state::{OccupancyEvent, SpotState};

pub struct OccupancyMonitor {
    spots: SpotTracker,
    gates: GateTracker,
    plate_reader: Option<Box<dyn PlateReader>>,
    read_plates_on_spots: bool,
}

impl OccupancyMonitor {
    /// `plate_reader` is ignored when plate recognition is disabled.
    pub fn new(
        regions: RegionSet,
        config: &OccupancyConfig,
        plate_reader: Option<Box<dyn PlateReader>>,
        read_plates_on_spots: bool,
    ) -> Self {
        let plate_reader = plate_reader.filter(|_| config.enable_plate_recognition);
        info!(
            "Occupancy monitor: {} spot(s), {} gate(s), spot>{:.2}, gate>{:.2}, zone +{}px, plates {}",
            regions.spots.len(),
            regions.gates.len(),
            config.spot_iou_threshold,
            config.gate_iou_threshold,
            config.gate_max_distance,
            if plate_reader.is_some() { "on" } else { "off" }
        );

        Self {
            spots: SpotTracker::new(regions.spots, config.spot_iou_threshold),
            gates: GateTracker::new(
                regions.gates,
                config.gate_max_distance,
                config.gate_iou_threshold,
            ),
            plate_reader,
            read_plates_on_spots,
        }
    }

    /// Feed one frame's detections. Spot events come first (index order),
    /// then gate openings.
    pub fn process(&mut self, frame: &Mat, detections: &[Rect]) -> Vec<OccupancyEvent> {
        let mut events = Vec::new();

        for transition in self.spots.update(detections) {
            let event = match transition {
                SpotTransition::Occupied { spot, vehicle } => {
                    let plate = if self.read_plates_on_spots {
                        self.read_plate(frame, &vehicle)
                    } else {
                        None
                    };
                    OccupancyEvent::SpotOccupied {
                        spot,
                        vehicle,
                        plate,
                    }
                }
                SpotTransition::Vacated { spot } => OccupancyEvent::SpotVacated { spot },
            };
            events.push(event);
        }

        for opening in self.gates.update(detections) {
            let plate = self.read_plate(frame, &opening.vehicle);
            events.push(OccupancyEvent::GateOpened {
                gate: opening.gate,
                role: opening.role,
                vehicle: opening.vehicle,
                plate,
            });
        }

        events
    }

    fn read_plate(&mut self, frame: &Mat, vehicle: &Rect) -> Option<PlateReading> {
        self.plate_reader
            .as_mut()
            .map(|reader| reader.read_plate(frame, vehicle))
    }

    pub fn spots(&self) -> &[ParkingSpot] {
        self.spots.spots()
    }

    pub fn spot_states(&self) -> &[SpotState] {
        self.spots.states()
    }

    pub fn occupied_count(&self) -> usize {
        self.spots.occupied_count()
    }

    pub fn gates(&self) -> &[Gate] {
        self.gates.gates()
    }

    pub fn gate_zones(&self) -> &[Rect] {
        self.gates.zones()
    }

    pub fn gate_open_states(&self) -> &[bool] {
        self.gates.open_states()
    }
}
