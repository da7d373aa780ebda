// src/occupancy/state.rs

use crate::geometry::Rect;
use crate::plate::PlateReading;
use crate::regions::GateRole;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpotState {
    #[default]
    Unoccupied,
    /// Holds the detection that matched the spot on the latest frame
    Occupied(Rect),
}

impl SpotState {
    pub fn is_occupied(&self) -> bool {
        matches!(self, SpotState::Occupied(_))
    }
}

/// Edge-triggered occupancy change. `Display` renders the event-log message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OccupancyEvent {
    SpotOccupied {
        spot: usize,
        vehicle: Rect,
        #[serde(skip_serializing_if = "Option::is_none")]
        plate: Option<PlateReading>,
    },
    SpotVacated {
        spot: usize,
    },
    GateOpened {
        gate: usize,
        role: GateRole,
        vehicle: Rect,
        #[serde(skip_serializing_if = "Option::is_none")]
        plate: Option<PlateReading>,
    },
}

impl fmt::Display for OccupancyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Spots are numbered from 1 for humans
        match self {
            OccupancyEvent::SpotOccupied {
                spot,
                vehicle,
                plate: Some(plate),
            } => write!(
                f,
                "Car {} with plate '{}' occupies Spot {}",
                vehicle,
                plate,
                spot + 1
            ),
            OccupancyEvent::SpotOccupied {
                spot,
                vehicle,
                plate: None,
            } => write!(f, "Car {} occupies Spot {}", vehicle, spot + 1),
            OccupancyEvent::SpotVacated { spot } => write!(f, "Spot {} freed", spot + 1),
            OccupancyEvent::GateOpened {
                role,
                plate: Some(plate),
                ..
            } => write!(f, "Car with plate '{}' {}", plate, role.verb()),
            OccupancyEvent::GateOpened {
                role, plate: None, ..
            } => write!(f, "Car {}", role.verb()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_messages() {
        let occupied = OccupancyEvent::SpotOccupied {
            spot: 0,
            vehicle: Rect::new(12, 12, 46, 46),
            plate: None,
        };
        assert_eq!(occupied.to_string(), "Car (12, 12, 46, 46) occupies Spot 1");

        let with_plate = OccupancyEvent::SpotOccupied {
            spot: 2,
            vehicle: Rect::new(1, 2, 3, 4),
            plate: Some(PlateReading::Unrecognized),
        };
        assert_eq!(
            with_plate.to_string(),
            "Car (1, 2, 3, 4) with plate 'UNRECOGNIZED' occupies Spot 3"
        );

        assert_eq!(OccupancyEvent::SpotVacated { spot: 4 }.to_string(), "Spot 5 freed");

        let exit = OccupancyEvent::GateOpened {
            gate: 1,
            role: GateRole::Exit,
            vehicle: Rect::new(0, 0, 10, 10),
            plate: Some(PlateReading::Plate("EL 12345".to_string())),
        };
        assert_eq!(exit.to_string(), "Car with plate 'EL 12345' exiting");
    }

    #[test]
    fn test_event_json_shape() {
        let event = OccupancyEvent::GateOpened {
            gate: 0,
            role: GateRole::Entry,
            vehicle: Rect::new(5, 6, 7, 8),
            plate: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "gate_opened");
        assert_eq!(json["role"], "entry");
        assert_eq!(json["vehicle"]["width"], 7);
        assert!(json.get("plate").is_none());
    }
}
