// src/pipeline/metrics.rs
//
// Per-video counters, summarized at the end of each run.

use crate::occupancy::OccupancyEvent;
use crate::plate::PlateReading;
use crate::regions::GateRole;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub total_frames: u64,
    pub frames_with_detections: u64,
    pub total_detections: u64,
    pub spots_occupied: u64,
    pub spots_vacated: u64,
    pub gate_entries: u64,
    pub gate_exits: u64,
    pub plates_recognized: u64,
    pub plates_unrecognized: u64,
    pub started_at: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: 0,
            frames_with_detections: 0,
            total_detections: 0,
            spots_occupied: 0,
            spots_vacated: 0,
            gate_entries: 0,
            gate_exits: 0,
            plates_recognized: 0,
            plates_unrecognized: 0,
            started_at: Instant::now(),
        }
    }

    pub fn record_frame(&mut self, detections: usize) {
        self.total_frames += 1;
        self.total_detections += detections as u64;
        if detections > 0 {
            self.frames_with_detections += 1;
        }
    }

    pub fn record_event(&mut self, event: &OccupancyEvent) {
        let plate = match event {
            OccupancyEvent::SpotOccupied { plate, .. } => {
                self.spots_occupied += 1;
                plate
            }
            OccupancyEvent::SpotVacated { .. } => {
                self.spots_vacated += 1;
                &None
            }
            OccupancyEvent::GateOpened { role, plate, .. } => {
                match role {
                    GateRole::Entry => self.gate_entries += 1,
                    GateRole::Exit => self.gate_exits += 1,
                }
                plate
            }
        };

        match plate {
            Some(PlateReading::Plate(_)) => self.plates_recognized += 1,
            Some(PlateReading::Unrecognized) => self.plates_unrecognized += 1,
            None => {}
        }
    }

    pub fn fps(&self) -> f64 {
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            self.total_frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames,
            frames_with_detections: self.frames_with_detections,
            avg_detections_per_frame: self.total_detections as f64
                / self.total_frames.max(1) as f64,
            spots_occupied: self.spots_occupied,
            spots_vacated: self.spots_vacated,
            gate_entries: self.gate_entries,
            gate_exits: self.gate_exits,
            plates_recognized: self.plates_recognized,
            plates_unrecognized: self.plates_unrecognized,
            fps: self.fps(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub frames_with_detections: u64,
    pub avg_detections_per_frame: f64,
    pub spots_occupied: u64,
    pub spots_vacated: u64,
    pub gate_entries: u64,
    pub gate_exits: u64,
    pub plates_recognized: u64,
    pub plates_unrecognized: u64,
    pub fps: f64,
    pub elapsed_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    #[test]
    fn test_counts_events_and_plates() {
        let mut m = PipelineMetrics::new();
        m.record_frame(0);
        m.record_frame(3);
        m.record_event(&OccupancyEvent::SpotOccupied {
            spot: 0,
            vehicle: Rect::new(0, 0, 1, 1),
            plate: Some(PlateReading::Unrecognized),
        });
        m.record_event(&OccupancyEvent::SpotVacated { spot: 0 });
        m.record_event(&OccupancyEvent::GateOpened {
            gate: 1,
            role: GateRole::Exit,
            vehicle: Rect::new(0, 0, 1, 1),
            plate: Some(PlateReading::Plate("EL 12345".to_string())),
        });

        let s = m.summary();
        assert_eq!(s.total_frames, 2);
        assert_eq!(s.frames_with_detections, 1);
        assert!((s.avg_detections_per_frame - 1.5).abs() < 1e-9);
        assert_eq!((s.spots_occupied, s.spots_vacated), (1, 1));
        assert_eq!((s.gate_entries, s.gate_exits), (0, 1));
        assert_eq!((s.plates_recognized, s.plates_unrecognized), (1, 1));
    }
}
