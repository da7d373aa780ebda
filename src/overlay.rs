// src/overlay.rs
//
// Per-frame annotation: parking spots (green free / red occupied), gates
// (filled, red closed / green open), optional gate detection zones, and the
// raw detections. Read-only with respect to occupancy state.

use crate::geometry::Rect;
use crate::occupancy::OccupancyMonitor;
use anyhow::Result;
use opencv::{
    core::{self, Mat, Point, Scalar},
    imgproc,
};

/// BGR colors.
pub mod colors {
    use opencv::core::Scalar;

    pub const FREE: Scalar = Scalar::new(0.0, 255.0, 0.0, 0.0);
    pub const OCCUPIED: Scalar = Scalar::new(0.0, 0.0, 255.0, 0.0);
    pub const GATE_OPEN: Scalar = Scalar::new(0.0, 255.0, 0.0, 0.0);
    pub const GATE_CLOSED: Scalar = Scalar::new(0.0, 0.0, 255.0, 0.0);
    pub const DETECTION: Scalar = Scalar::new(255.0, 0.0, 0.0, 0.0);
    pub const ZONE: Scalar = Scalar::new(255.0, 0.0, 255.0, 0.0);
    pub const LABEL: Scalar = Scalar::new(255.0, 255.0, 255.0, 0.0);
}

pub fn draw_frame(
    frame: &mut Mat,
    monitor: &OccupancyMonitor,
    detections: &[Rect],
    draw_zones: bool,
) -> Result<()> {
    draw_detections(frame, detections)?;
    draw_spots(frame, monitor)?;
    draw_gates(frame, monitor, draw_zones)?;
    draw_summary(frame, monitor, detections.len())
}

fn draw_detections(frame: &mut Mat, detections: &[Rect]) -> Result<()> {
    for det in detections {
        draw_box(frame, det, colors::DETECTION, 2)?;
        draw_label(frame, "Car", Point::new(det.x, det.y - 10), colors::DETECTION)?;
    }
    Ok(())
}

fn draw_spots(frame: &mut Mat, monitor: &OccupancyMonitor) -> Result<()> {
    for (spot, state) in monitor.spots().iter().zip(monitor.spot_states()) {
        let color = if state.is_occupied() {
            colors::OCCUPIED
        } else {
            colors::FREE
        };
        let r = spot.rect;
        draw_box(frame, &r, color, 2)?;
        draw_label(
            frame,
            &format!("Spot {}", spot.index + 1),
            Point::new(r.x, r.y - 10),
            color,
        )?;
    }
    Ok(())
}

fn draw_gates(frame: &mut Mat, monitor: &OccupancyMonitor, draw_zones: bool) -> Result<()> {
    for ((gate, zone), open) in monitor
        .gates()
        .iter()
        .zip(monitor.gate_zones())
        .zip(monitor.gate_open_states())
    {
        let color = if *open {
            colors::GATE_OPEN
        } else {
            colors::GATE_CLOSED
        };
        let r = gate.rect;
        draw_box(frame, &r, color, -1)?;
        draw_label(frame, gate.role.label(), Point::new(r.x, r.y - 10), colors::LABEL)?;

        if draw_zones {
            draw_box(frame, zone, colors::ZONE, 2)?;
            draw_label(
                frame,
                "Detection zone",
                Point::new(zone.x, zone.bottom() + 20),
                colors::ZONE,
            )?;
        }
    }
    Ok(())
}

fn draw_summary(frame: &mut Mat, monitor: &OccupancyMonitor, detections: usize) -> Result<()> {
    let total = monitor.spots().len();
    let text = format!(
        "Free: {}/{} | Cars: {}",
        total - monitor.occupied_count(),
        total,
        detections
    );
    imgproc::rectangle(
        frame,
        core::Rect::new(5, 5, 260, 30),
        Scalar::new(40.0, 40.0, 40.0, 0.0),
        -1,
        imgproc::LINE_8,
        0,
    )?;
    imgproc::put_text(
        frame,
        &text,
        Point::new(12, 26),
        imgproc::FONT_HERSHEY_SIMPLEX,
        0.6,
        colors::LABEL,
        1,
        imgproc::LINE_8,
        false,
    )?;
    Ok(())
}

fn draw_box(frame: &mut Mat, rect: &Rect, color: Scalar, thickness: i32) -> Result<()> {
    imgproc::rectangle(frame, (*rect).into(), color, thickness, imgproc::LINE_8, 0)?;
    Ok(())
}

fn draw_label(frame: &mut Mat, text: &str, origin: Point, color: Scalar) -> Result<()> {
    imgproc::put_text(
        frame,
        text,
        origin,
        imgproc::FONT_HERSHEY_SIMPLEX,
        0.5,
        color,
        2,
        imgproc::LINE_8,
        false,
    )?;
    Ok(())
}
