// src/pipeline/event_export.rs
//
// JSON Lines export of occupancy events, one object per line with the frame
// position attached.

use crate::occupancy::OccupancyEvent;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
pub struct EventRecord<'a> {
    pub frame: u64,
    pub timestamp_ms: f64,
    #[serde(flatten)]
    pub event: &'a OccupancyEvent,
}

pub fn write_event<W: Write>(
    out: &mut W,
    frame: u64,
    timestamp_ms: f64,
    event: &OccupancyEvent,
) -> Result<()> {
    let record = EventRecord {
        frame,
        timestamp_ms,
        event,
    };
    serde_json::to_writer(&mut *out, &record)?;
    writeln!(out)?;
    Ok(())
}
