// src/event_log.rs
//
// The product output: one append-only line per occupancy transition,
// `[YYYY-MM-DD HH:MM:SS] message`. Lines are flushed as they are written so
// the file is usable while a long video is still being processed.

use crate::occupancy::OccupancyEvent;
use anyhow::{Context, Result};
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::info;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct EventLog<W: Write> {
    sink: W,
    lines_written: usize,
}

impl EventLog<File> {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening event log {}", path.display()))?;
        info!("📝 Event log: {}", path.display());
        Ok(Self::from_writer(file))
    }
}

impl<W: Write> EventLog<W> {
    pub fn from_writer(sink: W) -> Self {
        Self {
            sink,
            lines_written: 0,
        }
    }

    pub fn log(&mut self, message: &str) -> Result<()> {
        let line = format!("[{}] {}", Local::now().format(TIMESTAMP_FORMAT), message);
        info!("{}", line);
        writeln!(self.sink, "{}", line)?;
        self.sink.flush()?;
        self.lines_written += 1;
        Ok(())
    }

    pub fn record(&mut self, event: &OccupancyEvent) -> Result<()> {
        self.log(&event.to_string())
    }

    pub fn lines_written(&self) -> usize {
        self.lines_written
    }

    /// Write the closing line and hand back the sink.
    pub fn finish(mut self) -> Result<W> {
        self.log("Processing finished")?;
        Ok(self.sink)
    }

    /// Close the log whatever the outcome of the run. A failed run gets a
    /// `Processing stopped: <error>` line before the closing line.
    pub fn finish_with<T>(mut self, outcome: Result<T>) -> Result<T> {
        if let Err(e) = &outcome {
            self.log(&format!("Processing stopped: {:#}", e))?;
        }
        self.finish()?;
        outcome
    }
}
