// src/occupancy/mod.rs

pub mod gate_tracker;
pub mod monitor;
pub mod spot_tracker;
pub mod state;

pub use monitor::OccupancyMonitor;
pub use state::OccupancyEvent;
