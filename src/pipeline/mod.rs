// src/pipeline/mod.rs

pub mod event_export;
pub mod metrics;

pub use event_export::write_event;
pub use metrics::{MetricsSummary, PipelineMetrics};
