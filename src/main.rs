// src/main.rs

mod config;
mod event_log;
mod geometry;
mod occupancy;
mod ocr;
mod overlay;
mod pipeline;
mod plate;
mod regions;
mod types;
mod vehicle_detection;
mod video_processor;

use anyhow::{Context, Result};
use event_log::EventLog;
use occupancy::OccupancyMonitor;
use ocr::TesseractRecognizer;
use opencv::videoio::{VideoWriter, VideoWriterTrait};
use pipeline::{MetricsSummary, PipelineMetrics};
use plate::{OcrPlateReader, PlateReader};
use regions::RegionSet;
use std::fs::File;
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use types::Config;
use vehicle_detection::SaturationDetector;
use video_processor::{VideoProcessor, VideoReader};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parking_occupancy={}", config.logging.level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🅿️  Parking Occupancy Monitor Starting");
    info!("✓ Configuration loaded from {}", config_path);

    let regions = RegionSet::load(&config.regions.spots_path, &config.regions.gates_path)
        .context("loading parking spots and gates")?;
    info!(
        "✓ Loaded {} parking spot(s) and {} gate(s)",
        regions.spots.len(),
        regions.gates.len()
    );
    if regions.gates.len() < 2 {
        warn!("Only {} gate(s) defined, entry/exit logging is partial", regions.gates.len());
    }

    let plates_available = config.occupancy.enable_plate_recognition && probe_ocr(&config);

    let video_processor = VideoProcessor::new(config.clone());
    let video_files = video_processor.find_video_files()?;

    if video_files.is_empty() {
        error!("No video files found in {}", config.video.input_dir);
        return Ok(());
    }

    info!("Found {} video file(s) to process", video_files.len());

    for (idx, video_path) in video_files.iter().enumerate() {
        info!("========================================");
        info!(
            "Processing video {}/{}: {}",
            idx + 1,
            video_files.len(),
            video_path.display()
        );

        match process_video(
            video_path,
            &video_processor,
            &config,
            regions.clone(),
            plates_available,
        ) {
            Ok(stats) => log_summary(&stats),
            Err(e) => error!("Failed to process video {}: {:#}", video_path.display(), e),
        }
    }

    Ok(())
}

/// Plate recognition without a working OCR binary degrades to "off".
fn probe_ocr(config: &Config) -> bool {
    match TesseractRecognizer::new(&config.plates).probe() {
        Ok(version) => {
            info!("✓ Plate recognition ready ({})", version);
            true
        }
        Err(e) => {
            warn!(
                "⚠️  Plate recognition unavailable: {:#}. Continuing without it.",
                e
            );
            false
        }
    }
}

fn build_plate_reader(config: &Config) -> Box<dyn PlateReader> {
    Box::new(OcrPlateReader::new(
        TesseractRecognizer::new(&config.plates),
        &config.plates,
    ))
}

fn process_video(
    video_path: &Path,
    video_processor: &VideoProcessor,
    config: &Config,
    regions: RegionSet,
    plates_available: bool,
) -> Result<MetricsSummary> {
    let mut event_log = EventLog::open(&video_processor.log_path(video_path))?;
    let outcome = run_video(
        video_path,
        video_processor,
        config,
        regions,
        plates_available,
        &mut event_log,
    );
    event_log.finish_with(outcome)
}

fn run_video(
    video_path: &Path,
    video_processor: &VideoProcessor,
    config: &Config,
    regions: RegionSet,
    plates_available: bool,
    event_log: &mut EventLog<File>,
) -> Result<MetricsSummary> {
    let mut reader = match video_processor.open_video(video_path) {
        Ok(reader) => reader,
        Err(e) => {
            event_log.log("Unable to read video frame")?;
            return Err(e);
        }
    };
    let mut writer =
        video_processor.create_writer(video_path, reader.width, reader.height, reader.fps)?;
    let mut events_file = video_processor.create_events_file(video_path)?;

    let detector = SaturationDetector::new(&config.detection)?;
    let plate_reader = plates_available.then(|| build_plate_reader(config));
    let mut monitor = OccupancyMonitor::new(
        regions,
        &config.occupancy,
        plate_reader,
        config.plates.read_on_spot_occupied,
    );
    let mut metrics = PipelineMetrics::new();

    let outcome = run_frames(
        config,
        &mut reader,
        writer.as_mut(),
        events_file.as_mut(),
        &detector,
        &mut monitor,
        &mut metrics,
        event_log,
    );

    if let Some(mut w) = writer {
        if let Err(e) = w.release() {
            warn!("Failed to release video writer: {}", e);
        }
    }
    outcome?;

    if metrics.total_frames == 0 {
        event_log.log("Unable to read video frame")?;
        anyhow::bail!("no frames decoded from {}", video_path.display());
    }

    Ok(metrics.summary())
}

#[allow(clippy::too_many_arguments)]
fn run_frames(
    config: &Config,
    reader: &mut VideoReader,
    mut writer: Option<&mut VideoWriter>,
    mut events_file: Option<&mut File>,
    detector: &SaturationDetector,
    monitor: &mut OccupancyMonitor,
    metrics: &mut PipelineMetrics,
    event_log: &mut EventLog<File>,
) -> Result<()> {
    while let Some(mut frame) = reader.read_frame()? {
        let detections = detector
            .detect(&frame.mat)
            .with_context(|| format!("detecting vehicles in frame {}", frame.index))?;
        let events = monitor.process(&frame.mat, &detections);

        for event in &events {
            event_log.record(event)?;
            metrics.record_event(event);
            if let Some(file) = events_file.as_deref_mut() {
                pipeline::write_event(file, frame.index, frame.timestamp_ms, event)?;
            }
        }
        metrics.record_frame(detections.len());

        debug!(
            "Frame {}: {} detection(s), {} event(s), {} occupied",
            frame.index,
            detections.len(),
            events.len(),
            monitor.occupied_count()
        );

        if let Some(w) = writer.as_deref_mut() {
            overlay::draw_frame(
                &mut frame.mat,
                monitor,
                &detections,
                config.video.draw_detection_zones,
            )?;
            w.write(&frame.mat)
                .with_context(|| format!("writing frame {}", frame.index))?;
        }

        let interval = config.video.progress_interval;
        if interval > 0 && metrics.total_frames % interval == 0 {
            info!(
                "Progress: {:.1}% ({} frames), {}/{} spots occupied",
                reader.progress(),
                metrics.total_frames,
                monitor.occupied_count(),
                monitor.spots().len()
            );
        }
    }

    Ok(())
}

fn log_summary(stats: &MetricsSummary) {
    info!("✓ Video processed successfully!");
    info!("  Total frames: {}", stats.total_frames);
    info!(
        "  Frames with vehicles: {} ({:.1}%)",
        stats.frames_with_detections,
        100.0 * stats.frames_with_detections as f64 / stats.total_frames.max(1) as f64
    );
    info!(
        "  🚗 Average: {:.1} vehicles per frame",
        stats.avg_detections_per_frame
    );
    info!(
        "  🅿️  Spots occupied: {} | freed: {}",
        stats.spots_occupied, stats.spots_vacated
    );
    info!(
        "  🚧 Gate entries: {} | exits: {}",
        stats.gate_entries, stats.gate_exits
    );
    if stats.plates_recognized + stats.plates_unrecognized > 0 {
        info!(
            "  🔤 Plates read: {} | unrecognized: {}",
            stats.plates_recognized, stats.plates_unrecognized
        );
    }
    info!(
        "  Processing Speed: {:.1} FPS ({:.1}s)",
        stats.fps, stats.elapsed_secs
    );
}
