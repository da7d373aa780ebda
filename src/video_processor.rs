// src/video_processor.rs

use crate::types::{Config, Frame};
use anyhow::{Context, Result};
use opencv::{
    core::{self, Mat},
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTraitConst, VideoWriter},
};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];

pub struct VideoProcessor {
    config: Config,
}

impl VideoProcessor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Videos under `input_dir`, sorted so batch runs are reproducible.
    /// Files we produced ourselves are skipped.
    pub fn find_video_files(&self) -> Result<Vec<PathBuf>> {
        let mut videos = Vec::new();

        for entry in WalkDir::new(&self.config.video.input_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if is_video_file(path) && !is_processed_output(path) {
                videos.push(path.to_path_buf());
            }
        }

        videos.sort();
        info!("Found {} video files", videos.len());
        Ok(videos)
    }

    pub fn open_video(&self, path: &Path) -> Result<VideoReader> {
        info!("Opening video: {}", path.display());

        let path_str = path
            .to_str()
            .with_context(|| format!("non UTF-8 path {}", path.display()))?;
        let cap = VideoCapture::from_file(path_str, videoio::CAP_ANY)?;

        if !cap.is_opened()? {
            anyhow::bail!("Failed to open video file {}", path.display());
        }

        let fps = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FPS)?;
        let total_frames = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_COUNT)? as i32;
        let width = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_WIDTH)? as i32;
        let height = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_HEIGHT)? as i32;

        info!(
            "Video properties: {}x{} @ {:.1} FPS, {} frames",
            width, height, fps, total_frames
        );

        Ok(VideoReader {
            cap,
            // Some containers report 0 FPS; timestamps then fall back to 30
            fps: if fps > 0.0 { fps } else { 30.0 },
            total_frames,
            current_frame: 0,
            width,
            height,
        })
    }

    pub fn create_writer(
        &self,
        input_path: &Path,
        width: i32,
        height: i32,
        fps: f64,
    ) -> Result<Option<VideoWriter>> {
        if !self.config.video.save_annotated {
            return Ok(None);
        }

        let output_path = self.output_path(input_path, "_processed.mp4");
        std::fs::create_dir_all(&self.config.video.output_dir)?;
        info!("Output video: {}", output_path.display());

        let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let writer = VideoWriter::new(
            &output_path.to_string_lossy(),
            fourcc,
            fps,
            core::Size::new(width, height),
            true,
        )?;

        if !writer.is_opened()? {
            anyhow::bail!("Failed to open video writer {}", output_path.display());
        }

        Ok(Some(writer))
    }

    /// `<output_dir>/<stem>.log`
    pub fn log_path(&self, input_path: &Path) -> PathBuf {
        self.output_path(input_path, ".log")
    }

    pub fn create_events_file(&self, input_path: &Path) -> Result<Option<File>> {
        if !self.config.video.save_events_jsonl {
            return Ok(None);
        }

        std::fs::create_dir_all(&self.config.video.output_dir)?;
        let path = self.output_path(input_path, "_events.jsonl");
        info!("💾 Events will be written to: {}", path.display());
        Ok(Some(File::create(path)?))
    }

    fn output_path(&self, input_path: &Path, suffix: &str) -> PathBuf {
        let stem = input_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        PathBuf::from(&self.config.video.output_dir).join(format!("{}{}", stem, suffix))
    }
}

fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

fn is_processed_output(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.ends_with("_processed"))
        .unwrap_or(false)
}

pub struct VideoReader {
    pub cap: VideoCapture,
    pub fps: f64,
    pub total_frames: i32,
    pub current_frame: i32,
    pub width: i32,
    pub height: i32,
}

impl VideoReader {
    /// Next BGR frame, `None` at end of stream.
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        use opencv::videoio::VideoCaptureTrait;

        let mut mat = Mat::default();

        if !VideoCaptureTrait::read(&mut self.cap, &mut mat)? || mat.empty() {
            return Ok(None);
        }

        let index = self.current_frame as u64;
        self.current_frame += 1;
        let timestamp_ms = (index as f64 / self.fps) * 1000.0;

        Ok(Some(Frame {
            mat,
            index,
            timestamp_ms,
        }))
    }

    pub fn progress(&self) -> f32 {
        if self.total_frames <= 0 {
            return 0.0;
        }
        (self.current_frame as f32 / self.total_frames as f32) * 100.0
    }
}
