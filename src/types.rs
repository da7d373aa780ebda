use opencv::core::Mat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub regions: RegionsConfig,
    pub video: VideoConfig,
    pub detection: DetectionConfig,
    pub occupancy: OccupancyConfig,
    pub plates: PlateConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionsConfig {
    pub spots_path: String,
    pub gates_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub input_dir: String,
    pub output_dir: String,
    pub save_annotated: bool,
    pub save_events_jsonl: bool,
    pub draw_detection_zones: bool,
    /// Log progress every N frames (0 disables)
    pub progress_interval: u64,
}

/// Saturation-based vehicle detector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub min_saturation: u8,
    pub min_contour_area: f64,
    pub morph_kernel_size: i32,
    /// Optional `[pad_x, pad_y]` added around every detection
    pub padding: Option<[i32; 2]>,
}

/// Parameters of the occupancy core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OccupancyConfig {
    /// Fraction of a spot a detection must cover to occupy it
    pub spot_iou_threshold: f32,
    /// Fraction of a vehicle that must lie inside a gate zone to open it
    pub gate_iou_threshold: f32,
    /// How far (px) a gate zone reaches towards approaching traffic
    pub gate_max_distance: i32,
    pub enable_plate_recognition: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateConfig {
    pub tesseract_cmd: String,
    pub page_segmentation_mode: u8,
    pub char_whitelist: Option<String>,
    /// Two-letter region code prepended to 5-character reads
    pub region_prefix: String,
    pub fill_missing_prefix: bool,
    pub read_on_spot_occupied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for RegionsConfig {
    fn default() -> Self {
        Self {
            spots_path: "data/parking_spots.csv".to_string(),
            gates_path: "data/gates.csv".to_string(),
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            input_dir: "recordings".to_string(),
            output_dir: "output".to_string(),
            save_annotated: true,
            save_events_jsonl: true,
            draw_detection_zones: false,
            progress_interval: 300,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_saturation: 150,
            min_contour_area: 2500.0,
            morph_kernel_size: 5,
            padding: None,
        }
    }
}

impl Default for OccupancyConfig {
    fn default() -> Self {
        Self {
            spot_iou_threshold: 0.3,
            gate_iou_threshold: 0.01,
            gate_max_distance: 50,
            enable_plate_recognition: true,
        }
    }
}

impl Default for PlateConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: "tesseract".to_string(),
            page_segmentation_mode: 6,
            char_whitelist: Some("ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789".to_string()),
            region_prefix: "EL".to_string(),
            fill_missing_prefix: true,
            read_on_spot_occupied: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// One decoded BGR frame.
#[derive(Debug)]
pub struct Frame {
    pub mat: Mat,
    pub index: u64,
    pub timestamp_ms: f64,
}
