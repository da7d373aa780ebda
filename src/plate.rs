// src/plate.rs
//
// License plate reading on top of a text recognizer.
//
// A plate is accepted only in the `XX YYYYY` layout (two letters, a space,
// five letters or digits). Raw OCR output is uppercased, stripped to ASCII
// alphanumerics, split after the second character and checked against that
// layout. The vehicle crop is tried at 0/90/180/270 degrees and the first
// rotation that yields a valid plate wins.
//
// OCR often drops the two-letter region code. When no rotation produced a
// valid plate, 5-character fragments are retried with the configured region
// prefix. This is a guess, not a read, and can be switched off.

use crate::geometry::Rect;
use crate::ocr::TextRecognizer;
use crate::types::PlateConfig;
use anyhow::Result;
use opencv::{
    core::{self, Mat},
    imgproc,
    prelude::*,
};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

const UNRECOGNIZED: &str = "UNRECOGNIZED";

/// Outcome of a plate read. `Unrecognized` is a normal value, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum PlateReading {
    Plate(String),
    Unrecognized,
}

impl fmt::Display for PlateReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlateReading::Plate(text) => f.write_str(text),
            PlateReading::Unrecognized => f.write_str(UNRECOGNIZED),
        }
    }
}

impl From<PlateReading> for String {
    fn from(reading: PlateReading) -> Self {
        reading.to_string()
    }
}

/// Anything that can turn a vehicle in a frame into a plate reading.
pub trait PlateReader {
    fn read_plate(&mut self, frame: &Mat, vehicle: &Rect) -> PlateReading;
}

/// Uppercase and drop everything that isn't an ASCII letter or digit.
pub fn normalize_fragment(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_uppercase)
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// Insert the separator after the region code: `AB12345` -> `AB 12345`.
pub fn format_plate(fragment: &str) -> String {
    let split = fragment
        .char_indices()
        .nth(2)
        .map(|(i, _)| i)
        .unwrap_or(fragment.len());
    format!("{} {}", &fragment[..split], &fragment[split..])
}

/// Matches `^[A-Z]{2} [A-Z0-9]{5}$`.
pub fn is_valid_plate(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 8
        && bytes[..2].iter().all(u8::is_ascii_uppercase)
        && bytes[2] == b' '
        && bytes[3..]
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Pick the first fragment that formats into a valid plate. If none does and
/// `fill_prefix` is set, retry 5-character fragments with the prefix added.
pub fn select_plate(fragments: &[String], fill_prefix: Option<&str>) -> PlateReading {
    for fragment in fragments {
        let candidate = format_plate(fragment);
        debug!("Plate candidate `{}`", candidate);
        if is_valid_plate(&candidate) {
            return PlateReading::Plate(candidate);
        }
    }

    if let Some(prefix) = fill_prefix {
        debug!("No valid plate, retrying with region prefix {}", prefix);
        for fragment in fragments.iter().filter(|f| f.len() == 5) {
            let candidate = format_plate(&format!("{}{}", prefix, fragment));
            debug!("Plate candidate `{}`", candidate);
            if is_valid_plate(&candidate) {
                return PlateReading::Plate(candidate);
            }
        }
    }

    PlateReading::Unrecognized
}

/// Plate reader backed by a [`TextRecognizer`].
pub struct OcrPlateReader<R: TextRecognizer> {
    recognizer: R,
    fill_prefix: Option<String>,
}

impl<R: TextRecognizer> OcrPlateReader<R> {
    pub fn new(recognizer: R, config: &PlateConfig) -> Self {
        let fill_prefix = config
            .fill_missing_prefix
            .then(|| config.region_prefix.clone());
        Self {
            recognizer,
            fill_prefix,
        }
    }

    /// Normalized text for each rotation of the grayscale vehicle crop.
    fn rotation_fragments(&mut self, frame: &Mat, vehicle: &Rect) -> Result<Vec<String>> {
        let Some(crop_rect) = vehicle.clamp_to(frame.cols(), frame.rows()) else {
            return Ok(Vec::new());
        };

        let crop = Mat::roi(frame, crop_rect.into())?.try_clone()?;
        let mut gray = Mat::default();
        imgproc::cvt_color_def(&crop, &mut gray, imgproc::COLOR_BGR2GRAY)?;

        let rotations = [
            None,
            Some(core::ROTATE_90_CLOCKWISE),
            Some(core::ROTATE_180),
            Some(core::ROTATE_90_COUNTERCLOCKWISE),
        ];

        let mut fragments = Vec::with_capacity(rotations.len());
        for rotation in rotations {
            let image = match rotation {
                None => gray.try_clone()?,
                Some(code) => {
                    let mut rotated = Mat::default();
                    core::rotate(&gray, &mut rotated, code)?;
                    rotated
                }
            };

            // A failing rotation contributes nothing, the others still count
            let fragment = match self.recognizer.recognize(&image) {
                Ok(text) => normalize_fragment(&text),
                Err(e) => {
                    warn!("Text recognition failed: {:#}", e);
                    String::new()
                }
            };
            fragments.push(fragment);
        }

        Ok(fragments)
    }
}

impl<R: TextRecognizer> PlateReader for OcrPlateReader<R> {
    fn read_plate(&mut self, frame: &Mat, vehicle: &Rect) -> PlateReading {
        match self.rotation_fragments(frame, vehicle) {
            Ok(fragments) => select_plate(&fragments, self.fill_prefix.as_deref()),
            Err(e) => {
                warn!("Could not prepare vehicle {} for plate reading: {:#}", vehicle, e);
                PlateReading::Unrecognized
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::Scalar;

    fn frags(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Returns canned text per call, in order.
    struct ScriptedRecognizer {
        outputs: Vec<Result<String>>,
        calls: usize,
    }

    impl TextRecognizer for ScriptedRecognizer {
        fn recognize(&mut self, _image: &Mat) -> Result<String> {
            let out = match self.outputs.get(self.calls) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(e)) => Err(anyhow::anyhow!("{}", e)),
                None => Ok(String::new()),
            };
            self.calls += 1;
            out
        }
    }

    fn test_frame() -> Mat {
        Mat::new_rows_cols_with_default(120, 160, core::CV_8UC3, Scalar::all(90.0)).unwrap()
    }

    #[test]
    fn test_format_raw_fragment() {
        let plate = format_plate(&normalize_fragment("AB12345"));
        assert_eq!(plate, "AB 12345");
        assert!(is_valid_plate(&plate));
    }

    #[test]
    fn test_normalize_strips_noise() {
        assert_eq!(normalize_fragment(" el-4k 2.7x\n"), "EL4K27X");
        assert_eq!(normalize_fragment("ąb|12"), "B12");
    }

    #[test]
    fn test_validation_rules() {
        assert!(is_valid_plate("EL 4K27X"));
        assert!(!is_valid_plate("E1 12345"));
        assert!(!is_valid_plate("EL 1234"));
        assert!(!is_valid_plate("EL 123456"));
        assert!(!is_valid_plate("el 12345"));
        assert!(!is_valid_plate("EL12345"));
    }

    #[test]
    fn test_short_fragments_do_not_panic() {
        assert_eq!(format_plate(""), " ");
        assert_eq!(format_plate("A"), "A ");
    }

    #[test]
    fn test_first_valid_rotation_wins() {
        let reading = select_plate(&frags(&["", "X1", "WA12345", "KR99999"]), None);
        assert_eq!(reading, PlateReading::Plate("WA 12345".to_string()));
    }

    #[test]
    fn test_prefix_fallback() {
        let fragments = frags(&["12", "4K27X", ""]);
        assert_eq!(select_plate(&fragments, None), PlateReading::Unrecognized);
        assert_eq!(
            select_plate(&fragments, Some("EL")),
            PlateReading::Plate("EL 4K27X".to_string())
        );
    }

    #[test]
    fn test_unrecognized_display() {
        assert_eq!(PlateReading::Unrecognized.to_string(), "UNRECOGNIZED");
        assert_eq!(
            serde_json::to_string(&PlateReading::Plate("EL 12345".into())).unwrap(),
            "\"EL 12345\""
        );
    }

    #[test]
    fn test_reader_tries_four_rotations() {
        let recognizer = ScriptedRecognizer {
            outputs: vec![
                Ok("??".to_string()),
                Err(anyhow::anyhow!("tesseract crashed")),
                Ok("ab 12345".to_string()),
                Ok("CD 00000".to_string()),
            ],
            calls: 0,
        };
        let mut reader = OcrPlateReader::new(recognizer, &PlateConfig::default());
        let reading = reader.read_plate(&test_frame(), &Rect::new(10, 10, 80, 60));
        assert_eq!(reading, PlateReading::Plate("AB 12345".to_string()));
        assert_eq!(reader.recognizer.calls, 4);
    }

    #[test]
    fn test_vehicle_outside_frame_is_unrecognized() {
        let recognizer = ScriptedRecognizer {
            outputs: vec![Ok("AB12345".to_string())],
            calls: 0,
        };
        let mut reader = OcrPlateReader::new(recognizer, &PlateConfig::default());
        let reading = reader.read_plate(&test_frame(), &Rect::new(500, 500, 40, 40));
        assert_eq!(reading, PlateReading::Unrecognized);
        assert_eq!(reader.recognizer.calls, 0);
    }
}
