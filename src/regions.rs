// src/regions.rs
//
// Parking spots and gates, loaded once at startup from plain `x,y,w,h` rows.
// Anything unexpected in these files aborts startup: running with zero or
// half-parsed regions would silently report an empty lot.

use crate::geometry::Rect;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegionError>;

#[derive(Error, Debug)]
pub enum RegionError {
    #[error("cannot read region file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: malformed rectangle `{content}`: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        content: String,
        reason: String,
    },

    #[error("region file {0} defines no rectangles")]
    Empty(PathBuf),

    #[error("expected at most 2 gates (entry, exit), found {0}")]
    TooManyGates(usize),
}

/// Which way traffic passes through a gate. Fixed by file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateRole {
    Entry,
    Exit,
}

impl GateRole {
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(GateRole::Entry),
            1 => Some(GateRole::Exit),
            _ => None,
        }
    }

    /// Verb used in the event log.
    pub fn verb(&self) -> &'static str {
        match self {
            GateRole::Entry => "entering",
            GateRole::Exit => "exiting",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GateRole::Entry => "Entry gate",
            GateRole::Exit => "Exit gate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParkingSpot {
    pub index: usize,
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gate {
    pub index: usize,
    pub role: GateRole,
    pub rect: Rect,
}

impl Gate {
    /// Gate rectangle stretched by `max_distance` towards where traffic comes
    /// from: backwards (left) for the entry gate, forwards for the exit gate.
    pub fn detection_zone(&self, max_distance: i32) -> Rect {
        let r = self.rect;
        match self.role {
            GateRole::Entry => Rect::new(
                r.x.saturating_sub(max_distance),
                r.y,
                r.width.saturating_add(max_distance),
                r.height,
            ),
            GateRole::Exit => Rect::new(r.x, r.y, r.width.saturating_add(max_distance), r.height),
        }
    }
}

/// All regions of one lot.
#[derive(Debug, Clone)]
pub struct RegionSet {
    pub spots: Vec<ParkingSpot>,
    pub gates: Vec<Gate>,
}

impl RegionSet {
    pub fn load(spots_path: impl AsRef<Path>, gates_path: impl AsRef<Path>) -> Result<Self> {
        let spot_rects = load_rects(spots_path.as_ref())?;
        let gate_rects = load_rects(gates_path.as_ref())?;
        Self::from_rects(spot_rects, gate_rects)
    }

    pub fn from_rects(spot_rects: Vec<Rect>, gate_rects: Vec<Rect>) -> Result<Self> {
        let spots = spot_rects
            .into_iter()
            .enumerate()
            .map(|(index, rect)| ParkingSpot { index, rect })
            .collect();

        let gate_count = gate_rects.len();
        let gates = gate_rects
            .into_iter()
            .enumerate()
            .map(|(index, rect)| {
                GateRole::from_index(index)
                    .map(|role| Gate { index, role, rect })
                    .ok_or(RegionError::TooManyGates(gate_count))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { spots, gates })
    }
}

/// Read a region file. Blank lines are skipped; every other line must be
/// four comma-separated integers.
pub fn load_rects(path: &Path) -> Result<Vec<Rect>> {
    let contents = fs::read_to_string(path).map_err(|source| RegionError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let rects = parse_rects(&contents, path)?;
    if rects.is_empty() {
        return Err(RegionError::Empty(path.to_path_buf()));
    }
    Ok(rects)
}

pub fn parse_rects(contents: &str, path: &Path) -> Result<Vec<Rect>> {
    let mut rects = Vec::new();

    for (line_no, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let malformed = |reason: String| RegionError::Malformed {
            path: path.to_path_buf(),
            line: line_no + 1,
            content: trimmed.to_string(),
            reason,
        };

        let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        if fields.len() != 4 {
            return Err(malformed(format!("expected 4 fields, found {}", fields.len())));
        }

        let mut values = [0i32; 4];
        for (slot, field) in values.iter_mut().zip(&fields) {
            *slot = field
                .parse::<i32>()
                .map_err(|e| malformed(format!("`{}` is not an integer ({})", field, e)))?;
        }

        let [x, y, width, height] = values;
        if width <= 0 || height <= 0 {
            return Err(malformed(format!(
                "width and height must be positive, got {}x{}",
                width, height
            )));
        }
        if x.checked_add(width).is_none() || y.checked_add(height).is_none() {
            return Err(malformed("rectangle extends past the i32 range".to_string()));
        }

        rects.push(Rect::new(x, y, width, height));
    }

    Ok(rects)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> Result<Vec<Rect>> {
        parse_rects(contents, Path::new("spots.csv"))
    }

    #[test]
    fn test_parse_rows() {
        let rects = parse("10,10,50,50\n\n 70, 10 ,50,50\r\n").unwrap();
        assert_eq!(rects, vec![Rect::new(10, 10, 50, 50), Rect::new(70, 10, 50, 50)]);
    }

    #[test]
    fn test_non_integer_is_reported_with_line() {
        let err = parse("10,10,50,50\n10,abc,50,50\n").unwrap_err();
        match err {
            RegionError::Malformed { line, content, .. } => {
                assert_eq!(line, 2);
                assert_eq!(content, "10,abc,50,50");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wrong_field_count() {
        assert!(matches!(
            parse("1,2,3\n"),
            Err(RegionError::Malformed { line: 1, .. })
        ));
        assert!(matches!(
            parse("1,2,3,4,5\n"),
            Err(RegionError::Malformed { .. })
        ));
    }

    #[test]
    fn test_non_positive_size_rejected() {
        for row in ["10,10,-5,50", "10,10,50,-1", "10,10,0,50"] {
            match parse(row) {
                Err(RegionError::Malformed { line, content, .. }) => {
                    assert_eq!(line, 1);
                    assert_eq!(content, row);
                }
                other => panic!("{row} should be malformed, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_rows_past_i32_range_rejected() {
        assert!(matches!(
            parse("10,10,50,50\n2147483000,10,1000,50\n"),
            Err(RegionError::Malformed { line: 2, .. })
        ));
        assert!(matches!(
            parse("10,2147483000,50,1000"),
            Err(RegionError::Malformed { line: 1, .. })
        ));
        // Right at the edge is still fine
        assert!(parse("2147483000,10,647,50").is_ok());
    }

    #[test]
    fn test_blank_file_is_empty_error() {
        let dir = std::env::temp_dir().join(format!("parking_regions_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("gates.csv");
        fs::write(&path, "\n   \n\r\n").unwrap();

        let err = load_rects(&path).unwrap_err();
        assert!(matches!(err, RegionError::Empty(ref p) if p == &path));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = load_rects(Path::new("/nonexistent/parking_spots.csv")).unwrap_err();
        assert!(matches!(err, RegionError::Io { .. }));
    }

    #[test]
    fn test_gate_roles_follow_file_order() {
        let set = RegionSet::from_rects(
            vec![Rect::new(0, 0, 10, 10)],
            vec![Rect::new(100, 0, 20, 40), Rect::new(300, 0, 20, 40)],
        )
        .unwrap();
        assert_eq!(set.gates[0].role, GateRole::Entry);
        assert_eq!(set.gates[1].role, GateRole::Exit);
    }

    #[test]
    fn test_third_gate_rejected() {
        let gate = Rect::new(0, 0, 5, 5);
        let err = RegionSet::from_rects(vec![], vec![gate, gate, gate]).unwrap_err();
        assert!(matches!(err, RegionError::TooManyGates(3)));
    }

    #[test]
    fn test_detection_zones() {
        let entry = Gate {
            index: 0,
            role: GateRole::Entry,
            rect: Rect::new(100, 100, 20, 40),
        };
        let exit = Gate {
            index: 1,
            role: GateRole::Exit,
            rect: Rect::new(400, 100, 20, 40),
        };
        assert_eq!(entry.detection_zone(20), Rect::new(80, 100, 40, 40));
        assert_eq!(exit.detection_zone(20), Rect::new(400, 100, 40, 40));
    }

    #[test]
    fn test_detection_zone_saturates_at_i32_edges() {
        let entry = Gate {
            index: 0,
            role: GateRole::Entry,
            rect: Rect::new(i32::MIN + 10, 0, 20, 40),
        };
        let zone = entry.detection_zone(50);
        assert_eq!(zone.x, i32::MIN);
        assert_eq!(zone.width, 70);
        assert_eq!(crate::geometry::overlap_ratio(&Rect::new(0, 0, 10, 10), &zone), 0.0);

        let exit = Gate {
            index: 1,
            role: GateRole::Exit,
            rect: Rect::new(0, 0, i32::MAX - 10, 40),
        };
        assert_eq!(exit.detection_zone(50).width, i32::MAX);
    }
}
