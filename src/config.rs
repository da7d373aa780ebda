use crate::types::Config;
use anyhow::{bail, Context, Result};
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing config {}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let occ = &self.occupancy;
        for (name, value) in [
            ("occupancy.spot_iou_threshold", occ.spot_iou_threshold),
            ("occupancy.gate_iou_threshold", occ.gate_iou_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{} must be within [0, 1], got {}", name, value);
            }
        }

        if occ.gate_max_distance < 0 {
            bail!(
                "occupancy.gate_max_distance must be non-negative, got {}",
                occ.gate_max_distance
            );
        }

        let k = self.detection.morph_kernel_size;
        if k <= 0 || k % 2 == 0 {
            bail!("detection.morph_kernel_size must be a positive odd number, got {}", k);
        }

        if let Some([pad_x, pad_y]) = self.detection.padding {
            if pad_x < 0 || pad_y < 0 {
                bail!("detection.padding must be non-negative, got [{}, {}]", pad_x, pad_y);
            }
        }

        let prefix = &self.plates.region_prefix;
        if prefix.len() != 2 || !prefix.chars().all(|c| c.is_ascii_uppercase()) {
            bail!("plates.region_prefix must be two uppercase letters, got `{}`", prefix);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!((config.occupancy.spot_iou_threshold - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.occupancy.gate_max_distance, 50);
        assert_eq!(config.detection.min_saturation, 150);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
occupancy:
  spot_iou_threshold: 0.5
  enable_plate_recognition: false
video:
  input_dir: clips
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!((config.occupancy.spot_iou_threshold - 0.5).abs() < f32::EPSILON);
        assert!(!config.occupancy.enable_plate_recognition);
        assert_eq!(config.occupancy.gate_max_distance, 50);
        assert_eq!(config.video.input_dir, "clips");
        assert_eq!(config.video.output_dir, "output");
        assert_eq!(config.plates.region_prefix, "EL");
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let mut config = Config::default();
        config.occupancy.gate_iou_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_even_kernel() {
        let mut config = Config::default();
        config.detection.morph_kernel_size = 4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_prefix() {
        let mut config = Config::default();
        config.plates.region_prefix = "e1".to_string();
        assert!(config.validate().is_err());
    }
}
