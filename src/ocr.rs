// src/ocr.rs
//
// Text recognition backend. The Tesseract CLI reads a PNG from stdin and
// prints the recognized text to stdout; nothing touches the filesystem.

use crate::types::PlateConfig;
use anyhow::{bail, Context, Result};
use opencv::{
    core::{Mat, Vector},
    imgcodecs,
};
use std::io::Write;
use std::process::{Command, Stdio};

/// Turns an image into raw text. Implementations may fail; callers decide
/// whether that is fatal.
pub trait TextRecognizer {
    fn recognize(&mut self, image: &Mat) -> Result<String>;
}

pub struct TesseractRecognizer {
    command: String,
    page_segmentation_mode: u8,
    char_whitelist: Option<String>,
}

impl TesseractRecognizer {
    pub fn new(config: &PlateConfig) -> Self {
        Self {
            command: config.tesseract_cmd.clone(),
            page_segmentation_mode: config.page_segmentation_mode,
            char_whitelist: config.char_whitelist.clone(),
        }
    }

    /// Check that the binary runs. Returns the first line of `--version`.
    pub fn probe(&self) -> Result<String> {
        let output = Command::new(&self.command)
            .arg("--version")
            .output()
            .with_context(|| format!("running `{} --version`", self.command))?;

        if !output.status.success() {
            bail!("`{} --version` exited with {}", self.command, output.status);
        }

        // Older releases print the version banner on stderr
        let banner = if output.stdout.is_empty() {
            output.stderr
        } else {
            output.stdout
        };
        Ok(String::from_utf8_lossy(&banner)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "--psm".to_string(),
            self.page_segmentation_mode.to_string(),
        ];
        if let Some(whitelist) = &self.char_whitelist {
            args.push("-c".to_string());
            args.push(format!("tessedit_char_whitelist={}", whitelist));
        }
        args
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&mut self, image: &Mat) -> Result<String> {
        let mut png = Vector::<u8>::new();
        if !imgcodecs::imencode(".png", image, &mut png, &Vector::new())? {
            bail!("PNG encoding failed");
        }

        let mut child = Command::new(&self.command)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawning {}", self.command))?;

        {
            let mut stdin = child.stdin.take().context("tesseract stdin unavailable")?;
            stdin.write_all(&png.to_vec())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
