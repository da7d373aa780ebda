// src/vehicle_detection.rs
//
// Classical vehicle detector for a fixed overhead camera: painted car bodies
// are far more saturated than asphalt and lane paint, so a threshold on the
// HSV saturation channel followed by open/close morphology leaves one blob
// per car. Blobs under `min_contour_area` are noise.

use crate::geometry::Rect;
use crate::types::DetectionConfig;
use anyhow::Result;
use opencv::{
    core::{self, Mat, Point, Size, Vector},
    imgproc,
    prelude::*,
};
use tracing::debug;

pub struct SaturationDetector {
    min_saturation: f64,
    min_contour_area: f64,
    padding: Option<(i32, i32)>,
    kernel: Mat,
}

impl SaturationDetector {
    pub fn new(config: &DetectionConfig) -> Result<Self> {
        let k = config.morph_kernel_size;
        let kernel = imgproc::get_structuring_element(
            imgproc::MORPH_RECT,
            Size::new(k, k),
            Point::new(-1, -1),
        )?;

        Ok(Self {
            min_saturation: config.min_saturation as f64,
            min_contour_area: config.min_contour_area,
            padding: config.padding.map(|[x, y]| (x, y)),
            kernel,
        })
    }

    /// Vehicle bounding boxes in contour order.
    pub fn detect(&self, frame: &Mat) -> Result<Vec<Rect>> {
        let mask = self.saturation_mask(frame)?;

        let mut contours = Vector::<Vector<Point>>::new();
        imgproc::find_contours(
            &mask,
            &mut contours,
            imgproc::RETR_EXTERNAL,
            imgproc::CHAIN_APPROX_SIMPLE,
            Point::new(0, 0),
        )?;

        let mut detections = Vec::new();
        for contour in contours.iter() {
            if imgproc::contour_area(&contour, false)? <= self.min_contour_area {
                continue;
            }
            let rect = Rect::from(imgproc::bounding_rect(&contour)?);
            detections.push(match self.padding {
                Some((pad_x, pad_y)) => rect.padded(pad_x, pad_y),
                None => rect,
            });
        }

        debug!("Detected {} vehicle(s)", detections.len());
        Ok(detections)
    }

    /// Binary mask of highly saturated pixels, cleaned with open then close.
    fn saturation_mask(&self, frame: &Mat) -> Result<Mat> {
        let mut hsv = Mat::default();
        imgproc::cvt_color_def(frame, &mut hsv, imgproc::COLOR_BGR2HSV)?;

        let mut saturation = Mat::default();
        core::extract_channel(&hsv, &mut saturation, 1)?;

        let mut mask = Mat::default();
        imgproc::threshold(
            &saturation,
            &mut mask,
            self.min_saturation,
            255.0,
            imgproc::THRESH_BINARY,
        )?;

        let mut opened = Mat::default();
        self.morph(&mask, &mut opened, imgproc::MORPH_OPEN)?;
        let mut closed = Mat::default();
        self.morph(&opened, &mut closed, imgproc::MORPH_CLOSE)?;

        Ok(closed)
    }

    fn morph(&self, src: &Mat, dst: &mut Mat, op: i32) -> Result<()> {
        imgproc::morphology_ex(
            src,
            dst,
            op,
            &self.kernel,
            Point::new(-1, -1),
            1,
            core::BORDER_CONSTANT,
            imgproc::morphology_default_border_value()?,
        )?;
        Ok(())
    }
}
