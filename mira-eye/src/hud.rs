//! Heads-up display drawn over each frame

use crate::error::VisionError;
use mira_core::text::wrap_chunks;
use mira_core::threat::is_dangerous;
use mira_core::session::DEFAULT_EMOTION;
use mira_core::{Detection, FrameAnalysis, Subject};
use opencv::{
    core::{self, Mat, Point, Rect, Scalar},
    imgproc,
    prelude::*,
};
use serde::{Deserialize, Serialize};

/// First keypoint drawn; the face points (0-4) are skipped
pub const FIRST_BODY_KEYPOINT: usize = 5;

const PERSON: (f64, f64, f64) = (255.0, 0.0, 255.0);
const DANGER: (f64, f64, f64) = (0.0, 0.0, 255.0);
const KEYPOINT: (f64, f64, f64) = (0.0, 255.0, 0.0);
const HIGHLIGHT: (f64, f64, f64) = (0.0, 255.0, 255.0);
const MUTED: (f64, f64, f64) = (200.0, 200.0, 200.0);
const SECURE: (f64, f64, f64) = (0.0, 255.0, 0.0);
const TEXT: (f64, f64, f64) = (255.0, 255.0, 255.0);
const HEADER: (f64, f64, f64) = (10.0, 10.0, 10.0);

/// Upper bound for `line_spacing`, in pixels
pub const MAX_LINE_SPACING: i32 = 1000;

fn bgr(color: (f64, f64, f64)) -> Scalar {
    Scalar::new(color.0, color.1, color.2, 0.0)
}

/// Layout of the header band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HudConfig {
    /// Height of the dark band at the top of the frame
    pub header_height: i32,
    /// Weight of the dark band when blended over the frame
    pub header_opacity: f64,
    /// Characters per reaction line
    pub wrap_width: usize,
    pub text_x: i32,
    /// Baseline of the first reaction line
    pub text_y: i32,
    pub line_spacing: i32,
    pub status_y: i32,
    pub status_scale: f64,
    pub text_scale: f64,
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            header_height: 120,
            header_opacity: 0.6,
            wrap_width: 60,
            text_x: 20,
            text_y: 70,
            line_spacing: 25,
            status_y: 35,
            status_scale: 0.8,
            text_scale: 0.6,
        }
    }
}

impl HudConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.header_height <= 0 {
            return Err("Header height must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.header_opacity) {
            return Err("Header opacity must be between 0 and 1".to_string());
        }
        if self.wrap_width == 0 {
            return Err("Wrap width must be at least 1".to_string());
        }
        if self.line_spacing <= 0 || self.line_spacing > MAX_LINE_SPACING {
            return Err(format!("Line spacing must be between 1 and {}", MAX_LINE_SPACING));
        }
        if self.status_scale <= 0.0 || self.text_scale <= 0.0 {
            return Err("Font scales must be positive".to_string());
        }
        Ok(())
    }
}

/// What the status line shows
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Mood { emotion: String },
    Security { threat: bool },
}

impl Status {
    pub fn text(&self) -> String {
        match self {
            Status::Mood { emotion } => format!("MOOD: {}", emotion.to_uppercase()),
            Status::Security { threat: true } => "THREAT DETECTED".to_string(),
            Status::Security { threat: false } => "SECURE".to_string(),
        }
    }

    pub fn color(&self) -> Scalar {
        match self {
            Status::Mood { emotion } if emotion == DEFAULT_EMOTION => bgr(MUTED),
            Status::Mood { .. } => bgr(HIGHLIGHT),
            Status::Security { threat: true } => bgr(DANGER),
            Status::Security { threat: false } => bgr(SECURE),
        }
    }

    /// Color of the line under the header band
    pub fn separator_color(&self) -> Scalar {
        match self {
            Status::Mood { .. } => bgr(HIGHLIGHT),
            Status::Security { threat: true } => bgr(DANGER),
            Status::Security { threat: false } => bgr(SECURE),
        }
    }
}

/// Everything the HUD reads from the session for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct HudView {
    pub status: Status,
    pub reaction: String,
}

/// Color of a detection box by label; `None` for labels the HUD does not draw
pub fn box_color(detection: &Detection) -> Option<Scalar> {
    if detection.label == mira_core::threat::PERSON_LABEL {
        Some(bgr(PERSON))
    } else if is_dangerous(&detection.label) {
        Some(bgr(DANGER))
    } else {
        None
    }
}

/// Pixel positions of the drawable body keypoints.
///
/// Face points are skipped, as are points that do not land strictly inside
/// the positive quadrant (the pose decoder puts unseen joints at the origin).
pub fn body_points(subject: &Subject, width: i32, height: i32) -> Vec<Point> {
    subject
        .keypoints
        .iter()
        .skip(FIRST_BODY_KEYPOINT)
        .filter(|kp| kp.x.is_finite() && kp.y.is_finite())
        .map(|kp| Point::new((kp.x * width as f32) as i32, (kp.y * height as f32) as i32))
        .filter(|p| p.x > 0 && p.y > 0)
        .collect()
}

pub struct HudRenderer {
    config: HudConfig,
}

impl HudRenderer {
    pub fn new(config: HudConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HudConfig {
        &self.config
    }

    /// `(line, baseline)` pairs for the reaction text; lines whose
    /// baseline falls below `frame_height` are dropped
    pub fn reaction_lines(&self, reaction: &str, frame_height: i32) -> Vec<(String, i32)> {
        let text = format!("MIRA: {}", reaction);
        wrap_chunks(&text, self.config.wrap_width)
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let offset = i32::try_from(i)
                    .unwrap_or(i32::MAX)
                    .saturating_mul(self.config.line_spacing);
                (line, self.config.text_y.saturating_add(offset))
            })
            .take_while(|(_, y)| *y <= frame_height)
            .collect()
    }

    /// Draw boxes, keypoints, the header band and the text on a copy of `frame`
    pub fn render(&self, frame: &Mat, analysis: &FrameAnalysis, view: &HudView) -> Result<Mat, VisionError> {
        if frame.empty() {
            return Err(VisionError::Processing("Cannot render an empty frame".to_string()));
        }

        let mut canvas = frame.try_clone()?;
        let (width, height) = (canvas.cols(), canvas.rows());

        for detection in &analysis.detections {
            self.draw_detection(&mut canvas, detection)?;
        }
        for subject in &analysis.subjects {
            for point in body_points(subject, width, height) {
                imgproc::circle(&mut canvas, point, 4, bgr(KEYPOINT), imgproc::FILLED, imgproc::LINE_8, 0)?;
            }
        }

        let mut canvas = self.blend_header(&canvas)?;
        let band = self.config.header_height.min(height);
        imgproc::line(
            &mut canvas,
            Point::new(0, band),
            Point::new(width, band),
            view.status.separator_color(),
            2,
            imgproc::LINE_8,
            0,
        )?;

        imgproc::put_text(
            &mut canvas,
            &view.status.text(),
            Point::new(self.config.text_x, self.config.status_y),
            imgproc::FONT_HERSHEY_SIMPLEX,
            self.config.status_scale,
            view.status.color(),
            2,
            imgproc::LINE_AA,
            false,
        )?;

        for (line, y) in self.reaction_lines(&view.reaction, height) {
            imgproc::put_text(
                &mut canvas,
                &line,
                Point::new(self.config.text_x, y),
                imgproc::FONT_HERSHEY_SIMPLEX,
                self.config.text_scale,
                bgr(TEXT),
                1,
                imgproc::LINE_AA,
                false,
            )?;
        }

        Ok(canvas)
    }

    fn draw_detection(&self, canvas: &mut Mat, detection: &Detection) -> Result<(), VisionError> {
        let Some(color) = box_color(detection) else {
            return Ok(());
        };
        let b = &detection.bbox;
        let rect = Rect::new(b.x1 as i32, b.y1 as i32, b.width() as i32, b.height() as i32);
        imgproc::rectangle(canvas, rect, color, 2, imgproc::LINE_8, 0)?;

        if is_dangerous(&detection.label) {
            let label = format!("{} {:.0}%", detection.label.to_uppercase(), detection.confidence * 100.0);
            imgproc::put_text(
                canvas,
                &label,
                Point::new(rect.x, (rect.y - 8).max(12)),
                imgproc::FONT_HERSHEY_SIMPLEX,
                0.6,
                color,
                2,
                imgproc::LINE_AA,
                false,
            )?;
        }
        Ok(())
    }

    /// Dark band over the top rows: `opacity * dark + (1 - opacity) * frame`
    fn blend_header(&self, canvas: &Mat) -> Result<Mat, VisionError> {
        let band = self.config.header_height.min(canvas.rows());
        let mut overlay = canvas.try_clone()?;
        imgproc::rectangle(
            &mut overlay,
            Rect::new(0, 0, canvas.cols(), band),
            bgr(HEADER),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;

        let mut blended = Mat::default();
        core::add_weighted(
            &overlay,
            self.config.header_opacity,
            canvas,
            1.0 - self.config.header_opacity,
            0.0,
            &mut blended,
            -1,
        )?;
        Ok(blended)
    }
}

impl Default for HudRenderer {
    fn default() -> Self {
        Self::new(HudConfig::default())
    }
}
