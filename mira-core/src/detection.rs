//! Per-frame perception results

use serde::{Deserialize, Serialize};

/// Axis-aligned box in frame pixels, corner form
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build from the center form YOLO heads emit
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x1: cx - width / 2.0,
            y1: cy - height / 2.0,
            x2: cx + width / 2.0,
            y2: cy + height / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn is_finite(&self) -> bool {
        self.x1.is_finite() && self.y1.is_finite() && self.x2.is_finite() && self.y2.is_finite()
    }

    /// Scale both axes, e.g. from model input space to frame space
    pub fn scale(&self, sx: f32, sy: f32) -> Self {
        Self {
            x1: self.x1 * sx,
            y1: self.y1 * sy,
            x2: self.x2 * sx,
            y2: self.y2 * sy,
        }
    }

    /// Clamp to `[0, width] x [0, height]`
    pub fn clamp(&self, width: f32, height: f32) -> Self {
        Self {
            x1: self.x1.clamp(0.0, width),
            y1: self.y1.clamp(0.0, height),
            x2: self.x2.clamp(0.0, width),
            y2: self.y2.clamp(0.0, height),
        }
    }

    /// Intersection over union; 0.0 for degenerate or non-finite boxes
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        if !self.is_finite() || !other.is_finite() {
            return 0.0;
        }

        let inter_x1 = self.x1.max(other.x1);
        let inter_y1 = self.y1.max(other.y1);
        let inter_x2 = self.x2.min(other.x2);
        let inter_y2 = self.y2.min(other.y2);

        if inter_x2 <= inter_x1 || inter_y2 <= inter_y1 {
            return 0.0;
        }

        let inter_area = (inter_x2 - inter_x1) * (inter_y2 - inter_y1);
        let union_area = self.area() + other.area() - inter_area;
        if union_area <= 0.0 || !union_area.is_finite() {
            return 0.0;
        }

        let iou = inter_area / union_area;
        if iou.is_finite() {
            iou.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// A labelled box from the perception model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub class_id: usize,
    pub label: String,
    pub confidence: f32,
}

impl Detection {
    pub fn new(bbox: BoundingBox, class_id: usize, label: impl Into<String>, confidence: f32) -> Self {
        Self {
            bbox,
            class_id,
            label: label.into(),
            confidence,
        }
    }
}

/// Joint position normalized to the frame, `(0, 0)` top-left
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }
}

/// One person found by the pose model, COCO-17 joint order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Subject {
    pub keypoints: Vec<Keypoint>,
}

impl Subject {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    pub fn joint(&self, index: usize) -> Option<&Keypoint> {
        self.keypoints.get(index)
    }
}

/// Everything the perception model reports for one frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameAnalysis {
    pub detections: Vec<Detection>,
    /// Empty unless the model estimates pose
    pub subjects: Vec<Subject>,
}

impl FrameAnalysis {
    pub fn new(detections: Vec<Detection>, subjects: Vec<Subject>) -> Self {
        Self { detections, subjects }
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty() && self.subjects.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.detections.iter().map(|d| d.label.as_str())
    }
}

/// Greedy class-aware non-maximum suppression.
///
/// Candidates are visited by descending confidence; a candidate is dropped
/// when it overlaps an already kept candidate of the same class by more
/// than `iou_threshold`. `parts` exposes the box, class and confidence of
/// each item so pose candidates can carry their keypoints through.
pub fn non_max_suppression<T, F>(mut items: Vec<T>, iou_threshold: f32, parts: F) -> Vec<T>
where
    F: Fn(&T) -> (BoundingBox, usize, f32),
{
    items.retain(|item| {
        let (bbox, _, confidence) = parts(item);
        confidence.is_finite() && bbox.is_finite()
    });
    items.sort_by(|a, b| parts(b).2.total_cmp(&parts(a).2));

    let mut keep: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        let (bbox, class_id, _) = parts(&item);
        let suppressed = keep.iter().any(|kept| {
            let (kept_bbox, kept_class, _) = parts(kept);
            kept_class == class_id && kept_bbox.iou(&bbox) > iou_threshold
        });
        if !suppressed {
            keep.push(item);
        }
    }
    keep
}
