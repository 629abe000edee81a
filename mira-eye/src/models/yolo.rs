//! YOLOv8 detection and pose models

use crate::config::VisionConfig;
use crate::error::VisionError;
use crate::utils::bgr_to_nchw;
use mira_core::detection::non_max_suppression;
use mira_core::{BoundingBox, Detection, FrameAnalysis, Keypoint, Subject};
use ndarray::{ArrayView2, Axis, Ix2};
use opencv::{core::Mat, prelude::*};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use parking_lot::Mutex;
use std::path::Path;
use tracing::{debug, info};

/// COCO class names (80 classes)
pub const COCO_CLASSES: &[&str] = &[
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat",
    "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack",
    "umbrella", "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball",
    "kite", "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket",
    "bottle", "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple",
    "sandwich", "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair",
    "couch", "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse",
    "remote", "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator",
    "book", "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// Keypoints per pose subject
pub const POSE_KEYPOINTS: usize = 17;

/// Keypoints scored below this come back as `(0, 0)`, as ultralytics reports them
pub const KEYPOINT_VISIBILITY: f32 = 0.5;

/// YOLOv8 standard input size
pub const INPUT_SIZE: (u32, u32) = (640, 640);

/// Which head the exported model carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YoloTask {
    /// `[1, 4 + classes, anchors]`
    Detect,
    /// `[1, 5 + 17 * 3, anchors]`
    Pose,
}

/// Geometry and thresholds used to turn raw rows into frame-space results
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeParams {
    pub frame_size: (f32, f32),
    pub input_size: (f32, f32),
    pub confidence_threshold: f32,
    pub nms_threshold: f32,
}

impl DecodeParams {
    fn scale(&self) -> (f32, f32) {
        (
            self.frame_size.0 / self.input_size.0,
            self.frame_size.1 / self.input_size.1,
        )
    }
}

fn class_label(class_id: usize) -> String {
    COCO_CLASSES
        .get(class_id)
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("class_{}", class_id))
}

/// Decode a detection head laid out as `[4 + classes, anchors]`.
///
/// Boxes are center form in input pixels; they come back in frame pixels,
/// clamped to the frame, after class-aware NMS.
pub fn decode_detections(output: ArrayView2<f32>, params: &DecodeParams) -> Result<Vec<Detection>, VisionError> {
    if output.nrows() < 5 {
        return Err(VisionError::Processing(format!(
            "Detection output has {} rows, expected at least 5",
            output.nrows()
        )));
    }

    let (sx, sy) = params.scale();
    let mut candidates = Vec::new();

    for column in output.axis_iter(Axis(1)) {
        let (class_id, score) = column
            .iter()
            .skip(4)
            .copied()
            .enumerate()
            .filter(|(_, s)| s.is_finite())
            .fold((0usize, f32::NEG_INFINITY), |best, (i, s)| if s > best.1 { (i, s) } else { best });

        if score < params.confidence_threshold {
            continue;
        }

        let bbox = BoundingBox::from_center(column[0], column[1], column[2], column[3])
            .scale(sx, sy)
            .clamp(params.frame_size.0, params.frame_size.1);
        if !bbox.is_finite() || bbox.area() <= 0.0 {
            continue;
        }

        candidates.push(Detection::new(bbox, class_id, class_label(class_id), score));
    }

    let detections = non_max_suppression(candidates, params.nms_threshold, |d| {
        (d.bbox, d.class_id, d.confidence)
    });
    debug!("Decoded {} detections", detections.len());
    Ok(detections)
}

/// Decode a pose head laid out as `[5 + 17 * 3, anchors]`.
///
/// Every subject is a `person` detection; keypoints are normalized to the
/// input size so they stay in `[0, 1]` regardless of the frame size.
/// Joints scored under [`KEYPOINT_VISIBILITY`] keep their score but sit at
/// the origin.
pub fn decode_poses(output: ArrayView2<f32>, params: &DecodeParams) -> Result<FrameAnalysis, VisionError> {
    let expected = 5 + POSE_KEYPOINTS * 3;
    if output.nrows() != expected {
        return Err(VisionError::Processing(format!(
            "Pose output has {} rows, expected {}",
            output.nrows(),
            expected
        )));
    }

    let (sx, sy) = params.scale();
    let mut candidates = Vec::new();

    for column in output.axis_iter(Axis(1)) {
        let score = column[4];
        if !score.is_finite() || score < params.confidence_threshold {
            continue;
        }

        let bbox = BoundingBox::from_center(column[0], column[1], column[2], column[3])
            .scale(sx, sy)
            .clamp(params.frame_size.0, params.frame_size.1);
        if !bbox.is_finite() || bbox.area() <= 0.0 {
            continue;
        }

        let keypoints = (0..POSE_KEYPOINTS)
            .map(|k| {
                let base = 5 + k * 3;
                let visibility = column[base + 2];
                if visibility < KEYPOINT_VISIBILITY || !visibility.is_finite() {
                    return Keypoint::new(0.0, 0.0, visibility);
                }
                Keypoint::new(
                    column[base] / params.input_size.0,
                    column[base + 1] / params.input_size.1,
                    visibility,
                )
            })
            .collect();

        candidates.push((Detection::new(bbox, 0, class_label(0), score), Subject::new(keypoints)));
    }

    let kept = non_max_suppression(candidates, params.nms_threshold, |(d, _)| {
        (d.bbox, d.class_id, d.confidence)
    });
    let (detections, subjects) = kept.into_iter().unzip();
    Ok(FrameAnalysis::new(detections, subjects))
}

/// Open an ONNX Runtime session with full graph optimization
pub(crate) fn build_session(model_path: &Path, threads: usize) -> Result<Session, VisionError> {
    let ort_err = |e: &dyn std::fmt::Display| {
        VisionError::Ort(format!("Failed to load model {:?}: {}", model_path, e))
    };
    Session::builder()
        .map_err(|e| ort_err(&e))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| ort_err(&e))?
        .with_intra_threads(threads)
        .map_err(|e| ort_err(&e))?
        .commit_from_file(model_path)
        .map_err(|e| ort_err(&e))
}

/// A YOLOv8 ONNX session
pub struct YoloModel {
    session: Mutex<Session>,
    task: YoloTask,
    input_size: (u32, u32),
    confidence_threshold: f32,
    nms_threshold: f32,
}

impl YoloModel {
    /// Load a model exported with the given head
    pub fn load(model_path: &Path, task: YoloTask, config: &VisionConfig) -> Result<Self, VisionError> {
        if !model_path.exists() {
            return Err(VisionError::Model(format!("Model file not found: {:?}", model_path)));
        }

        let session = build_session(model_path, config.inference_threads)?;

        info!("YOLO {:?} model loaded from {:?}", task, model_path);

        Ok(Self {
            session: Mutex::new(session),
            task,
            input_size: INPUT_SIZE,
            confidence_threshold: config.confidence_threshold,
            nms_threshold: config.nms_threshold,
        })
    }

    pub fn task(&self) -> YoloTask {
        self.task
    }

    /// Run the model on a BGR frame
    pub fn infer(&self, frame: &Mat) -> Result<FrameAnalysis, VisionError> {
        let input = bgr_to_nchw(frame, self.input_size.0, self.input_size.1)?;
        let params = DecodeParams {
            frame_size: (frame.cols() as f32, frame.rows() as f32),
            input_size: (self.input_size.0 as f32, self.input_size.1 as f32),
            confidence_threshold: self.confidence_threshold,
            nms_threshold: self.nms_threshold,
        };

        let tensor = Tensor::from_array(input)?;
        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![tensor])?;
        let raw = outputs[0].try_extract_array::<f32>()?;
        if raw.ndim() != 3 || raw.shape()[0] != 1 {
            return Err(VisionError::Processing(format!(
                "Unexpected YOLO output shape: {:?}",
                raw.shape()
            )));
        }

        let rows = raw
            .index_axis(Axis(0), 0)
            .into_dimensionality::<Ix2>()
            .map_err(|e| VisionError::Processing(format!("Failed to read YOLO output: {}", e)))?;

        match self.task {
            YoloTask::Detect => Ok(FrameAnalysis::new(decode_detections(rows, &params)?, Vec::new())),
            YoloTask::Pose => decode_poses(rows, &params),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn params() -> DecodeParams {
        DecodeParams {
            frame_size: (1280.0, 960.0),
            input_size: (640.0, 640.0),
            confidence_threshold: 0.25,
            nms_threshold: 0.45,
        }
    }

    fn set_box(output: &mut Array2<f32>, col: usize, cx: f32, cy: f32, w: f32, h: f32) {
        output[[0, col]] = cx;
        output[[1, col]] = cy;
        output[[2, col]] = w;
        output[[3, col]] = h;
    }

    #[test]
    fn test_coco_classes() {
        assert_eq!(COCO_CLASSES.len(), 80);
        assert_eq!(COCO_CLASSES[0], "person");
        assert_eq!(COCO_CLASSES[43], "knife");
        assert_eq!(COCO_CLASSES[76], "scissors");
        assert_eq!(class_label(200), "class_200");
    }

    #[test]
    fn test_decode_detections_scales_to_frame() {
        let mut output = Array2::<f32>::zeros((84, 3));
        set_box(&mut output, 0, 320.0, 320.0, 100.0, 200.0);
        output[[4 + 43, 0]] = 0.9;
        // Below threshold
        set_box(&mut output, 1, 100.0, 100.0, 50.0, 50.0);
        output[[4, 1]] = 0.1;

        let detections = decode_detections(output.view(), &params()).unwrap();
        assert_eq!(detections.len(), 1);
        let knife = &detections[0];
        assert_eq!(knife.label, "knife");
        assert_eq!(knife.class_id, 43);
        assert!((knife.confidence - 0.9).abs() < 1e-6);
        // x scaled by 2.0, y by 1.5
        assert!((knife.bbox.x1 - 540.0).abs() < 1e-3);
        assert!((knife.bbox.x2 - 740.0).abs() < 1e-3);
        assert!((knife.bbox.y1 - 330.0).abs() < 1e-3);
        assert!((knife.bbox.y2 - 630.0).abs() < 1e-3);
    }

    #[test]
    fn test_decode_detections_suppresses_overlaps_per_class() {
        let mut output = Array2::<f32>::zeros((84, 3));
        set_box(&mut output, 0, 320.0, 320.0, 100.0, 100.0);
        output[[4, 0]] = 0.9;
        set_box(&mut output, 1, 322.0, 322.0, 100.0, 100.0);
        output[[4, 1]] = 0.8;
        // Same place, different class survives
        set_box(&mut output, 2, 320.0, 320.0, 100.0, 100.0);
        output[[4 + 76, 2]] = 0.7;

        let detections = decode_detections(output.view(), &params()).unwrap();
        let labels: Vec<&str> = detections.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["person", "scissors"]);
    }

    #[test]
    fn test_decode_detections_clamps_and_rejects_degenerate() {
        let mut output = Array2::<f32>::zeros((84, 2));
        set_box(&mut output, 0, 630.0, 630.0, 100.0, 100.0);
        output[[4, 0]] = 0.9;
        set_box(&mut output, 1, 100.0, 100.0, 0.0, 10.0);
        output[[4, 1]] = 0.9;

        let detections = decode_detections(output.view(), &params()).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].bbox.x2, 1280.0);
        assert_eq!(detections[0].bbox.y2, 960.0);
    }

    #[test]
    fn test_decode_detections_rejects_short_output() {
        let output = Array2::<f32>::zeros((4, 10));
        assert!(decode_detections(output.view(), &params()).is_err());
    }

    #[test]
    fn test_decode_poses_normalizes_keypoints() {
        let mut output = Array2::<f32>::zeros((56, 2));
        set_box(&mut output, 0, 320.0, 320.0, 200.0, 400.0);
        output[[4, 0]] = 0.8;
        // Left wrist (index 9) near the top of the input
        let wrist = 5 + 9 * 3;
        output[[wrist, 0]] = 320.0;
        output[[wrist + 1, 0]] = 160.0;
        output[[wrist + 2, 0]] = 0.95;
        output[[4, 1]] = 0.05;

        let analysis = decode_poses(output.view(), &params()).unwrap();
        assert_eq!(analysis.detections.len(), 1);
        assert_eq!(analysis.subjects.len(), 1);
        assert_eq!(analysis.detections[0].label, "person");

        let subject = &analysis.subjects[0];
        assert_eq!(subject.keypoints.len(), POSE_KEYPOINTS);
        let joint = subject.joint(9).unwrap();
        assert!((joint.x - 0.5).abs() < 1e-6);
        assert!((joint.y - 0.25).abs() < 1e-6);
        assert!((joint.confidence - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_decode_poses_keeps_subjects_aligned_after_nms() {
        let mut output = Array2::<f32>::zeros((56, 3));
        set_box(&mut output, 0, 200.0, 320.0, 100.0, 300.0);
        output[[4, 0]] = 0.6;
        output[[5, 0]] = 64.0;
        set_box(&mut output, 1, 202.0, 320.0, 100.0, 300.0);
        output[[4, 1]] = 0.7;
        output[[5, 1]] = 128.0;
        set_box(&mut output, 2, 500.0, 320.0, 100.0, 300.0);
        output[[4, 2]] = 0.5;
        output[[5, 2]] = 320.0;
        for col in 0..3 {
            output[[7, col]] = 0.9;
        }

        let analysis = decode_poses(output.view(), &params()).unwrap();
        assert_eq!(analysis.detections.len(), 2);
        assert_eq!(analysis.subjects.len(), 2);
        // Highest score first, its own keypoints attached
        assert!((analysis.detections[0].confidence - 0.7).abs() < 1e-6);
        assert!((analysis.subjects[0].keypoints[0].x - 0.2).abs() < 1e-6);
        assert!((analysis.subjects[1].keypoints[0].x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_decode_poses_zeroes_unseen_joints() {
        let mut output = Array2::<f32>::zeros((56, 1));
        set_box(&mut output, 0, 320.0, 320.0, 200.0, 400.0);
        output[[4, 0]] = 0.8;
        let wrist = 5 + 9 * 3;
        output[[wrist, 0]] = 320.0;
        output[[wrist + 1, 0]] = 320.0;
        output[[wrist + 2, 0]] = 0.1;
        let shoulder = 5 + 5 * 3;
        output[[shoulder, 0]] = 320.0;
        output[[shoulder + 1, 0]] = 320.0;
        output[[shoulder + 2, 0]] = 0.5;

        let analysis = decode_poses(output.view(), &params()).unwrap();
        let subject = &analysis.subjects[0];

        let wrist = subject.joint(9).unwrap();
        assert_eq!((wrist.x, wrist.y), (0.0, 0.0));
        assert!((wrist.confidence - 0.1).abs() < 1e-6);

        let shoulder = subject.joint(5).unwrap();
        assert!((shoulder.x - 0.5).abs() < 1e-6);
        assert!((shoulder.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_decode_poses_rejects_wrong_layout() {
        let output = Array2::<f32>::zeros((84, 2));
        assert!(decode_poses(output.view(), &params()).is_err());
    }
}
