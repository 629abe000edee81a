//! HUD rendering on synthetic frames

use mira_core::{BoundingBox, Detection, FrameAnalysis, Keypoint, Subject};
use mira_eye::hud::{HudRenderer, HudView, Status};
use opencv::core::{Mat, Scalar, Vec3b, VecN, CV_8UC3};
use opencv::prelude::*;

fn gray_frame(width: i32, height: i32) -> Mat {
    Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(200.0)).unwrap()
}

fn pixel(mat: &Mat, x: i32, y: i32) -> Vec3b {
    *mat.at_2d::<Vec3b>(y, x).unwrap()
}

fn view(status: Status) -> HudView {
    HudView {
        status,
        reaction: "Analyzing...".to_string(),
    }
}

#[test]
fn test_render_leaves_input_untouched() {
    let frame = gray_frame(640, 480);
    let hud = HudRenderer::default();
    let out = hud
        .render(&frame, &FrameAnalysis::default(), &view(Status::Mood { emotion: "neutral".to_string() }))
        .unwrap();

    assert_eq!(out.cols(), 640);
    assert_eq!(out.rows(), 480);
    assert_eq!(pixel(&frame, 600, 10), VecN([200, 200, 200]));
}

#[test]
fn test_header_band_is_darkened() {
    let frame = gray_frame(640, 480);
    let hud = HudRenderer::default();
    let out = hud
        .render(&frame, &FrameAnalysis::default(), &view(Status::Security { threat: false }))
        .unwrap();

    // 0.6 * 10 + 0.4 * 200 = 86
    let header = pixel(&out, 600, 100);
    assert!((header[0] as i32 - 86).abs() <= 1, "header pixel {:?}", header);
    // Below the band and the separator the frame is as captured
    assert_eq!(pixel(&out, 600, 300), VecN([200, 200, 200]));
    // Separator is green when secure
    assert_eq!(pixel(&out, 600, 120), VecN([0, 255, 0]));
}

#[test]
fn test_threat_separator_is_red() {
    let frame = gray_frame(640, 480);
    let hud = HudRenderer::default();
    let out = hud
        .render(&frame, &FrameAnalysis::default(), &view(Status::Security { threat: true }))
        .unwrap();
    assert_eq!(pixel(&out, 600, 120), VecN([0, 0, 255]));
}

#[test]
fn test_detections_and_keypoints_are_drawn() {
    let frame = gray_frame(640, 480);
    let analysis = FrameAnalysis::new(
        vec![
            Detection::new(BoundingBox::new(100.0, 200.0, 300.0, 400.0), 0, "person", 0.9),
            Detection::new(BoundingBox::new(400.0, 200.0, 500.0, 300.0), 43, "knife", 0.8),
        ],
        vec![Subject::new(vec![Keypoint::new(0.5, 0.75, 0.9); 17])],
    );

    let hud = HudRenderer::default();
    let out = hud
        .render(&frame, &analysis, &view(Status::Security { threat: true }))
        .unwrap();

    // Person box edge in magenta, knife box edge in red
    assert_eq!(pixel(&out, 200, 200), VecN([255, 0, 255]));
    assert_eq!(pixel(&out, 450, 200), VecN([0, 0, 255]));
    // Keypoint at (320, 360) in green
    assert_eq!(pixel(&out, 320, 360), VecN([0, 255, 0]));
}

#[test]
fn test_unflagged_labels_get_no_box() {
    let frame = gray_frame(640, 480);
    let analysis = FrameAnalysis::new(
        vec![Detection::new(BoundingBox::new(100.0, 200.0, 300.0, 400.0), 41, "cup", 0.9)],
        Vec::new(),
    );

    let hud = HudRenderer::default();
    let out = hud
        .render(&frame, &analysis, &view(Status::Security { threat: false }))
        .unwrap();

    assert_eq!(pixel(&out, 200, 200), VecN([200, 200, 200]));
    assert_eq!(pixel(&out, 100, 300), VecN([200, 200, 200]));
}

#[test]
fn test_small_frame_renders() {
    // Shorter than the header band and the first text baseline
    let frame = gray_frame(160, 60);
    let hud = HudRenderer::default();
    let reaction = "x".repeat(300);
    let out = hud
        .render(
            &frame,
            &FrameAnalysis::default(),
            &HudView {
                status: Status::Mood { emotion: "happy".to_string() },
                reaction,
            },
        )
        .unwrap();
    assert_eq!(out.rows(), 60);
}

#[test]
fn test_empty_frame_is_error() {
    let hud = HudRenderer::default();
    let result = hud.render(
        &Mat::default(),
        &FrameAnalysis::default(),
        &view(Status::Security { threat: false }),
    );
    assert!(result.is_err());
}
