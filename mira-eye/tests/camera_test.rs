//! Tests for CameraManager
//!
//! These stay off the capture hardware: nothing here opens a device.

use mira_eye::camera::CameraManager;
use mira_eye::config::VisionConfig;
use mira_eye::error::VisionError;
use std::sync::Arc;

#[test]
fn test_camera_manager_starts_closed() {
    let manager = CameraManager::new(Arc::new(VisionConfig::default()));
    assert!(!manager.is_open());
}

#[test]
fn test_read_frame_before_initialize_is_camera_error() {
    let mut manager = CameraManager::new(Arc::new(VisionConfig::default()));
    match manager.read_frame() {
        Err(VisionError::Camera(msg)) => assert!(msg.contains("not initialized")),
        Err(other) => panic!("Expected camera error, got {}", other),
        Ok(_) => panic!("Expected camera error"),
    }
}

#[test]
fn test_release_is_idempotent() {
    let mut manager = CameraManager::new(Arc::new(VisionConfig::default()));
    manager.release();
    manager.release();
    assert!(!manager.is_open());
}
