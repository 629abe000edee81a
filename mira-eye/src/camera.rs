//! USB webcam capture

use crate::config::VisionConfig;
use crate::error::VisionError;
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{VideoCapture, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Anything the render loop can pull frames from
pub trait FrameSource {
    /// Next frame, or `Ok(None)` once the stream is over
    fn next_frame(&mut self) -> Result<Option<Mat>, VisionError>;
}

/// Owns the capture device for the render loop
pub struct CameraManager {
    config: Arc<VisionConfig>,
    capture: Option<VideoCapture>,
}

impl CameraManager {
    /// Create a new camera manager; the device is opened by `initialize`
    pub fn new(config: Arc<VisionConfig>) -> Self {
        Self {
            config,
            capture: None,
        }
    }

    /// Open the device and request resolution and frame rate
    pub fn initialize(&mut self) -> Result<(), VisionError> {
        if self.capture.is_some() {
            return Ok(());
        }

        let camera_id = self.config.camera_id;
        let mut capture = VideoCapture::new(camera_id as i32, CAP_ANY)
            .map_err(|e| VisionError::Camera(format!("Failed to open camera {}: {}", camera_id, e)))?;

        if !capture
            .is_opened()
            .map_err(|e| VisionError::Camera(format!("Camera {} not opened: {}", camera_id, e)))?
        {
            return Err(VisionError::Camera(format!("Camera {} failed to open", camera_id)));
        }

        let (width, height) = self.config.resolution;
        // Drivers may ignore these; the frames carry the real size
        for (prop, value, name) in [
            (CAP_PROP_FRAME_WIDTH, width as f64, "width"),
            (CAP_PROP_FRAME_HEIGHT, height as f64, "height"),
            (CAP_PROP_FPS, self.config.frame_rate as f64, "fps"),
        ] {
            match capture.set(prop, value) {
                Ok(true) => {}
                Ok(false) => debug!("Camera {} ignored {} = {}", camera_id, name, value),
                Err(e) => warn!("Failed to set camera {} {}: {}", camera_id, name, e),
            }
        }

        self.capture = Some(capture);
        info!(
            "Camera {} initialized at {}x{} @ {}fps",
            camera_id, width, height, self.config.frame_rate
        );

        Ok(())
    }

    /// Read the next frame.
    ///
    /// `Ok(None)` means the stream is over: the device returned no frame
    /// or an empty one.
    pub fn read_frame(&mut self) -> Result<Option<Mat>, VisionError> {
        let capture = self
            .capture
            .as_mut()
            .ok_or_else(|| VisionError::Camera("Camera not initialized".to_string()))?;

        let mut frame = Mat::default();
        let grabbed = capture
            .read(&mut frame)
            .map_err(|e| VisionError::Camera(format!("Failed to read frame: {}", e)))?;

        if !grabbed || frame.empty() {
            return Ok(None);
        }

        Ok(Some(frame))
    }

    /// Release the device
    pub fn release(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            if let Err(e) = capture.release() {
                warn!("Failed to release camera {}: {}", self.config.camera_id, e);
            }
            info!("Camera {} released", self.config.camera_id);
        }
    }

    pub fn is_open(&self) -> bool {
        self.capture.is_some()
    }
}

impl FrameSource for CameraManager {
    fn next_frame(&mut self) -> Result<Option<Mat>, VisionError> {
        self.read_frame()
    }
}

impl Drop for CameraManager {
    fn drop(&mut self) {
        self.release();
    }
}
