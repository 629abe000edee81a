//! On-screen window

use crate::error::VisionError;
use opencv::{core::Mat, highgui};
use tracing::{info, warn};

/// Key that ends the session
pub const QUIT_KEY: char = 'q';

/// True when the low byte of a `wait_key` code is the quit key
pub fn is_quit_key(code: i32) -> bool {
    code >= 0 && (code & 0xFF) as u8 == QUIT_KEY as u8
}

/// Where annotated frames go
pub trait FrameSink {
    /// Present a frame; true when the user asked to stop
    fn present(&mut self, frame: &Mat) -> Result<bool, VisionError>;
}

/// A named highgui window, destroyed on drop
pub struct DisplayWindow {
    name: String,
}

impl DisplayWindow {
    pub fn open(name: impl Into<String>) -> Result<Self, VisionError> {
        let name = name.into();
        highgui::named_window(&name, highgui::WINDOW_AUTOSIZE)
            .map_err(|e| VisionError::Display(format!("Failed to open window {}: {}", name, e)))?;
        info!("Opened window {}", name);
        Ok(Self { name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn show(&self, frame: &Mat) -> Result<(), VisionError> {
        highgui::imshow(&self.name, frame)?;
        Ok(())
    }

    /// Wait 1 ms for a key; true when the quit key was pressed
    pub fn quit_requested(&self) -> Result<bool, VisionError> {
        let code = highgui::wait_key(1)?;
        Ok(is_quit_key(code))
    }
}

impl FrameSink for DisplayWindow {
    fn present(&mut self, frame: &Mat) -> Result<bool, VisionError> {
        self.show(frame)?;
        self.quit_requested()
    }
}

impl Drop for DisplayWindow {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_window(&self.name) {
            warn!("Failed to destroy window {}: {}", self.name, e);
        }
    }
}
