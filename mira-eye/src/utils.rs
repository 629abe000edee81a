//! Frame-to-tensor conversions shared by the models

use crate::error::VisionError;
use ndarray::Array4;
use opencv::{
    core::{Mat, Size, Vec3f, CV_32F, CV_32FC3},
    imgproc,
    prelude::*,
};

fn check_target(width: u32, height: u32) -> Result<(), VisionError> {
    if width == 0 || height == 0 {
        return Err(VisionError::Processing("Target dimensions cannot be zero".to_string()));
    }
    if width > 4096 || height > 4096 {
        return Err(VisionError::Processing("Target dimensions too large (max 4096)".to_string()));
    }
    Ok(())
}

fn check_source(frame: &Mat, channels: i32) -> Result<(), VisionError> {
    if frame.empty() || frame.cols() <= 0 || frame.rows() <= 0 {
        return Err(VisionError::Processing("Invalid image dimensions".to_string()));
    }
    if frame.channels() != channels {
        return Err(VisionError::Processing(format!(
            "Expected {} channel(s), got {}",
            channels,
            frame.channels()
        )));
    }
    Ok(())
}

/// Resize a BGR frame and lay it out as a `[1, 3, H, W]` RGB tensor in `[0, 1]`
pub fn bgr_to_nchw(frame: &Mat, width: u32, height: u32) -> Result<Array4<f32>, VisionError> {
    check_target(width, height)?;
    check_source(frame, 3)?;

    let mut resized = Mat::default();
    imgproc::resize(
        frame,
        &mut resized,
        Size::new(width as i32, height as i32),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;

    let mut rgb = Mat::default();
    imgproc::cvt_color(&resized, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

    let mut float_mat = Mat::default();
    rgb.convert_to(&mut float_mat, CV_32FC3, 1.0 / 255.0, 0.0)?;

    let (w, h) = (width as usize, height as usize);
    let pixels = float_mat.data_typed::<Vec3f>()?;
    if pixels.len() != w * h {
        return Err(VisionError::Processing(format!(
            "Resized frame has {} pixels, expected {}",
            pixels.len(),
            w * h
        )));
    }

    let mut tensor = Array4::<f32>::zeros((1, 3, h, w));
    for (i, px) in pixels.iter().enumerate() {
        let (y, x) = (i / w, i % w);
        for c in 0..3 {
            tensor[[0, c, y, x]] = px[c];
        }
    }

    Ok(tensor)
}

/// Resize a single-channel image into a `[1, 1, H, W]` tensor of raw
/// intensities (0-255)
pub fn gray_to_nchw(gray: &Mat, width: u32, height: u32) -> Result<Array4<f32>, VisionError> {
    check_target(width, height)?;
    check_source(gray, 1)?;

    let mut resized = Mat::default();
    imgproc::resize(
        gray,
        &mut resized,
        Size::new(width as i32, height as i32),
        0.0,
        0.0,
        imgproc::INTER_AREA,
    )?;

    let mut float_mat = Mat::default();
    resized.convert_to(&mut float_mat, CV_32F, 1.0, 0.0)?;

    let (w, h) = (width as usize, height as usize);
    let pixels = float_mat.data_typed::<f32>()?;
    Array4::from_shape_vec((1, 1, h, w), pixels.to_vec())
        .map_err(|e| VisionError::Processing(format!("Failed to shape gray tensor: {}", e)))
}

/// Numerically stable softmax; non-finite inputs count as zero weight
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![0.0; logits.len()];
    }

    let exps: Vec<f32> = logits
        .iter()
        .map(|v| if v.is_finite() { (v - max).exp() } else { 0.0 })
        .collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
