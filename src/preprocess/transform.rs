use crate::error::ImageDecodeError;
use crate::preprocess::tensor::{ImageTensor, INPUT_SIZE};
use image::imageops::{self, FilterType};
use image::RgbImage;

pub const RESIZE_SHORTER_EDGE: u32 = 256;
pub const CROP_SIZE: u32 = INPUT_SIZE as u32;

/// ImageNet channel statistics the weights were trained against.
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Longest edge the resize step may produce. Images whose aspect ratio would
/// exceed it are rejected rather than resampled into a huge buffer.
pub const MAX_RESIZED_EDGE: u32 = 65_536;

/// Target size when scaling the shorter edge to `shorter`; the longer edge
/// is truncated, never rounded. `None` for empty images or when the longer
/// edge would exceed [`MAX_RESIZED_EDGE`].
pub fn resized_dimensions(width: u32, height: u32, shorter: u32) -> Option<(u32, u32)> {
    if width == 0 || height == 0 {
        return None;
    }
    let scale_long = |long: u32, short: u32| {
        u32::try_from(shorter as u64 * long as u64 / short as u64)
            .ok()
            .filter(|edge| *edge <= MAX_RESIZED_EDGE)
    };
    if width <= height {
        Some((shorter, scale_long(height, width)?))
    } else {
        Some((scale_long(width, height)?, shorter))
    }
}

/// Leading offset of a centered window, rounding halves to even.
pub fn crop_offset(length: u32, window: u32) -> u32 {
    (length.saturating_sub(window) as f64 / 2.0).round_ties_even() as u32
}

pub fn resize_shorter_edge(image: &RgbImage, shorter: u32) -> Result<RgbImage, ImageDecodeError> {
    let (width, height) = image.dimensions();
    let (new_width, new_height) = resized_dimensions(width, height, shorter)
        .ok_or(ImageDecodeError::UnsupportedDimensions { width, height })?;
    if (new_width, new_height) == (width, height) {
        return Ok(image.clone());
    }
    Ok(imageops::resize(image, new_width, new_height, FilterType::Triangle))
}

/// A `CROP_SIZE` x `CROP_SIZE` image. Only [`center_crop`] builds one.
#[derive(Debug, Clone)]
pub struct Cropped(RgbImage);

pub fn center_crop(image: &RgbImage) -> Option<Cropped> {
    let (width, height) = image.dimensions();
    if width < CROP_SIZE || height < CROP_SIZE {
        return None;
    }
    let left = crop_offset(width, CROP_SIZE);
    let top = crop_offset(height, CROP_SIZE);
    let window = imageops::crop_imm(image, left, top, CROP_SIZE, CROP_SIZE).to_image();
    Some(Cropped(window))
}

/// Scales to `[0, 1]`, normalizes with [`MEAN`]/[`STD`] and lays out NCHW.
pub fn to_tensor(image: &Cropped) -> ImageTensor {
    let pixels = &image.0;
    ImageTensor::from_fn(|(_, c, y, x)| {
        let value = pixels.get_pixel(x as u32, y as u32)[c];
        (value as f32 / 255.0 - MEAN[c]) / STD[c]
    })
}

pub fn transform(image: &RgbImage) -> Result<ImageTensor, ImageDecodeError> {
    let resized = resize_shorter_edge(image, RESIZE_SHORTER_EDGE)?;
    let (width, height) = resized.dimensions();
    let cropped = center_crop(&resized)
        .ok_or(ImageDecodeError::UnsupportedDimensions { width, height })?;
    Ok(to_tensor(&cropped))
}
