//! Image bytes to normalized model input.
//!
//! The transform chain is the one the classifier was trained with and must
//! not change: decode to RGB, resize the shorter edge to 256, center-crop
//! 224x224, scale to `[0, 1]`, normalize per channel, lay out as NCHW.

pub mod decode;
pub mod tensor;
pub mod transform;

use crate::error::ImageDecodeError;
use tensor::ImageTensor;

pub fn preprocess(bytes: &[u8]) -> Result<ImageTensor, ImageDecodeError> {
    let rgb = decode::decode_rgb(bytes)?;
    transform::transform(&rgb)
}
