use crate::error::ImageDecodeError;
use image::RgbImage;

// ISO-BMFF major brands used by HEIF/HEIC stills and sequences.
const HEIF_BRANDS: [&[u8]; 10] = [
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"hevm", b"hevs", b"mif1", b"msf1",
];

pub fn is_heif(bytes: &[u8]) -> bool {
    bytes.len() >= 12
        && &bytes[4..8] == b"ftyp"
        && HEIF_BRANDS.iter().any(|brand| &bytes[8..12] == *brand)
}

/// Decodes any supported raster format into 8-bit RGB. Alpha is dropped, not
/// composited, and EXIF orientation is left as stored.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, ImageDecodeError> {
    if bytes.is_empty() {
        return Err(ImageDecodeError::Empty);
    }

    if is_heif(bytes) {
        return decode_heif(bytes);
    }

    let image = image::load_from_memory(bytes)?;
    Ok(image.to_rgb8())
}

#[cfg(feature = "heic")]
fn decode_heif(bytes: &[u8]) -> Result<RgbImage, ImageDecodeError> {
    use libheif_rs::{ColorSpace, HeifContext, HeifError, LibHeif, RgbChroma};

    let malformed = |e: HeifError| ImageDecodeError::Malformed(Box::new(e));

    let lib_heif = LibHeif::new();
    let context = HeifContext::read_from_bytes(bytes).map_err(malformed)?;
    let handle = context.primary_image_handle().map_err(malformed)?;
    let image = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(malformed)?;

    let planes = image.planes();
    let interleaved = planes
        .interleaved
        .ok_or_else(|| ImageDecodeError::UnsupportedFormat {
            format: "heic without an interleaved RGB plane".to_string(),
        })?;

    let width = interleaved.width;
    let height = interleaved.height;
    let row_len = width as usize * 3;
    let mut raw = Vec::with_capacity(row_len * height as usize);
    for row in interleaved.data.chunks(interleaved.stride).take(height as usize) {
        raw.extend_from_slice(&row[..row_len.min(row.len())]);
    }

    RgbImage::from_raw(width, height, raw).ok_or_else(|| {
        ImageDecodeError::Malformed("heic plane shorter than its dimensions".into())
    })
}

#[cfg(not(feature = "heic"))]
fn decode_heif(_bytes: &[u8]) -> Result<RgbImage, ImageDecodeError> {
    Err(ImageDecodeError::UnsupportedFormat {
        format: "heic (built without the `heic` feature)".to_string(),
    })
}
