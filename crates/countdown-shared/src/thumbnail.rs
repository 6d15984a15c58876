use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;

use crate::constants::{THUMBNAIL_JPEG_QUALITY, THUMBNAIL_MAX_DIMENSION};
use crate::error::ThumbnailError;

/// A downscaled JPEG rendition of a countdown background.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

impl Thumbnail {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.jpeg)
    }
}

/// Scale factor that brings the longer edge down to `max_dimension`.
/// Never above 1: small images keep their size.
pub fn scale_factor(width: u32, height: u32, max_dimension: u32) -> f64 {
    let longer = width.max(height);
    if longer <= max_dimension {
        1.0
    } else {
        f64::from(max_dimension) / f64::from(longer)
    }
}

fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let scale = scale_factor(width, height, max_dimension);
    if scale >= 1.0 {
        return (width, height);
    }
    let w = ((f64::from(width) * scale).round() as u32).clamp(1, max_dimension);
    let h = ((f64::from(height) * scale).round() as u32).clamp(1, max_dimension);
    (w, h)
}

/// Decode `image_bytes`, shrink it to fit [`THUMBNAIL_MAX_DIMENSION`] and
/// re-encode it as JPEG.
pub fn make_thumbnail(image_bytes: &[u8]) -> Result<Thumbnail, ThumbnailError> {
    make_thumbnail_with(image_bytes, THUMBNAIL_MAX_DIMENSION, THUMBNAIL_JPEG_QUALITY)
}

pub fn make_thumbnail_with(
    image_bytes: &[u8],
    max_dimension: u32,
    quality: u8,
) -> Result<Thumbnail, ThumbnailError> {
    let img = image::load_from_memory(image_bytes)?;
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(ThumbnailError::Empty);
    }

    let (w, h) = scaled_dimensions(width, height, max_dimension);
    let img = if (w, h) == (width, height) {
        img
    } else {
        img.resize_exact(w, h, FilterType::Triangle)
    };

    // JPEG has no alpha channel.
    let rgb = img.to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality).encode_image(&rgb)?;

    Ok(Thumbnail {
        width: w,
        height: h,
        jpeg,
    })
}
