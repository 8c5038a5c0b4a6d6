//! Vision utilities
//!
//! Handles image preparation and format conversion for the vision backend.

use crate::error::ExtractError;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Prepare an image for the vision backend
///
/// - Resizes if too large
/// - Converts to JPEG for optimal size
pub fn prepare_image_for_vision(image_data: &[u8], max_dimension: u32) -> Result<Vec<u8>, ExtractError> {
    let img = image::load_from_memory(image_data).map_err(|e| ExtractError::parse("image", e))?;
    encode_for_vision(img, max_dimension)
}

/// Resize and encode an already decoded image as JPEG
pub fn encode_for_vision(img: DynamicImage, max_dimension: u32) -> Result<Vec<u8>, ExtractError> {
    let img = resize_if_needed(img, max_dimension);

    // JPEG has no alpha channel
    let img = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .map_err(|e| ExtractError::parse("image", e))?;

    Ok(buffer)
}

/// Resize image if it exceeds maximum dimensions
fn resize_if_needed(img: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = (img.width(), img.height());

    if width <= max_dimension && height <= max_dimension {
        return img;
    }

    let scale = (max_dimension as f32 / width.max(height) as f32).min(1.0);
    let new_width = ((width as f32 * scale) as u32).max(1);
    let new_height = ((height as f32 * scale) as u32).max(1);

    img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
}
