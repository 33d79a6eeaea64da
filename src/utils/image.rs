//! Loading label crops and encoding reconstructed images.

use crate::core::{EnsembleError, EnsembleResult};
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::Path;

/// Converts a DynamicImage to an RgbImage.
pub fn dynamic_to_rgb(img: DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Loads an image from a file path and converts it to RgbImage.
///
/// # Errors
///
/// [`EnsembleError::MissingImage`] when nothing exists at `path`, and a
/// rendering error when the file cannot be decoded.
pub fn load_image(path: &Path) -> EnsembleResult<RgbImage> {
    if !path.is_file() {
        return Err(EnsembleError::MissingImage {
            path: path.to_path_buf(),
        });
    }
    let img = image::open(path)
        .map_err(|e| EnsembleError::rendering(&format!("decoding {}", path.display()), e))?;
    Ok(dynamic_to_rgb(img))
}

/// Encodes an image in the format named by `extension`.
pub fn encode_image(img: &RgbImage, extension: &str) -> EnsembleResult<Vec<u8>> {
    let format = ImageFormat::from_extension(extension).ok_or_else(|| {
        EnsembleError::invalid_input(format!("unknown image extension: {extension}"))
    })?;
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, format)
        .map_err(|e| EnsembleError::output(&format!("encoding {extension} image"), e))?;
    Ok(buffer.into_inner())
}
