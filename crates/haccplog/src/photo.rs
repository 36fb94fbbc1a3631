//! Photo normalization.
//!
//! Photos are stored inline in the day records, so they are shrunk to a
//! bounded width and re-encoded as JPEG before being attached.

use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::{debug, warn};

use crate::config::PhotoConfig;
use crate::error::{Error, Result};

/// Prefix of every normalized photo payload.
pub const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Decode `bytes`, bound the width, and return a JPEG data URL.
///
/// Images narrower than `config.max_width` keep their size.
///
/// # Errors
///
/// Returns [`Error::UnreadableImage`] if `bytes` is not a supported image,
/// or [`Error::ImageEncode`] if re-encoding fails.
pub fn normalize_photo(bytes: &[u8], config: &PhotoConfig) -> Result<String> {
    let image = image::load_from_memory(bytes).map_err(|e| Error::UnreadableImage {
        reason: e.to_string(),
    })?;

    let (width, height) = (image.width(), image.height());
    let image = if width > config.max_width {
        let scaled_height = scaled_height(width, height, config.max_width);
        debug!(
            from = %format!("{width}x{height}"),
            to = %format!("{}x{scaled_height}", config.max_width),
            "Downscaling photo"
        );
        image.resize_exact(config.max_width, scaled_height, FilterType::Triangle)
    } else {
        image
    };

    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut encoded = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut encoded, config.jpeg_quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| Error::ImageEncode(e.to_string()))?;

    let encoded = encoded.into_inner();
    debug!(bytes = encoded.len(), "Encoded photo");
    Ok(format!("{DATA_URL_PREFIX}{}", STANDARD.encode(encoded)))
}

/// Like [`normalize_photo`], but a failure only drops the photo.
///
/// The rest of the edit the photo belongs to should still go ahead.
#[must_use]
pub fn photo_or_skip(bytes: &[u8], config: &PhotoConfig) -> Option<String> {
    match normalize_photo(bytes, config) {
        Ok(photo) => Some(photo),
        Err(e) => {
            warn!("Photo not attached: {e}");
            None
        }
    }
}

/// Read a photo file and normalize it with [`photo_or_skip`].
///
/// A file that cannot be read is dropped with a warning, like an undecodable one.
#[must_use]
pub fn photo_from_path(path: &Path, config: &PhotoConfig) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => photo_or_skip(&bytes, config),
        Err(e) => {
            warn!("Photo not attached: cannot read {}: {e}", path.display());
            None
        }
    }
}

fn scaled_height(width: u32, height: u32, max_width: u32) -> u32 {
    let scaled = u64::from(height) * u64::from(max_width) / u64::from(width.max(1));
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}
