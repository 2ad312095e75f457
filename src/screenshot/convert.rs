//! Re-encode captured frames as web-suitable JPEGs.

use image::codecs::jpeg::JpegEncoder;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

/// Fixed quality for the final screenshots.
pub const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to decode captured frame '{path}': {source}")]
    Decode {
        path: String,
        source: image::ImageError,
    },
    #[error("failed to write jpeg '{path}': {source}")]
    Encode {
        path: String,
        source: image::ImageError,
    },
}

/// Decode the raw capture (mpv writes PNG) and re-encode it as JPEG.
/// Synchronous; callers run it on a blocking thread.
pub fn convert_to_jpeg(source: &Path, dest: &Path) -> Result<(), ConvertError> {
    let img = image::open(source).map_err(|e| ConvertError::Decode {
        path: source.display().to_string(),
        source: e,
    })?;

    let file = File::create(dest).map_err(|e| ConvertError::Encode {
        path: dest.display().to_string(),
        source: image::ImageError::IoError(e),
    })?;
    let mut writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
    img.write_with_encoder(encoder).map_err(|e| ConvertError::Encode {
        path: dest.display().to_string(),
        source: e,
    })?;

    tracing::debug!(dest = %dest.display(), quality = JPEG_QUALITY, "converted frame to jpeg");
    Ok(())
}
