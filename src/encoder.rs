//! Lossless sheet encoding and file output

use std::fmt;
use std::path::Path;

use base64::Engine;
use image::{ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resolver::GenerationLog;

/// Error type for encoding and output operations
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Image encoding error
    #[error("Failed to encode sprite sheet: {0}")]
    Image(#[from] image::ImageError),
    /// IO error during file operations
    #[error("Failed to write sprite sheet: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot encode an empty {0}x{1} canvas")]
    Empty(u32, u32),
}

/// Output container. Only lossless formats are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetFormat {
    #[default]
    Png,
}

impl SheetFormat {
    pub fn mime(self) -> &'static str {
        match self {
            SheetFormat::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            SheetFormat::Png => "png",
        }
    }
}

impl fmt::Display for SheetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// An encoded sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSheet {
    pub bytes: Vec<u8>,
    pub format: SheetFormat,
    pub width: u32,
    pub height: u32,
}

/// Encode `canvas` as PNG, appending dimension and size notes to `log`.
pub fn encode(canvas: &RgbaImage, log: &mut GenerationLog) -> Result<EncodedSheet, EncodeError> {
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return Err(EncodeError::Empty(width, height));
    }

    let mut bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut bytes).write_image(
        canvas.as_raw(),
        width,
        height,
        image::ColorType::Rgba8,
    )?;

    log.push(format!("sheet: {}x{} px", width, height));
    log.push(format!("encoded: {} bytes {}", bytes.len(), SheetFormat::Png.mime()));
    Ok(EncodedSheet { bytes, format: SheetFormat::Png, width, height })
}

/// `data:` URI for embedding a sheet in JSON responses.
///
/// ```
/// use spriteforge::encoder::{data_uri, SheetFormat};
///
/// assert_eq!(data_uri(SheetFormat::Png, b"hi"), "data:image/png;base64,aGk=");
/// ```
pub fn data_uri(format: SheetFormat, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        format.mime(),
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Write encoded bytes to `path`, creating parent directories.
pub fn save(bytes: &[u8], path: &Path) -> Result<(), EncodeError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::TempDir;

    fn checker() -> RgbaImage {
        RgbaImage::from_fn(6, 4, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        })
    }

    #[test]
    fn test_png_is_lossless() {
        let canvas = checker();
        let mut log = GenerationLog::new();
        let sheet = encode(&canvas, &mut log).unwrap();
        assert_eq!(&sheet.bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&sheet.bytes).unwrap().to_rgba8();
        assert_eq!(decoded, canvas);
        assert_eq!((sheet.width, sheet.height), (6, 4));
    }

    #[test]
    fn test_encoder_notes() {
        let mut log = GenerationLog::new();
        let sheet = encode(&checker(), &mut log).unwrap();
        assert_eq!(log.lines()[0], "sheet: 6x4 px");
        assert_eq!(log.lines()[1], format!("encoded: {} bytes image/png", sheet.bytes.len()));
    }

    #[test]
    fn test_empty_canvas_rejected() {
        let mut log = GenerationLog::new();
        assert!(matches!(encode(&RgbaImage::new(0, 4), &mut log), Err(EncodeError::Empty(0, 4))));
        assert!(log.is_empty());
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out/sheet.png");
        save(b"png", &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"png");
    }
}
