//! PNG header inspection for generated sheets.

use std::fmt;

use thiserror::Error;

/// The 8-byte PNG file signature
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectError {
    #[error("Not a PNG file (bad signature)")]
    BadSignature,
    #[error("PNG truncated: {0} bytes")]
    Truncated(usize),
    #[error("First chunk is '{0}', expected IHDR")]
    MissingHeader(String),
}

/// What the IHDR chunk says about an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngInfo {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
}

impl PngInfo {
    /// (frames, rows) when the image is an exact grid of `tile` tiles.
    pub fn grid(&self, tile: (u32, u32)) -> Option<(u32, u32)> {
        let (tw, th) = tile;
        if tw == 0 || th == 0 || self.width % tw != 0 || self.height % th != 0 {
            return None;
        }
        Some((self.width / tw, self.height / th))
    }

    pub fn color_name(&self) -> &'static str {
        match self.color_type {
            0 => "grayscale",
            2 => "rgb",
            3 => "indexed",
            4 => "grayscale+alpha",
            6 => "rgba",
            _ => "unknown",
        }
    }
}

impl fmt::Display for PngInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} {}-bit {}",
            self.width,
            self.height,
            self.bit_depth,
            self.color_name()
        )
    }
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Check the signature and read the IHDR chunk.
///
/// ```
/// use spriteforge::inspect::{inspect_png, InspectError};
///
/// assert_eq!(inspect_png(b"GIF89a"), Err(InspectError::BadSignature));
/// ```
pub fn inspect_png(bytes: &[u8]) -> Result<PngInfo, InspectError> {
    if bytes.len() < PNG_SIGNATURE.len() || bytes[..8] != PNG_SIGNATURE {
        return Err(InspectError::BadSignature);
    }
    // signature(8) + length(4) + type(4) + IHDR data(13)
    if bytes.len() < 29 {
        return Err(InspectError::Truncated(bytes.len()));
    }
    let chunk_type = &bytes[12..16];
    if chunk_type != b"IHDR" {
        return Err(InspectError::MissingHeader(String::from_utf8_lossy(chunk_type).into_owned()));
    }
    Ok(PngInfo {
        width: be_u32(&bytes[16..20]),
        height: be_u32(&bytes[20..24]),
        bit_depth: bytes[24],
        color_type: bytes[25],
    })
}
