//! Parameter types for the JPEG encode step.
//!
//! These structs describe *what* the encoder should produce, not *how*. They
//! sit between the batch converter (which reads them from config) and the
//! [`codec`](super::backend::ImageCodec) that does the pixel work, so a mock
//! codec can record exactly what it was asked to do.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG quality (1–100, default 95). Clamped on construction.
//! - [`EncodeParams`]: quality plus the size-optimizing flag.

use image::Rgb;

/// Quality setting for JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Everything the encoder needs besides the pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeParams {
    pub quality: Quality,
    /// Emit optimized Huffman tables: smaller files, same pixels.
    pub optimize: bool,
}

impl Default for EncodeParams {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            optimize: true,
        }
    }
}

/// Colour that transparent pixels are composited onto before encoding.
pub const DEFAULT_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
