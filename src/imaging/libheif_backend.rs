//! Production codec: libheif for decoding, `jpeg-encoder` for encoding.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Parse HEIF container | `libheif_rs::HeifContext::read_from_bytes` |
//! | Decode primary image | `LibHeif::decode` → interleaved RGB / RGBA, 8 bits per channel |
//! | Encode → JPEG | [`jpeg::encode_rgb`](super::jpeg::encode_rgb) |
//!
//! libheif applies the container's rotation and mirror properties during
//! decode, so the pixels come out upright. Premultiplied alpha is converted
//! to straight alpha before the image leaves this module.

use super::backend::{CodecError, ImageCodec};
use super::flatten::unpremultiply;
use super::jpeg;
use super::params::EncodeParams;
use image::{DynamicImage, RgbImage, RgbaImage};
use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

/// Codec backed by the system libheif.
pub struct LibheifCodec {
    lib: LibHeif,
}

impl LibheifCodec {
    pub fn new() -> Self {
        Self {
            lib: LibHeif::new(),
        }
    }
}

impl Default for LibheifCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(err: libheif_rs::HeifError) -> CodecError {
    CodecError::Decode(err.to_string())
}

/// Copy `height` rows of `width * channels` bytes out of a strided buffer.
fn pack_rows(
    data: &[u8],
    width: u32,
    height: u32,
    stride: usize,
    channels: usize,
) -> Result<Vec<u8>, CodecError> {
    let row_len = width as usize * channels;
    if stride < row_len {
        return Err(CodecError::Decode(format!(
            "plane stride {stride} shorter than row of {row_len} bytes"
        )));
    }
    let mut packed = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let line = data.get(start..start + row_len).ok_or_else(|| {
            CodecError::Decode(format!("decoded plane truncated at row {row}"))
        })?;
        packed.extend_from_slice(line);
    }
    Ok(packed)
}

impl ImageCodec for LibheifCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError> {
        let ctx = HeifContext::read_from_bytes(bytes).map_err(decode_error)?;
        let handle = ctx.primary_image_handle().map_err(decode_error)?;

        let has_alpha = handle.has_alpha_channel();
        let (chroma, channels) = if has_alpha {
            (RgbChroma::Rgba, 4)
        } else {
            (RgbChroma::Rgb, 3)
        };
        let decoded = self
            .lib
            .decode(&handle, ColorSpace::Rgb(chroma), None)
            .map_err(decode_error)?;

        let planes = decoded.planes();
        let plane = planes.interleaved.ok_or_else(|| {
            CodecError::Decode("decoder returned no interleaved RGB plane".into())
        })?;
        let (width, height) = (plane.width, plane.height);
        let pixels = pack_rows(plane.data, width, height, plane.stride, channels)?;

        let mismatch = || CodecError::Decode("decoded buffer does not match dimensions".into());
        if has_alpha {
            let mut rgba = RgbaImage::from_raw(width, height, pixels).ok_or_else(mismatch)?;
            if handle.is_premultiplied_alpha() {
                unpremultiply(&mut rgba);
            }
            Ok(DynamicImage::ImageRgba8(rgba))
        } else {
            let rgb = RgbImage::from_raw(width, height, pixels).ok_or_else(mismatch)?;
            Ok(DynamicImage::ImageRgb8(rgb))
        }
    }

    fn encode_jpeg(&self, image: &RgbImage, params: &EncodeParams) -> Result<Vec<u8>, CodecError> {
        jpeg::encode_rgb(image, params)
    }
}
