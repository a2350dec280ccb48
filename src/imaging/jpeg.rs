//! JPEG encoding via `jpeg-encoder`.
//!
//! The `image` crate's encoder always writes the standard Huffman tables.
//! `jpeg-encoder` can compute per-image optimized tables, which is what the
//! `optimize` flag turns on: a few percent smaller, pixel-identical.

use super::backend::CodecError;
use super::params::EncodeParams;
use image::RgbImage;
use jpeg_encoder::{ColorType, Encoder};

/// Encode RGB pixels into an in-memory JPEG.
///
/// JPEG dimensions are 16-bit; larger images fail with [`CodecError::Encode`].
pub fn encode_rgb(image: &RgbImage, params: &EncodeParams) -> Result<Vec<u8>, CodecError> {
    let width = jpeg_dimension(image.width())?;
    let height = jpeg_dimension(image.height())?;

    let mut buf = Vec::new();
    let mut encoder = Encoder::new(&mut buf, params.quality.value());
    encoder.set_optimized_huffman_tables(params.optimize);
    encoder
        .encode(image.as_raw(), width, height, ColorType::Rgb)
        .map_err(|e| CodecError::Encode(e.to_string()))?;
    Ok(buf)
}

fn jpeg_dimension(value: u32) -> Result<u16, CodecError> {
    u16::try_from(value).map_err(|_| {
        CodecError::Encode(format!("dimension {value} exceeds the JPEG limit of 65535"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Quality;
    use image::{ImageFormat, Rgb};

    fn noisy(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let v = (x.wrapping_mul(31) ^ y.wrapping_mul(17)) as u8;
            Rgb([v, v.wrapping_add(40), 255 - v])
        })
    }

    fn params(quality: u32, optimize: bool) -> EncodeParams {
        EncodeParams {
            quality: Quality::new(quality),
            optimize,
        }
    }

    #[test]
    fn output_decodes_with_same_dimensions() {
        let bytes = encode_rgb(&noisy(120, 80), &params(95, true)).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (120, 80));
    }

    #[test]
    fn optimized_tables_are_not_larger() {
        let img = noisy(256, 256);
        let plain = encode_rgb(&img, &params(95, false)).unwrap();
        let optimized = encode_rgb(&img, &params(95, true)).unwrap();
        assert!(
            optimized.len() <= plain.len(),
            "optimized {} > plain {}",
            optimized.len(),
            plain.len()
        );
    }

    #[test]
    fn lower_quality_is_smaller() {
        let img = noisy(256, 256);
        let high = encode_rgb(&img, &params(95, true)).unwrap();
        let low = encode_rgb(&img, &params(30, true)).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn encoding_is_deterministic() {
        let img = noisy(64, 64);
        assert_eq!(
            encode_rgb(&img, &params(95, true)).unwrap(),
            encode_rgb(&img, &params(95, true)).unwrap()
        );
    }

    #[test]
    fn oversized_width_is_encode_error() {
        assert!(matches!(jpeg_dimension(70_000), Err(CodecError::Encode(_))));
        assert_eq!(jpeg_dimension(65_535).unwrap(), 65_535);
    }

    #[test]
    fn empty_image_is_encode_error() {
        let result = encode_rgb(&RgbImage::new(0, 0), &params(95, true));
        assert!(matches!(result, Err(CodecError::Encode(_))));
    }
}
