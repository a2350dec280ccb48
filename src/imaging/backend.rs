//! Codec trait and shared error type.
//!
//! The [`ImageCodec`] trait is the seam between the batch converter and the
//! actual image libraries. The converter hands it raw file bytes and gets a
//! decoded image back, then hands it RGB pixels and gets JPEG bytes back. It
//! never sees libheif or the JPEG encoder directly.
//!
//! The production implementation is
//! [`LibheifCodec`](super::libheif_backend::LibheifCodec).

use super::params::EncodeParams;
use image::{DynamicImage, RgbImage};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Trait for HEIC/HEIF → JPEG codecs.
///
/// Both operations work on memory only; reading the source file and writing
/// the output are the caller's job.
pub trait ImageCodec {
    /// Decode a HEIC/HEIF file's bytes into pixels.
    ///
    /// The returned image keeps its alpha channel if the source had one.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError>;

    /// Encode opaque RGB pixels as a baseline JPEG.
    fn encode_jpeg(&self, image: &RgbImage, params: &EncodeParams) -> Result<Vec<u8>, CodecError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use image::{Rgb, Rgba, RgbaImage};
    use std::sync::Mutex;

    /// Leading bytes of a synthetic "HEIF" file the mock can decode.
    pub const MOCK_MAGIC: &[u8; 8] = b"MOCKHEIF";

    /// Build bytes that [`MockCodec::decode`] turns into a `width`×`height` image.
    pub fn mock_heif_bytes(width: u16, height: u16, alpha: bool) -> Vec<u8> {
        let mut bytes = MOCK_MAGIC.to_vec();
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        bytes.push(alpha as u8);
        bytes
    }

    /// Mock codec that records operations and produces deterministic output.
    /// Uses Mutex (not RefCell) so a shared reference can record.
    #[derive(Default)]
    pub struct MockCodec {
        pub operations: Mutex<Vec<RecordedOp>>,
        pub fail_encode: bool,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode {
            len: usize,
        },
        Encode {
            width: u32,
            height: u32,
            quality: u8,
            optimize: bool,
        },
    }

    impl MockCodec {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_encode() -> Self {
            Self {
                fail_encode: true,
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageCodec for MockCodec {
        fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode { len: bytes.len() });

            if bytes.len() < 13 || &bytes[..8] != MOCK_MAGIC {
                return Err(CodecError::Decode("not a HEIF container".into()));
            }
            let width = u16::from_le_bytes([bytes[8], bytes[9]]) as u32;
            let height = u16::from_le_bytes([bytes[10], bytes[11]]) as u32;
            if bytes[12] == 1 {
                Ok(DynamicImage::ImageRgba8(RgbaImage::from_fn(
                    width,
                    height,
                    |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, 0, 128]),
                )))
            } else {
                Ok(DynamicImage::ImageRgb8(RgbImage::from_fn(
                    width,
                    height,
                    |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 64]),
                )))
            }
        }

        fn encode_jpeg(
            &self,
            image: &RgbImage,
            params: &EncodeParams,
        ) -> Result<Vec<u8>, CodecError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                width: image.width(),
                height: image.height(),
                quality: params.quality.value(),
                optimize: params.optimize,
            });

            if self.fail_encode {
                return Err(CodecError::Encode("mock encoder refused".into()));
            }
            let mut out = b"MOCKJPEG".to_vec();
            out.push(params.quality.value());
            out.extend_from_slice(image.as_raw());
            Ok(out)
        }
    }

    #[test]
    fn mock_decodes_synthetic_bytes() {
        let codec = MockCodec::new();
        let img = codec.decode(&mock_heif_bytes(4, 3, false)).unwrap();
        assert_eq!((img.width(), img.height()), (4, 3));
        assert!(!img.color().has_alpha());

        let ops = codec.get_operations();
        assert_eq!(ops, vec![RecordedOp::Decode { len: 13 }]);
    }

    #[test]
    fn mock_rejects_foreign_bytes() {
        let codec = MockCodec::new();
        let result = codec.decode(b"definitely not heif");
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    #[test]
    fn mock_records_encode_params() {
        let codec = MockCodec::new();
        let rgb = RgbImage::new(2, 2);
        let params = EncodeParams {
            quality: crate::imaging::Quality::new(80),
            optimize: false,
        };
        let bytes = codec.encode_jpeg(&rgb, &params).unwrap();
        assert!(bytes.starts_with(b"MOCKJPEG"));

        assert!(matches!(
            &codec.get_operations()[0],
            RecordedOp::Encode {
                width: 2,
                height: 2,
                quality: 80,
                optimize: false,
            }
        ));
    }
}
