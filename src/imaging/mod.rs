//! Image codec layer.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode HEIC/HEIF** | `libheif-rs` (system libheif) |
//! | **Flatten alpha** | integer source-over onto a background colour |
//! | **Encode JPEG** | `jpeg-encoder` with optional optimized Huffman tables |
//! | **Sniff container** | `ftyp` box parser, used by diagnostics |
//!
//! The module is split into:
//! - **Parameters**: quality and encode flags
//! - **Backend**: [`ImageCodec`] trait + [`LibheifCodec`]
//! - **Flatten / sniff**: pure functions, unit testable without any codec

pub mod backend;
pub mod flatten;
mod jpeg;
pub mod libheif_backend;
mod params;
pub mod sniff;

pub use backend::{CodecError, ImageCodec};
pub use flatten::flatten_to_rgb;
pub use libheif_backend::LibheifCodec;
pub use params::{DEFAULT_BACKGROUND, EncodeParams, Quality};
