//! Alpha flattening for JPEG output.
//!
//! JPEG has no alpha channel. HEIF images may carry one (screenshots, edited
//! exports), so transparent pixels are composited onto a fixed background
//! colour before encoding. Integer math with round-half-up keeps the result
//! identical across runs and platforms.
//!
//! Compositing expects straight alpha. Images stored with premultiplied alpha
//! go through [`unpremultiply`] first.

use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

/// Convert any decoded image to 8-bit RGB, compositing alpha onto `background`.
///
/// Images without alpha go through `to_rgb8` unchanged (grayscale expands,
/// 16-bit narrows).
pub fn flatten_to_rgb(image: &DynamicImage, background: Rgb<u8>) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        composite(*rgba.get_pixel(x, y), background)
    })
}

/// Source-over composite of one pixel onto an opaque background.
pub fn composite(pixel: Rgba<u8>, background: Rgb<u8>) -> Rgb<u8> {
    let alpha = pixel[3] as u32;
    let blend = |fg: u8, bg: u8| -> u8 {
        ((fg as u32 * alpha + bg as u32 * (255 - alpha) + 127) / 255) as u8
    };
    Rgb([
        blend(pixel[0], background[0]),
        blend(pixel[1], background[1]),
        blend(pixel[2], background[2]),
    ])
}

/// Convert premultiplied colour values back to straight alpha, in place.
///
/// Fully transparent and fully opaque pixels are unchanged. Channels larger
/// than their alpha (invalid when premultiplied) saturate at 255.
pub fn unpremultiply(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        let alpha = pixel[3] as u32;
        if alpha == 0 || alpha == 255 {
            continue;
        }
        for channel in &mut pixel.0[..3] {
            *channel = ((*channel as u32 * 255 + alpha / 2) / alpha).min(255) as u8;
        }
    }
}
