//! Chroma-key matting against a green backdrop.
//!
//! A pixel is treated as backdrop when its green channel outweighs red and
//! blue combined: `R + B < G`. This is a fixed linear rule, not a distance or
//! range key. Foreground colors that satisfy it (yellow-greens, for example)
//! are keyed out as well; that is a property of the rule, not a defect.

use image::{Rgba, RgbaImage};

/// Returns `true` if the pixel has any opacity.
#[must_use]
pub fn is_opaque(px: &Rgba<u8>) -> bool {
    px[3] != 0
}

/// Returns `true` if the pixel belongs to the green backdrop.
#[must_use]
pub fn is_background(px: &Rgba<u8>) -> bool {
    let [r, g, b, _] = px.0;
    u16::from(r) + u16::from(b) < u16::from(g)
}

/// Make every backdrop pixel fully transparent.
///
/// Returns a new image of the same dimensions. Backdrop pixels keep their
/// color channels and only lose their alpha; all other pixels are copied
/// unchanged.
#[must_use]
pub fn key_out(image: &RgbaImage) -> RgbaImage {
    let mut keyed = image.clone();
    for px in keyed.pixels_mut() {
        if is_background(px) {
            px[3] = 0;
        }
    }
    keyed
}
