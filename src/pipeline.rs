//! The full background removal pipeline: key, denoise, crop.

use image::RgbaImage;
use tracing::debug;

use crate::crop::crop;
use crate::denoise::denoise;
use crate::keying::key_out;

/// Erosion threshold used by the upload service.
pub const DEFAULT_MIN_SIZE: u32 = 20;

/// Strip the green backdrop from an image and trim it to what remains.
///
/// Equivalent to `crop(denoise(key_out(image), min_size))`. An image with
/// zero width or height comes back as an empty image, and so does one where
/// nothing survives keying. Callers that need content must check the
/// dimensions of the result.
#[must_use]
pub fn remove_green_background(image: &RgbaImage, min_size: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        debug!(width, height, "empty input, skipping pipeline");
        return RgbaImage::new(0, 0);
    }

    let keyed = key_out(image);
    let cleaned = denoise(&keyed, min_size);
    let trimmed = crop(&cleaned);

    debug!(
        width,
        height,
        trimmed_width = trimmed.width(),
        trimmed_height = trimmed.height(),
        "background removed"
    );
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
    const MAGENTA: Rgba<u8> = Rgba([255, 0, 255, 255]);

    #[test]
    fn pure_backdrop_yields_empty_image() {
        let img = RgbaImage::from_pixel(5, 5, GREEN);
        let out = remove_green_background(&img, DEFAULT_MIN_SIZE);
        assert_eq!(out.dimensions(), (0, 0));
    }

    #[test]
    fn zero_height_input_yields_empty_image() {
        let img = RgbaImage::new(7, 0);
        assert_eq!(remove_green_background(&img, 3).dimensions(), (0, 0));
    }

    #[test]
    fn subject_is_kept_and_stray_pixel_dropped() {
        let mut img = RgbaImage::from_pixel(40, 40, GREEN);
        for y in 15..25 {
            for x in 15..25 {
                img.put_pixel(x, y, MAGENTA);
            }
        }
        img.put_pixel(30, 2, MAGENTA);

        let out = remove_green_background(&img, DEFAULT_MIN_SIZE);
        assert_eq!(out.dimensions(), (10, 10));
        assert!(out.pixels().all(|px| *px == MAGENTA));
    }

    #[test]
    fn magenta_with_green_dot_keeps_full_extent() {
        let mut img = RgbaImage::from_pixel(10, 10, MAGENTA);
        img.put_pixel(5, 5, GREEN);

        let out = remove_green_background(&img, 1);
        assert_eq!(out.dimensions(), (10, 10));
        assert_eq!(out.get_pixel(5, 5)[3], 0);
        assert_eq!(*out.get_pixel(0, 0), MAGENTA);
    }
}
