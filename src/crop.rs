//! Trimming an image to the extent of its opaque pixels.

use image::RgbaImage;
use tracing::debug;

use crate::keying::is_opaque;

/// Half-open rectangle `[min_x, max_x) x [min_y, max_y)` enclosing the
/// opaque pixels of an image.
///
/// When the image has no opaque pixel the box is inverted:
/// `min_x = width`, `min_y = height`, `max_x = max_y = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    /// Left edge, inclusive.
    pub min_x: u32,
    /// Top edge, inclusive.
    pub min_y: u32,
    /// Right edge, exclusive.
    pub max_x: u32,
    /// Bottom edge, exclusive.
    pub max_y: u32,
}

impl BoundingBox {
    /// The inverted box reported for an image with no opaque pixel.
    #[must_use]
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            min_x: width,
            min_y: height,
            max_x: 0,
            max_y: 0,
        }
    }

    /// Width of the box, zero when empty.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.max_x.saturating_sub(self.min_x)
    }

    /// Height of the box, zero when empty.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.max_y.saturating_sub(self.min_y)
    }

    /// Returns `true` if the box encloses no pixel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Scan the image for the smallest box holding every opaque pixel.
#[must_use]
pub fn find_bounding_box(image: &RgbaImage) -> BoundingBox {
    let mut bbox = BoundingBox::empty(image.width(), image.height());

    for (x, y, px) in image.enumerate_pixels() {
        if is_opaque(px) {
            bbox.min_x = bbox.min_x.min(x);
            bbox.min_y = bbox.min_y.min(y);
            bbox.max_x = bbox.max_x.max(x + 1);
            bbox.max_y = bbox.max_y.max(y + 1);
        }
    }

    bbox
}

/// Copy the region covered by `bbox` into a new image.
///
/// An empty box produces a 0x0 image. The box is clipped to the source.
#[must_use]
pub fn crop_to(image: &RgbaImage, bbox: BoundingBox) -> RgbaImage {
    let max_x = bbox.max_x.min(image.width());
    let max_y = bbox.max_y.min(image.height());
    let width = max_x.saturating_sub(bbox.min_x);
    let height = max_y.saturating_sub(bbox.min_y);

    if width == 0 || height == 0 {
        return RgbaImage::new(0, 0);
    }

    RgbaImage::from_fn(width, height, |x, y| {
        *image.get_pixel(bbox.min_x + x, bbox.min_y + y)
    })
}

/// Trim the image to the bounding box of its opaque pixels.
#[must_use]
pub fn crop(image: &RgbaImage) -> RgbaImage {
    let bbox = find_bounding_box(image);
    debug!(
        min_x = bbox.min_x,
        min_y = bbox.min_y,
        max_x = bbox.max_x,
        max_y = bbox.max_y,
        "bounding box"
    );
    crop_to(image, bbox)
}
