//! Erasure of small opaque particles left behind by keying.
//!
//! Imperfect keying leaves anti-aliased fringes and stray pixels around the
//! subject. Four directional sweeps walk the image; whenever an opaque pixel
//! is followed by `min_size` transparent pixels along the sweep's look-ahead
//! direction, the `min_size x min_size` block anchored at that pixel is
//! cleared.
//!
//! The cleared block always extends right and down from the detection origin,
//! whatever the look-ahead direction. Existing processed assets depend on this
//! footprint, so it is kept as is.

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::keying::is_opaque;

/// Fully transparent black.
const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// One of the four directional passes, in the order [`denoise`] runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sweep {
    /// Columns left to right, rows top to bottom, looking down.
    Down,
    /// Rows top to bottom, columns right to left, looking left.
    Leftward,
    /// Columns left to right, rows bottom to top, looking up.
    Up,
    /// Rows top to bottom, columns left to right, looking right.
    Rightward,
}

impl Sweep {
    /// The fixed order in which the sweeps are applied.
    pub const ORDER: [Sweep; 4] = [Sweep::Down, Sweep::Leftward, Sweep::Up, Sweep::Rightward];

    /// Look-ahead direction `(dx, dy)` tested at each opaque pixel.
    #[must_use]
    pub fn direction(self) -> (i32, i32) {
        match self {
            Sweep::Down => (0, 1),
            Sweep::Leftward => (-1, 0),
            Sweep::Up => (0, -1),
            Sweep::Rightward => (1, 0),
        }
    }
}

/// Check whether the `min_size` pixels strictly ahead of `(x, y)` along
/// `(dx, dy)` are all inside the image and transparent.
///
/// The origin pixel itself is not inspected. Running off the edge before
/// `min_size` steps counts as "not small".
#[must_use]
pub fn is_small_particle(
    image: &RgbaImage,
    x: u32,
    y: u32,
    min_size: u32,
    dx: i32,
    dy: i32,
) -> bool {
    (1..=i64::from(min_size)).all(|i| {
        let nx = i64::from(x) + i * i64::from(dx);
        let ny = i64::from(y) + i * i64::from(dy);
        match (u32::try_from(nx), u32::try_from(ny)) {
            (Ok(nx), Ok(ny)) => image
                .get_pixel_checked(nx, ny)
                .is_some_and(|px| !is_opaque(px)),
            _ => false,
        }
    })
}

/// Clear the `min_size x min_size` block whose top-left corner is `(x, y)`.
///
/// The block is clipped to the image bounds.
pub fn erase(image: &mut RgbaImage, x: u32, y: u32, min_size: u32) {
    let x2 = x.saturating_add(min_size).min(image.width());
    let y2 = y.saturating_add(min_size).min(image.height());

    for py in y..y2 {
        for px in x..x2 {
            image.put_pixel(px, py, CLEAR);
        }
    }
}

/// Run a single sweep over the working image and hand it back.
#[must_use]
pub fn apply_sweep(mut image: RgbaImage, sweep: Sweep, min_size: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    let (dx, dy) = sweep.direction();
    let mut erased = 0usize;

    let mut visit = |image: &mut RgbaImage, x: u32, y: u32| {
        if is_opaque(image.get_pixel(x, y)) && is_small_particle(image, x, y, min_size, dx, dy) {
            erase(image, x, y, min_size);
            erased += 1;
        }
    };

    match sweep {
        Sweep::Down => {
            for x in 0..width {
                for y in 0..height {
                    visit(&mut image, x, y);
                }
            }
        }
        Sweep::Leftward => {
            for y in 0..height {
                for x in (0..width).rev() {
                    visit(&mut image, x, y);
                }
            }
        }
        Sweep::Up => {
            for x in 0..width {
                for y in (0..height).rev() {
                    visit(&mut image, x, y);
                }
            }
        }
        Sweep::Rightward => {
            for y in 0..height {
                for x in 0..width {
                    visit(&mut image, x, y);
                }
            }
        }
    }

    debug!(?sweep, erased, "particle sweep finished");
    image
}

/// Remove small particles with all four sweeps.
///
/// Each sweep sees the erasures of the ones before it, so the result is
/// deterministic for a given input and `min_size`. A `min_size` of zero
/// leaves the image unchanged.
#[must_use]
pub fn denoise(image: &RgbaImage, min_size: u32) -> RgbaImage {
    if min_size == 0 {
        return image.clone();
    }

    Sweep::ORDER
        .into_iter()
        .fold(image.clone(), |working, sweep| {
            apply_sweep(working, sweep, min_size)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPAQUE: Rgba<u8> = Rgba([255, 0, 255, 255]);

    fn single_pixel(width: u32, height: u32, x: u32, y: u32) -> RgbaImage {
        let mut img = RgbaImage::new(width, height);
        img.put_pixel(x, y, OPAQUE);
        img
    }

    fn opaque_set(img: &RgbaImage) -> Vec<(u32, u32)> {
        img.enumerate_pixels()
            .filter(|(_, _, px)| is_opaque(px))
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    #[test]
    fn small_particle_needs_room_in_the_tested_direction() {
        let img = single_pixel(5, 5, 0, 0);
        assert!(is_small_particle(&img, 0, 0, 4, 1, 0));
        assert!(!is_small_particle(&img, 0, 0, 5, 1, 0));
        assert!(!is_small_particle(&img, 0, 0, 1, -1, 0));
        assert!(!is_small_particle(&img, 0, 0, 1, 0, -1));
    }

    #[test]
    fn opaque_pixel_ahead_is_not_a_particle() {
        let mut img = single_pixel(10, 10, 2, 2);
        img.put_pixel(2, 5, OPAQUE);
        assert!(!is_small_particle(&img, 2, 2, 4, 0, 1));
        assert!(is_small_particle(&img, 2, 2, 2, 0, 1));
    }

    #[test]
    fn origin_is_not_rechecked() {
        let img = RgbaImage::from_pixel(3, 3, OPAQUE);
        let mut holed = img.clone();
        holed.put_pixel(1, 0, CLEAR);
        holed.put_pixel(2, 0, CLEAR);
        assert!(is_small_particle(&holed, 0, 0, 2, 1, 0));
    }

    #[test]
    fn erase_clips_to_image_bounds() {
        let mut img = RgbaImage::from_pixel(3, 3, OPAQUE);
        erase(&mut img, 1, 1, 5);
        assert_eq!(
            opaque_set(&img),
            vec![(0, 0), (1, 0), (2, 0), (0, 1), (0, 2)]
        );

        erase(&mut img, 7, 7, 3);
        assert_eq!(opaque_set(&img).len(), 5);
    }

    #[test]
    fn isolated_pixel_is_erased() {
        let img = single_pixel(30, 30, 5, 5);
        let cleaned = denoise(&img, 3);
        assert!(opaque_set(&cleaned).is_empty());
    }

    #[test]
    fn particle_without_room_in_any_direction_survives() {
        let img = single_pixel(4, 4, 0, 3);
        let cleaned = denoise(&img, 4);
        assert_eq!(opaque_set(&cleaned), vec![(0, 3)]);
    }

    #[test]
    fn fully_opaque_image_is_untouched() {
        let img = RgbaImage::from_pixel(12, 8, OPAQUE);
        assert_eq!(denoise(&img, 3), img);
    }

    #[test]
    fn transparent_hole_grows_by_one_pixel_per_side_with_min_size_one() {
        let mut img = RgbaImage::from_pixel(10, 10, OPAQUE);
        img.put_pixel(5, 5, Rgba([0, 255, 0, 0]));

        let cleaned = denoise(&img, 1);
        for (x, y, px) in cleaned.enumerate_pixels() {
            let in_hole = (4..=6).contains(&x) && (4..=6).contains(&y);
            assert_eq!(!is_opaque(px), in_hole, "pixel ({x},{y})");
        }
    }

    #[test]
    fn upward_detection_clears_block_below_and_right() {
        let mut img = RgbaImage::new(10, 10);
        for (x, y) in [(2, 5), (2, 7), (3, 6), (4, 7), (2, 8), (2, 1)] {
            img.put_pixel(x, y, OPAQUE);
        }

        // (2,5) sees three transparent pixels above it; the block it clears
        // is [2,5) x [5,8), not the run it looked at
        let swept = apply_sweep(img, Sweep::Up, 3);
        assert_eq!(opaque_set(&swept), vec![(2, 1), (2, 8)]);
    }

    #[test]
    fn leftward_detection_clears_block_to_the_right() {
        let mut img = RgbaImage::new(10, 10);
        for (x, y) in [(5, 2), (6, 3), (7, 4), (8, 2), (1, 2)] {
            img.put_pixel(x, y, OPAQUE);
        }

        // (8,2) is blocked by (5,2) three steps to its left; (5,2) sees x=4..2
        // clear and wipes [5,8) x [2,5), leaving (1,2) on the tested side
        let swept = apply_sweep(img, Sweep::Leftward, 3);
        assert_eq!(opaque_set(&swept), vec![(1, 2), (8, 2)]);
    }

    #[test]
    fn each_sweep_sees_earlier_erasures() {
        let mut img = RgbaImage::from_pixel(10, 10, OPAQUE);
        img.put_pixel(5, 5, CLEAR);

        let after_down = apply_sweep(img, Sweep::Down, 1);
        assert!(!is_opaque(after_down.get_pixel(5, 4)));

        // (6,4) only has a transparent left neighbour because of the first sweep
        let after_left = apply_sweep(after_down, Sweep::Leftward, 1);
        assert!(!is_opaque(after_left.get_pixel(6, 4)));
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn denoise_only_removes_opacity() {
        let img = RgbaImage::from_fn(40, 40, |x, y| {
            let alpha = if (x * 7 + y * 13) % 5 == 0 { 0 } else { 255 };
            Rgba([(x * 3) as u8, (y * 5) as u8, 10, alpha])
        });
        let before = opaque_set(&img);
        let after = opaque_set(&denoise(&img, 3));
        assert!(after.iter().all(|p| before.contains(p)));
    }

    #[test]
    fn zero_min_size_is_a_no_op() {
        let img = single_pixel(8, 8, 3, 3);
        assert_eq!(denoise(&img, 0), img);
    }

    #[test]
    fn empty_image_stays_empty() {
        let cleaned = denoise(&RgbaImage::new(0, 0), 20);
        assert_eq!(cleaned.dimensions(), (0, 0));
    }

    #[test]
    fn sweep_directions_match_order() {
        let dirs: Vec<_> = Sweep::ORDER.iter().map(|s| s.direction()).collect();
        assert_eq!(dirs, vec![(0, 1), (-1, 0), (0, -1), (1, 0)]);
    }
}
