//! Vertical row shift applied to captured frames before packing
//!
//! Rows are counted from the bottom of the image, as everywhere else in sheet
//! addressing, so a positive `dy` moves content upward: bottom-up row `y` lands
//! on row `y + dy`. Vacated rows become fully transparent and rows pushed past
//! an edge are dropped.

use image::{Rgba, RgbaImage};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Shift an image vertically by `dy` rows (positive = up).
///
/// `dy == 0` returns the input unchanged without allocating.
pub fn shift_rows(image: RgbaImage, dy: i32) -> RgbaImage {
    if dy == 0 {
        return image;
    }

    let (width, height) = image.dimensions();
    let mut out = RgbaImage::from_pixel(width, height, TRANSPARENT);

    for src_top in 0..height {
        // Up in bottom-up rows is toward y = 0 in the buffer
        let dst_top = src_top as i64 - dy as i64;
        if dst_top < 0 || dst_top >= height as i64 {
            continue;
        }
        for x in 0..width {
            out.put_pixel(x, dst_top as u32, *image.get_pixel(x, src_top));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x4 image whose bottom-up row `r` is filled with red = r + 1.
    fn striped() -> RgbaImage {
        let mut image = RgbaImage::new(4, 4);
        for (_, y, p) in image.enumerate_pixels_mut() {
            let bottom_up = 3 - y;
            *p = Rgba([bottom_up as u8 + 1, 0, 0, 255]);
        }
        image
    }

    fn row(image: &RgbaImage, bottom_up: u32) -> Rgba<u8> {
        *image.get_pixel(0, image.height() - 1 - bottom_up)
    }

    #[test]
    fn test_shift_up_two() {
        let out = shift_rows(striped(), 2);

        // Row 0 moved to row 2, row 1 to row 3
        assert_eq!(row(&out, 2), Rgba([1, 0, 0, 255]));
        assert_eq!(row(&out, 3), Rgba([2, 0, 0, 255]));
        // Vacated rows are transparent
        assert_eq!(row(&out, 0), TRANSPARENT);
        assert_eq!(row(&out, 1), TRANSPARENT);
        // Original rows 2 and 3 went past the top edge
        assert!(out.pixels().all(|p| p[0] != 3 && p[0] != 4));
    }

    #[test]
    fn test_shift_down() {
        let out = shift_rows(striped(), -1);
        assert_eq!(row(&out, 0), Rgba([2, 0, 0, 255]));
        assert_eq!(row(&out, 2), Rgba([4, 0, 0, 255]));
        assert_eq!(row(&out, 3), TRANSPARENT);
    }

    #[test]
    fn test_zero_shift_is_identity() {
        assert_eq!(shift_rows(striped(), 0), striped());
    }

    #[test]
    fn test_shift_past_height_clears_image() {
        let out = shift_rows(striped(), 4);
        assert!(out.pixels().all(|p| *p == TRANSPARENT));
        let out = shift_rows(striped(), -9);
        assert!(out.pixels().all(|p| *p == TRANSPARENT));
    }
}
