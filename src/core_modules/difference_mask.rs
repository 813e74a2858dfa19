// THEORY:
// The `DifferenceMask` is the binary "what changed" picture of one cycle. It is built in
// two steps from the absolute difference between the reference frame and the live frame:
//
// 1.  **Threshold**: a pixel is marked changed when its difference reaches the cutoff.
//     The cutoff is inclusive, so a delta of exactly `threshold` always counts.
// 2.  **Dilation**: each pass grows every changed pixel into its 3x3 neighbourhood. Two
//     passes close small gaps and glue nearby fragments of the same moving object into
//     one region, trading fine shape detail for fewer, larger, more stable regions.
//
// Changed pixels are stored as 255 and unchanged pixels as 0 so the mask can be dumped
// and inspected as an ordinary grayscale image.

use crate::core_modules::frame::Frame;
use image::{GrayImage, Luma};

pub const CHANGED: u8 = 255;
pub const UNCHANGED: u8 = 0;

/// A binary raster marking the pixels that changed between two frames.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferenceMask {
    mask: GrayImage,
}

impl DifferenceMask {
    /// Thresholds the difference between `reference` and `current`, then dilates it.
    pub fn between(reference: &Frame, current: &Frame, threshold: u8, dilation_iterations: u32) -> Self {
        let diff = reference.abs_diff(current);
        let mut mask = Self::threshold(&diff, threshold);
        mask.dilate(dilation_iterations);
        mask
    }

    /// Marks every pixel whose value is at least `threshold`.
    pub fn threshold(diff: &GrayImage, threshold: u8) -> Self {
        let (width, height) = diff.dimensions();
        let mask = GrayImage::from_fn(width, height, |x, y| {
            if diff.get_pixel(x, y)[0] >= threshold {
                Luma([CHANGED])
            } else {
                Luma([UNCHANGED])
            }
        });
        Self { mask }
    }

    /// Grows changed areas by one pixel in every direction per iteration.
    pub fn dilate(&mut self, iterations: u32) {
        for _ in 0..iterations {
            self.mask = dilate_once(&self.mask);
        }
    }

    pub fn width(&self) -> u32 {
        self.mask.width()
    }

    pub fn height(&self) -> u32 {
        self.mask.height()
    }

    pub fn is_changed(&self, x: u32, y: u32) -> bool {
        self.mask.get_pixel(x, y)[0] == CHANGED
    }

    pub fn changed_count(&self) -> usize {
        self.mask.pixels().filter(|p| p[0] == CHANGED).count()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.mask
    }
}

/// One pass of a 3x3 square dilation. Pixels outside the raster never count as changed.
fn dilate_once(mask: &GrayImage) -> GrayImage {
    let (width, height) = mask.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let x_lo = x.saturating_sub(1);
        let y_lo = y.saturating_sub(1);
        let x_hi = (x + 1).min(width - 1);
        let y_hi = (y + 1).min(height - 1);
        for ny in y_lo..=y_hi {
            for nx in x_lo..=x_hi {
                if mask.get_pixel(nx, ny)[0] == CHANGED {
                    return Luma([CHANGED]);
                }
            }
        }
        Luma([UNCHANGED])
    })
}
