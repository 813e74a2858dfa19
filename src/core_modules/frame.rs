// THEORY:
// The `Frame` module is the entry point for raw camera data. A camera hands us a color
// raster; the tracker only ever wants a single intensity channel that has had its
// pixel-level sensor noise washed out. `Frame` is that normalized form.
//
// Key architectural principles:
// 1.  **Luminance only**: Color is collapsed with the Rec. 601 weights (the same legacy
//     luminance definition used for brightness everywhere else in this crate). Motion
//     shows up as a change in brightness long before it shows up as a change in hue.
// 2.  **Low-pass first**: A wide Gaussian blur is applied before any comparison. A
//     single flickering photosite then cannot produce a "changed" pixel on its own; only
//     spatially coherent changes survive.
// 3.  **Dumb container**: A `Frame` holds its pixels and knows how to compare itself to
//     another frame of the same size. It has no memory of earlier frames.

use crate::error::EyeError;
use image::{GrayImage, Luma, RgbImage, imageops};

/// A grayscale, blurred 8-bit raster ready for differencing.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pixels: GrayImage,
}

impl Frame {
    /// Converts a color capture to grayscale and blurs it with a `kernel_size` square kernel.
    pub fn from_rgb(image: &RgbImage, kernel_size: u32) -> Result<Self, EyeError> {
        let gray = luminance(image);
        Self::from_gray(gray, kernel_size)
    }

    /// Blurs an already single-channel image. An empty raster is a failed capture.
    pub fn from_gray(gray: GrayImage, kernel_size: u32) -> Result<Self, EyeError> {
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Err(EyeError::CaptureFailure(format!("empty {width}x{height} frame")));
        }
        let pixels = match kernel_sigma(kernel_size) {
            Some(sigma) => imageops::blur(&gray, sigma),
            None => gray,
        };
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &GrayImage {
        &self.pixels
    }

    /// Per-pixel absolute intensity difference. Both frames must share dimensions.
    pub fn abs_diff(&self, other: &Frame) -> GrayImage {
        let (width, height) = self.dimensions();
        GrayImage::from_fn(width, height, |x, y| {
            let a = self.pixels.get_pixel(x, y)[0];
            let b = other.pixels.get_pixel(x, y)[0];
            Luma([a.abs_diff(b)])
        })
    }
}

/// Rec. 601 luma of every pixel, rounded to the nearest intensity.
pub fn luminance(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let luma = 0.299_f64 * r as f64 + 0.587_f64 * g as f64 + 0.114_f64 * b as f64;
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}

/// Gaussian sigma for a square kernel of side `kernel_size`, derived the way common
/// vision libraries do when only the kernel size is given. `None` means "do not blur".
pub fn kernel_sigma(kernel_size: u32) -> Option<f32> {
    if kernel_size <= 1 {
        return None;
    }
    let k = kernel_size as f32;
    Some(0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8)
}
