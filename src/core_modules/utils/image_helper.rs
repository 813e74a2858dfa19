pub mod image_helper {
    use crate::error::EyeError;
    use image::{GrayImage, ImageEncoder};
    use std::path::{Path, PathBuf};

    /// Writes a single-channel image as PNG.
    pub fn save_gray(path: &Path, image: &GrayImage) -> Result<(), EyeError> {
        let output = std::fs::File::create(path)?;
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::L8,
        )?;

        Ok(())
    }

    /// Writes a cycle's difference mask as `mask_<cycle>.png` inside `dir`.
    pub fn save_mask(dir: &Path, cycle: u64, mask: &GrayImage) -> Result<PathBuf, EyeError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("mask_{cycle:06}.png"));
        save_gray(&path, mask)?;
        Ok(path)
    }
}
