//! Frame acquisition.
//!
//! The tracker never talks to a camera directly. Anything that can hand over one color
//! frame per call implements [`FrameSource`]; a read that produces no frame is a
//! [`EyeError::CaptureFailure`] and must never be papered over with a stale image.

use crate::error::EyeError;
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A pull-based supplier of color frames.
pub trait FrameSource {
    /// Blocks until the next frame is available.
    fn read(&mut self) -> Result<RgbImage, EyeError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read(&mut self) -> Result<RgbImage, EyeError> {
        (**self).read()
    }
}

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff", "webp"];

/// Replays the image files of a directory, in file-name order, as a video stream.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    next: usize,
    looping: bool,
}

impl ImageSequenceSource {
    /// Collects every image file directly inside `dir`.
    pub fn open(dir: impl AsRef<Path>, looping: bool) -> Result<Self, EyeError> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_frame = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if path.is_file() && is_frame {
                paths.push(path);
            }
        }
        paths.sort();
        info!(dir = %dir.display(), frames = paths.len(), looping, "Opened image sequence");
        Ok(Self::from_paths(paths, looping))
    }

    pub fn from_paths(paths: Vec<PathBuf>, looping: bool) -> Self {
        Self {
            paths,
            next: 0,
            looping,
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn read(&mut self) -> Result<RgbImage, EyeError> {
        if self.next >= self.paths.len() {
            if self.looping && !self.paths.is_empty() {
                self.next = 0;
            } else {
                return Err(EyeError::CaptureFailure("image sequence exhausted".to_string()));
            }
        }

        let path = &self.paths[self.next];
        self.next += 1;
        debug!(path = %path.display(), "Reading frame");
        image::open(path)
            .map(|image| image.to_rgb8())
            .map_err(|e| EyeError::CaptureFailure(format!("failed to decode {}: {e}", path.display())))
    }
}
