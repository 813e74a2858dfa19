//! Error types for motion_eye

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EyeError {
    /// The frame source returned no frame for this cycle.
    #[error("Capture failure: {0}")]
    CaptureFailure(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl EyeError {
    /// True for failures that only cost the current cycle.
    pub fn is_capture_failure(&self) -> bool {
        matches!(self, EyeError::CaptureFailure(_))
    }
}
