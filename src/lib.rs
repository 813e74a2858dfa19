// THEORY:
// This file is the main entry point for the `motion_eye` library crate. It exposes the
// `EyePipeline` (one call per rendered frame) and the `MotionTracker` underneath it as
// the public API, together with the seams a deployment plugs into: `FrameSource` for
// the camera, `InputSource` for the blink button and `Renderer` for whatever draws the
// eye.
//
// The building blocks (`core_modules`) stay public for callers that only want part of
// the stack, e.g. motion tracking without any animation.

pub mod capture;
pub mod config;
pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use capture::{FrameSource, ImageSequenceSource};
pub use config::EyeConfig;
pub use core_modules::gaze::{GazeMapping, GazePoint};
pub use core_modules::motion_tracker::{Detection, MotionReport, MotionTracker, TrackerState};
pub use core_modules::region_detector::Region;
pub use error::EyeError;
pub use parallel_pipeline::CaptureHandoff;
pub use pipeline::{EyePipeline, EyePose, InputSource, LogRenderer, NoInput, Renderer, RunSummary};
