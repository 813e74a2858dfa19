pub mod blink;
pub mod difference_mask;
pub mod eyelid;
pub mod frame;
pub mod gaze;
pub mod motion_tracker;
pub mod pupil;
pub mod region_detector;
pub mod utils;
