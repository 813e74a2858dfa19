use image::{Rgb, RgbImage};
use motion_eye::config::{ANIMATION_DIFFERENCE_THRESHOLD, DETECTOR_DIFFERENCE_THRESHOLD, TrackerConfig};
use motion_eye::{EyeError, FrameSource, GazeMapping, GazePoint, MotionReport, MotionTracker, Region, TrackerState};

const WIDTH: u32 = 160;
const HEIGHT: u32 = 120;

fn uniform(value: u8) -> RgbImage {
    RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([value, value, value]))
}

fn with_patch(mut image: RgbImage, x: u32, y: u32, w: u32, h: u32, value: u8) -> RgbImage {
    for py in y..y + h {
        for px in x..x + w {
            image.put_pixel(px, py, Rgb([value, value, value]));
        }
    }
    image
}

/// No blur, default dilation: the mask is exactly the patch grown by the dilation.
fn sharp_config(threshold: u8) -> TrackerConfig {
    TrackerConfig {
        blur_kernel_size: 1,
        difference_threshold: threshold,
        ..TrackerConfig::default()
    }
}

fn region_of(report: MotionReport) -> Region {
    report.region().expect("expected motion")
}

#[test]
fn first_update_only_bootstraps() {
    let mut tracker = MotionTracker::new(TrackerConfig::default(), GazeMapping::default());
    assert_eq!(tracker.state(), TrackerState::Uninitialized);

    let busy = with_patch(uniform(0), 10, 10, 100, 80, 255);
    assert_eq!(tracker.update(&busy).unwrap(), MotionReport::NoMotion);
    assert_eq!(tracker.state(), TrackerState::Tracking);
    assert!(tracker.reference().is_some());
    assert_eq!(tracker.gaze_target(), GazePoint::default());
}

#[test]
fn identical_frames_never_move_the_gaze() {
    let mut tracker = MotionTracker::new(TrackerConfig::default(), GazeMapping::default());
    // Some texture so the blur has something to do.
    let mut textured = uniform(0);
    for (x, y, pixel) in textured.enumerate_pixels_mut() {
        let v = ((x * 7 + y * 13) % 256) as u8;
        *pixel = Rgb([v, v / 2, 255 - v]);
    }

    tracker.update(&textured).unwrap();
    let initial = tracker.gaze_target();
    for _ in 0..20 {
        assert_eq!(tracker.update(&textured).unwrap(), MotionReport::NoMotion);
        assert_eq!(tracker.gaze_target(), initial);
    }
}

#[test]
fn single_patch_matches_within_dilation_margin() {
    let mut tracker = MotionTracker::new(sharp_config(ANIMATION_DIFFERENCE_THRESHOLD), GazeMapping::identity());
    tracker.update(&uniform(50)).unwrap();

    let report = tracker.update(&with_patch(uniform(50), 40, 30, 20, 10, 200)).unwrap();
    // Two dilation passes grow the patch by two pixels on each side.
    assert_eq!(
        region_of(report),
        Region { x: 38, y: 28, width: 24, height: 14, area: 24 * 14 }
    );
}

#[test]
fn blurred_patch_is_found_around_the_patch() {
    let config = TrackerConfig::default();
    let margin = config.blur_kernel_size + config.dilation_iterations;
    let mut tracker = MotionTracker::new(config, GazeMapping::identity());
    tracker.update(&uniform(50)).unwrap();

    let (px, py, pw, ph) = (60, 40, 30, 20);
    let region = region_of(tracker.update(&with_patch(uniform(50), px, py, pw, ph, 200)).unwrap());

    assert!(region.x <= px && region.x + margin >= px, "{region:?}");
    assert!(region.y <= py && region.y + margin >= py, "{region:?}");
    assert!(region.x + region.width >= px + pw, "{region:?}");
    assert!(region.x + region.width <= px + pw + margin, "{region:?}");
    assert!(region.y + region.height >= py + ph, "{region:?}");
    assert!(region.y + region.height <= py + ph + margin, "{region:?}");

    let (cx, cy) = region.center();
    assert!((cx - 75.0).abs() <= 1.5, "center x {cx}");
    assert!((cy - 50.0).abs() <= 1.5, "center y {cy}");
}

#[test]
fn largest_patch_wins_not_the_union() {
    let mut tracker = MotionTracker::new(sharp_config(ANIMATION_DIFFERENCE_THRESHOLD), GazeMapping::identity());
    tracker.update(&uniform(30)).unwrap();

    let frame = with_patch(with_patch(uniform(30), 10, 10, 10, 10, 220), 80, 50, 30, 20, 220);
    let region = region_of(tracker.update(&frame).unwrap());
    assert_eq!(region, Region { x: 78, y: 48, width: 34, height: 24, area: 34 * 24 });
    assert!(!region.contains(15, 15));
}

#[test]
fn largest_patch_wins_with_blur() {
    let mut tracker = MotionTracker::new(TrackerConfig::default(), GazeMapping::identity());
    tracker.update(&uniform(30)).unwrap();

    let frame = with_patch(with_patch(uniform(30), 5, 5, 12, 12, 220), 90, 50, 40, 30, 220);
    let region = region_of(tracker.update(&frame).unwrap());
    assert!(region.x > 17, "small patch leaked into {region:?}");
    assert!(region.contains(110, 65));
}

fn classify(threshold: u8, delta: u8) -> MotionReport {
    let mut tracker = MotionTracker::new(sharp_config(threshold), GazeMapping::identity());
    tracker.update(&uniform(100)).unwrap();
    tracker.update(&with_patch(uniform(100), 50, 50, 8, 8, 100 + delta)).unwrap()
}

#[test]
fn threshold_boundary_at_both_cutoffs() {
    for cutoff in [ANIMATION_DIFFERENCE_THRESHOLD, DETECTOR_DIFFERENCE_THRESHOLD] {
        assert_eq!(classify(cutoff, cutoff - 1), MotionReport::NoMotion, "cutoff {cutoff}");
        assert!(classify(cutoff, cutoff).is_motion(), "cutoff {cutoff}");
    }
}

#[test]
fn cutoffs_disagree_between_ten_and_twenty() {
    // A delta of 10..20 is motion for the animation cutoff but not for the detector's.
    for delta in [10u8, 15, 19] {
        assert!(classify(ANIMATION_DIFFERENCE_THRESHOLD, delta).is_motion());
        assert_eq!(classify(DETECTOR_DIFFERENCE_THRESHOLD, delta), MotionReport::NoMotion);
    }
}

#[test]
fn gaze_target_is_idempotent() {
    let mut tracker = MotionTracker::new(sharp_config(10), GazeMapping::default());
    tracker.update(&uniform(0)).unwrap();
    tracker.update(&with_patch(uniform(0), 20, 20, 10, 10, 255)).unwrap();
    let first = tracker.gaze_target();
    let second = tracker.gaze_target();
    assert_eq!(first, second);
}

#[test]
fn gaze_uses_the_affine_mapping() {
    let mut tracker = MotionTracker::new(sharp_config(10), GazeMapping::default());
    tracker.update(&uniform(0)).unwrap();
    let region = region_of(tracker.update(&with_patch(uniform(0), 20, 20, 10, 10, 255)).unwrap());

    let (cx, cy) = region.center();
    let gaze = tracker.gaze_target();
    assert!((gaze.x - ((320.0 + cx) / 6.0 + 260.0)).abs() < 1e-9);
    assert!((gaze.y - ((240.0 - cy) / 6.0)).abs() < 1e-9);
}

#[test]
fn no_motion_keeps_last_gaze() {
    let mut tracker = MotionTracker::new(sharp_config(10), GazeMapping::identity());
    tracker.update(&uniform(0)).unwrap();
    let moved = with_patch(uniform(0), 20, 20, 10, 10, 255);
    tracker.update(&moved).unwrap();
    let after_motion = tracker.gaze_target();
    assert_ne!(after_motion, GazePoint::default());

    // Same frame again: the reference already caught up, so nothing moved.
    assert_eq!(tracker.update(&moved).unwrap(), MotionReport::NoMotion);
    assert_eq!(tracker.gaze_target(), after_motion);
}

#[test]
fn reference_drifts_to_the_latest_frame() {
    let mut tracker = MotionTracker::new(sharp_config(10), GazeMapping::identity());
    tracker.update(&uniform(100)).unwrap();
    // A slow, global brightening is absorbed cycle by cycle.
    for step in 1..=10u8 {
        assert_eq!(tracker.update(&uniform(100 + step * 5)).unwrap(), MotionReport::NoMotion);
    }
}

#[test]
fn min_region_area_ignores_small_changes() {
    let config = TrackerConfig {
        min_region_area: Some(500),
        ..sharp_config(10)
    };
    let mut tracker = MotionTracker::new(config, GazeMapping::identity());
    tracker.update(&uniform(0)).unwrap();
    // 10x10 patch dilated to 14x14 = 196 pixels.
    assert_eq!(tracker.update(&with_patch(uniform(0), 20, 20, 10, 10, 255)).unwrap(), MotionReport::NoMotion);
}

struct FailingSource;

impl FrameSource for FailingSource {
    fn read(&mut self) -> Result<RgbImage, EyeError> {
        Err(EyeError::CaptureFailure("no frame".to_string()))
    }
}

#[test]
fn capture_failure_is_a_distinct_error() {
    let mut tracker = MotionTracker::new(TrackerConfig::default(), GazeMapping::default());
    let err = tracker.update_from(&mut FailingSource).unwrap_err();
    assert!(matches!(err, EyeError::CaptureFailure(_)));
    // The failed cycle left no trace.
    assert_eq!(tracker.state(), TrackerState::Uninitialized);
}

#[test]
fn empty_capture_is_a_capture_failure() {
    let mut tracker = MotionTracker::new(TrackerConfig::default(), GazeMapping::default());
    tracker.update(&uniform(0)).unwrap();
    let err = tracker.update(&RgbImage::new(0, 0)).unwrap_err();
    assert!(matches!(err, EyeError::CaptureFailure(_)));
    assert_eq!(tracker.reference().unwrap().dimensions(), (WIDTH, HEIGHT));
}

fn outline(mut image: RgbImage, x: u32, y: u32, w: u32, h: u32, value: u8) -> RgbImage {
    image = with_patch(image, x, y, w, 1, value);
    image = with_patch(image, x, y + h - 1, w, 1, value);
    image = with_patch(image, x, y, 1, h, value);
    with_patch(image, x + w - 1, y, 1, h, value)
}

#[test]
fn blob_inside_a_moving_outline_follows_the_outline() {
    let mut tracker = MotionTracker::new(sharp_config(ANIMATION_DIFFERENCE_THRESHOLD), GazeMapping::identity());
    let background = RgbImage::from_pixel(200, 200, Rgb([0, 0, 0]));
    tracker.update(&background).unwrap();

    let ring = outline(background, 10, 10, 180, 180, 255);
    let frame = with_patch(ring, 70, 70, 60, 60, 255);
    let region = region_of(tracker.update(&frame).unwrap());
    // The outline grown by two dilation passes, with its inside counted as area.
    assert_eq!(region, Region { x: 8, y: 8, width: 184, height: 184, area: 184 * 184 });
    assert_eq!(region.center(), (100.0, 100.0));
}
