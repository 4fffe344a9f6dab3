//! View and recording configuration.

use std::path::PathBuf;

/// Size of the view the waves are laid out in (points/pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSize {
    pub width: f64,
    pub height: f64,
}

impl ViewSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Pixel dimensions for rasterizing, at least 1x1
    pub fn pixels(&self) -> (u32, u32) {
        let to_px = |v: f64| if v.is_finite() && v >= 1.0 { v.round() as u32 } else { 1 };
        (to_px(self.width), to_px(self.height))
    }
}

impl Default for ViewSize {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output directory for frames and audio
    pub output_dir: PathBuf,

    /// Frame rate (FPS)
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_dir: PathBuf::from("recording"),
            fps: 60,
        }
    }

    /// Total number of frames to capture
    pub fn total_frames(&self) -> usize {
        (self.duration_secs.max(0.0) * self.fps as f32).ceil() as usize
    }

    /// Seconds between captured frames
    pub fn frame_interval_secs(&self) -> f64 {
        1.0 / self.fps.max(1) as f64
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> PathBuf {
        self.output_dir.join("frames")
    }

    /// Path of a single captured frame
    pub fn frame_path(&self, frame_num: usize) -> PathBuf {
        self.frames_dir().join(format!("frame_{:05}.png", frame_num))
    }

    /// Audio file path
    pub fn audio_path(&self) -> PathBuf {
        self.output_dir.join("audio.wav")
    }
}
