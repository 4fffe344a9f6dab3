//! Playback metering consumed by the spectrum analyzer.

use crate::params::audio_constants::SILENCE_DB;

/// Coarse playback state polled once per analysis tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterReading {
    /// Average power of the most recent samples (dBFS, -160..0)
    pub average_power_db: f32,

    /// Playback position (seconds)
    pub current_time_s: f64,

    /// Track length (seconds)
    pub duration_s: f64,

    pub is_playing: bool,
}

impl MeterReading {
    /// Elapsed fraction of the track in [0, 1]; 0 for zero-length tracks
    pub fn position_fraction(&self) -> f32 {
        if self.duration_s > 0.0 {
            (self.current_time_s / self.duration_s).clamp(0.0, 1.0) as f32
        } else {
            0.0
        }
    }
}

/// Source of metering for the analyzer
pub trait PlaybackMeter {
    /// Current reading, or `None` when nothing is loaded
    fn reading(&self) -> Option<MeterReading>;

    /// Fill `out` with the most recent mono samples ending at the playback
    /// cursor. Returns false when no samples are available.
    fn pcm_window(&self, out: &mut [f32]) -> bool;
}

/// Mean-square power of `samples` in dBFS, clamped to [-160, 0]
pub fn average_power_db(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return SILENCE_DB;
    }
    let mean_square = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    if mean_square <= 0.0 {
        return SILENCE_DB;
    }
    (10.0 * mean_square.log10()).clamp(SILENCE_DB, 0.0)
}
