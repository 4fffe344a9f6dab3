//! Audio analysis configuration and constants.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Where the analysis buffer comes from on each tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    /// Synthesize a buffer from the playback power meter and position.
    ///
    /// A stand-in for real sampling; not perceptually meaningful, but it is
    /// what the visualizer has always reacted to.
    #[default]
    Metering,

    /// Hann-window the most recent decoded PCM samples at the playback cursor
    Pcm,
}

/// FFT analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// FFT window size (must be power of 2)
    pub fft_size: usize,

    /// Analysis buffer source
    pub source: AnalysisSource,

    /// Frames averaged by the power meter (at the track sample rate)
    pub meter_window_frames: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: audio_constants::FFT_SIZE,
            source: AnalysisSource::Metering,
            meter_window_frames: 1024,
        }
    }
}

impl AnalysisConfig {
    /// Number of magnitude bins produced per analysis
    pub fn spectrum_len(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fft_size.is_power_of_two() || self.fft_size < 2 {
            return Err(ConfigError::Invalid(format!(
                "FFT size must be a power of 2, got {}",
                self.fft_size
            )));
        }
        if self.meter_window_frames == 0 {
            return Err(ConfigError::Invalid(
                "meter window must be > 0 frames".to_string(),
            ));
        }
        Ok(())
    }
}

/// Audio constants
pub mod audio_constants {
    /// log2 of the default FFT size
    pub const FFT_LOG2N: u32 = 11;

    /// Default FFT window (2048 samples)
    pub const FFT_SIZE: usize = 1 << FFT_LOG2N;

    /// Quietest level reported by the power meter (dBFS)
    pub const SILENCE_DB: f32 = -160.0;
}
