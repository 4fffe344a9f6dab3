//! Live-tunable visualizer parameters.
//!
//! Everything the settings panel can change lives here. The struct is owned
//! by the front end and passed by reference into every tick, so edits take
//! effect on the next analysis or render.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use super::analysis::AnalysisConfig;
use super::layers::{LayerStyles, WaveLayer};
use crate::error::ConfigError;
use crate::spectrum::FrequencyBand;

/// Shortest allowed tick interval (seconds)
const MIN_INTERVAL_S: f64 = 0.001;

/// Longest allowed tick interval (seconds)
const MAX_INTERVAL_S: f64 = 10.0;

/// How the perlin-amount term is produced
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseMode {
    /// Smooth product of three sines of the noise phase
    #[default]
    Harmonic,

    /// Seeded 3D Perlin noise sampled at the noise phase
    Perlin,
}

/// Visualizer parameters with slider ranges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Band energy multiplier, range [0.1, 4.0]
    pub sensitivity: f32,

    /// Random jitter amount, range [0, 1]
    pub randomness: f64,

    /// Organic noise amount, range [0, 1]
    pub perlin_amount: f64,

    /// Noise term flavour
    pub noise_mode: NoiseMode,

    /// Seed for the Perlin noise table
    pub noise_seed: u32,

    /// Seconds between analysis ticks
    pub analysis_interval_s: f64,

    /// Seconds between render ticks
    pub render_interval_s: f64,

    /// Band index (0..=5) driving the front wave
    pub main_band: usize,

    /// Band index (0..=5) driving the middle wave
    pub sub_band: usize,

    /// Band index (0..=5) driving the rear wave
    pub sub_sub_band: usize,

    /// Draw the vertically mirrored stroke of every layer
    pub show_lines: bool,

    /// Points per wave sequence
    pub points_per_wave: usize,

    /// Start playback as soon as a source loads
    pub autoplay: bool,

    pub analysis: AnalysisConfig,

    pub layers: LayerStyles,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            sensitivity: 0.1,
            randomness: 0.0,
            perlin_amount: 1.0,
            noise_mode: NoiseMode::Harmonic,
            noise_seed: 0,
            analysis_interval_s: 0.01,
            render_interval_s: 0.01,
            main_band: FrequencyBand::Bass.index(),
            sub_band: FrequencyBand::Mid.index(),
            sub_sub_band: FrequencyBand::Presence.index(),
            show_lines: false,
            points_per_wave: 100,
            autoplay: true,
            analysis: AnalysisConfig::default(),
            layers: LayerStyles::default(),
        }
    }
}

impl VisualizerConfig {
    /// Load a TOML config file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: PathBuf::from(path),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from(path),
            source,
        })?;
        config.analysis.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config.sanitize())
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply the slider range clamps to every field
    pub fn sanitize(mut self) -> Self {
        self.sensitivity = if self.sensitivity.is_nan() {
            0.1
        } else {
            self.sensitivity.clamp(0.1, 4.0)
        };
        self.randomness = clamp_unit(self.randomness);
        self.perlin_amount = clamp_unit(self.perlin_amount);
        self.analysis_interval_s = clamp_interval(self.analysis_interval_s);
        self.render_interval_s = clamp_interval(self.render_interval_s);
        self.main_band = self.main_band.min(5);
        self.sub_band = self.sub_band.min(5);
        self.sub_sub_band = self.sub_sub_band.min(5);
        self.points_per_wave = self.points_per_wave.max(2);
        self
    }

    /// Band assigned to a layer
    pub fn band_for(&self, layer: WaveLayer) -> FrequencyBand {
        let index = match layer {
            WaveLayer::Main => self.main_band,
            WaveLayer::Sub => self.sub_band,
            WaveLayer::SubSub => self.sub_sub_band,
        };
        FrequencyBand::from_index(index)
    }

    pub fn analysis_interval(&self) -> Duration {
        Duration::from_secs_f64(clamp_interval(self.analysis_interval_s))
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_secs_f64(clamp_interval(self.render_interval_s))
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn clamp_interval(seconds: f64) -> f64 {
    if seconds.is_nan() {
        MIN_INTERVAL_S
    } else {
        seconds.clamp(MIN_INTERVAL_S, MAX_INTERVAL_S)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::AnalysisSource;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = VisualizerConfig::default();
        assert_eq!(config.sensitivity, 0.1);
        assert_eq!(config.band_for(WaveLayer::Main), FrequencyBand::Bass);
        assert_eq!(config.band_for(WaveLayer::Sub), FrequencyBand::Mid);
        assert_eq!(config.band_for(WaveLayer::SubSub), FrequencyBand::Presence);
        assert_eq!(config.analysis_interval(), Duration::from_millis(10));
        assert_eq!(config.render_interval(), Duration::from_millis(10));
        assert!(!config.show_lines);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = VisualizerConfig::from_toml(
            r#"
            sensitivity = 2.5
            main_band = 3
            noise_mode = "perlin"

            [analysis]
            source = "pcm"
            "#,
        )
        .unwrap();

        assert_eq!(config.sensitivity, 2.5);
        assert_eq!(config.band_for(WaveLayer::Main), FrequencyBand::HighMid);
        assert_eq!(config.noise_mode, NoiseMode::Perlin);
        assert_eq!(config.analysis.source, AnalysisSource::Pcm);
        assert_eq!(config.analysis.fft_size, 2048);
        assert_eq!(config.points_per_wave, 100);
        assert_eq!(config.layers, LayerStyles::default());
    }

    #[test]
    fn test_sanitize_clamps_sliders() {
        let config = VisualizerConfig {
            sensitivity: 9.0,
            randomness: -1.0,
            perlin_amount: 3.0,
            analysis_interval_s: -5.0,
            render_interval_s: f64::NAN,
            main_band: 17,
            points_per_wave: 0,
            ..Default::default()
        }
        .sanitize();

        assert_eq!(config.sensitivity, 4.0);
        assert_eq!(config.randomness, 0.0);
        assert_eq!(config.perlin_amount, 1.0);
        assert_eq!(config.analysis_interval_s, MIN_INTERVAL_S);
        assert_eq!(config.render_interval_s, MIN_INTERVAL_S);
        assert_eq!(config.main_band, 5);
        assert_eq!(config.points_per_wave, 2);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "randomness = 0.5\nshow_lines = true").unwrap();

        let config = VisualizerConfig::load(file.path()).unwrap();
        assert_eq!(config.randomness, 0.5);
        assert!(config.show_lines);
    }

    #[test]
    fn test_load_errors() {
        let missing = VisualizerConfig::load(Path::new("/nonexistent/visuac.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sensitivity = \"loud\"").unwrap();
        assert!(matches!(
            VisualizerConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[analysis]\nfft_size = 1000").unwrap();
        assert!(matches!(
            VisualizerConfig::load(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }
}
