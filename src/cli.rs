//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;
use log::info;

use crate::params::{AnalysisSource, RecordingConfig, ViewSize, VisualizerConfig};
use crate::playback::AudioSource;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "visuac")]
#[command(about = "Audio-reactive layered waveform visualizer", long_about = None)]
pub struct Args {
    /// Audio file to play (defaults to the bundled example track)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Record frames and audio offline (duration in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,

    /// Output directory for recordings
    #[arg(long, value_name = "DIR", default_value = "recording")]
    pub output: PathBuf,

    /// Recording frame rate
    #[arg(long, value_name = "FPS", default_value = "60")]
    pub fps: u32,

    /// View width (pixels)
    #[arg(long, value_name = "PIXELS", default_value = "1280")]
    pub width: u32,

    /// View height (pixels)
    #[arg(long, value_name = "PIXELS", default_value = "720")]
    pub height: u32,

    /// Band sensitivity override (0.1 - 4.0)
    #[arg(long, value_name = "GAIN")]
    pub sensitivity: Option<f32>,

    /// Analyze decoded PCM instead of the power meter
    #[arg(long)]
    pub pcm: bool,

    /// Stop live playback after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub seconds: Option<f64>,
}

impl Args {
    /// Audio source selected on the command line
    pub fn audio_source(&self) -> AudioSource {
        match &self.file {
            Some(path) => AudioSource::External(path.clone()),
            None => AudioSource::default(),
        }
    }

    pub fn view_size(&self) -> ViewSize {
        ViewSize::new(self.width as f64, self.height as f64)
    }

    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply_overrides(&self, mut config: VisualizerConfig) -> VisualizerConfig {
        if let Some(sensitivity) = self.sensitivity {
            info!("Sensitivity: {}", sensitivity);
            config.sensitivity = sensitivity;
        }
        if self.pcm {
            info!("Analysis source: PCM");
            config.analysis.source = AnalysisSource::Pcm;
        }
        config.sanitize()
    }

    /// Create recording configuration if recording mode is enabled
    pub fn create_recording_config(&self) -> Option<RecordingConfig> {
        self.record.map(|duration| {
            let mut config = RecordingConfig::new(duration);
            config.output_dir = self.output.clone();
            config.fps = self.fps.max(1);
            config
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["visuac"]);
        assert_eq!(args.audio_source(), AudioSource::default());
        assert_eq!(args.view_size(), ViewSize::new(1280.0, 720.0));
        assert!(args.create_recording_config().is_none());
        assert!(!args.pcm);
    }

    #[test]
    fn test_recording_args() {
        let args = Args::parse_from([
            "visuac",
            "song.mp3",
            "--record",
            "2.5",
            "--output",
            "out",
            "--fps",
            "30",
        ]);
        assert_eq!(
            args.audio_source(),
            AudioSource::External(PathBuf::from("song.mp3"))
        );
        let recording = args.create_recording_config().unwrap();
        assert_eq!(recording.output_dir, PathBuf::from("out"));
        assert_eq!(recording.fps, 30);
        assert_eq!(recording.total_frames(), 75);
    }

    #[test]
    fn test_overrides_are_sanitized() {
        let args = Args::parse_from(["visuac", "--sensitivity", "9", "--pcm"]);
        let config = args.apply_overrides(VisualizerConfig::default());
        assert_eq!(config.sensitivity, 4.0);
        assert_eq!(config.analysis.source, AnalysisSource::Pcm);
    }
}
