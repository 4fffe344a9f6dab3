//! Visualizer: wires playback, analysis and synthesis to the scheduler ticks.

use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::error::AudioError;
use crate::params::{LayerStyle, ViewSize, VisualizerConfig, WaveLayer};
use crate::playback::{AudioSource, PlaybackDriver};
use crate::scheduler::TickHandler;
use crate::spectrum::{AnalysisOutcome, SpectrumAnalyzer, SpectrumSnapshot};
use crate::waveform::{WavePointSequence, WaveformSynthesizer};

/// One layer of a composed frame
#[derive(Debug, Clone, PartialEq)]
pub struct LayerFrame {
    pub layer: WaveLayer,
    pub points: WavePointSequence,
    pub style: LayerStyle,

    /// Draw the vertically mirrored stroke
    pub mirrored: bool,
}

/// Everything a renderer needs for one render tick, layers back to front
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub time_s: f64,
    pub bands: SpectrumSnapshot,
    pub layers: Vec<LayerFrame>,
}

/// Consumer of composed frames
pub trait FrameSink {
    fn present(&mut self, frame: &RenderFrame);
}

/// Where the synthesizer's time input comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameClock {
    /// Seconds since the Unix epoch
    #[default]
    Wall,

    /// Playback position; reproducible under a manual playback clock
    Playback,
}

/// Owns the pipeline and implements both tick handlers
pub struct Visualizer<S: FrameSink> {
    driver: PlaybackDriver,
    analyzer: SpectrumAnalyzer,
    synthesizer: WaveformSynthesizer,
    config: VisualizerConfig,
    size: ViewSize,
    sink: S,
    frame_clock: FrameClock,
    stop_at_end: bool,
    frames_presented: usize,
}

impl<S: FrameSink> Visualizer<S> {
    pub fn new(driver: PlaybackDriver, config: VisualizerConfig, size: ViewSize, sink: S) -> Self {
        let config = config.sanitize();
        let analyzer = SpectrumAnalyzer::new(&config.analysis);
        let synthesizer = WaveformSynthesizer::new(config.noise_seed);
        Self {
            driver,
            analyzer,
            synthesizer,
            config,
            size,
            sink,
            frame_clock: FrameClock::Wall,
            stop_at_end: false,
            frames_presented: 0,
        }
    }

    /// Replace the synthesizer (e.g. one with a seeded jitter RNG)
    pub fn with_synthesizer(mut self, synthesizer: WaveformSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn with_frame_clock(mut self, frame_clock: FrameClock) -> Self {
        self.frame_clock = frame_clock;
        self
    }

    /// Report finished once a loaded track is no longer playing
    pub fn stop_at_end(mut self, enabled: bool) -> Self {
        self.stop_at_end = enabled;
        self
    }

    /// Load a source and start playback when autoplay is on.
    ///
    /// A failure leaves the flat floor waveform; the driver has already
    /// logged it.
    pub fn load(&mut self, source: &AudioSource) -> Result<(), AudioError> {
        match self.driver.load(source) {
            Ok(()) => {
                if self.config.autoplay {
                    self.driver.play();
                }
                Ok(())
            }
            Err(e) => {
                self.analyzer.reset();
                Err(e)
            }
        }
    }

    /// Swap in a new configuration; the FFT plan is rebuilt if its size changed
    pub fn set_config(&mut self, config: VisualizerConfig) {
        let config = config.sanitize();
        if config.analysis.fft_size != self.config.analysis.fft_size {
            info!("FFT size changed to {}", config.analysis.fft_size);
            self.analyzer = SpectrumAnalyzer::new(&config.analysis);
        }
        self.config = config;
    }

    pub fn set_size(&mut self, size: ViewSize) {
        self.size = size;
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    pub fn size(&self) -> ViewSize {
        self.size
    }

    pub fn driver(&self) -> &PlaybackDriver {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut PlaybackDriver {
        &mut self.driver
    }

    pub fn snapshot(&self) -> &SpectrumSnapshot {
        self.analyzer.snapshot()
    }

    pub fn synthesizer(&self) -> &WaveformSynthesizer {
        &self.synthesizer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn frames_presented(&self) -> usize {
        self.frames_presented
    }

    fn frame_time(&self) -> f64 {
        match self.frame_clock {
            FrameClock::Wall => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0.0, |d| d.as_secs_f64()),
            FrameClock::Playback => self.driver.current_time(),
        }
    }

    /// Compose the front sequence of each layer into a frame
    pub fn compose_frame(&self, time_s: f64) -> RenderFrame {
        let layers = WaveLayer::ALL
            .iter()
            .map(|&layer| LayerFrame {
                layer,
                points: self.synthesizer.layer_sequence(layer).clone(),
                style: *self.config.layers.get(layer),
                mirrored: self.config.show_lines,
            })
            .collect();
        RenderFrame {
            time_s,
            bands: *self.analyzer.snapshot(),
            layers,
        }
    }
}

impl<S: FrameSink> TickHandler for Visualizer<S> {
    fn on_analysis_tick(&mut self) {
        if self.analyzer.tick(&self.driver, &self.config) == AnalysisOutcome::Updated {
            debug!("Bands: {:?}", self.analyzer.snapshot().values());
        }
    }

    fn on_render_tick(&mut self) {
        let time_s = self.frame_time();
        self.synthesizer
            .render_tick(time_s, self.size, self.analyzer.snapshot(), &self.config);
        let frame = self.compose_frame(time_s);
        self.sink.present(&frame);
        self.frames_presented += 1;
    }

    fn is_finished(&self) -> bool {
        self.stop_at_end && self.driver.track().is_some() && !self.driver.is_playing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{ClockMode, Track};
    use crate::spectrum::BAND_FLOOR;
    use std::path::PathBuf;
    use std::time::Duration;

    #[derive(Default)]
    struct CollectSink {
        frames: Vec<RenderFrame>,
    }

    impl FrameSink for CollectSink {
        fn present(&mut self, frame: &RenderFrame) {
            self.frames.push(frame.clone());
        }
    }

    fn sine_track() -> Track {
        let samples = (0..44100)
            .map(|i| 0.5 * (i as f32 * 0.05).sin())
            .collect();
        Track::from_samples(samples, 44100).unwrap()
    }

    fn visualizer(config: VisualizerConfig) -> Visualizer<CollectSink> {
        let driver = PlaybackDriver::new(ClockMode::Manual);
        Visualizer::new(
            driver,
            config,
            ViewSize::new(400.0, 200.0),
            CollectSink::default(),
        )
        .with_synthesizer(WaveformSynthesizer::with_rng_seed(0, 7))
        .with_frame_clock(FrameClock::Playback)
    }

    #[test]
    fn test_frame_layers_back_to_front() {
        let config = VisualizerConfig {
            show_lines: true,
            ..Default::default()
        };
        let mut vis = visualizer(config);
        vis.on_render_tick();

        let frame = &vis.sink().frames[0];
        let layers: Vec<WaveLayer> = frame.layers.iter().map(|l| l.layer).collect();
        assert_eq!(layers, vec![WaveLayer::SubSub, WaveLayer::Sub, WaveLayer::Main]);
        assert!(frame.layers.iter().all(|l| l.mirrored));
        assert_eq!(frame.layers[2].style, vis.config().layers.main);
        assert_eq!(
            frame.layers[1].points,
            *vis.synthesizer().sequence(2).unwrap()
        );
        assert_eq!(frame.layers[0].points.len(), 100);
    }

    #[test]
    fn test_playing_track_drives_bands() {
        let mut vis = visualizer(VisualizerConfig {
            sensitivity: 4.0,
            ..Default::default()
        });
        vis.driver_mut().load_track(sine_track()).unwrap();
        vis.driver_mut().play();
        vis.driver_mut().advance(Duration::from_millis(500));

        vis.on_analysis_tick();
        vis.on_render_tick();

        let frame = &vis.sink().frames[0];
        assert!(frame.bands.values().iter().any(|&b| b > BAND_FLOOR));
        assert!((frame.time_s - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_load_failure_keeps_flat_floor() {
        let mut vis = visualizer(VisualizerConfig::default());
        let result = vis.load(&AudioSource::External(PathBuf::from("/nonexistent/a.mp3")));
        assert!(matches!(result, Err(AudioError::NotFound(_))));

        vis.on_analysis_tick();
        vis.on_render_tick();
        let frame = &vis.sink().frames[0];
        assert!(frame.bands.values().iter().all(|&b| b == BAND_FLOOR));
        assert_eq!(vis.frames_presented(), 1);
    }

    #[test]
    fn test_stop_at_end() {
        let mut vis = visualizer(VisualizerConfig::default()).stop_at_end(true);
        assert!(!vis.is_finished());

        vis.driver_mut().load_track(sine_track()).unwrap();
        vis.driver_mut().play();
        assert!(!vis.is_finished());

        vis.driver_mut().advance(Duration::from_secs(2));
        assert!(vis.is_finished());
    }

    #[test]
    fn test_set_config_rebuilds_fft() {
        let mut vis = visualizer(VisualizerConfig::default());
        let mut config = VisualizerConfig::default();
        config.analysis.fft_size = 1024;
        config.sensitivity = 100.0;
        vis.set_config(config);

        assert_eq!(vis.config().analysis.fft_size, 1024);
        // sanitized on the way in
        assert_eq!(vis.config().sensitivity, 4.0);
    }
}
