//! Per-tick spectrum analysis into band energies.

use log::trace;

use super::bands::{FrequencyBand, SpectrumSnapshot, BAND_FLOOR};
use super::fft::{apply_hann_window, MagnitudeSpectrum, RustFftSpectrum};
use crate::params::{AnalysisConfig, AnalysisSource, VisualizerConfig};
use crate::playback::PlaybackMeter;

/// Result of one analysis tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// Snapshot was recomputed
    Updated,

    /// Nothing playing (or no samples yet); previous snapshot kept
    Skipped,
}

/// Turns playback metering into band energies once per analysis tick
pub struct SpectrumAnalyzer<S = RustFftSpectrum> {
    spectrum: S,
    samples: Vec<f32>,
    magnitudes: Vec<f32>,
    snapshot: SpectrumSnapshot,
}

impl SpectrumAnalyzer<RustFftSpectrum> {
    /// Create analyzer with a rustfft plan sized from the config
    pub fn new(config: &AnalysisConfig) -> Self {
        Self::with_spectrum(RustFftSpectrum::new(config.fft_size), config.fft_size)
    }
}

impl<S: MagnitudeSpectrum> SpectrumAnalyzer<S> {
    /// Create analyzer around any magnitude spectrum implementation
    pub fn with_spectrum(spectrum: S, fft_size: usize) -> Self {
        Self {
            spectrum,
            samples: vec![0.0; fft_size],
            magnitudes: vec![0.0; fft_size / 2],
            snapshot: SpectrumSnapshot::default(),
        }
    }

    /// Run one analysis tick against the current playback state
    pub fn tick(&mut self, meter: &impl PlaybackMeter, config: &VisualizerConfig) -> AnalysisOutcome {
        let Some(reading) = meter.reading() else {
            trace!("Analysis skipped: nothing loaded");
            return AnalysisOutcome::Skipped;
        };
        if !reading.is_playing {
            trace!("Analysis skipped: paused");
            return AnalysisOutcome::Skipped;
        }

        match config.analysis.source {
            AnalysisSource::Metering => {
                fill_metered_buffer(
                    &mut self.samples,
                    reading.average_power_db,
                    reading.position_fraction(),
                );
            }
            AnalysisSource::Pcm => {
                if !meter.pcm_window(&mut self.samples) {
                    trace!("Analysis skipped: no PCM window");
                    return AnalysisOutcome::Skipped;
                }
                apply_hann_window(&mut self.samples);
            }
        }

        self.spectrum
            .compute_magnitude_spectrum(&self.samples, &mut self.magnitudes);
        aggregate_bands(&self.magnitudes, config.sensitivity, &mut self.snapshot);

        trace!("Bands: {:?}", self.snapshot.values());
        AnalysisOutcome::Updated
    }

    /// Latest complete band snapshot
    pub fn snapshot(&self) -> &SpectrumSnapshot {
        &self.snapshot
    }

    /// Magnitude spectrum from the last successful tick
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    /// Drop back to the floor snapshot (flat waveform)
    pub fn reset(&mut self) {
        self.snapshot.reset();
        self.magnitudes.iter_mut().for_each(|m| *m = 0.0);
    }
}

/// Synthesize an analysis buffer from the power meter and playback position.
///
/// `sample[i] = 10^(0.05·power_db) · sin(i · (1 + 2·position))`
pub fn fill_metered_buffer(buffer: &mut [f32], power_db: f32, position_fraction: f32) {
    let normalized_power = 10f32.powf(0.05 * power_db);
    let step = 1.0 + position_fraction * 2.0;
    for (i, sample) in buffer.iter_mut().enumerate() {
        *sample = normalized_power * (i as f32 * step).sin();
    }
}

/// Mean magnitude over a band's bins, before sensitivity scaling.
///
/// Bins past the end of the spectrum read the last bin. An empty spectrum
/// reads as silence.
pub fn band_average(magnitudes: &[f32], band: FrequencyBand) -> f32 {
    let Some(last) = magnitudes.len().checked_sub(1) else {
        return 0.0;
    };
    let bins = band.bins();
    let count = bins.len();
    let sum: f32 = bins.map(|bin| magnitudes[bin.min(last)]).sum();
    sum / count as f32
}

/// Average, scale and clamp every band into the snapshot
pub fn aggregate_bands(magnitudes: &[f32], sensitivity: f32, snapshot: &mut SpectrumSnapshot) {
    for band in FrequencyBand::ALL {
        if band.index() >= snapshot.len() {
            continue;
        }
        let value = if magnitudes.is_empty() {
            BAND_FLOOR
        } else {
            band_average(magnitudes, band) * sensitivity
        };
        snapshot.set_index(band.index(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::MeterReading;
    use crate::spectrum::{BAND_CEILING, BAND_COUNT};
    use approx::assert_relative_eq;

    struct FakeMeter {
        reading: Option<MeterReading>,
        pcm: Option<Vec<f32>>,
    }

    impl FakeMeter {
        fn playing(power_db: f32, time_s: f64, duration_s: f64) -> Self {
            Self {
                reading: Some(MeterReading {
                    average_power_db: power_db,
                    current_time_s: time_s,
                    duration_s,
                    is_playing: true,
                }),
                pcm: None,
            }
        }
    }

    impl PlaybackMeter for FakeMeter {
        fn reading(&self) -> Option<MeterReading> {
            self.reading
        }

        fn pcm_window(&self, out: &mut [f32]) -> bool {
            match &self.pcm {
                Some(pcm) if pcm.len() >= out.len() => {
                    out.copy_from_slice(&pcm[pcm.len() - out.len()..]);
                    true
                }
                _ => false,
            }
        }
    }

    fn config_with_sensitivity(sensitivity: f32) -> VisualizerConfig {
        VisualizerConfig {
            sensitivity,
            ..Default::default()
        }
    }

    #[test]
    fn test_metered_buffer_formula() {
        let mut buffer = vec![0.0f32; 4];
        fill_metered_buffer(&mut buffer, -20.0, 0.5);

        assert_relative_eq!(buffer[0], 0.0);
        assert_relative_eq!(buffer[1], 0.1 * 2.0f32.sin(), max_relative = 1e-5);
        assert_relative_eq!(buffer[3], 0.1 * 6.0f32.sin(), max_relative = 1e-5);
    }

    #[test]
    fn test_golden_band_average_at_minus_20_db() {
        let meter = FakeMeter::playing(-20.0, 5.0, 10.0);
        let mut analyzer = SpectrumAnalyzer::new(&AnalysisConfig::default());

        let outcome = analyzer.tick(&meter, &config_with_sensitivity(4.0));

        assert_eq!(outcome, AnalysisOutcome::Updated);
        let bass = band_average(analyzer.magnitudes(), FrequencyBand::Bass);
        assert_relative_eq!(bass, 0.036_025, max_relative = 1e-3);
        assert_relative_eq!(
            analyzer.snapshot().get(FrequencyBand::Bass),
            0.036_025 * 4.0,
            max_relative = 1e-3
        );
    }

    #[test]
    fn test_low_energy_clamps_to_floor() {
        let meter = FakeMeter::playing(-20.0, 5.0, 10.0);
        let mut analyzer = SpectrumAnalyzer::new(&AnalysisConfig::default());

        analyzer.tick(&meter, &config_with_sensitivity(1.0));

        assert!(analyzer
            .snapshot()
            .values()
            .iter()
            .all(|&v| v == BAND_FLOOR));
    }

    #[test]
    fn test_skipped_when_not_playing_keeps_snapshot() {
        let mut analyzer = SpectrumAnalyzer::new(&AnalysisConfig::default());
        let config = config_with_sensitivity(4.0);

        analyzer.tick(&FakeMeter::playing(0.0, 1.0, 10.0), &config);
        let before = *analyzer.snapshot();

        let mut paused = FakeMeter::playing(0.0, 2.0, 10.0);
        if let Some(reading) = paused.reading.as_mut() {
            reading.is_playing = false;
        }
        assert_eq!(analyzer.tick(&paused, &config), AnalysisOutcome::Skipped);

        let unloaded = FakeMeter {
            reading: None,
            pcm: None,
        };
        assert_eq!(analyzer.tick(&unloaded, &config), AnalysisOutcome::Skipped);
        assert_eq!(*analyzer.snapshot(), before);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let magnitudes: Vec<f32> = (0..1024).map(|i| (i % 7) as f32 * 0.3).collect();
        let mut first = SpectrumSnapshot::default();
        let mut second = SpectrumSnapshot::default();

        aggregate_bands(&magnitudes, 1.5, &mut first);
        aggregate_bands(&magnitudes, 1.5, &mut second);
        aggregate_bands(&magnitudes, 1.5, &mut second);

        assert_eq!(first, second);
    }

    #[test]
    fn test_aggregation_clamps_extremes() {
        let mut snapshot = SpectrumSnapshot::default();

        aggregate_bands(&vec![1e9; 1024], 4.0, &mut snapshot);
        assert!(snapshot.values().iter().all(|&v| v == BAND_CEILING));

        aggregate_bands(&vec![0.0; 1024], 4.0, &mut snapshot);
        assert!(snapshot.values().iter().all(|&v| v == BAND_FLOOR));

        aggregate_bands(&[], 4.0, &mut snapshot);
        assert_eq!(snapshot.len(), BAND_COUNT);
        assert!(snapshot.values().iter().all(|&v| v == BAND_FLOOR));
    }

    #[test]
    fn test_short_spectrum_reads_last_bin() {
        // 100 bins: Brilliance (80..160) reads bins 80..99 then repeats bin 99
        let mut magnitudes = vec![0.0f32; 100];
        magnitudes[99] = 1.0;

        let avg = band_average(&magnitudes, FrequencyBand::Brilliance);
        assert_relative_eq!(avg, 61.0 / 80.0);
    }

    #[test]
    fn test_band_average_picks_band_bins() {
        let mut magnitudes = vec![0.0f32; 1024];
        for m in &mut magnitudes[10..20] {
            *m = 2.0;
        }
        assert_relative_eq!(band_average(&magnitudes, FrequencyBand::Mid), 2.0);
        assert_eq!(band_average(&magnitudes, FrequencyBand::LowMid), 0.0);
    }

    #[test]
    fn test_pcm_source_windows_real_samples() {
        let size = 2048;
        // Bin-aligned tone in the Mid band (bin 15)
        let pcm: Vec<f32> = (0..size)
            .map(|i| (2.0 * std::f32::consts::PI * 15.0 * i as f32 / size as f32).sin())
            .collect();
        let meter = FakeMeter {
            pcm: Some(pcm),
            ..FakeMeter::playing(-6.0, 1.0, 2.0)
        };
        let mut config = config_with_sensitivity(0.1);
        config.analysis.source = AnalysisSource::Pcm;

        let mut analyzer = SpectrumAnalyzer::new(&config.analysis);
        assert_eq!(analyzer.tick(&meter, &config), AnalysisOutcome::Updated);

        let snapshot = analyzer.snapshot();
        assert!(snapshot.get(FrequencyBand::Mid) > snapshot.get(FrequencyBand::Bass));
        assert!(snapshot.get(FrequencyBand::Mid) > snapshot.get(FrequencyBand::Brilliance));
    }

    #[test]
    fn test_pcm_source_skips_without_samples() {
        let meter = FakeMeter::playing(-6.0, 1.0, 2.0);
        let mut config = VisualizerConfig::default();
        config.analysis.source = AnalysisSource::Pcm;

        let mut analyzer = SpectrumAnalyzer::new(&config.analysis);
        assert_eq!(analyzer.tick(&meter, &config), AnalysisOutcome::Skipped);
    }

    #[test]
    fn test_reset_returns_to_floor() {
        let mut analyzer = SpectrumAnalyzer::new(&AnalysisConfig::default());
        analyzer.tick(&FakeMeter::playing(0.0, 1.0, 4.0), &config_with_sensitivity(4.0));
        analyzer.reset();
        assert_eq!(*analyzer.snapshot(), SpectrumSnapshot::default());
    }
}
