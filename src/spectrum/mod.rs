//! Spectrum analysis: FFT magnitudes aggregated into six named bands.
//!
//! Each analysis tick builds a 2048-sample buffer from playback, runs it
//! through a [`MagnitudeSpectrum`] and averages fixed bin ranges into a
//! [`SpectrumSnapshot`] the wave synthesizer reads.

mod analyzer;
mod bands;
mod fft;

// Re-export public types
pub use analyzer::{aggregate_bands, band_average, fill_metered_buffer, AnalysisOutcome, SpectrumAnalyzer};
pub use bands::{clamp_band, FrequencyBand, SpectrumSnapshot, BAND_CEILING, BAND_COUNT, BAND_FLOOR};
pub use fft::{apply_hann_window, hann_window, MagnitudeSpectrum, RustFftSpectrum};
