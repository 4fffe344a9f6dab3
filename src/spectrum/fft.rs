//! FFT magnitude spectrum and window utilities.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Converts a block of real samples into a magnitude spectrum.
///
/// Band aggregation only sees the magnitudes, so any real FFT can sit behind
/// this trait.
pub trait MagnitudeSpectrum {
    /// Fill `out` with `sqrt(re² + im²)` for bins `0..out.len()`.
    ///
    /// `out.len()` is expected to be at most `samples.len() / 2`; extra slots
    /// are zeroed.
    fn compute_magnitude_spectrum(&mut self, samples: &[f32], out: &mut [f32]);
}

/// Forward FFT via rustfft, unnormalized
pub struct RustFftSpectrum {
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl RustFftSpectrum {
    /// Plan a forward FFT of `size` points
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Self {
            fft,
            buffer: vec![Complex::new(0.0, 0.0); size],
            scratch,
        }
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }
}

impl MagnitudeSpectrum for RustFftSpectrum {
    fn compute_magnitude_spectrum(&mut self, samples: &[f32], out: &mut [f32]) {
        // Short input is zero-padded, long input truncated
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = samples.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample, 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        let half = self.buffer.len() / 2;
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = if i < half { self.buffer[i].norm() } else { 0.0 };
        }
    }
}

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    if size < 2 {
        return 1.0;
    }
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

/// Apply a Hann window in place
pub fn apply_hann_window(samples: &mut [f32]) {
    let size = samples.len();
    for (i, sample) in samples.iter_mut().enumerate() {
        *sample *= hann_window(i, size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_hann_window() {
        let size = 1024;

        // Hann window should be 0 at edges, 1 at center
        assert!((hann_window(0, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size - 1, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size / 2, size) - 1.0).abs() < 0.01);
        assert_eq!(hann_window(0, 1), 1.0);
    }

    #[test]
    fn test_dc_signal_lands_in_bin_zero() {
        let mut spectrum = RustFftSpectrum::new(64);
        let samples = vec![1.0f32; 64];
        let mut out = vec![0.0f32; 32];

        spectrum.compute_magnitude_spectrum(&samples, &mut out);

        assert_relative_eq!(out[0], 64.0, epsilon = 1e-3);
        assert!(out[1..].iter().all(|&m| m < 1e-3));
    }

    #[test]
    fn test_bin_aligned_sine_peaks_at_its_bin() {
        let size = 256;
        let bin = 8;
        let samples: Vec<f32> = (0..size)
            .map(|i| (2.0 * PI * bin as f32 * i as f32 / size as f32).sin())
            .collect();
        let mut out = vec![0.0f32; size / 2];

        RustFftSpectrum::new(size).compute_magnitude_spectrum(&samples, &mut out);

        let peak = out
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, bin);
        // Unnormalized: amplitude * N / 2
        assert_relative_eq!(out[bin], size as f32 / 2.0, max_relative = 1e-3);
    }

    #[test]
    fn test_extra_output_slots_are_zeroed() {
        let mut spectrum = RustFftSpectrum::new(8);
        let mut out = vec![9.0f32; 6];
        spectrum.compute_magnitude_spectrum(&[0.5; 8], &mut out);
        assert_eq!(&out[4..], &[0.0, 0.0]);
    }
}
