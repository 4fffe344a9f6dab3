//! Multi-layer wave synthesis driven by band energies.

use std::f64::consts::PI;

use glam::DVec2;
use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::sequence::WavePointSequence;
use crate::noise::PerlinNoise;
use crate::params::{NoiseMode, ViewSize, VisualizerConfig, WaveLayer};
use crate::spectrum::SpectrumSnapshot;

/// Point sequences produced per render tick (two per layer)
pub const RENDER_SEQUENCES: usize = 6;

/// Phase offset between consecutive render indices (radians)
const PHASE_OFFSET_STEP: f64 = 0.3;

/// Fraction of the view height one unit of wave amplitude spans
const AMPLITUDE_HEIGHT_FRACTION: f64 = 0.15;

/// Inputs for one wave sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveParams {
    pub width: f64,
    pub height: f64,
    pub phase_offset: f64,

    /// Band energy scaling the whole wave
    pub amplitude_modifier: f64,

    /// Render index; parity picks phase speed, index mod 3 picks frequency
    pub wave_index: usize,

    /// Animation clock (seconds)
    pub time_s: f64,
}

/// Generates and stores the six wave point sequences
pub struct WaveformSynthesizer {
    noise: PerlinNoise,
    noise_seed: u32,
    rng: StdRng,
    sequences: [WavePointSequence; RENDER_SEQUENCES],
}

impl WaveformSynthesizer {
    /// Create synthesizer with an entropy-seeded jitter RNG
    pub fn new(noise_seed: u32) -> Self {
        Self::with_rng(noise_seed, StdRng::from_entropy())
    }

    /// Create synthesizer with a reproducible jitter RNG
    pub fn with_rng_seed(noise_seed: u32, rng_seed: u64) -> Self {
        Self::with_rng(noise_seed, StdRng::seed_from_u64(rng_seed))
    }

    fn with_rng(noise_seed: u32, rng: StdRng) -> Self {
        Self {
            noise: PerlinNoise::new(noise_seed),
            noise_seed,
            rng,
            sequences: Default::default(),
        }
    }

    /// Regenerate all six sequences for one render tick
    pub fn render_tick(
        &mut self,
        time_s: f64,
        size: ViewSize,
        snapshot: &SpectrumSnapshot,
        config: &VisualizerConfig,
    ) {
        if config.noise_seed != self.noise_seed {
            debug!("Noise seed changed to {}", config.noise_seed);
            self.noise = PerlinNoise::new(config.noise_seed);
            self.noise_seed = config.noise_seed;
        }

        for wave_index in 0..RENDER_SEQUENCES {
            let layer = WaveLayer::for_render_index(wave_index);
            let params = WaveParams {
                width: size.width,
                height: size.height,
                phase_offset: wave_index as f64 * PHASE_OFFSET_STEP,
                amplitude_modifier: snapshot.get(config.band_for(layer)) as f64,
                wave_index,
                time_s,
            };
            let sequence = self.generate(&params, config);
            self.sequences[wave_index] = sequence;
        }
    }

    /// Compute one wave sequence
    pub fn generate(&mut self, params: &WaveParams, config: &VisualizerConfig) -> WavePointSequence {
        let count = config.points_per_wave;
        let center_y = params.height / 2.0;

        // Degenerate views collapse onto the midline; nothing divides by width
        if !(params.width > 0.0) {
            return WavePointSequence::new(vec![DVec2::new(0.0, center_y); count]);
        }
        let spacing = if count > 1 {
            params.width / (count - 1) as f64
        } else {
            0.0
        };
        if !(params.height > 0.0) {
            let points = (0..count)
                .map(|i| DVec2::new(i as f64 * spacing, center_y))
                .collect();
            return WavePointSequence::new(points);
        }

        let phase = params.time_s * if params.wave_index % 2 == 0 { 2.0 } else { 3.0 };
        let frequency = (params.wave_index % 3 + 2) as f64 * 0.5;

        let mut points = Vec::with_capacity(count);
        for i in 0..count {
            let x = i as f64 * spacing;
            let rel = x / params.width;

            let mut y = (rel * PI * 2.0 * frequency + phase + params.phase_offset).sin();
            y += 0.5 * (rel * PI * 4.0 * frequency + phase * 1.5).sin();
            y += 0.3 * (rel * PI * 3.0 * frequency + phase * 0.8).sin();

            if config.perlin_amount > 0.0 {
                let noise_phase = phase * 0.1 + i as f64 * 0.05;
                let noise_value = match config.noise_mode {
                    NoiseMode::Harmonic => {
                        noise_phase.sin() * (noise_phase * 1.3).cos() * (noise_phase * 0.7).sin()
                    }
                    NoiseMode::Perlin => {
                        self.noise.sample(noise_phase, params.wave_index as f64, 0.0)
                    }
                };
                y += noise_value * config.perlin_amount * 0.5;
            }

            if config.randomness > 0.0 {
                y += self.rng.gen_range(-1.0..=1.0) * config.randomness * 0.3;
            }

            y *= params.amplitude_modifier;

            let final_y = center_y + y * (params.height * AMPLITUDE_HEIGHT_FRACTION);
            points.push(DVec2::new(x, final_y));
        }

        WavePointSequence::new(points)
    }

    /// Stored sequence for a render index (0..6)
    pub fn sequence(&self, render_index: usize) -> Option<&WavePointSequence> {
        self.sequences.get(render_index)
    }

    /// Sequence composed into frames for a layer
    pub fn layer_sequence(&self, layer: WaveLayer) -> &WavePointSequence {
        &self.sequences[layer.render_index()]
    }

    pub fn sequences(&self) -> &[WavePointSequence; RENDER_SEQUENCES] {
        &self.sequences
    }
}
