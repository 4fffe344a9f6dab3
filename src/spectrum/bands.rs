//! Named frequency bands and the band energy snapshot.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Number of frequency bands the spectrum is aggregated into
pub const BAND_COUNT: usize = 6;

/// Lowest amplitude a band may take (also the value before any analysis)
pub const BAND_FLOOR: f32 = 0.1;

/// Highest amplitude a band may take
pub const BAND_CEILING: f32 = 4.0;

/// FFT bin ranges per band, in band index order.
///
/// Contiguous from bin 0 and doubling in width; bins past the last range are
/// not used by the visualizer.
const BAND_BINS: [Range<usize>; BAND_COUNT] = [0..5, 5..10, 10..20, 20..40, 40..80, 80..160];

/// One of the six fixed frequency regions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrequencyBand {
    Bass,
    LowMid,
    Mid,
    HighMid,
    Presence,
    Brilliance,
}

impl FrequencyBand {
    /// All bands in index order
    pub const ALL: [FrequencyBand; BAND_COUNT] = [
        FrequencyBand::Bass,
        FrequencyBand::LowMid,
        FrequencyBand::Mid,
        FrequencyBand::HighMid,
        FrequencyBand::Presence,
        FrequencyBand::Brilliance,
    ];

    /// Band for an index, clamping out-of-range indices to the last band
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(BAND_COUNT - 1)]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Human-readable name shown by band pickers
    pub fn name(self) -> &'static str {
        match self {
            FrequencyBand::Bass => "Bass",
            FrequencyBand::LowMid => "Low-Mid",
            FrequencyBand::Mid => "Mid",
            FrequencyBand::HighMid => "High-Mid",
            FrequencyBand::Presence => "Presence",
            FrequencyBand::Brilliance => "Brilliance",
        }
    }

    /// FFT magnitude bins aggregated into this band
    pub fn bins(self) -> Range<usize> {
        BAND_BINS[self.index()].clone()
    }
}

impl fmt::Display for FrequencyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Most recent band amplitudes, one per [`FrequencyBand`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpectrumSnapshot {
    bands: [f32; BAND_COUNT],
}

impl Default for SpectrumSnapshot {
    fn default() -> Self {
        Self {
            bands: [BAND_FLOOR; BAND_COUNT],
        }
    }
}

impl SpectrumSnapshot {
    pub fn get(&self, band: FrequencyBand) -> f32 {
        self.bands[band.index()]
    }

    /// Store a band value, clamped to [`BAND_FLOOR`, `BAND_CEILING`].
    ///
    /// Indices past the snapshot are ignored.
    pub fn set_index(&mut self, index: usize, value: f32) {
        if let Some(slot) = self.bands.get_mut(index) {
            *slot = clamp_band(value);
        }
    }

    pub fn values(&self) -> &[f32; BAND_COUNT] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Reset every band to the floor (flat waveform)
    pub fn reset(&mut self) {
        self.bands = [BAND_FLOOR; BAND_COUNT];
    }
}

/// Clamp a scaled band value into the displayable range. NaN maps to the floor.
pub fn clamp_band(value: f32) -> f32 {
    if value.is_nan() {
        BAND_FLOOR
    } else {
        value.clamp(BAND_FLOOR, BAND_CEILING)
    }
}
