//! Wave synthesis: layered sine harmonics, noise and jitter scaled by band energy.

mod sequence;
mod synthesizer;

// Re-export public types
pub use sequence::WavePointSequence;
pub use synthesizer::{WaveParams, WaveformSynthesizer, RENDER_SEQUENCES};
