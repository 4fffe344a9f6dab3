//! Parameter definitions with documented ranges and semantics.
//!
//! All tunable numbers are collected here with:
//! - Units (seconds, pixels, dB)
//! - Documented ranges and meanings
//! - Serde defaults so partial config files load

mod analysis;
mod layers;
mod render;
mod visualizer;

// Re-export all types
pub use analysis::{audio_constants, AnalysisConfig, AnalysisSource};
pub use layers::{LayerStyle, LayerStyles, WaveLayer};
pub use render::{RecordingConfig, ViewSize};
pub use visualizer::{NoiseMode, VisualizerConfig};
