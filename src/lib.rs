//! visuac library - audio-reactive layered waveform visualization

pub mod cli;
pub mod error;
pub mod noise;
pub mod params;
pub mod playback;
pub mod rendering;
pub mod scheduler;
pub mod spectrum;
pub mod visualizer;
pub mod waveform;
