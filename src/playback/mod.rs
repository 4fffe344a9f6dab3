//! Audio playback and metering.
//!
//! The driver decodes a source into a mono [`Track`], runs a transport
//! against one of three clocks and exposes the coarse [`MeterReading`] the
//! spectrum analyzer polls each tick.

mod decode;
mod driver;
mod meter;
mod output;
mod source;

// Re-export public types
pub use decode::{decode_file, Track};
pub use driver::{ClockMode, PlaybackDriver, PlaybackState, Player};
pub use meter::{average_power_db, MeterReading, PlaybackMeter};
pub use source::{AudioSource, ScopedAccess, DEFAULT_ASSET, DEFAULT_ASSET_DIR};
