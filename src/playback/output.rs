//! Audio device output for loaded tracks.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{error, info};

use super::decode::Track;
use crate::error::AudioError;

/// Playback cursor and run flag shared with the audio callback
#[derive(Debug, Default)]
pub(crate) struct Transport {
    /// Position in track frames
    pub cursor: AtomicU64,
    pub playing: AtomicBool,
}

impl Transport {
    pub fn cursor(&self) -> u64 {
        self.cursor.load(Ordering::Acquire)
    }

    pub fn set_cursor(&self, frame: u64) {
        self.cursor.store(frame, Ordering::Release);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Release);
    }
}

/// Open the default output device and stream `track` from the shared cursor.
///
/// The stream keeps running while paused and writes silence; the driver only
/// flips the transport flag.
pub(crate) fn open_output_stream(
    track: Arc<Track>,
    transport: Arc<Transport>,
) -> Result<cpal::Stream, AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::SessionConfigFailed("No audio output device found".to_string()))?;

    let config = device
        .default_output_config()
        .map_err(|e| AudioError::SessionConfigFailed(format!("Failed to get audio config: {}", e)))?;

    info!(
        "Audio: {} @ {}Hz",
        device.name().unwrap_or_else(|_| "Unknown".to_string()),
        config.sample_rate().0
    );

    let channels = config.channels().max(1) as usize;
    // Track frames consumed per device frame (nearest-sample resampling)
    let step = track.sample_rate() as f64 / config.sample_rate().0 as f64;
    let mut fraction = 0.0f64;

    let stream = device
        .build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                if !transport.is_playing() {
                    data.fill(0.0);
                    return;
                }

                let start = transport.cursor();
                let mut cursor = start;
                for frame in data.chunks_mut(channels) {
                    match track.samples().get(cursor as usize) {
                        Some(&sample) => frame.fill(sample.clamp(-1.0, 1.0)),
                        None => {
                            frame.fill(0.0);
                            transport.set_playing(false);
                            continue;
                        }
                    }
                    fraction += step;
                    let whole = fraction.floor();
                    fraction -= whole;
                    cursor += whole as u64;
                }

                // A seek/stop from the driver during this callback wins
                let _ = transport.cursor.compare_exchange(
                    start,
                    cursor,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| AudioError::SessionConfigFailed(format!("Failed to build audio stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| AudioError::SessionConfigFailed(format!("Failed to start audio stream: {}", e)))?;

    Ok(stream)
}
