//! Decoding audio files into mono tracks.

use std::fs::File;
use std::path::Path;

use log::{debug, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::AudioError;

/// Fully decoded, down-mixed audio ready for playback and analysis
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Track {
    /// Wrap mono samples; a zero sample rate is rejected
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Result<Self, AudioError> {
        if sample_rate == 0 {
            return Err(AudioError::DecodeFailed("sample rate must be > 0".to_string()));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> u64 {
        self.samples.len() as u64
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Copy the `out.len()` samples ending at `end_frame` into `out`.
    ///
    /// Positions before the start of the track read as silence.
    pub fn window_ending_at(&self, end_frame: u64, out: &mut [f32]) {
        let end = (end_frame as usize).min(self.samples.len());
        let start = end.saturating_sub(out.len());
        let available = &self.samples[start..end];
        let pad = out.len() - available.len();
        out[..pad].iter_mut().for_each(|s| *s = 0.0);
        out[pad..].copy_from_slice(available);
    }
}

/// Decode an audio file (any format symphonia probes) into a mono track
pub fn decode_file(path: &Path) -> Result<Track, AudioError> {
    let file = File::open(path).map_err(|e| AudioError::from_io(&e, path))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decode_error(path, e))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| AudioError::DecodeFailed(format!("{}: no audio track", path.display())))?;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_error(path, e))?;

    let mut samples: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(decode_error(path, e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let channels = spec.channels.count().max(1);
                let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);

                // Mix to mono
                for chunk in sample_buf.samples().chunks(channels) {
                    samples.push(chunk.iter().sum::<f32>() / channels as f32);
                }
            }
            Err(SymphoniaError::DecodeError(msg)) => {
                warn!("Skipping corrupt packet in {}: {}", path.display(), msg);
            }
            Err(e) => return Err(decode_error(path, e)),
        }
    }

    if samples.is_empty() {
        return Err(AudioError::DecodeFailed(format!(
            "{}: no audio samples",
            path.display()
        )));
    }

    debug!(
        "Decoded {}: {} frames @ {}Hz",
        path.display(),
        samples.len(),
        sample_rate
    );
    Track::from_samples(samples, sample_rate)
}

fn decode_error(path: &Path, err: SymphoniaError) -> AudioError {
    match err {
        SymphoniaError::IoError(e) => AudioError::from_io(&e, path),
        other => AudioError::DecodeFailed(format!("{}: {}", path.display(), other)),
    }
}
