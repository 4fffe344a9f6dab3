//! Playback driver: loads a source, owns the transport and answers metering.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info};

use super::decode::{decode_file, Track};
use super::meter::{average_power_db, MeterReading, PlaybackMeter};
use super::output::{open_output_stream, Transport};
use super::source::{AudioSource, ScopedAccess, DEFAULT_ASSET_DIR};
use crate::error::AudioError;
use crate::params::AnalysisConfig;

/// What advances the playback cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockMode {
    /// Audio device callback (audible playback)
    #[default]
    Device,

    /// Wall clock, no audio output
    Wall,

    /// Only [`PlaybackDriver::advance`] moves the cursor
    Manual,
}

enum Clock {
    Device(cpal::Stream),
    Wall {
        /// Instant and cursor at which playback last resumed
        anchor: Option<(Instant, u64)>,
    },
    Manual,
}

/// A loaded track and its transport
pub struct Player {
    track: Arc<Track>,
    transport: Arc<Transport>,
    clock: Clock,
}

impl Player {
    fn new(track: Track, mode: ClockMode) -> Result<Self, AudioError> {
        let track = Arc::new(track);
        let transport = Arc::new(Transport::default());
        let clock = match mode {
            ClockMode::Device => {
                Clock::Device(open_output_stream(Arc::clone(&track), Arc::clone(&transport))?)
            }
            ClockMode::Wall => Clock::Wall { anchor: None },
            ClockMode::Manual => Clock::Manual,
        };
        Ok(Self {
            track,
            transport,
            clock,
        })
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    /// Cursor in track frames, never past the end
    pub fn position_frames(&self) -> u64 {
        let cursor = match &self.clock {
            Clock::Wall {
                anchor: Some((resumed, from)),
            } => {
                let elapsed = resumed.elapsed().as_secs_f64() * self.track.sample_rate() as f64;
                from + elapsed as u64
            }
            _ => self.transport.cursor(),
        };
        cursor.min(self.track.frames())
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing() && self.position_frames() < self.track.frames()
    }

    fn play(&mut self) {
        let mut from = self.position_frames();
        if from >= self.track.frames() {
            from = 0;
        }
        self.transport.set_cursor(from);
        if let Clock::Wall { anchor } = &mut self.clock {
            *anchor = Some((Instant::now(), from));
        }
        self.transport.set_playing(true);
    }

    fn pause(&mut self) {
        let at = self.position_frames();
        self.transport.set_playing(false);
        self.transport.set_cursor(at);
        if let Clock::Wall { anchor } = &mut self.clock {
            *anchor = None;
        }
    }

    fn stop(&mut self) {
        self.transport.set_playing(false);
        self.transport.set_cursor(0);
        if let Clock::Wall { anchor } = &mut self.clock {
            *anchor = None;
        }
    }

    fn advance(&mut self, dt: Duration) {
        if !matches!(self.clock, Clock::Manual) || !self.transport.is_playing() {
            return;
        }
        let step = (dt.as_secs_f64() * self.track.sample_rate() as f64).round() as u64;
        let next = self.transport.cursor().saturating_add(step);
        if next >= self.track.frames() {
            self.transport.set_cursor(self.track.frames());
            self.transport.set_playing(false);
            debug!("Reached end of track");
        } else {
            self.transport.set_cursor(next);
        }
    }
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clock = match self.clock {
            Clock::Device(_) => ClockMode::Device,
            Clock::Wall { .. } => ClockMode::Wall,
            Clock::Manual => ClockMode::Manual,
        };
        f.debug_struct("Player")
            .field("frames", &self.track.frames())
            .field("sample_rate", &self.track.sample_rate())
            .field("position", &self.position_frames())
            .field("playing", &self.is_playing())
            .field("clock", &clock)
            .finish()
    }
}

/// Load state of the driver
#[derive(Debug, Default)]
pub enum PlaybackState {
    #[default]
    Unloaded,
    Loaded(Player),
    Failed(AudioError),
}

/// Owns the loaded track and exposes transport control plus metering
#[derive(Debug)]
pub struct PlaybackDriver {
    state: PlaybackState,
    clock_mode: ClockMode,
    asset_dir: PathBuf,
    meter_window: usize,
}

impl PlaybackDriver {
    pub fn new(clock_mode: ClockMode) -> Self {
        Self {
            state: PlaybackState::Unloaded,
            clock_mode,
            asset_dir: PathBuf::from(DEFAULT_ASSET_DIR),
            meter_window: AnalysisConfig::default().meter_window_frames,
        }
    }

    /// Directory bundled sources are resolved against
    pub fn with_asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = dir.into();
        self
    }

    /// Number of frames averaged for the power meter
    pub fn with_meter_window(mut self, frames: usize) -> Self {
        self.meter_window = frames.max(1);
        self
    }

    pub fn clock_mode(&self) -> ClockMode {
        self.clock_mode
    }

    /// Decode `source` and prepare playback.
    ///
    /// On failure the driver keeps the error in [`PlaybackState::Failed`]
    /// and metering reports nothing.
    pub fn load(&mut self, source: &AudioSource) -> Result<(), AudioError> {
        let result = self.resolve(source).and_then(|track| {
            info!(
                "Loaded {}: {:.1}s @ {}Hz",
                source.display_name(),
                track.duration_secs(),
                track.sample_rate()
            );
            self.load_track(track)
        });

        if let Err(e) = &result {
            error!("Failed to load {}: {}", source.display_name(), e);
            self.state = PlaybackState::Failed(e.clone());
        }
        result
    }

    fn resolve(&self, source: &AudioSource) -> Result<Track, AudioError> {
        match source {
            AudioSource::Bundled(name) => decode_file(&self.asset_dir.join(name)),
            AudioSource::External(path) => {
                let access = ScopedAccess::acquire(path)?;
                decode_file(access.path())
            }
        }
    }

    /// Install an already decoded track, replacing anything loaded
    pub fn load_track(&mut self, track: Track) -> Result<(), AudioError> {
        // Drop the old stream before opening a new one
        self.state = PlaybackState::Unloaded;
        match Player::new(track, self.clock_mode) {
            Ok(player) => {
                self.state = PlaybackState::Loaded(player);
                Ok(())
            }
            Err(e) => {
                self.state = PlaybackState::Failed(e.clone());
                Err(e)
            }
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    fn player(&self) -> Option<&Player> {
        match &self.state {
            PlaybackState::Loaded(player) => Some(player),
            _ => None,
        }
    }

    fn player_mut(&mut self) -> Option<&mut Player> {
        match &mut self.state {
            PlaybackState::Loaded(player) => Some(player),
            _ => None,
        }
    }

    pub fn track(&self) -> Option<&Track> {
        self.player().map(Player::track)
    }

    pub fn play(&mut self) {
        if let Some(player) = self.player_mut() {
            player.play();
            info!("Playback started");
        }
    }

    pub fn pause(&mut self) {
        if let Some(player) = self.player_mut() {
            player.pause();
            info!("Playback paused");
        }
    }

    /// Halt and rewind to the start
    pub fn stop(&mut self) {
        if let Some(player) = self.player_mut() {
            player.stop();
            info!("Playback stopped");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.player().is_some_and(Player::is_playing)
    }

    /// Move a manual clock forward; other clocks ignore this
    pub fn advance(&mut self, dt: Duration) {
        if let Some(player) = self.player_mut() {
            player.advance(dt);
        }
    }

    /// Average power (dBFS) of the meter window ending at the cursor
    pub fn current_power(&self) -> f32 {
        let Some(player) = self.player() else {
            return crate::params::audio_constants::SILENCE_DB;
        };
        let end = player.position_frames() as usize;
        let start = end.saturating_sub(self.meter_window);
        average_power_db(&player.track().samples()[start..end])
    }

    /// Playback position in seconds
    pub fn current_time(&self) -> f64 {
        self.player().map_or(0.0, |p| {
            p.position_frames() as f64 / p.track().sample_rate() as f64
        })
    }

    /// Track length in seconds; 0 when nothing is loaded
    pub fn duration(&self) -> f64 {
        self.track().map_or(0.0, Track::duration_secs)
    }

    /// Elapsed fraction of the track in [0, 1]
    pub fn position_fraction(&self) -> f32 {
        self.reading().map_or(0.0, |r| r.position_fraction())
    }

    pub fn asset_dir(&self) -> &Path {
        &self.asset_dir
    }
}

impl PlaybackMeter for PlaybackDriver {
    fn reading(&self) -> Option<MeterReading> {
        self.player()?;
        Some(MeterReading {
            average_power_db: self.current_power(),
            current_time_s: self.current_time(),
            duration_s: self.duration(),
            is_playing: self.is_playing(),
        })
    }

    fn pcm_window(&self, out: &mut [f32]) -> bool {
        match self.player() {
            Some(player) if !out.is_empty() => {
                player
                    .track()
                    .window_ending_at(player.position_frames(), out);
                true
            }
            _ => false,
        }
    }
}
