//! visuac - layered, audio-reactive waveforms
//!
//! Three translucent waves ride on top of each other, each one swelling with
//! the energy of its own frequency band.

use std::error::Error;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use log::{error, info, warn};

use visuac::cli::Args;
use visuac::error::AudioError;
use visuac::params::{RecordingConfig, VisualizerConfig};
use visuac::playback::{ClockMode, PlaybackDriver};
use visuac::rendering::{self, PngSequenceSink};
use visuac::scheduler::Scheduler;
use visuac::spectrum::FrequencyBand;
use visuac::visualizer::{FrameClock, FrameSink, RenderFrame, Visualizer};

/// Live-mode sink: logs a band meter about once per second
struct BandLogSink {
    last_report: Instant,
}

impl BandLogSink {
    fn new() -> Self {
        Self {
            last_report: Instant::now(),
        }
    }
}

impl FrameSink for BandLogSink {
    fn present(&mut self, frame: &RenderFrame) {
        if self.last_report.elapsed() < Duration::from_secs(1) {
            return;
        }
        self.last_report = Instant::now();

        let meter: Vec<String> = FrequencyBand::ALL
            .iter()
            .map(|&band| {
                let level = frame.bands.get(band);
                let bar = "#".repeat((level * 4.0).round() as usize);
                format!("{:>10} {:<16}", band.name(), bar)
            })
            .collect();
        info!("\n{}", meter.join("\n"));
    }
}

fn load_config(args: &Args) -> Result<VisualizerConfig, Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => {
            info!("Config: {}", path.display());
            VisualizerConfig::load(path)?
        }
        None => VisualizerConfig::default(),
    };
    Ok(args.apply_overrides(config))
}

fn run_live(args: &Args, config: VisualizerConfig) -> Result<(), Box<dyn Error>> {
    let driver = PlaybackDriver::new(ClockMode::Device)
        .with_meter_window(config.analysis.meter_window_frames);
    let mut scheduler = Scheduler::new(config.analysis_interval(), config.render_interval());
    let autoplay = config.autoplay;
    let mut visualizer =
        Visualizer::new(driver, config, args.view_size(), BandLogSink::new()).stop_at_end(autoplay);

    let source = args.audio_source();
    if let Err(AudioError::SessionConfigFailed(_)) = visualizer.load(&source) {
        warn!("No usable audio output; continuing without sound");
        let meter_window = visualizer.config().analysis.meter_window_frames;
        *visualizer.driver_mut() =
            PlaybackDriver::new(ClockMode::Wall).with_meter_window(meter_window);
        let _ = visualizer.load(&source);
    }

    if visualizer.driver().track().is_none() && args.seconds.is_none() {
        return Err(format!("could not load {}", source.display_name()).into());
    }

    if let Some(seconds) = args.seconds {
        let stop = scheduler.stop_handle();
        let limit = Duration::from_secs_f64(seconds.max(0.0));
        std::thread::spawn(move || {
            std::thread::sleep(limit);
            stop.stop();
        });
    }

    info!("visuac is running (Ctrl+C to quit)");
    scheduler.run(&mut visualizer);
    info!(
        "Stopped after {} frames at {:.1}s",
        visualizer.frames_presented(),
        visualizer.driver().current_time()
    );
    Ok(())
}

fn run_recording(
    args: &Args,
    config: VisualizerConfig,
    recording: RecordingConfig,
) -> Result<(), Box<dyn Error>> {
    let driver = PlaybackDriver::new(ClockMode::Manual)
        .with_meter_window(config.analysis.meter_window_frames);
    let sink = PngSequenceSink::new(recording.clone(), args.view_size())?;
    let mut visualizer = Visualizer::new(driver, config, args.view_size(), sink)
        .with_frame_clock(FrameClock::Playback);

    if visualizer.load(&args.audio_source()).is_err() {
        warn!("Recording a flat waveform without audio");
    }
    // Recording always plays, whatever the autoplay setting
    visualizer.driver_mut().play();

    let summary = rendering::record(&mut visualizer, &recording)?;
    if summary.frames_failed > 0 {
        warn!("{} frames failed to save", summary.frames_failed);
    }

    info!("Frames saved to: {}", recording.frames_dir().display());
    info!("Audio saved to: {}", recording.audio_path().display());
    info!(
        "Encode with: ffmpeg -framerate {} -i {}/frame_%05d.png -i {} -c:v libx264 -pix_fmt yuv420p -c:a aac output.mp4",
        recording.fps,
        recording.frames_dir().display(),
        recording.audio_path().display()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let result = load_config(&args).and_then(|config| match args.create_recording_config() {
        Some(recording) => run_recording(&args, config, recording),
        None => run_live(&args, config),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
