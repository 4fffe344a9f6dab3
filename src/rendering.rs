//! Software rasterizer and recording output (PNG frames plus WAV audio).

use std::path::Path;
use std::time::Duration;

use glam::DVec2;
use image::{Rgba, RgbaImage};
use log::{error, info, warn};

use crate::error::RenderError;
use crate::params::{LayerStyle, RecordingConfig, ViewSize};
use crate::scheduler::TickHandler;
use crate::visualizer::{FrameSink, RenderFrame, Visualizer};

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Draw a frame onto a black canvas of the view's pixel size.
///
/// Each layer fills the area below its curve at the layer opacity; mirrored
/// layers also get an opaque stroke of the curve flipped about the center.
pub fn rasterize(frame: &RenderFrame, size: ViewSize) -> RgbaImage {
    let (width, height) = size.pixels();
    let mut image = RgbaImage::from_pixel(width, height, BACKGROUND);

    for layer in &frame.layers {
        fill_under_curve(&mut image, |x| layer.points.y_at(x), &layer.style);
        if layer.mirrored {
            stroke_polyline(&mut image, &layer.points.mirrored(size.height), &layer.style);
        }
    }
    image
}

fn fill_under_curve(image: &mut RgbaImage, curve_y: impl Fn(f64) -> Option<f64>, style: &LayerStyle) {
    let (width, height) = image.dimensions();
    let alpha = style.opacity.clamp(0.0, 1.0);
    for x in 0..width {
        let Some(y) = curve_y(x as f64 + 0.5) else {
            continue;
        };
        if !y.is_finite() {
            continue;
        }
        let top = y.round().clamp(0.0, height as f64) as u32;
        for row in top..height {
            blend(image.get_pixel_mut(x, row), style.color, alpha);
        }
    }
}

fn stroke_polyline(image: &mut RgbaImage, points: &[DVec2], style: &LayerStyle) {
    let radius = (style.stroke_width as f64 / 2.0).max(0.5);
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let steps = ((b - a).length() / 0.5).ceil().max(1.0) as usize;
        for i in 0..=steps {
            stamp_disc(image, a.lerp(b, i as f64 / steps as f64), radius, style.color);
        }
    }
}

fn stamp_disc(image: &mut RgbaImage, center: DVec2, radius: f64, color: [u8; 3]) {
    if !center.is_finite() {
        return;
    }
    let (width, height) = image.dimensions();
    let x0 = (center.x - radius).floor().max(0.0) as u32;
    let y0 = (center.y - radius).floor().max(0.0) as u32;
    let x1 = ((center.x + radius).ceil().max(0.0) as u32).min(width);
    let y1 = ((center.y + radius).ceil().max(0.0) as u32).min(height);

    for y in y0..y1 {
        for x in x0..x1 {
            let pixel_center = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
            if pixel_center.distance(center) <= radius {
                image.put_pixel(x, y, Rgba([color[0], color[1], color[2], 255]));
            }
        }
    }
}

fn blend(pixel: &mut Rgba<u8>, color: [u8; 3], alpha: f32) {
    for (channel, &target) in pixel.0.iter_mut().zip(color.iter()) {
        let mixed = *channel as f32 * (1.0 - alpha) + target as f32 * alpha;
        *channel = mixed.round().clamp(0.0, 255.0) as u8;
    }
}

/// Writes every presented frame as a numbered PNG
#[derive(Debug)]
pub struct PngSequenceSink {
    recording: RecordingConfig,
    size: ViewSize,
    frame_num: usize,
    failed: usize,
}

impl PngSequenceSink {
    /// Create the frames directory and start numbering at zero
    pub fn new(recording: RecordingConfig, size: ViewSize) -> Result<Self, RenderError> {
        std::fs::create_dir_all(recording.frames_dir())?;
        Ok(Self {
            recording,
            size,
            frame_num: 0,
            failed: 0,
        })
    }

    pub fn frames_written(&self) -> usize {
        self.frame_num - self.failed
    }

    pub fn frames_failed(&self) -> usize {
        self.failed
    }
}

impl FrameSink for PngSequenceSink {
    fn present(&mut self, frame: &RenderFrame) {
        let image = rasterize(frame, self.size);
        let path = self.recording.frame_path(self.frame_num);
        if let Err(e) = image::save_buffer(
            &path,
            &image,
            image.width(),
            image.height(),
            image::ColorType::Rgba8,
        ) {
            error!("Failed to save frame {}: {}", self.frame_num, e);
            self.failed += 1;
        }
        self.frame_num += 1;
    }
}

/// Write mono samples as a 32-bit float WAV
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), RenderError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Outcome of a finished recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSummary {
    pub frames_written: usize,
    pub frames_failed: usize,

    /// Audio frames written to the WAV (0 when nothing was loaded)
    pub audio_frames: usize,
}

/// Render `recording.total_frames()` frames offline.
///
/// Every frame runs one analysis tick and one render tick, then moves the
/// playback clock forward by one frame interval. The driver should use the
/// manual clock so the output is reproducible.
pub fn record(
    visualizer: &mut Visualizer<PngSequenceSink>,
    recording: &RecordingConfig,
) -> Result<RecordingSummary, RenderError> {
    std::fs::create_dir_all(&recording.output_dir)?;

    let total_frames = recording.total_frames();
    let frame_dt = Duration::from_secs_f64(recording.frame_interval_secs());
    let fps = recording.fps.max(1) as usize;
    info!(
        "Recording {} frames @ {} fps to {}",
        total_frames,
        recording.fps,
        recording.output_dir.display()
    );

    for frame in 0..total_frames {
        visualizer.on_analysis_tick();
        visualizer.on_render_tick();
        visualizer.driver_mut().advance(frame_dt);

        if (frame + 1) % fps == 0 {
            info!("Recorded {}/{} frames", frame + 1, total_frames);
        }
    }

    let audio_frames = match visualizer.driver().track() {
        Some(track) => {
            let wanted = (total_frames as f64 * recording.frame_interval_secs()
                * track.sample_rate() as f64)
                .round() as usize;
            let samples = &track.samples()[..wanted.min(track.samples().len())];
            write_wav(&recording.audio_path(), samples, track.sample_rate())?;
            samples.len()
        }
        None => {
            warn!("No track loaded; skipping audio");
            0
        }
    };

    let sink = visualizer.sink();
    let summary = RecordingSummary {
        frames_written: sink.frames_written(),
        frames_failed: sink.frames_failed(),
        audio_frames,
    };
    info!(
        "Recording complete: {} frames, {} audio samples",
        summary.frames_written, summary.audio_frames
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::WaveLayer;
    use crate::spectrum::SpectrumSnapshot;
    use crate::visualizer::LayerFrame;
    use crate::waveform::WavePointSequence;

    const RED: LayerStyle = LayerStyle {
        color: [255, 0, 0],
        opacity: 0.5,
        stroke_width: 2.0,
    };

    fn flat_frame(y: f64, mirrored: bool) -> RenderFrame {
        let points = (0..=10).map(|i| DVec2::new(i as f64 * 10.0, y)).collect();
        RenderFrame {
            time_s: 0.0,
            bands: SpectrumSnapshot::default(),
            layers: vec![LayerFrame {
                layer: WaveLayer::Main,
                points: WavePointSequence::new(points),
                style: RED,
                mirrored,
            }],
        }
    }

    #[test]
    fn test_rasterize_size_and_background() {
        let frame = RenderFrame {
            time_s: 0.0,
            bands: SpectrumSnapshot::default(),
            layers: Vec::new(),
        };
        let image = rasterize(&frame, ViewSize::new(64.0, 32.0));
        assert_eq!(image.dimensions(), (64, 32));
        assert!(image.pixels().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn test_fill_below_curve_only() {
        let image = rasterize(&flat_frame(20.0, false), ViewSize::new(100.0, 40.0));

        let below = image.get_pixel(50, 30);
        assert!((below[0] as i32 - 128).abs() <= 1);
        assert_eq!(below[1], 0);

        assert_eq!(*image.get_pixel(50, 10), BACKGROUND);
    }

    #[test]
    fn test_mirrored_stroke() {
        let size = ViewSize::new(100.0, 40.0);
        // Curve at y = 30 mirrors to y = 10
        let plain = rasterize(&flat_frame(30.0, false), size);
        assert_eq!(*plain.get_pixel(50, 10), BACKGROUND);

        let mirrored = rasterize(&flat_frame(30.0, true), size);
        assert_eq!(*mirrored.get_pixel(50, 10), Rgba([255, 0, 0, 255]));
        assert_eq!(*mirrored.get_pixel(50, 2), BACKGROUND);
    }

    #[test]
    fn test_png_sink_numbers_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut recording = RecordingConfig::new(1.0);
        recording.output_dir = dir.path().to_path_buf();

        let mut sink = PngSequenceSink::new(recording.clone(), ViewSize::new(20.0, 10.0)).unwrap();
        sink.present(&flat_frame(5.0, true));
        sink.present(&flat_frame(5.0, false));

        assert_eq!(sink.frames_written(), 2);
        assert_eq!(sink.frames_failed(), 0);
        let saved = image::open(recording.frame_path(1)).unwrap();
        assert_eq!((saved.width(), saved.height()), (20, 10));
        assert!(recording.frames_dir().join("frame_00000.png").exists());
    }

    #[test]
    fn test_write_wav_float() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        write_wav(&path, &[0.0, 0.5, -0.5], 22050).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.bits_per_sample, 32);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0.0, 0.5, -0.5]);
    }
}
