//! Example: Record a visualization of synthetic audio.
//!
//! Generates a synthetic beat, plays it through the visualizer and records
//! the whole track. The video lands in the output directory.
//!
//! Run with:
//!     cargo run --example render_synthetic -- [mode] [theme] [output-dir]
//!
//! Set `RUST_LOG=debug` for lifecycle logging.

use anyhow::Context;
use music_visualizer::audio::generate_test_beat;
use music_visualizer::capture::DirectorySink;
use music_visualizer::modes::{BackgroundType, ModeKind};
use music_visualizer::pipeline::{InputSource, Visualizer, VisualizerConfig};
use music_visualizer::playback::RecordingStatus;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let mode: ModeKind = args.next().as_deref().unwrap_or("galaxyspiral").parse()?;
    let theme = args.next().unwrap_or_else(|| "neon".to_string());
    let output_dir = args.next().unwrap_or_else(|| "exports".to_string());

    println!("Music Visualizer - Synthetic Audio Example");
    println!("==========================================\n");

    // 120 BPM beat, 4 seconds
    let sample_rate: u32 = 44100;
    let duration_secs: f32 = 4.0;
    let samples = generate_test_beat(120.0, sample_rate, duration_secs);
    println!("Generated {} samples @ {} Hz", samples.len(), sample_rate);

    let mut config = VisualizerConfig {
        width: 640,
        height: 360,
        ..Default::default()
    };
    config.render.mode = mode;
    config.render.color_theme = theme;
    config.render.background_type = BackgroundType::Black;
    config.capture.fps = 30;

    let sink = DirectorySink::new(&output_dir);
    let mut visualizer = Visualizer::builder(config)
        .sink(Box::new(sink.clone()))
        .build()
        .context("building visualizer")?;

    visualizer.load_input(InputSource::new("synthetic-beat.wav", "audio/wav", samples, sample_rate))?;
    println!("Mode: {} ({})", mode, mode.description());
    println!("Status: {}\n", visualizer.status());

    visualizer.download_video(false)?;
    println!("{}", visualizer.recording_status());

    let mut ticks = 0u64;
    while visualizer.recorder().is_recording() {
        visualizer.on_frame();
        ticks += 1;
        if ticks % 60 == 0 {
            println!("  {}s recorded", ticks / 60);
        }
    }

    match visualizer.recording_status() {
        RecordingStatus::Failed(reason) => anyhow::bail!("recording failed: {reason}"),
        status => println!("\n{}", status),
    }
    for path in sink.written() {
        println!("Output: {}", path.display());
    }

    Ok(())
}
