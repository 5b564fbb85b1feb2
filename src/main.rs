// src/main.rs
use anyhow::{Context, Result};
use body_retarget::data::default_output_dir;
use body_retarget::{
    frame_channel, FrameRecord, PipelineConfig, RetargetPipeline, Rig, SessionRecorder,
    TrackingFrame,
};
use clap::Parser;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Replays recorded tracking frames through the retarget pipeline.
#[derive(Parser, Debug)]
#[command(name = "body_retarget", version, about)]
struct Args {
    /// Recorded frames, one JSON object per line
    #[arg(short, long)]
    frames: PathBuf,

    /// Pipeline configuration (JSON); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Delivery rate of the simulated tracking source, in frames per second
    #[arg(short, long, default_value_t = 30.0)]
    rate: f64,

    /// Update tick rate, in ticks per second
    #[arg(long, default_value_t = 60.0)]
    tick_rate: f64,

    /// Export directory for the session CSV files
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Session name; timestamped when omitted
    #[arg(long)]
    session: Option<String>,
}

fn load_frames(path: &Path) -> Result<Vec<TrackingFrame>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut frames = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: FrameRecord = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: bad frame record", path.display(), line_no + 1))?;
        frames.push(TrackingFrame::try_from(record)?);
    }
    Ok(frames)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    if args.rate <= 0.0 || args.tick_rate <= 0.0 {
        anyhow::bail!("rates must be positive");
    }

    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let frames = load_frames(&args.frames)?;
    info!(count = frames.len(), "Loaded recorded frames");

    let mut pipeline =
        RetargetPipeline::new(config, Rig::humanoid()).context("setting up pipeline")?;
    let mut recorder = SessionRecorder::new(
        args.output.clone().unwrap_or_else(default_output_dir),
        args.session.clone(),
    );

    let (ingestor, mut receiver) = frame_channel();
    let delivery = Duration::from_secs_f64(1.0 / args.rate);
    let producer = tokio::spawn(async move {
        let mut interval = tokio::time::interval(delivery);
        for frame in frames {
            interval.tick().await;
            ingestor.publish(frame);
        }
    });

    let start = Instant::now();
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / args.tick_rate));
    let mut skipped = 0usize;
    loop {
        ticker.tick().await;
        match pipeline.tick(&mut receiver) {
            Some(report) => {
                if report.was_dropped() {
                    skipped += 1;
                }
                recorder.add_frame(report, start.elapsed().as_secs_f64());
            }
            None if receiver.producer_closed() => break,
            None => {}
        }
    }
    producer.await.context("frame producer task failed")?;

    if skipped > 0 {
        warn!(skipped, "Out-of-order frames were dropped");
    }
    if recorder.is_empty() {
        warn!("No frames processed, nothing to export");
        return Ok(());
    }
    let dir = recorder.export_csv().context("exporting session")?;
    println!("Processed {} frames, session written to {}", recorder.len(), dir.display());
    Ok(())
}
