// src/bin/synthetic_feed.rs
use anyhow::{Context, Result};
use body_retarget::{FrameRecord, JointType, Rig, RigHost, TrackingState};
use clap::Parser;
use nalgebra::{UnitQuaternion, Vector3};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "synthetic_feed", version, about)]
struct Args {
    /// Number of frames to generate
    #[arg(short = 'n', long, default_value_t = 300)]
    frames: usize,

    /// Simulated capture rate, in frames per second
    #[arg(short, long, default_value_t = 30.0)]
    rate: f32,

    /// Distance between the sensor and the subject
    #[arg(long, default_value_t = 2.0)]
    distance: f32,

    /// Mark the left hand untracked on every Nth frame (0 disables)
    #[arg(long, default_value_t = 0)]
    dropout_every: usize,

    /// Restart frame ids at 1 after this many frames, as a reset source would
    #[arg(long)]
    reset_at: Option<usize>,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn pose(rig: &mut Rig, t: f32) {
    let z = Vector3::z_axis();
    let x = Vector3::x_axis();

    rig.set_translation_root_position(Vector3::new(0.3 * (t * 0.5).sin(), 1.0, 0.0));
    // approaching and receding shows up as apparent size
    rig.set_uniform_scale(1.0 + 0.2 * (t * 0.2).sin());

    rig.set_local_rotation(
        JointType::ShoulderRight,
        UnitQuaternion::from_axis_angle(&z, 0.8 * t.sin()),
    );
    rig.set_local_rotation(
        JointType::ElbowRight,
        UnitQuaternion::from_axis_angle(&z, 0.5 * (1.0 + (t * 1.3).sin())),
    );
    rig.set_local_rotation(
        JointType::ShoulderLeft,
        UnitQuaternion::from_axis_angle(&z, 0.6 + 0.1 * (t * 0.7).cos()),
    );
    rig.set_local_rotation(
        JointType::ElbowLeft,
        UnitQuaternion::from_axis_angle(&x, 0.4 * (t * 0.9).sin()),
    );
    rig.set_local_rotation(
        JointType::Head,
        UnitQuaternion::from_axis_angle(&z, 0.15 * (t * 0.4).sin()),
    );
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let args = Args::parse();
    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let mut rig = Rig::humanoid();
    let mut frame_id: i64 = 2;
    for i in 0..args.frames {
        if args.reset_at == Some(i) {
            info!(at = i, "Emitting reset");
            frame_id = 1;
        }

        let t = i as f32 / args.rate;
        pose(&mut rig, t);
        let mut frame = rig.observe(frame_id, args.distance);
        if args.dropout_every > 0 && i > 0 && i % args.dropout_every == 0 {
            frame.joints[JointType::HandLeft].state = TrackingState::NotTracked;
        }

        serde_json::to_writer(&mut out, &FrameRecord::from(&frame))?;
        out.write_all(b"\n")?;
        frame_id += 1;
    }
    out.flush()?;
    info!(frames = args.frames, "Synthetic feed written");
    Ok(())
}
