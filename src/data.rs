// src/data.rs
use crate::error::RetargetResult;
use crate::frame::Admission;
use crate::pipeline::FrameReport;
use chrono::Local;
use csv::Writer;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Serialize)]
struct FrameRow {
    timestamp: f64,
    frame_id: i64,
    admission: &'static str,
    anomalies: usize,
    rotated_joints: usize,
    scale_coefficient: f32,
    uniform_scale: Option<f32>,

    root_x: f32,
    root_y: f32,
    root_z: f32,

    root_offset_x: Option<f32>,
    root_offset_y: Option<f32>,
    root_offset_z: Option<f32>,
}

#[derive(Debug, Serialize)]
struct JointRow {
    frame_id: i64,
    joint: &'static str,
    x: f32,
    y: f32,
    z: f32,
}

pub fn default_output_dir() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.document_dir().map(|p| p.join("BodyRetarget")))
        .unwrap_or_else(|| PathBuf::from("./output"))
}

pub struct SessionRecorder {
    output_dir: PathBuf,
    session_name: String,
    reports: Vec<FrameReport>,
    timestamps: Vec<f64>,
}

impl SessionRecorder {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name.unwrap_or_else(|| {
            format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"))
        });

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
            reports: Vec::new(),
            timestamps: Vec::new(),
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn session_dir(&self) -> PathBuf {
        self.output_dir.join(&self.session_name)
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn add_frame(&mut self, report: FrameReport, timestamp: f64) {
        self.reports.push(report);
        self.timestamps.push(timestamp);
    }

    /// Writes `tracking_data.csv` (one row per frame) and
    /// `joint_positions.csv` (one row per filtered joint per frame) into the
    /// session directory. Returns the session directory.
    pub fn export_csv(&self) -> RetargetResult<PathBuf> {
        let dir = self.session_dir();
        fs::create_dir_all(&dir)?;

        let mut frames = Writer::from_writer(File::create(dir.join("tracking_data.csv"))?);
        let mut joints = Writer::from_writer(File::create(dir.join("joint_positions.csv"))?);

        for (report, timestamp) in self.reports.iter().zip(self.timestamps.iter()) {
            frames.serialize(Self::create_record(report, *timestamp))?;

            if report.was_dropped() {
                continue;
            }
            for (joint, position) in report.filtered.iter() {
                if let Some(p) = position {
                    joints.serialize(JointRow {
                        frame_id: report.frame_id,
                        joint: joint.name(),
                        x: p.x,
                        y: p.y,
                        z: p.z,
                    })?;
                }
            }
        }

        frames.flush()?;
        joints.flush()?;
        info!(frames = self.reports.len(), dir = %dir.display(), "Session exported");
        Ok(dir)
    }

    fn create_record(report: &FrameReport, timestamp: f64) -> FrameRow {
        let admission = match report.admission {
            Admission::Accept => "accept",
            Admission::Reset => "reset",
            Admission::Drop { .. } => "drop",
        };
        FrameRow {
            timestamp,
            frame_id: report.frame_id,
            admission,
            anomalies: report.anomalies.len(),
            rotated_joints: report.rotated_joints,
            scale_coefficient: report.scale_coefficient,
            uniform_scale: report.uniform_scale,
            root_x: report.root_position.x,
            root_y: report.root_position.y,
            root_z: report.root_position.z,
            root_offset_x: report.root_offset.map(|o| o.x),
            root_offset_y: report.root_offset.map(|o| o.y),
            root_offset_z: report.root_offset.map(|o| o.z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::pipeline::RetargetPipeline;
    use crate::rig::Rig;

    #[test]
    fn test_default_session_name_is_timestamped() {
        let recorder = SessionRecorder::new("/tmp", None);
        assert!(recorder.session_name().starts_with("session_"));
        assert_eq!(recorder.session_name().len(), "session_20240101_120000".len());
    }

    #[test]
    fn test_export_writes_both_files() {
        let source = Rig::humanoid();
        let config = PipelineConfig { window_size: 1, ..Default::default() };
        let mut pipeline = RetargetPipeline::new(config, Rig::humanoid()).unwrap();

        let out = std::env::temp_dir().join(format!("body_retarget_test_{}", std::process::id()));
        let mut recorder = SessionRecorder::new(&out, Some("export".to_string()));
        for id in [2, 3, 3, 4] {
            let report = pipeline.process_frame(&source.observe(id, 2.0));
            recorder.add_frame(report, id as f64 / 30.0);
        }
        assert_eq!(recorder.len(), 4);

        let dir = recorder.export_csv().unwrap();
        let frames = fs::read_to_string(dir.join("tracking_data.csv")).unwrap();
        assert!(frames.starts_with("timestamp,frame_id,admission"));
        assert_eq!(frames.lines().count(), 5);
        assert!(frames.contains(",drop,"));

        let joints = fs::read_to_string(dir.join("joint_positions.csv")).unwrap();
        assert!(joints.contains("hand_right"));

        fs::remove_dir_all(&out).unwrap();
    }
}
