// src/error.rs
use crate::skeleton::{Bone, JointType};
use thiserror::Error;

/// Setup-time failures. Nothing in the per-frame path returns these.
#[derive(Error, Debug)]
pub enum RetargetError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Degenerate bind pose: bone {parent:?} -> {child:?} has zero length")]
    DegenerateBindPose { parent: JointType, child: JointType },

    #[error("Malformed frame record: {0}")]
    MalformedFrame(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type RetargetResult<T> = Result<T, RetargetError>;

/// Steady-state anomalies. Each one degrades to "no update this frame" for
/// the affected joint or axis and is reported, never raised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anomaly {
    StaleData(JointType),
    CalibrationPending(CalibrationStage),
    DegenerateRotation { joint: JointType, bone: Bone },
    OutOfOrderFrame { frame_id: i64, last_processed: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStage {
    Proximity,
    Translation,
}
