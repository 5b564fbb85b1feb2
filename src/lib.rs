// src/lib.rs
pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod frame;
pub mod pipeline;
pub mod proximity;
pub mod retarget;
pub mod rig;
pub mod skeleton;
pub mod translation;
pub mod window;

pub use config::{DepthMode, FilterKind, PipelineConfig, ScaleReference, TranslationReference};
pub use data::SessionRecorder;
pub use error::{Anomaly, CalibrationStage, RetargetError, RetargetResult};
pub use frame::{
    frame_channel, Admission, FrameIngestor, FrameReceiver, FrameRecord, TrackedJointSample,
    TrackingFrame, TrackingState, RESET_FRAME_ID,
};
pub use pipeline::{FrameReport, RetargetPipeline};
pub use rig::{Rig, RigHost};
pub use skeleton::{Bone, JointMap, JointType};
