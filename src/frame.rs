// src/frame.rs
use crate::error::{RetargetError, RetargetResult};
use crate::skeleton::{JointMap, JointType};
use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;

/// Frame id the tracking source emits after a reset or resume.
pub const RESET_FRAME_ID: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    Tracked,
    #[default]
    NotTracked,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedJointSample {
    pub position: Vector3<f32>,
    /// Normalized image coordinate, (0,0) top-left to (1,1) bottom-right.
    pub image: Vector2<f32>,
    pub state: TrackingState,
}

impl TrackedJointSample {
    pub fn tracked(position: Vector3<f32>, image: Vector2<f32>) -> Self {
        Self {
            position: Vector3::new(position.x, position.y, -position.z.abs()),
            image,
            state: TrackingState::Tracked,
        }
    }

    pub fn is_tracked(&self) -> bool {
        self.state == TrackingState::Tracked
    }
}

impl Default for TrackedJointSample {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            image: Vector2::zeros(),
            state: TrackingState::NotTracked,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackingFrame {
    pub frame_id: i64,
    pub joints: JointMap<TrackedJointSample>,
}

impl TrackingFrame {
    pub fn new(frame_id: i64) -> Self {
        Self {
            frame_id,
            joints: JointMap::default(),
        }
    }

    pub fn with_joint(mut self, joint: JointType, sample: TrackedJointSample) -> Self {
        self.joints[joint] = sample;
        self
    }

    pub fn sample(&self, joint: JointType) -> &TrackedJointSample {
        &self.joints[joint]
    }

    pub fn tracked_count(&self) -> usize {
        self.joints.values().filter(|s| s.is_tracked()).count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    pub frame_id: i64,
    #[serde(default)]
    pub joints: BTreeMap<JointType, JointRecord>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JointRecord {
    pub position: [f32; 3],
    pub image: [f32; 2],
    #[serde(default)]
    pub state: TrackingState,
}

impl TryFrom<FrameRecord> for TrackingFrame {
    type Error = RetargetError;

    fn try_from(record: FrameRecord) -> RetargetResult<Self> {
        let mut frame = TrackingFrame::new(record.frame_id);
        for (joint, joint_record) in record.joints {
            let finite = joint_record.position.iter().all(|v| v.is_finite())
                && joint_record.image.iter().all(|v| v.is_finite());
            if !finite {
                return Err(RetargetError::MalformedFrame(format!(
                    "frame {}: non-finite values for {}",
                    record.frame_id,
                    joint.name()
                )));
            }
            let sample = TrackedJointSample::tracked(
                Vector3::from(joint_record.position),
                Vector2::from(joint_record.image),
            );
            frame.joints[joint] = TrackedJointSample {
                state: joint_record.state,
                ..sample
            };
        }
        Ok(frame)
    }
}

impl From<&TrackingFrame> for FrameRecord {
    fn from(frame: &TrackingFrame) -> Self {
        let joints = frame
            .joints
            .iter()
            .map(|(joint, sample)| {
                (
                    joint,
                    JointRecord {
                        position: sample.position.into(),
                        image: sample.image.into(),
                        state: sample.state,
                    },
                )
            })
            .collect();
        FrameRecord {
            frame_id: frame.frame_id,
            joints,
        }
    }
}

/// Producer half. Only the newest frame matters, so the slot is a `watch`
/// channel rather than a queue.
pub struct FrameIngestor {
    tx: watch::Sender<Option<Arc<TrackingFrame>>>,
}

pub struct FrameReceiver {
    rx: watch::Receiver<Option<Arc<TrackingFrame>>>,
    last_seen: Option<Arc<TrackingFrame>>,
}

pub fn frame_channel() -> (FrameIngestor, FrameReceiver) {
    let (tx, rx) = watch::channel(None);
    (
        FrameIngestor { tx },
        FrameReceiver {
            rx,
            last_seen: None,
        },
    )
}

impl FrameIngestor {
    /// Overwrites whatever frame is waiting; never blocks on the tick.
    pub fn publish(&self, frame: TrackingFrame) {
        self.tx.send_replace(Some(Arc::new(frame)));
    }
}

impl FrameReceiver {
    pub fn latest(&mut self) -> Option<Arc<TrackingFrame>> {
        let current = self.rx.borrow_and_update().clone()?;
        if let Some(seen) = &self.last_seen {
            if Arc::ptr_eq(seen, &current) {
                return None;
            }
        }
        self.last_seen = Some(Arc::clone(&current));
        Some(current)
    }

    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    pub fn producer_closed(&self) -> bool {
        self.rx.has_changed().is_err()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accept,
    Reset,
    Drop { last_processed: i64 },
}

#[derive(Debug, Clone)]
pub struct FrameSequencer {
    last_processed: i64,
}

impl Default for FrameSequencer {
    fn default() -> Self {
        Self { last_processed: -1 }
    }
}

impl FrameSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&mut self, frame_id: i64) -> Admission {
        if frame_id == RESET_FRAME_ID {
            self.last_processed = frame_id;
            return Admission::Reset;
        }
        if frame_id <= self.last_processed {
            return Admission::Drop {
                last_processed: self.last_processed,
            };
        }
        self.last_processed = frame_id;
        Admission::Accept
    }

    pub fn last_processed(&self) -> i64 {
        self.last_processed
    }
}
