// src/pipeline.rs
use crate::config::{DepthMode, PipelineConfig};
use crate::error::{Anomaly, CalibrationStage, RetargetResult};
use crate::filter::{build_filter, SignalFilter};
use crate::frame::{Admission, FrameReceiver, FrameSequencer, TrackingFrame};
use crate::proximity::{scale_sample, ProximityEstimator};
use crate::retarget::{BindPose, Retargeter};
use crate::rig::RigHost;
use crate::skeleton::{JointMap, JointType};
use crate::translation::RootTranslationEstimator;
use crate::window::{Purpose, WindowBank};
use nalgebra::Vector3;
use tracing::{debug, info, trace};

#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame_id: i64,
    pub admission: Admission,
    pub anomalies: Vec<Anomaly>,
    /// Stale for joints not tracked this frame.
    pub filtered: JointMap<Option<Vector3<f32>>>,
    pub scale_coefficient: f32,
    pub root_offset: Option<Vector3<f32>>,
    pub root_position: Vector3<f32>,
    pub uniform_scale: Option<f32>,
    pub rotated_joints: usize,
}

impl FrameReport {
    fn new(frame_id: i64, admission: Admission) -> Self {
        Self {
            frame_id,
            admission,
            anomalies: Vec::new(),
            filtered: JointMap::default(),
            scale_coefficient: 1.0,
            root_offset: None,
            root_position: Vector3::zeros(),
            uniform_scale: None,
            rotated_joints: 0,
        }
    }

    pub fn was_dropped(&self) -> bool {
        matches!(self.admission, Admission::Drop { .. })
    }
}

pub struct RetargetPipeline<H: RigHost> {
    config: PipelineConfig,
    host: H,
    sequencer: FrameSequencer,
    windows: WindowBank,
    filters: JointMap<Box<dyn SignalFilter>>,
    filtered: JointMap<Option<Vector3<f32>>>,
    proximity: ProximityEstimator,
    translation: RootTranslationEstimator,
    retargeter: Retargeter,
    rig_reference_length: f32,
}

impl<H: RigHost> RetargetPipeline<H> {
    pub fn new(config: PipelineConfig, host: H) -> RetargetResult<Self> {
        config.validate()?;
        let bind = BindPose::capture(&host)?;
        let (first, second) = config.scale_reference.joints();
        let rig_reference_length = bind.distance(first, second);

        info!(
            window_size = config.window_size,
            filter = ?config.filter,
            depth_mode = ?config.depth_mode,
            "Retarget pipeline ready"
        );

        Ok(Self {
            windows: WindowBank::new(config.window_size),
            filters: JointMap::from_fn(|_| build_filter(&config)),
            filtered: JointMap::default(),
            proximity: ProximityEstimator::new(config.scale_reference, config.smoothing_constant),
            translation: RootTranslationEstimator::new(&config),
            retargeter: Retargeter::new(bind, config.head_emphasis),
            sequencer: FrameSequencer::new(),
            rig_reference_length,
            config,
            host,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn proximity(&self) -> &ProximityEstimator {
        &self.proximity
    }

    pub fn translation(&self) -> &RootTranslationEstimator {
        &self.translation
    }

    pub fn last_processed(&self) -> i64 {
        self.sequencer.last_processed()
    }

    pub fn tick(&mut self, receiver: &mut FrameReceiver) -> Option<FrameReport> {
        let frame = receiver.latest()?;
        Some(self.process_frame(&frame))
    }

    pub fn process_frame(&mut self, frame: &TrackingFrame) -> FrameReport {
        let admission = self.sequencer.admit(frame.frame_id);
        let mut report = FrameReport::new(frame.frame_id, admission);

        match admission {
            Admission::Drop { last_processed } => {
                debug!(frame_id = frame.frame_id, last_processed, "Dropping out-of-order frame");
                report.anomalies.push(Anomaly::OutOfOrderFrame {
                    frame_id: frame.frame_id,
                    last_processed,
                });
                report.filtered = self.filtered.clone();
                report.root_position = self.host.translation_root_position();
                return report;
            }
            Admission::Reset => {
                info!("Tracking source reset, recalibrating");
                // baselines are captured from post-reset samples only
                self.windows.clear_purpose(Purpose::Scale);
                self.windows.clear_purpose(Purpose::Translation);
                self.proximity.reset();
                self.translation.reset();
            }
            Admission::Accept => {}
        }

        let ready = self.ingest(frame, &mut report.anomalies);

        report.scale_coefficient = self.proximity.update(&self.windows);
        if !self.proximity.is_calibrated() {
            report
                .anomalies
                .push(Anomaly::CalibrationPending(CalibrationStage::Proximity));
        }

        if self.config.translation_enabled {
            let sample = frame.sample(self.translation.reference());
            if sample.is_tracked() {
                report.root_offset = self.translation.update(
                    &mut self.host,
                    &mut self.windows,
                    sample,
                    &self.proximity,
                );
                if report.root_offset.is_none() {
                    report
                        .anomalies
                        .push(Anomaly::CalibrationPending(CalibrationStage::Translation));
                }
            }
        }

        for joint in JointType::ALL {
            if ready[joint] {
                let applied =
                    self.retargeter
                        .retarget_joint(&mut self.host, joint, &self.filtered, &mut report.anomalies);
                if applied > 0 {
                    report.rotated_joints += 1;
                }
            }
        }

        if self.config.depth_mode == DepthMode::ScaleByProximity && self.proximity.is_calibrated() {
            report.uniform_scale = self.proximity.estimate_model_scale_ratio(
                &self.host,
                frame,
                self.rig_reference_length,
            );
            if let Some(scale) = report.uniform_scale {
                self.host.set_uniform_scale(scale);
            }
        }

        report.filtered = self.filtered.clone();
        report.root_position = self.host.translation_root_position();
        trace!(
            frame_id = frame.frame_id,
            coefficient = report.scale_coefficient,
            rotated = report.rotated_joints,
            "Frame processed"
        );
        report
    }

    /// Pushes every tracked joint into its windows and refreshes its filtered
    /// position. Returns which joints have a full rotation window this frame.
    fn ingest(&mut self, frame: &TrackingFrame, anomalies: &mut Vec<Anomaly>) -> JointMap<bool> {
        let mut ready = JointMap::default();
        for joint in JointType::ALL {
            let sample = frame.sample(joint);
            if !sample.is_tracked() {
                self.host.set_joint_active(joint, false);
                anomalies.push(Anomaly::StaleData(joint));
                continue;
            }
            self.host.set_joint_active(joint, true);

            self.windows.push(joint, Purpose::Rotation, sample.position);
            let window = self.windows.window(joint, Purpose::Rotation);
            if let Some(position) = self.filters[joint].estimate(window) {
                self.filtered[joint] = Some(position);
            }
            ready[joint] = window.is_full() && self.filtered[joint].is_some();

            self.windows.push(joint, Purpose::Scale, scale_sample(sample.image));
        }
        ready
    }
}
