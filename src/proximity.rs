// src/proximity.rs
use crate::config::ScaleReference;
use crate::filter::weighted_average;
use crate::frame::TrackingFrame;
use crate::rig::RigHost;
use crate::window::{Purpose, WindowBank};
use nalgebra::{Vector2, Vector3};
use tracing::{debug, info};

/// Constant depth given to image-derived samples, and the neutral depth
/// offset.
pub const DEPTH_CONSTANT: f32 = 1.0;

/// Non-zero bone observations required before the baseline freezes.
pub const CALIBRATION_OBSERVATIONS: usize = 5;

/// Normalized image coordinate (origin top-left, y down) to an offset
/// centred on the image, y up.
pub fn image_offset(image: Vector2<f32>) -> Vector2<f32> {
    Vector2::new(image.x * 2.0 - 1.0, 1.0 - image.y * 2.0)
}

pub fn scale_sample(image: Vector2<f32>) -> Vector3<f32> {
    let offset = image_offset(image);
    Vector3::new(offset.x, offset.y, DEPTH_CONSTANT)
}

#[derive(Debug, Clone)]
pub struct ProximityEstimator {
    reference: ScaleReference,
    smoothing: f32,
    observations: usize,
    baseline: Option<Vector3<f32>>,
    current: Option<Vector3<f32>>,
}

impl ProximityEstimator {
    pub fn new(reference: ScaleReference, smoothing: f32) -> Self {
        Self {
            reference,
            smoothing,
            observations: 0,
            baseline: None,
            current: None,
        }
    }

    pub fn reference(&self) -> ScaleReference {
        self.reference
    }

    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn baseline(&self) -> Option<Vector3<f32>> {
        self.baseline
    }

    /// Re-reads the reference bone from the scale windows and returns the
    /// current coefficient.
    pub fn update(&mut self, windows: &WindowBank) -> f32 {
        let (first, second) = self.reference.joints();
        let smoothed = |joint| {
            let window = windows.window(joint, Purpose::Scale);
            if window.is_full() {
                weighted_average(window.samples(), self.smoothing)
            } else {
                None
            }
        };
        if let (Some(a), Some(b)) = (smoothed(first), smoothed(second)) {
            self.observe(a - b);
        }
        self.coefficient()
    }

    pub fn observe(&mut self, bone: Vector3<f32>) {
        if bone.norm() <= f32::EPSILON {
            return;
        }
        self.current = Some(bone);
        if self.baseline.is_some() {
            return;
        }
        self.observations += 1;
        if self.observations >= CALIBRATION_OBSERVATIONS {
            self.baseline = Some(bone);
            info!(
                reference = ?self.reference,
                length = bone.norm(),
                "Proximity baseline captured"
            );
        } else {
            debug!(observations = self.observations, "Proximity calibration pending");
        }
    }

    /// Current over baseline bone length; 1 until calibrated. Above 1 the
    /// subject came closer.
    pub fn coefficient(&self) -> f32 {
        match (self.baseline, self.current) {
            (Some(baseline), Some(current)) => current.norm() / baseline.norm(),
            _ => 1.0,
        }
    }

    /// Depth sample for translation: the neutral depth minus how far the
    /// subject has moved from the baseline camera distance.
    pub fn estimate_depth_offset(&self, baseline_distance: f32) -> f32 {
        let current_distance = baseline_distance / self.coefficient();
        DEPTH_CONSTANT - (current_distance - baseline_distance)
    }

    /// Ratio between the reference bone as it appears on the image surface
    /// and the same bone on the rig. `None` when either joint is untracked
    /// or the rig bone has no length.
    pub fn estimate_model_scale_ratio<H: RigHost + ?Sized>(
        &self,
        host: &H,
        frame: &TrackingFrame,
        rig_length: f32,
    ) -> Option<f32> {
        let (first, second) = self.reference.joints();
        let (a, b) = (frame.sample(first), frame.sample(second));
        if !a.is_tracked() || !b.is_tracked() || rig_length <= f32::EPSILON {
            return None;
        }
        let projected = host.project_image_point(a.image) - host.project_image_point(b.image);
        Some(projected.norm() / rig_length)
    }

    pub fn reset(&mut self) {
        self.observations = 0;
        self.baseline = None;
        self.current = None;
    }
}
