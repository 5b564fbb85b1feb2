// src/translation.rs
use crate::config::{DepthMode, PipelineConfig};
use crate::filter::weighted_average;
use crate::frame::TrackedJointSample;
use crate::proximity::{image_offset, ProximityEstimator, DEPTH_CONSTANT};
use crate::rig::RigHost;
use crate::skeleton::JointType;
use crate::window::{Purpose, WindowBank};
use nalgebra::Vector3;
use tracing::{info, trace};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranslationBaseline {
    pub tracked: Vector3<f32>,
    pub rig: Vector3<f32>,
    /// Camera to rig root distance along Z at calibration.
    pub camera_distance: f32,
}

/// Tracking coordinates are relative to the skeleton itself, so lateral
/// motion is read from the image. Y is left to the host.
#[derive(Debug, Clone)]
pub struct RootTranslationEstimator {
    reference: JointType,
    smoothing: f32,
    axis_scale: Vector3<f32>,
    depth_mode: DepthMode,
    baseline: Option<TranslationBaseline>,
}

impl RootTranslationEstimator {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            reference: config.translation_reference.joint(),
            smoothing: config.smoothing_constant,
            axis_scale: config.translation_scale(),
            depth_mode: config.depth_mode,
            baseline: None,
        }
    }

    pub fn reference(&self) -> JointType {
        self.reference
    }

    pub fn baseline(&self) -> Option<TranslationBaseline> {
        self.baseline
    }

    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_some()
    }

    /// Pushes the reference joint's sample, and once its window is full
    /// moves the rig root. Returns the applied offset
    /// `axis_scale ⊙ (smoothed − baseline)`, or `None` while the window fills.
    pub fn update<H: RigHost + ?Sized>(
        &mut self,
        host: &mut H,
        windows: &mut WindowBank,
        sample: &TrackedJointSample,
        proximity: &ProximityEstimator,
    ) -> Option<Vector3<f32>> {
        let camera_distance = match self.baseline {
            Some(baseline) => baseline.camera_distance,
            None => host.camera_depth() - host.translation_root_position().z,
        };
        let depth = match self.depth_mode {
            DepthMode::Translate => proximity.estimate_depth_offset(camera_distance),
            DepthMode::ScaleByProximity => DEPTH_CONSTANT,
        };
        let offset = image_offset(sample.image);
        windows.push(
            self.reference,
            Purpose::Translation,
            Vector3::new(offset.x, offset.y, depth),
        );

        let window = windows.window(self.reference, Purpose::Translation);
        if !window.is_full() {
            return None;
        }
        let smoothed = weighted_average(window.samples(), self.smoothing)?;

        let baseline = match self.baseline {
            Some(baseline) => baseline,
            None => {
                let baseline = TranslationBaseline {
                    tracked: smoothed,
                    rig: host.translation_root_position(),
                    camera_distance,
                };
                info!(
                    joint = self.reference.name(),
                    camera_distance,
                    "Translation baseline captured"
                );
                self.baseline = Some(baseline);
                baseline
            }
        };

        let delta = (smoothed - baseline.tracked).component_mul(&self.axis_scale);
        let mut position = host.translation_root_position();
        position.x = baseline.rig.x + delta.x;
        if self.depth_mode == DepthMode::Translate {
            position.z = baseline.rig.z + delta.z;
        }
        host.set_translation_root_position(position);
        trace!(?delta, ?position, "Root translated");
        Some(delta)
    }

    pub fn reset(&mut self) {
        self.baseline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScaleReference;
    use crate::rig::Rig;
    use approx::assert_relative_eq;
    use nalgebra::Vector2;

    fn at(u: f32, v: f32) -> TrackedJointSample {
        TrackedJointSample::tracked(Vector3::new(0.0, 0.0, 2.0), Vector2::new(u, v))
    }

    fn config(depth_mode: DepthMode) -> PipelineConfig {
        PipelineConfig {
            window_size: 1,
            translation_scale: [2.0, 1.0, 1.0],
            depth_mode,
            ..Default::default()
        }
    }

    #[test]
    fn test_zero_delta_on_calibration_frame() {
        let mut rig = Rig::humanoid();
        let mut bank = WindowBank::new(1);
        let proximity = ProximityEstimator::new(ScaleReference::Torso, 0.1);
        let mut estimator = RootTranslationEstimator::new(&config(DepthMode::Translate));

        assert!(estimator.update(&mut rig, &mut bank, &at(0.6, 0.5), &proximity).is_none());
        let delta = estimator.update(&mut rig, &mut bank, &at(0.6, 0.5), &proximity).unwrap();
        assert_relative_eq!(delta, Vector3::zeros());
        assert!(estimator.is_calibrated());
        assert_relative_eq!(rig.translation_root_position(), Vector3::new(0.0, 1.0, 0.0));
        // camera at z = 10, root at z = 0
        assert_relative_eq!(estimator.baseline().unwrap().camera_distance, 10.0);
    }

    #[test]
    fn test_delta_scaled_per_axis_and_y_untouched() {
        let mut rig = Rig::humanoid();
        let mut bank = WindowBank::new(1);
        let proximity = ProximityEstimator::new(ScaleReference::Torso, 0.1);
        let mut estimator = RootTranslationEstimator::new(&config(DepthMode::Translate));

        estimator.update(&mut rig, &mut bank, &at(0.5, 0.5), &proximity);
        estimator.update(&mut rig, &mut bank, &at(0.5, 0.5), &proximity);
        let baseline = estimator.baseline().unwrap().tracked;

        rig.set_translation_root_position(Vector3::new(0.0, 1.3, 0.0));
        let delta = estimator.update(&mut rig, &mut bank, &at(0.75, 0.1), &proximity).unwrap();

        let window = bank.window(JointType::Spine, Purpose::Translation);
        let smoothed = weighted_average(window.samples(), 0.1).unwrap();
        let expected = (smoothed - baseline).component_mul(&Vector3::new(2.0, 1.0, 1.0));
        assert_relative_eq!(delta, expected, epsilon = 1e-6);
        assert!(delta.x > 0.0);

        let root = rig.translation_root_position();
        assert_relative_eq!(root.x, expected.x, epsilon = 1e-6);
        assert_relative_eq!(root.y, 1.3);
        // proximity not calibrated: depth stays neutral
        assert_relative_eq!(root.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_depth_follows_proximity_in_translate_mode() {
        let mut rig = Rig::humanoid();
        let mut bank = WindowBank::new(1);
        let mut proximity = ProximityEstimator::new(ScaleReference::Torso, 0.1);
        let mut estimator = RootTranslationEstimator::new(&config(DepthMode::Translate));

        for _ in 0..5 {
            proximity.observe(Vector3::new(0.0, 0.4, 0.0));
        }
        estimator.update(&mut rig, &mut bank, &at(0.5, 0.5), &proximity);
        estimator.update(&mut rig, &mut bank, &at(0.5, 0.5), &proximity);

        // subject doubled in apparent size: 10 -> 5 from the camera, so the
        // depth sample jumps from 1 to 6
        proximity.observe(Vector3::new(0.0, 0.8, 0.0));
        estimator.update(&mut rig, &mut bank, &at(0.5, 0.5), &proximity);

        // window [1, 6]: spread 5, the older sample weighted exp(-0.5)
        let older = (-0.5f32).exp();
        let smoothed = (6.0 + older) / (1.0 + older);
        let root = rig.translation_root_position();
        assert_relative_eq!(root.z, smoothed - 1.0, epsilon = 1e-5);
        assert_relative_eq!(root.z, 3.112, epsilon = 1e-3);
    }

    #[test]
    fn test_scale_mode_never_writes_depth() {
        let mut rig = Rig::humanoid();
        rig.set_translation_root_position(Vector3::new(0.0, 1.0, -3.0));
        let mut bank = WindowBank::new(1);
        let mut proximity = ProximityEstimator::new(ScaleReference::Torso, 0.1);
        let mut estimator = RootTranslationEstimator::new(&config(DepthMode::ScaleByProximity));

        for _ in 0..5 {
            proximity.observe(Vector3::new(0.0, 0.4, 0.0));
        }
        for u in [0.5, 0.5, 0.9, 0.9] {
            estimator.update(&mut rig, &mut bank, &at(u, 0.5), &proximity);
            proximity.observe(Vector3::new(0.0, 0.8, 0.0));
        }
        let root = rig.translation_root_position();
        assert!(root.x > 0.0);
        assert_eq!(root.z, -3.0);
    }

    #[test]
    fn test_reset_recaptures_baseline() {
        let mut rig = Rig::humanoid();
        let mut bank = WindowBank::new(1);
        let proximity = ProximityEstimator::new(ScaleReference::Torso, 0.1);
        let mut estimator = RootTranslationEstimator::new(&config(DepthMode::Translate));

        estimator.update(&mut rig, &mut bank, &at(0.5, 0.5), &proximity);
        estimator.update(&mut rig, &mut bank, &at(0.5, 0.5), &proximity);
        estimator.reset();
        bank.clear_purpose(Purpose::Translation);
        assert!(!estimator.is_calibrated());

        assert!(estimator.update(&mut rig, &mut bank, &at(0.9, 0.5), &proximity).is_none());
        let delta = estimator.update(&mut rig, &mut bank, &at(0.9, 0.5), &proximity).unwrap();
        assert_relative_eq!(delta, Vector3::zeros());
        assert_relative_eq!(estimator.baseline().unwrap().tracked.x, 0.8, epsilon = 1e-6);
    }
}
