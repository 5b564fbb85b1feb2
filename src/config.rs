// src/config.rs
use crate::error::{RetargetError, RetargetResult};
use crate::skeleton::JointType;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Upper bound on K; buffers are allocated up front for every joint.
pub const MAX_WINDOW_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    WeightedAverage,
    DoubleExponential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationReference {
    Spine,
    HipCenter,
}

impl TranslationReference {
    pub fn joint(self) -> JointType {
        match self {
            TranslationReference::Spine => JointType::Spine,
            TranslationReference::HipCenter => JointType::HipCenter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleReference {
    WristElbow,
    Torso,
    SpineShoulder,
    HeadSpine,
}

impl ScaleReference {
    /// (first, second); the measured bone vector is first - second.
    pub fn joints(self) -> (JointType, JointType) {
        match self {
            ScaleReference::WristElbow => (JointType::HandRight, JointType::ElbowRight),
            ScaleReference::Torso => (JointType::Spine, JointType::HipCenter),
            ScaleReference::SpineShoulder => (JointType::Spine, JointType::ShoulderRight),
            ScaleReference::HeadSpine => (JointType::Head, JointType::Spine),
        }
    }
}

/// Depth translation and proximity scaling are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthMode {
    Translate,
    ScaleByProximity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Window size K; buffers hold K + 1 samples.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_filter")]
    pub filter: FilterKind,
    /// H, decay of older samples in the weighted average.
    #[serde(default = "default_smoothing_constant")]
    pub smoothing_constant: f32,
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    #[serde(default = "default_gamma")]
    pub gamma: f32,
    #[serde(default = "default_translation_enabled")]
    pub translation_enabled: bool,
    #[serde(default = "default_translation_reference")]
    pub translation_reference: TranslationReference,
    #[serde(default = "default_scale_reference")]
    pub scale_reference: ScaleReference,
    #[serde(default = "default_depth_mode")]
    pub depth_mode: DepthMode,
    #[serde(default = "default_translation_scale")]
    pub translation_scale: [f32; 3],
    #[serde(default = "default_head_emphasis")]
    pub head_emphasis: bool,
}

fn default_window_size() -> usize { 5 }
fn default_filter() -> FilterKind { FilterKind::WeightedAverage }
fn default_smoothing_constant() -> f32 { 0.1 }
fn default_alpha() -> f32 { 0.1 }
fn default_gamma() -> f32 { 0.1 }
fn default_translation_enabled() -> bool { true }
fn default_translation_reference() -> TranslationReference { TranslationReference::Spine }
fn default_scale_reference() -> ScaleReference { ScaleReference::SpineShoulder }
fn default_depth_mode() -> DepthMode { DepthMode::Translate }
fn default_translation_scale() -> [f32; 3] { [1.0, 1.0, 1.0] }
fn default_head_emphasis() -> bool { true }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            filter: default_filter(),
            smoothing_constant: default_smoothing_constant(),
            alpha: default_alpha(),
            gamma: default_gamma(),
            translation_enabled: default_translation_enabled(),
            translation_reference: default_translation_reference(),
            scale_reference: default_scale_reference(),
            depth_mode: default_depth_mode(),
            translation_scale: default_translation_scale(),
            head_emphasis: default_head_emphasis(),
        }
    }
}

impl PipelineConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> RetargetResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn translation_scale(&self) -> Vector3<f32> {
        Vector3::from(self.translation_scale)
    }

    pub fn validate(&self) -> RetargetResult<()> {
        if self.window_size > MAX_WINDOW_SIZE {
            return Err(RetargetError::InvalidConfig(format!(
                "window_size {} exceeds the maximum of {}",
                self.window_size, MAX_WINDOW_SIZE
            )));
        }
        match self.filter {
            FilterKind::DoubleExponential if self.window_size < 3 => {
                return Err(RetargetError::InvalidConfig(format!(
                    "window_size {} too small for double exponential smoothing (minimum 3)",
                    self.window_size
                )));
            }
            FilterKind::WeightedAverage if self.window_size < 1 => {
                return Err(RetargetError::InvalidConfig(
                    "window_size must be at least 1".to_string(),
                ));
            }
            FilterKind::WeightedAverage if self.window_size < 5 => {
                warn!(
                    window_size = self.window_size,
                    "weighted average works best with a window of 5 or more"
                );
            }
            _ => {}
        }

        if !self.smoothing_constant.is_finite() || self.smoothing_constant <= 0.0 {
            return Err(RetargetError::InvalidConfig(format!(
                "smoothing_constant must be positive, got {}",
                self.smoothing_constant
            )));
        }
        for (name, value) in [("alpha", self.alpha), ("gamma", self.gamma)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(RetargetError::InvalidConfig(format!(
                    "{} must lie in (0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.translation_scale.iter().any(|s| !s.is_finite()) {
            return Err(RetargetError::InvalidConfig(
                "translation_scale must be finite".to_string(),
            ));
        }
        Ok(())
    }
}
