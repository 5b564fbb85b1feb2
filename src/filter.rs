// src/filter.rs
use crate::config::{FilterKind, PipelineConfig};
use crate::window::WindowBuffer;
use nalgebra::Vector3;

/// Jitter suppression over a joint's sliding window, chosen once from
/// configuration.
pub trait SignalFilter: Send {
    /// Smoothed value after the window's newest push, or `None` while the
    /// window cannot support an estimate yet.
    fn estimate(&mut self, window: &WindowBuffer) -> Option<Vector3<f32>>;
}

pub fn build_filter(config: &PipelineConfig) -> Box<dyn SignalFilter> {
    match config.filter {
        FilterKind::WeightedAverage => Box::new(WeightedAverage::new(config.smoothing_constant)),
        FilterKind::DoubleExponential => {
            Box::new(DoubleExponential::new(config.alpha, config.gamma))
        }
    }
}

/// Largest distance from the newest sample to any older one.
pub fn max_spread(samples: &[Vector3<f32>]) -> f32 {
    let Some(newest) = samples.last() else {
        return 0.0;
    };
    samples[..samples.len() - 1]
        .iter()
        .map(|older| (newest - older).norm())
        .fold(0.0, f32::max)
}

/// `Σ w_j·t[K-j] / Σ w_j` with `w_j = exp(-j·H·maxSpread)`, j counted back
/// from the newest sample.
pub fn weighted_average(samples: &[Vector3<f32>], smoothing: f32) -> Option<Vector3<f32>> {
    if samples.is_empty() {
        return None;
    }
    let spread = max_spread(samples);
    let mut sum = Vector3::zeros();
    let mut weight_sum = 0.0;
    for (j, sample) in samples.iter().rev().enumerate() {
        let weight = (-(j as f32) * smoothing * spread).exp();
        sum += sample * weight;
        weight_sum += weight;
    }
    Some(sum / weight_sum)
}

#[derive(Debug, Clone)]
pub struct WeightedAverage {
    smoothing: f32,
}

impl WeightedAverage {
    pub fn new(smoothing: f32) -> Self {
        Self { smoothing }
    }
}

impl SignalFilter for WeightedAverage {
    fn estimate(&mut self, window: &WindowBuffer) -> Option<Vector3<f32>> {
        if !window.is_full() {
            return None;
        }
        weighted_average(window.samples(), self.smoothing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesState {
    pub trend: Vector3<f32>,
    pub prev_smoothed: Vector3<f32>,
}

#[derive(Debug, Clone)]
pub struct DoubleExponential {
    alpha: f32,
    gamma: f32,
    state: Option<DesState>,
}

impl DoubleExponential {
    pub fn new(alpha: f32, gamma: f32) -> Self {
        Self {
            alpha,
            gamma,
            state: None,
        }
    }

    pub fn state(&self) -> Option<DesState> {
        self.state
    }

    /// Seed from the first two samples: level X0, trend X1 - X0.
    pub fn seed(&mut self, x0: Vector3<f32>, x1: Vector3<f32>) {
        self.state = Some(DesState {
            trend: x1 - x0,
            prev_smoothed: x0,
        });
    }

    /// One recursion step; `None` until seeded.
    pub fn step(&mut self, sample: Vector3<f32>) -> Option<Vector3<f32>> {
        let state = self.state.as_mut()?;
        let (alpha, gamma) = (self.alpha, self.gamma);

        let smoothed = sample * alpha + (state.prev_smoothed + state.trend) * (1.0 - alpha);
        state.trend = (smoothed - state.prev_smoothed) * gamma + state.trend * (1.0 - gamma);
        state.prev_smoothed = smoothed;
        Some(smoothed)
    }
}

impl SignalFilter for DoubleExponential {
    fn estimate(&mut self, window: &WindowBuffer) -> Option<Vector3<f32>> {
        let samples = window.samples();
        let n = samples.len();
        if self.state.is_none() {
            if n >= 2 {
                self.seed(samples[n - 2], samples[n - 1]);
            }
            return None;
        }
        self.step(samples[n - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn window_of(k: usize, samples: &[Vector3<f32>]) -> WindowBuffer {
        let mut window = WindowBuffer::new(k);
        for s in samples {
            window.push(*s);
        }
        window
    }

    #[test]
    fn test_constant_window_returns_constant() {
        let c = Vector3::new(0.3, -1.2, -2.0);
        for k in [1usize, 3, 5, 9] {
            for h in [0.01f32, 0.1, 5.0, 100.0] {
                let window = window_of(k, &vec![c; k + 1]);
                let out = WeightedAverage::new(h).estimate(&window).unwrap();
                assert_relative_eq!(out, c, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_weighted_average_favours_recent_samples() {
        let samples: Vec<Vector3<f32>> = (0..6).map(|i| Vector3::new(i as f32, 0.0, 0.0)).collect();
        let window = window_of(5, &samples);
        let out = WeightedAverage::new(0.5).estimate(&window).unwrap();
        // plain mean would be 2.5; recency weighting pulls toward 5
        assert!(out.x > 2.5 && out.x < 5.0);

        let sharper = WeightedAverage::new(5.0).estimate(&window).unwrap();
        assert!(sharper.x > out.x);
    }

    #[test]
    fn test_weighted_average_waits_for_full_window() {
        let window = window_of(5, &[Vector3::zeros(); 3]);
        assert!(WeightedAverage::new(0.1).estimate(&window).is_none());
    }

    #[test]
    fn test_max_spread_uses_newest_as_anchor() {
        let samples = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(3.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
        ];
        assert_relative_eq!(max_spread(&samples), 2.0);
    }

    #[test]
    fn test_double_exponential_closed_form() {
        let mut filter = DoubleExponential::new(0.5, 0.5);
        filter.seed(Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0));
        let smoothed = filter.step(Vector3::new(2.0, 0.0, 0.0)).unwrap();

        // smoothed = 0.5*2 + 0.5*(0 + 1) = 1.5
        // trend    = 0.5*(1.5 - 0) + 0.5*1 = 1.25
        assert_eq!(smoothed, Vector3::new(1.5, 0.0, 0.0));
        let state = filter.state().unwrap();
        assert_eq!(state.trend, Vector3::new(1.25, 0.0, 0.0));
        assert_eq!(state.prev_smoothed, Vector3::new(1.5, 0.0, 0.0));
    }

    #[test]
    fn test_double_exponential_through_window() {
        let mut window = WindowBuffer::new(3);
        let mut filter = DoubleExponential::new(0.5, 0.5);

        window.push(Vector3::zeros());
        assert!(filter.estimate(&window).is_none());
        window.push(Vector3::new(1.0, 0.0, 0.0));
        assert!(filter.estimate(&window).is_none());
        assert!(filter.state().is_some());

        window.push(Vector3::new(2.0, 0.0, 0.0));
        let out = filter.estimate(&window).unwrap();
        assert_eq!(out, Vector3::new(1.5, 0.0, 0.0));
    }

    #[test]
    fn test_double_exponential_tracks_ramp() {
        let mut filter = DoubleExponential::new(0.5, 0.5);
        filter.seed(Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0));
        let mut last = Vector3::zeros();
        for i in 2..40 {
            last = filter.step(Vector3::new(i as f32, 0.0, 0.0)).unwrap();
        }
        // a linear ramp is followed with vanishing lag
        assert_relative_eq!(last.x, 39.0, epsilon = 1e-3);
    }

    #[test]
    fn test_step_before_seed() {
        let mut filter = DoubleExponential::new(0.3, 0.3);
        assert!(filter.state().is_none());
        assert!(filter.step(Vector3::zeros()).is_none());
    }

    #[test]
    fn test_build_filter_matches_kind() {
        let config = PipelineConfig {
            filter: FilterKind::DoubleExponential,
            alpha: 0.5,
            gamma: 0.5,
            window_size: 3,
            ..Default::default()
        };
        let mut filter = build_filter(&config);
        let mut window = WindowBuffer::new(3);
        window.push(Vector3::zeros());
        window.push(Vector3::new(1.0, 0.0, 0.0));
        filter.estimate(&window);
        window.push(Vector3::new(2.0, 0.0, 0.0));
        // weighted average would still be filling; double exponential answers
        assert_eq!(filter.estimate(&window), Some(Vector3::new(1.5, 0.0, 0.0)));
    }
}
