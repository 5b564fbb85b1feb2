// src/window.rs
use crate::skeleton::{JointMap, JointType};
use nalgebra::Vector3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    Rotation,
    Scale,
    Translation,
}

impl Purpose {
    fn slot(self) -> usize {
        match self {
            Purpose::Rotation => 0,
            Purpose::Scale => 1,
            Purpose::Translation => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    Filling(usize),
    Full,
}

/// K + 1 ordered samples. Fills slot by slot, then slides: each push once
/// full drops the oldest sample and stores the new one in slot K.
#[derive(Debug, Clone)]
pub struct WindowBuffer {
    slots: Vec<Vector3<f32>>,
    filled: usize,
}

impl WindowBuffer {
    pub fn new(window_size: usize) -> Self {
        Self {
            slots: vec![Vector3::zeros(); window_size + 1],
            filled: 0,
        }
    }

    pub fn window_size(&self) -> usize {
        self.slots.len() - 1
    }

    pub fn push(&mut self, sample: Vector3<f32>) -> BufferState {
        let k = self.window_size();
        if self.filled < k {
            let index = self.filled;
            self.slots[index] = sample;
            self.filled += 1;
            return BufferState::Filling(index);
        }

        if self.filled > k {
            // steady state: O(K) shift, fine for small K at frame rate
            self.slots.copy_within(1.., 0);
        }
        self.slots[k] = sample;
        self.filled = k + 1;
        BufferState::Full
    }

    pub fn is_full(&self) -> bool {
        self.filled == self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn samples(&self) -> &[Vector3<f32>] {
        &self.slots[..self.filled]
    }

    pub fn newest(&self) -> Option<Vector3<f32>> {
        self.samples().last().copied()
    }

    pub fn clear(&mut self) {
        self.filled = 0;
    }
}

#[derive(Debug, Clone)]
pub struct WindowBank {
    windows: JointMap<[WindowBuffer; 3]>,
}

impl WindowBank {
    pub fn new(window_size: usize) -> Self {
        Self {
            windows: JointMap::from_fn(|_| {
                std::array::from_fn(|_| WindowBuffer::new(window_size))
            }),
        }
    }

    pub fn push(&mut self, joint: JointType, purpose: Purpose, sample: Vector3<f32>) -> BufferState {
        self.windows[joint][purpose.slot()].push(sample)
    }

    pub fn window(&self, joint: JointType, purpose: Purpose) -> &WindowBuffer {
        &self.windows[joint][purpose.slot()]
    }

    pub fn is_full(&self, joint: JointType, purpose: Purpose) -> bool {
        self.window(joint, purpose).is_full()
    }

    pub fn clear_purpose(&mut self, purpose: Purpose) {
        for (_, windows) in self.windows.iter_mut() {
            windows[purpose.slot()].clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32) -> Vector3<f32> {
        Vector3::new(x, 0.0, 0.0)
    }

    #[test]
    fn test_fill_lifecycle() {
        let mut window = WindowBuffer::new(3);
        assert!(window.is_empty());
        assert_eq!(window.push(v(0.0)), BufferState::Filling(0));
        assert_eq!(window.push(v(1.0)), BufferState::Filling(1));
        assert_eq!(window.push(v(2.0)), BufferState::Filling(2));
        assert!(!window.is_full());
        assert_eq!(window.push(v(3.0)), BufferState::Full);
        assert!(window.is_full());
        assert_eq!(window.len(), 4);
    }

    #[test]
    fn test_shift_keeps_last_k_plus_one_in_order() {
        let k = 4;
        let mut window = WindowBuffer::new(k);
        for i in 0..=k {
            window.push(v(i as f32));
        }
        assert!(window.is_full());

        for n in (k + 1)..(k + 25) {
            assert_eq!(window.push(v(n as f32)), BufferState::Full);
            let expected: Vec<Vector3<f32>> = ((n - k)..=n).map(|i| v(i as f32)).collect();
            assert_eq!(window.samples(), expected.as_slice());
        }
    }

    #[test]
    fn test_newest_is_last_pushed() {
        let mut window = WindowBuffer::new(2);
        assert!(window.newest().is_none());
        window.push(v(5.0));
        window.push(v(6.0));
        window.push(v(7.0));
        window.push(v(8.0));
        assert_eq!(window.newest(), Some(v(8.0)));
        assert_eq!(window.samples()[0], v(6.0));
    }

    #[test]
    fn test_bank_purposes_independent() {
        let mut bank = WindowBank::new(1);
        bank.push(JointType::Spine, Purpose::Rotation, v(1.0));
        bank.push(JointType::Spine, Purpose::Rotation, v(2.0));
        assert!(bank.is_full(JointType::Spine, Purpose::Rotation));
        assert!(!bank.is_full(JointType::Spine, Purpose::Translation));
        assert!(bank.window(JointType::Head, Purpose::Rotation).is_empty());
    }

    #[test]
    fn test_clear_purpose_refills_from_scratch() {
        let mut bank = WindowBank::new(1);
        for joint in [JointType::Spine, JointType::Head] {
            for purpose in [Purpose::Rotation, Purpose::Translation] {
                bank.push(joint, purpose, v(1.0));
                bank.push(joint, purpose, v(2.0));
            }
        }
        bank.clear_purpose(Purpose::Translation);

        assert!(bank.window(JointType::Spine, Purpose::Translation).is_empty());
        assert!(bank.window(JointType::Head, Purpose::Translation).is_empty());
        assert!(bank.is_full(JointType::Spine, Purpose::Rotation));

        assert_eq!(bank.push(JointType::Spine, Purpose::Translation, v(7.0)), BufferState::Filling(0));
        assert_eq!(bank.push(JointType::Spine, Purpose::Translation, v(8.0)), BufferState::Full);
        assert_eq!(bank.window(JointType::Spine, Purpose::Translation).samples(), &[v(7.0), v(8.0)]);
    }
}
