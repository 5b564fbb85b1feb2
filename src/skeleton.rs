// src/skeleton.rs
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

pub const JOINT_COUNT: usize = 10;
pub const BONE_COUNT: usize = 9;

/// Declared in hierarchy order: every parent precedes its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointType {
    HipCenter,
    Spine,
    ShoulderCenter,
    Head,
    ShoulderLeft,
    ElbowLeft,
    HandLeft,
    ShoulderRight,
    ElbowRight,
    HandRight,
}

impl JointType {
    pub const ALL: [JointType; JOINT_COUNT] = [
        JointType::HipCenter,
        JointType::Spine,
        JointType::ShoulderCenter,
        JointType::Head,
        JointType::ShoulderLeft,
        JointType::ElbowLeft,
        JointType::HandLeft,
        JointType::ShoulderRight,
        JointType::ElbowRight,
        JointType::HandRight,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn parent(self) -> Option<JointType> {
        use JointType::*;
        match self {
            HipCenter => None,
            Spine => Some(HipCenter),
            ShoulderCenter => Some(Spine),
            Head | ShoulderLeft | ShoulderRight => Some(ShoulderCenter),
            ElbowLeft => Some(ShoulderLeft),
            HandLeft => Some(ElbowLeft),
            ElbowRight => Some(ShoulderRight),
            HandRight => Some(ElbowRight),
        }
    }

    pub fn outgoing_bones(self) -> impl Iterator<Item = Bone> {
        Bone::ALL.into_iter().filter(move |bone| bone.parent == self)
    }

    /// Leaves have nothing to orient toward.
    pub fn is_leaf(self) -> bool {
        self.outgoing_bones().next().is_none()
    }

    pub fn name(self) -> &'static str {
        use JointType::*;
        match self {
            HipCenter => "hip_center",
            Spine => "spine",
            ShoulderCenter => "shoulder_center",
            Head => "head",
            ShoulderLeft => "shoulder_left",
            ElbowLeft => "elbow_left",
            HandLeft => "hand_left",
            ShoulderRight => "shoulder_right",
            ElbowRight => "elbow_right",
            HandRight => "hand_right",
        }
    }
}

/// Directed segment from `parent` to `child`. Only the bones in `Bone::ALL`
/// exist; each is identified by its child joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bone {
    parent: JointType,
    child: JointType,
}

impl Bone {
    const fn new(parent: JointType, child: JointType) -> Self {
        Self { parent, child }
    }

    /// Ordered so a bone's parent joint is evaluated before any bone hanging
    /// below it.
    pub const ALL: [Bone; BONE_COUNT] = [
        Bone::new(JointType::HipCenter, JointType::Spine),
        Bone::new(JointType::Spine, JointType::ShoulderCenter),
        Bone::new(JointType::ShoulderCenter, JointType::ShoulderLeft),
        Bone::new(JointType::ShoulderCenter, JointType::ShoulderRight),
        Bone::new(JointType::ShoulderCenter, JointType::Head),
        Bone::new(JointType::ShoulderLeft, JointType::ElbowLeft),
        Bone::new(JointType::ShoulderRight, JointType::ElbowRight),
        Bone::new(JointType::ElbowLeft, JointType::HandLeft),
        Bone::new(JointType::ElbowRight, JointType::HandRight),
    ];

    // the head re-uses it, the tracked skeleton has nothing above the head
    pub const NECK: Bone = Bone::new(JointType::ShoulderCenter, JointType::Head);

    pub fn ending_at(child: JointType) -> Option<Bone> {
        child.parent().map(|parent| Bone::new(parent, child))
    }

    pub fn parent(self) -> JointType {
        self.parent
    }

    pub fn child(self) -> JointType {
        self.child
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JointMap<T>([T; JOINT_COUNT]);

impl<T> JointMap<T> {
    pub fn from_fn(mut f: impl FnMut(JointType) -> T) -> Self {
        Self(std::array::from_fn(|i| f(JointType::ALL[i])))
    }

    pub fn iter(&self) -> impl Iterator<Item = (JointType, &T)> {
        JointType::ALL.into_iter().zip(self.0.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (JointType, &mut T)> {
        JointType::ALL.into_iter().zip(self.0.iter_mut())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T: Default> Default for JointMap<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<JointType> for JointMap<T> {
    type Output = T;

    fn index(&self, joint: JointType) -> &T {
        &self.0[joint.index()]
    }
}

impl<T> IndexMut<JointType> for JointMap<T> {
    fn index_mut(&mut self, joint: JointType) -> &mut T {
        &mut self.0[joint.index()]
    }
}
