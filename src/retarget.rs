// src/retarget.rs
use crate::error::{Anomaly, RetargetError, RetargetResult};
use crate::rig::RigHost;
use crate::skeleton::{Bone, JointMap, JointType};
use nalgebra::{UnitQuaternion, Vector3};
use tracing::debug;

/// Lateral boost applied to the neck direction when driving the head.
pub const HEAD_LATERAL_GAIN: f32 = 3.0;

const MIN_DIRECTION_NORM: f32 = 1e-6;

/// Rig reference captured once before the first frame. Bone directions are
/// kept in the space the bind positions were read in and keyed by child.
#[derive(Debug, Clone)]
pub struct BindPose {
    positions: JointMap<Vector3<f32>>,
    directions: JointMap<Vector3<f32>>,
}

impl BindPose {
    pub fn capture<H: RigHost + ?Sized>(host: &H) -> RetargetResult<Self> {
        let positions = JointMap::from_fn(|joint| host.world_position(joint));

        let mut directions = JointMap::from_fn(|_| Vector3::zeros());
        for bone in Bone::ALL {
            let direction = positions[bone.child()] - positions[bone.parent()];
            if direction.norm() <= MIN_DIRECTION_NORM {
                return Err(RetargetError::DegenerateBindPose {
                    parent: bone.parent(),
                    child: bone.child(),
                });
            }
            directions[bone.child()] = direction;
        }

        Ok(Self {
            positions,
            directions,
        })
    }

    /// Child minus parent position at bind time.
    pub fn direction(&self, bone: Bone) -> Vector3<f32> {
        self.directions[bone.child()]
    }

    pub fn distance(&self, a: JointType, b: JointType) -> f32 {
        (self.positions[a] - self.positions[b]).norm()
    }
}

/// Shortest-arc rotation taking `from` onto `to`; `None` when `to` has no
/// length or the two are opposite.
pub fn corrective_rotation(from: &Vector3<f32>, to: &Vector3<f32>) -> Option<UnitQuaternion<f32>> {
    if to.norm() <= MIN_DIRECTION_NORM || from.norm() <= MIN_DIRECTION_NORM {
        return None;
    }
    UnitQuaternion::rotation_between(from, to)
}

#[derive(Debug, Clone)]
pub struct Retargeter {
    bind: BindPose,
    head_emphasis: bool,
}

impl Retargeter {
    pub fn new(bind: BindPose, head_emphasis: bool) -> Self {
        Self {
            bind,
            head_emphasis,
        }
    }

    /// Bones whose tracked direction orients `joint`, with the lateral gain
    /// for each. Hands get none; the shoulder center gets three.
    pub fn driving_bones(&self, joint: JointType) -> Vec<(Bone, f32)> {
        if joint == JointType::Head {
            return if self.head_emphasis {
                vec![(Bone::NECK, HEAD_LATERAL_GAIN)]
            } else {
                Vec::new()
            };
        }
        joint.outgoing_bones().map(|bone| (bone, 1.0)).collect()
    }

    /// Applies every correction for `joint`. Returns how many bones were
    /// evaluated; degenerate ones count but leave the joint as it was.
    pub fn retarget_joint<H: RigHost + ?Sized>(
        &self,
        host: &mut H,
        joint: JointType,
        filtered: &JointMap<Option<Vector3<f32>>>,
        anomalies: &mut Vec<Anomaly>,
    ) -> usize {
        let mut applied = 0;
        for (bone, lateral_gain) in self.driving_bones(joint) {
            let (Some(parent), Some(child)) = (filtered[bone.parent()], filtered[bone.child()]) else {
                continue;
            };
            let mut target = child - parent;
            target.x *= lateral_gain;

            // tracking space -> rig world -> joint local
            let world = host.root_rotation() * target;
            let local = host.world_rotation(joint).inverse() * world;

            let rotation = match corrective_rotation(&self.bind.direction(bone), &local) {
                Some(rotation) => rotation,
                None => {
                    debug!(joint = joint.name(), ?bone, "Degenerate rotation, using identity");
                    anomalies.push(Anomaly::DegenerateRotation { joint, bone });
                    UnitQuaternion::identity()
                }
            };
            let current = host.local_rotation(joint);
            host.set_local_rotation(joint, current * rotation);
            applied += 1;
        }
        applied
    }
}
