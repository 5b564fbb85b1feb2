// src/rig.rs
use crate::frame::{TrackedJointSample, TrackingFrame};
use crate::skeleton::{JointMap, JointType};
use nalgebra::{UnitQuaternion, Vector2, Vector3};

/// Outbound side of the pipeline: the articulated rig being driven.
pub trait RigHost {
    fn local_rotation(&self, joint: JointType) -> UnitQuaternion<f32>;
    fn set_local_rotation(&mut self, joint: JointType, rotation: UnitQuaternion<f32>);
    fn world_rotation(&self, joint: JointType) -> UnitQuaternion<f32>;
    fn world_position(&self, joint: JointType) -> Vector3<f32>;

    /// Orientation of the object carrying the rig; tracking-space directions
    /// are taken into world space through it.
    fn root_rotation(&self) -> UnitQuaternion<f32>;

    fn translation_root_position(&self) -> Vector3<f32>;
    fn set_translation_root_position(&mut self, position: Vector3<f32>);

    fn set_uniform_scale(&mut self, scale: f32);
    fn set_joint_active(&mut self, joint: JointType, active: bool);

    fn camera_depth(&self) -> f32;

    /// Normalized image coordinate to a world point on the reference surface
    /// the camera image is shown on.
    fn project_image_point(&self, image: Vector2<f32>) -> Vector3<f32>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ImagePlane {
    top_left: Vector2<f32>,
    size: Vector2<f32>,
    depth: f32,
}

impl Default for ImagePlane {
    fn default() -> Self {
        Self {
            top_left: Vector2::new(-2.0, 3.0),
            size: Vector2::new(4.0, 3.0),
            depth: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct RigJoint {
    // parent frame, unscaled
    offset: Vector3<f32>,
    local_rotation: UnitQuaternion<f32>,
    active: bool,
}

#[derive(Debug, Clone)]
pub struct Rig {
    joints: JointMap<RigJoint>,
    root_position: Vector3<f32>,
    root_rotation: UnitQuaternion<f32>,
    scale: f32,
    camera_depth: f32,
    image_plane: ImagePlane,
}

impl Rig {
    // the hip offset is ignored
    pub fn new(offsets: JointMap<Vector3<f32>>, root_position: Vector3<f32>) -> Self {
        Self {
            joints: JointMap::from_fn(|joint| RigJoint {
                offset: offsets[joint],
                local_rotation: UnitQuaternion::identity(),
                active: true,
            }),
            root_position,
            root_rotation: UnitQuaternion::identity(),
            scale: 1.0,
            camera_depth: 10.0,
            image_plane: ImagePlane::default(),
        }
    }

    /// Upright humanoid in T-pose, left side toward -X, facing the camera.
    pub fn humanoid() -> Self {
        use JointType::*;
        let offsets = JointMap::from_fn(|joint| match joint {
            HipCenter => Vector3::zeros(),
            Spine => Vector3::new(0.0, 0.2, 0.0),
            ShoulderCenter => Vector3::new(0.0, 0.3, 0.0),
            Head => Vector3::new(0.0, 0.25, 0.0),
            ShoulderLeft => Vector3::new(-0.18, 0.0, 0.0),
            ElbowLeft => Vector3::new(-0.28, 0.0, 0.0),
            HandLeft => Vector3::new(-0.25, 0.0, 0.0),
            ShoulderRight => Vector3::new(0.18, 0.0, 0.0),
            ElbowRight => Vector3::new(0.28, 0.0, 0.0),
            HandRight => Vector3::new(0.25, 0.0, 0.0),
        });
        Self::new(offsets, Vector3::new(0.0, 1.0, 0.0))
    }

    pub fn with_root_rotation(mut self, rotation: UnitQuaternion<f32>) -> Self {
        self.root_rotation = rotation;
        self
    }

    pub fn uniform_scale(&self) -> f32 {
        self.scale
    }

    pub fn is_joint_active(&self, joint: JointType) -> bool {
        self.joints[joint].active
    }

    /// What a tracking source standing at `distance` in front of the rig
    /// would report for its current pose.
    pub fn observe(&self, frame_id: i64, distance: f32) -> TrackingFrame {
        let plane = &self.image_plane;
        let mut frame = TrackingFrame::new(frame_id);
        for joint in JointType::ALL {
            let world = self.world_position(joint);
            let image = Vector2::new(
                (world.x - plane.top_left.x) / plane.size.x,
                (plane.top_left.y - world.y) / plane.size.y,
            );
            let position = Vector3::new(world.x, world.y, world.z - distance);
            frame.joints[joint] = TrackedJointSample::tracked(position, image);
        }
        frame
    }

    fn world_transform(&self, joint: JointType) -> (Vector3<f32>, UnitQuaternion<f32>) {
        match joint.parent() {
            None => (
                self.root_position,
                self.root_rotation * self.joints[joint].local_rotation,
            ),
            Some(parent) => {
                let (parent_position, parent_rotation) = self.world_transform(parent);
                let node = &self.joints[joint];
                (
                    parent_position + parent_rotation * (node.offset * self.scale),
                    parent_rotation * node.local_rotation,
                )
            }
        }
    }
}

impl RigHost for Rig {
    fn local_rotation(&self, joint: JointType) -> UnitQuaternion<f32> {
        self.joints[joint].local_rotation
    }

    fn set_local_rotation(&mut self, joint: JointType, rotation: UnitQuaternion<f32>) {
        self.joints[joint].local_rotation = rotation;
    }

    fn world_rotation(&self, joint: JointType) -> UnitQuaternion<f32> {
        self.world_transform(joint).1
    }

    fn world_position(&self, joint: JointType) -> Vector3<f32> {
        self.world_transform(joint).0
    }

    fn root_rotation(&self) -> UnitQuaternion<f32> {
        self.root_rotation
    }

    fn translation_root_position(&self) -> Vector3<f32> {
        self.root_position
    }

    fn set_translation_root_position(&mut self, position: Vector3<f32>) {
        self.root_position = position;
    }

    fn set_uniform_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    fn set_joint_active(&mut self, joint: JointType, active: bool) {
        self.joints[joint].active = active;
    }

    fn camera_depth(&self) -> f32 {
        self.camera_depth
    }

    fn project_image_point(&self, image: Vector2<f32>) -> Vector3<f32> {
        let plane = &self.image_plane;
        Vector3::new(
            plane.top_left.x + image.x * plane.size.x,
            plane.top_left.y - image.y * plane.size.y,
            plane.depth,
        )
    }
}
