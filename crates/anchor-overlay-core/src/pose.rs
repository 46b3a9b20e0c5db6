use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::MarkerObservation;

/// World-space pose of an overlay: position plus orientation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl Pose {
    pub fn new(position: Point3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Self { position, rotation }
    }

    pub fn identity() -> Self {
        Self::new(Point3::origin(), UnitQuaternion::identity())
    }
}

/// Pose of an overlay anchored to a marker observation.
///
/// The local offset is expressed in the marker's frame, so the world
/// position is `P + R * offset` and the orientation follows the marker.
pub fn anchored_pose(obs: &MarkerObservation, local_offset: Vector3<f32>) -> Pose {
    Pose {
        position: obs.position + obs.rotation * local_offset,
        rotation: obs.rotation,
    }
}

/// Rotation that points an overlay's +Z axis at the camera, +Y up.
///
/// Returns `None` when the geometry is degenerate (camera on top of the
/// anchor, or the view direction parallel to the up axis); callers fall
/// back to the marker rotation in that case.
pub fn billboard_rotation(
    anchor: Point3<f32>,
    camera: Point3<f32>,
) -> Option<UnitQuaternion<f32>> {
    let dir = camera - anchor;
    if dir.norm_squared() <= f32::EPSILON {
        return None;
    }
    let up = Vector3::y();
    if dir.normalize().cross(&up).norm_squared() <= f32::EPSILON {
        return None;
    }
    Some(UnitQuaternion::face_towards(&dir, &up))
}
