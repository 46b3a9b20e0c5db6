//! Scene-graph collaborator boundary.

use nalgebra::{Point3, UnitQuaternion};

/// Minimal contract the synchronizer needs from a scene graph.
///
/// Handles are opaque backend-owned values. The synchronizer owns every
/// handle it is given until it calls [`SceneBackend::destroy`] on it; the
/// backend must not recycle a handle before then.
pub trait SceneBackend {
    type Handle: Clone + PartialEq + std::fmt::Debug;

    /// Create a renderable from a template name. The new instance's
    /// transform and visibility are unspecified until the first
    /// `set_transform` / `set_visible` calls.
    fn instantiate(&mut self, template: &str) -> Self::Handle;

    fn set_transform(
        &mut self,
        handle: &Self::Handle,
        position: Point3<f32>,
        rotation: UnitQuaternion<f32>,
    );

    fn set_visible(&mut self, handle: &Self::Handle, visible: bool);

    /// Release the renderable for good. The handle must not be used again.
    fn destroy(&mut self, handle: Self::Handle);
}
