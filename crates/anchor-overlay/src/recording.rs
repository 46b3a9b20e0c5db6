//! In-memory scene backend that records every mutation.
//!
//! Used by the test suites and the replay tool; it stands in for a real
//! scene graph and keeps the final state of every instance inspectable.

use std::collections::BTreeMap;

use nalgebra::{Point3, UnitQuaternion};
use serde::{Deserialize, Serialize};

use crate::scene::SceneBackend;

/// Opaque handle issued by [`RecordingScene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OverlayHandle(pub u32);

/// Last known state of one live instance.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OverlayRecord {
    pub handle: OverlayHandle,
    pub template: String,
    pub position: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub visible: bool,
}

/// Scene backend that only keeps books.
#[derive(Debug, Default)]
pub struct RecordingScene {
    next: u32,
    live: BTreeMap<OverlayHandle, OverlayRecord>,
    destroyed: usize,
    transform_writes: usize,
    visibility_writes: usize,
}

impl RecordingScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, handle: &OverlayHandle) -> Option<&OverlayRecord> {
        self.live.get(handle)
    }

    /// Live instances in creation order.
    pub fn live(&self) -> impl Iterator<Item = &OverlayRecord> {
        self.live.values()
    }

    pub fn visible(&self) -> impl Iterator<Item = &OverlayRecord> {
        self.live.values().filter(|r| r.visible)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn visible_count(&self) -> usize {
        self.visible().count()
    }

    pub fn destroyed_count(&self) -> usize {
        self.destroyed
    }

    pub fn transform_writes(&self) -> usize {
        self.transform_writes
    }

    pub fn visibility_writes(&self) -> usize {
        self.visibility_writes
    }
}

impl SceneBackend for RecordingScene {
    type Handle = OverlayHandle;

    fn instantiate(&mut self, template: &str) -> OverlayHandle {
        let handle = OverlayHandle(self.next);
        self.next += 1;
        self.live.insert(
            handle,
            OverlayRecord {
                handle,
                template: template.to_owned(),
                position: Point3::origin(),
                rotation: UnitQuaternion::identity(),
                visible: true,
            },
        );
        handle
    }

    fn set_transform(
        &mut self,
        handle: &OverlayHandle,
        position: Point3<f32>,
        rotation: UnitQuaternion<f32>,
    ) {
        self.transform_writes += 1;
        if let Some(record) = self.live.get_mut(handle) {
            record.position = position;
            record.rotation = rotation;
        }
    }

    fn set_visible(&mut self, handle: &OverlayHandle, visible: bool) {
        self.visibility_writes += 1;
        if let Some(record) = self.live.get_mut(handle) {
            record.visible = visible;
        }
    }

    fn destroy(&mut self, handle: OverlayHandle) {
        if self.live.remove(&handle).is_some() {
            self.destroyed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique_and_records_track_mutations() {
        let mut scene = RecordingScene::new();
        let a = scene.instantiate("chord_c");
        let b = scene.instantiate("chord_g");
        assert_ne!(a, b);
        assert_eq!(scene.live_count(), 2);

        scene.set_visible(&a, false);
        scene.set_transform(&b, Point3::new(1.0, 0.0, 0.0), UnitQuaternion::identity());

        assert_eq!(scene.visible_count(), 1);
        assert_eq!(scene.record(&b).unwrap().position, Point3::new(1.0, 0.0, 0.0));

        scene.destroy(a);
        assert_eq!(scene.live_count(), 1);
        assert_eq!(scene.destroyed_count(), 1);
    }
}
