//! Per-tick marker delta batches and ingestion summaries.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use anchor_overlay_core::{MarkerId, MarkerObservation};

/// One marker with its current observation, as listed in a delta batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackedMarker {
    pub id: MarkerId,
    pub observation: MarkerObservation,
}

/// A tracking-subsystem update tick: markers that appeared, moved, or were
/// lost since the previous tick, in the subsystem's order.
///
/// `camera` is optional and only consulted for overlays in
/// [`OrientationMode::FaceCamera`](anchor_overlay_core::OrientationMode).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerDeltas {
    #[serde(default)]
    pub added: Vec<TrackedMarker>,
    #[serde(default)]
    pub updated: Vec<TrackedMarker>,
    #[serde(default)]
    pub removed: Vec<MarkerId>,
    #[serde(default)]
    pub camera: Option<Point3<f32>>,
}

impl MarkerDeltas {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    pub fn with_added(mut self, id: impl Into<MarkerId>, observation: MarkerObservation) -> Self {
        self.added.push(TrackedMarker {
            id: id.into(),
            observation,
        });
        self
    }

    pub fn with_updated(mut self, id: impl Into<MarkerId>, observation: MarkerObservation) -> Self {
        self.updated.push(TrackedMarker {
            id: id.into(),
            observation,
        });
        self
    }

    pub fn with_removed(mut self, id: impl Into<MarkerId>) -> Self {
        self.removed.push(id.into());
        self
    }

    pub fn with_camera(mut self, camera: Point3<f32>) -> Self {
        self.camera = Some(camera);
        self
    }
}

/// What one `on_markers_changed` call did, by category.
///
/// Lookup misses and policy rejections are not errors; they show up here
/// and on the log channel only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    /// Markers newly bound to an overlay instance.
    pub bound: usize,
    /// Pose/visibility refreshes of already-bound markers.
    pub updated: usize,
    /// Bindings released back to the pool.
    pub released: usize,
    /// Instances destroyed (non-pooled mode, or pool overflow).
    pub destroyed: usize,
    /// Added markers turned away by the concurrency cap.
    pub rejected: usize,
    /// Bindings evicted to make room under `BindingPolicy::EvictOldest`.
    pub evicted: usize,
    /// Deltas dropped by the marker filter.
    pub ignored: usize,
    /// Lookup misses: no selector at bind time, or no descriptor for it.
    pub misses: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_overlay_core::TrackingState;

    #[test]
    fn deltas_round_trip_through_json() {
        let deltas = MarkerDeltas::default()
            .with_added(
                "img1",
                MarkerObservation::at(Point3::origin(), TrackingState::Tracking),
            )
            .with_removed("img2")
            .with_camera(Point3::new(0.0, 1.0, 2.0));
        let json = serde_json::to_string(&deltas).unwrap();
        let back: MarkerDeltas = serde_json::from_str(&json).unwrap();
        assert_eq!(back, deltas);
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let deltas: MarkerDeltas = serde_json::from_str("{}").unwrap();
        assert!(deltas.is_empty());
        assert!(deltas.camera.is_none());
    }
}
