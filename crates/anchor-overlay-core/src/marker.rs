use std::fmt;

use nalgebra::{Point3, UnitQuaternion};
use serde::{Deserialize, Serialize};

/// Stable name of a recognizable reference-image pattern.
///
/// Identities are opaque: the tracking subsystem guarantees the same
/// physical marker always reports the same name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(pub String);

impl MarkerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MarkerId {
    fn from(name: &str) -> Self {
        MarkerId(name.to_owned())
    }
}

impl From<String> for MarkerId {
    fn from(name: String) -> Self {
        MarkerId(name)
    }
}

/// Tracking quality reported with each observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    /// Marker is currently recognized and its pose is live.
    Tracking,
    /// Pose is extrapolated from recent frames; the marker itself is not seen.
    Limited,
    /// Marker is known but has no usable pose this frame.
    #[default]
    NotTracking,
}

impl TrackingState {
    /// Ranking used when several markers are held at once: the best state
    /// wins when summarizing a whole tick.
    pub(crate) fn rank(self) -> u8 {
        match self {
            TrackingState::Tracking => 2,
            TrackingState::Limited => 1,
            TrackingState::NotTracking => 0,
        }
    }

    /// Pick the better of two states (`Tracking` > `Limited` > `NotTracking`).
    pub fn better(self, other: TrackingState) -> TrackingState {
        if self.rank() >= other.rank() {
            self
        } else {
            other
        }
    }
}

/// One tracking sample for a marker, as delivered by the external subsystem.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerObservation {
    pub position: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub state: TrackingState,
}

impl MarkerObservation {
    pub fn new(
        position: Point3<f32>,
        rotation: UnitQuaternion<f32>,
        state: TrackingState,
    ) -> Self {
        Self {
            position,
            rotation,
            state,
        }
    }

    /// Observation at a position with identity rotation.
    pub fn at(position: Point3<f32>, state: TrackingState) -> Self {
        Self::new(position, UnitQuaternion::identity(), state)
    }

    pub fn is_tracking(&self) -> bool {
        self.state == TrackingState::Tracking
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn better_prefers_live_tracking() {
        assert_eq!(
            TrackingState::Limited.better(TrackingState::Tracking),
            TrackingState::Tracking
        );
        assert_eq!(
            TrackingState::NotTracking.better(TrackingState::Limited),
            TrackingState::Limited
        );
        assert_eq!(
            TrackingState::Tracking.better(TrackingState::Tracking),
            TrackingState::Tracking
        );
    }

    #[test]
    fn marker_id_round_trips_as_plain_string() {
        let id = MarkerId::from("fretboard");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"fretboard\"");
        let back: MarkerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn observation_at_defaults_to_identity_rotation() {
        let obs = MarkerObservation::at(Point3::new(1.0, 2.0, 3.0), TrackingState::Tracking);
        assert!(obs.is_tracking());
        assert_eq!(obs.rotation, nalgebra::UnitQuaternion::identity());
    }
}
