//! Core types for marker-anchored overlay synchronization.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any concrete tracking subsystem or scene graph: observations
//! come in as plain poses, overlays go out as plain poses.

mod descriptor;
mod logger;
mod marker;
mod pose;

pub use descriptor::{ConfigError, DescriptorSet, OrientationMode, OverlayDescriptor};
pub use marker::{MarkerId, MarkerObservation, TrackingState};
pub use pose::{anchored_pose, billboard_rotation, Pose};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
