//! Marker-anchored overlay synchronization.
//!
//! Consumes per-tick marker-tracking deltas (added / updated / removed)
//! and maintains a mapping from marker identity to a pooled overlay
//! instance in an abstract scene graph: pose following, visibility tied
//! to tracking state, selector-driven re-binding, bounded pooling.
//!
//! The tracking subsystem and the scene graph are collaborators, not
//! dependencies: the host routes its native tick events into
//! [`OverlaySynchronizer::on_markers_changed`] and implements
//! [`SceneBackend`] over its scene graph.
//!
//! ## Quickstart
//!
//! ```
//! use anchor_overlay::core::{MarkerObservation, OverlayDescriptor, TrackingState};
//! use anchor_overlay::{MarkerDeltas, OverlaySynchronizer, RecordingScene, SyncPolicy};
//! use nalgebra::{Point3, Vector3};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let chords = vec![OverlayDescriptor::new("C", "chord_c", Vector3::new(0.0, 0.0, 0.1))];
//! let mut sync = OverlaySynchronizer::new(
//!     chords,
//!     Vector3::new(0.0, 0.1, 0.0),
//!     SyncPolicy::default(),
//!     RecordingScene::new(),
//! )?;
//! sync.select_overlay("C")?;
//!
//! let tick = MarkerDeltas::default().with_added(
//!     "fretboard",
//!     MarkerObservation::at(Point3::origin(), TrackingState::Tracking),
//! );
//! let summary = sync.on_markers_changed(&tick);
//! assert_eq!(summary.bound, 1);
//! # Ok(())
//! # }
//! ```

mod events;
mod policy;
mod pool;
mod prompt;
mod recording;
mod scene;
mod sync;

pub use events::{MarkerDeltas, TickSummary, TrackedMarker};
pub use policy::{BindingPolicy, SyncPolicy};
pub use pool::OverlayPool;
pub use prompt::{PromptMessages, StatusPrompt};
pub use recording::{OverlayHandle, OverlayRecord, RecordingScene};
pub use scene::SceneBackend;
pub use sync::{OverlaySynchronizer, SelectError};

pub use anchor_overlay_core as core;
