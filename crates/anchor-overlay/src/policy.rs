//! Binding and pooling policy knobs.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use anchor_overlay_core::MarkerId;

/// What to do when an added marker hits the concurrency cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingPolicy {
    /// Keep existing bindings; the new marker stays unbound.
    #[default]
    RejectNew,
    /// Release the longest-bound marker, then bind the new one.
    EvictOldest,
}

/// Synchronizer behavior knobs.
///
/// The defaults reproduce the strictest source behavior: pooled
/// instances, a single concurrently bound marker, and no marker filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncPolicy {
    /// Reuse instances through the pool instead of destroying on marker
    /// loss.
    pub pooling: bool,
    /// Upper bound on concurrently bound markers; `None` allows one
    /// overlay per distinct marker.
    pub max_bound_markers: Option<NonZeroUsize>,
    /// Applied when `max_bound_markers` is reached.
    pub conflict: BindingPolicy,
    /// When set, deltas for markers outside this set are ignored.
    pub marker_filter: Option<BTreeSet<MarkerId>>,
    /// Idle instances kept per descriptor key; released instances beyond
    /// this are destroyed.
    pub max_idle_per_key: usize,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            pooling: true,
            max_bound_markers: NonZeroUsize::new(1),
            conflict: BindingPolicy::RejectNew,
            marker_filter: None,
            max_idle_per_key: 4,
        }
    }
}

impl SyncPolicy {
    /// Policy without a concurrency cap: one overlay per distinct marker.
    pub fn per_marker() -> Self {
        Self {
            max_bound_markers: None,
            ..Self::default()
        }
    }

    /// Non-pooled policy: instantiate on bind, destroy on marker loss.
    pub fn without_pooling() -> Self {
        Self {
            pooling: false,
            ..Self::default()
        }
    }

    pub fn with_filter<I, M>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<MarkerId>,
    {
        self.marker_filter = Some(markers.into_iter().map(Into::into).collect());
        self
    }

    pub(crate) fn accepts(&self, id: &MarkerId) -> bool {
        match &self.marker_filter {
            Some(filter) => filter.contains(id),
            None => true,
        }
    }

    pub(crate) fn at_capacity(&self, bound: usize) -> bool {
        self.max_bound_markers
            .map(|max| bound >= max.get())
            .unwrap_or(false)
    }
}
