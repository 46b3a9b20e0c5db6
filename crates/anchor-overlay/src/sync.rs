//! The synchronizer: marker deltas in, scene mutations out.

use std::collections::HashMap;

use log::{debug, warn};
use nalgebra::{Point3, Vector3};

#[cfg(feature = "tracing")]
use tracing::instrument;

use anchor_overlay_core::{
    anchored_pose, billboard_rotation, ConfigError, DescriptorSet, MarkerId, MarkerObservation,
    OrientationMode, OverlayDescriptor, Pose, TrackingState,
};

use crate::events::{MarkerDeltas, TickSummary, TrackedMarker};
use crate::policy::{BindingPolicy, SyncPolicy};
use crate::pool::OverlayPool;
use crate::prompt::{PromptMessages, StatusPrompt};
use crate::scene::SceneBackend;

/// Selector errors. Non-fatal: the previous selection and every binding
/// stay untouched.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SelectError {
    #[error("no overlay descriptor registered for key {0:?}")]
    UnknownKey(String),
}

#[derive(Debug)]
struct Binding<H> {
    handle: H,
    key: String,
    visible: bool,
}

/// Maintains the marker → overlay mapping against a scene backend.
///
/// All entry points take `&mut self`: the single-writer, tick-serialized
/// contract is enforced by the borrow checker. Construction validates the
/// descriptor catalog and, in pooled mode, pre-warms one hidden instance
/// per descriptor.
pub struct OverlaySynchronizer<B: SceneBackend> {
    descriptors: DescriptorSet,
    policy: SyncPolicy,
    backend: B,
    pool: OverlayPool<B::Handle>,
    bindings: HashMap<MarkerId, Binding<B::Handle>>,
    /// Bound markers, oldest first. Drives `EvictOldest` and keeps
    /// re-binding deterministic.
    bind_order: Vec<MarkerId>,
    /// Last observation of every accepted marker, bound or not.
    observed: HashMap<MarkerId, MarkerObservation>,
    observed_order: Vec<MarkerId>,
    selector: Option<String>,
    last_camera: Option<Point3<f32>>,
    prompt: StatusPrompt,
}

impl<B: SceneBackend> OverlaySynchronizer<B> {
    /// Register the overlay catalog and take ownership of the backend.
    ///
    /// Fails on duplicate descriptor keys, an empty catalog, or
    /// non-finite offsets; nothing is instantiated in that case.
    pub fn new(
        descriptors: Vec<OverlayDescriptor>,
        default_offset: Vector3<f32>,
        policy: SyncPolicy,
        mut backend: B,
    ) -> Result<Self, ConfigError> {
        let descriptors = DescriptorSet::new(descriptors, default_offset)?;
        let mut pool = OverlayPool::new(policy.max_idle_per_key);
        if policy.pooling {
            for desc in descriptors.iter() {
                let handle = backend.instantiate(&desc.template);
                backend.set_visible(&handle, false);
                if let Some(extra) = pool.release(&desc.key, handle) {
                    backend.destroy(extra);
                }
            }
        }
        Ok(Self {
            descriptors,
            policy,
            backend,
            pool,
            bindings: HashMap::new(),
            bind_order: Vec::new(),
            observed: HashMap::new(),
            observed_order: Vec::new(),
            selector: None,
            last_camera: None,
            prompt: StatusPrompt::default(),
        })
    }

    pub fn with_prompt_messages(mut self, messages: PromptMessages) -> Self {
        self.prompt = StatusPrompt::new(messages);
        self
    }

    /// Set the active overlay selector.
    ///
    /// Bound markers are re-bound to the new descriptor synchronously at
    /// their last observation: the old instance is deactivated and the
    /// new one attached within this call. Markers sighted while no
    /// selector was active are bound now as well, cap permitting.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn select_overlay(&mut self, key: &str) -> Result<(), SelectError> {
        if !self.descriptors.contains(key) {
            warn!("no overlay descriptor registered for {:?}", key);
            return Err(SelectError::UnknownKey(key.to_owned()));
        }
        if self.selector.as_deref() == Some(key) {
            return Ok(());
        }
        self.selector = Some(key.to_owned());
        debug!("overlay selector set to {:?}", key);

        for id in self.bind_order.clone() {
            let Some(obs) = self.observed.get(&id).copied() else {
                continue;
            };
            if let Some(binding) = self.bindings.remove(&id) {
                self.recycle(binding);
            }
            self.attach(id, obs, key);
        }

        // Cap slots left over go to markers sighted before a selector was
        // active, in sighting order. Eviction is never applied here.
        let unbound: Vec<MarkerId> = self
            .observed_order
            .iter()
            .filter(|id| !self.bindings.contains_key(*id))
            .cloned()
            .collect();
        for id in unbound {
            if self.policy.at_capacity(self.bindings.len()) {
                break;
            }
            let Some(obs) = self.observed.get(&id).copied() else {
                continue;
            };
            self.attach(id, obs, key);
        }
        Ok(())
    }

    /// Ingest one tracking tick: `added`, then `updated`, then `removed`,
    /// each in caller order.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(
            added = deltas.added.len(),
            updated = deltas.updated.len(),
            removed = deltas.removed.len()
        ))
    )]
    pub fn on_markers_changed(&mut self, deltas: &MarkerDeltas) -> TickSummary {
        self.last_camera = deltas.camera;
        let mut summary = TickSummary::default();
        for tracked in &deltas.added {
            self.ingest_added(tracked, &mut summary);
        }
        for tracked in &deltas.updated {
            self.ingest_updated(tracked, &mut summary);
        }
        for id in &deltas.removed {
            self.ingest_removed(id, &mut summary);
        }
        self.refresh_prompt();
        summary
    }

    fn ingest_added(&mut self, tracked: &TrackedMarker, summary: &mut TickSummary) {
        let TrackedMarker { id, observation } = tracked;
        if !self.policy.accepts(id) {
            summary.ignored += 1;
            return;
        }
        self.note_observation(id, *observation);

        if self.bindings.contains_key(id) {
            // Duplicate "added" event: idempotent, same as an update.
            self.refresh(id, *observation);
            summary.updated += 1;
            return;
        }

        let Some(key) = self.selector.clone() else {
            warn!("marker {} sighted with no overlay selected", id);
            summary.misses += 1;
            return;
        };
        if !self.descriptors.contains(&key) {
            warn!("selector {:?} has no descriptor; marker {} stays unbound", key, id);
            summary.misses += 1;
            return;
        }

        if self.policy.at_capacity(self.bindings.len()) {
            match self.policy.conflict {
                BindingPolicy::RejectNew => {
                    warn!("binding slots full; marker {} stays unbound", id);
                    summary.rejected += 1;
                    return;
                }
                BindingPolicy::EvictOldest => {
                    if let Some(oldest) = self.bind_order.first().cloned() {
                        debug!("evicting oldest bound marker {}", oldest);
                        self.unbind(&oldest, summary);
                        summary.evicted += 1;
                    }
                }
            }
        }

        self.attach(id.clone(), *observation, &key);
        summary.bound += 1;
    }

    fn ingest_updated(&mut self, tracked: &TrackedMarker, summary: &mut TickSummary) {
        let TrackedMarker { id, observation } = tracked;
        if !self.policy.accepts(id) {
            summary.ignored += 1;
            return;
        }
        self.note_observation(id, *observation);
        if self.bindings.contains_key(id) {
            self.refresh(id, *observation);
            summary.updated += 1;
        } else {
            debug!("update for unbound marker {}", id);
        }
    }

    fn ingest_removed(&mut self, id: &MarkerId, summary: &mut TickSummary) {
        if !self.policy.accepts(id) {
            summary.ignored += 1;
            return;
        }
        self.observed.remove(id);
        self.observed_order.retain(|m| m != id);
        if self.bindings.contains_key(id) {
            self.unbind(id, summary);
        } else {
            debug!("removal for unbound marker {}", id);
        }
    }

    /// World pose for an overlay of `key` anchored at `obs`.
    fn overlay_pose(&self, key: &str, obs: &MarkerObservation) -> Option<Pose> {
        let desc = self.descriptors.get(key)?;
        let mut pose = anchored_pose(obs, self.descriptors.total_offset(desc));
        if desc.orientation == OrientationMode::FaceCamera {
            if let Some(camera) = self.last_camera {
                if let Some(rotation) = billboard_rotation(pose.position, camera) {
                    pose.rotation = rotation;
                }
            }
        }
        Some(pose)
    }

    /// Write pose and visibility of a bound marker's instance.
    fn refresh(&mut self, id: &MarkerId, obs: MarkerObservation) {
        let Some(binding) = self.bindings.get(id) else {
            return;
        };
        let handle = binding.handle.clone();
        let key = binding.key.clone();
        let Some(pose) = self.overlay_pose(&key, &obs) else {
            return;
        };
        self.backend.set_transform(&handle, pose.position, pose.rotation);
        let visible = obs.is_tracking();
        self.backend.set_visible(&handle, visible);
        if let Some(binding) = self.bindings.get_mut(id) {
            binding.visible = visible;
        }
    }

    /// Bind `id` to a fresh or pooled instance of `key` and apply `obs`.
    /// Callers have already checked the selector, filter, and cap.
    fn attach(&mut self, id: MarkerId, obs: MarkerObservation, key: &str) {
        let Some(template) = self.descriptors.get(key).map(|d| d.template.clone()) else {
            return;
        };
        let handle = if self.policy.pooling {
            match self.pool.acquire(key) {
                Some(handle) => handle,
                None => self.backend.instantiate(&template),
            }
        } else {
            self.backend.instantiate(&template)
        };
        self.bindings.insert(
            id.clone(),
            Binding {
                handle,
                key: key.to_owned(),
                visible: false,
            },
        );
        if !self.bind_order.contains(&id) {
            self.bind_order.push(id.clone());
        }
        debug!("bound overlay {:?} to marker {}", key, id);
        self.refresh(&id, obs);
    }

    /// Drop the binding for `id` and recycle its instance.
    fn unbind(&mut self, id: &MarkerId, summary: &mut TickSummary) {
        let Some(binding) = self.bindings.remove(id) else {
            return;
        };
        self.bind_order.retain(|b| b != id);
        if self.policy.pooling {
            summary.released += 1;
        }
        if self.recycle(binding) {
            summary.destroyed += 1;
        }
        debug!("marker {} unbound", id);
    }

    /// Hide and pool the instance, or destroy it. Returns whether an
    /// instance was destroyed.
    fn recycle(&mut self, binding: Binding<B::Handle>) -> bool {
        if self.policy.pooling {
            self.backend.set_visible(&binding.handle, false);
            if let Some(extra) = self.pool.release(&binding.key, binding.handle) {
                self.backend.destroy(extra);
                return true;
            }
            false
        } else {
            self.backend.destroy(binding.handle);
            true
        }
    }

    fn note_observation(&mut self, id: &MarkerId, obs: MarkerObservation) {
        if self.observed.insert(id.clone(), obs).is_none() {
            self.observed_order.push(id.clone());
        }
    }

    fn refresh_prompt(&mut self) {
        let state = self
            .observed
            .values()
            .map(|obs| obs.state)
            .reduce(TrackingState::better);
        self.prompt.update(state);
    }

    /// Destroy every bound and pooled instance. Also runs on drop; safe
    /// to call more than once.
    pub fn release_all(&mut self) {
        for id in std::mem::take(&mut self.bind_order) {
            if let Some(binding) = self.bindings.remove(&id) {
                self.backend.destroy(binding.handle);
            }
        }
        self.bindings.clear();
        for handle in self.pool.drain() {
            self.backend.destroy(handle);
        }
        self.observed.clear();
        self.observed_order.clear();
    }

    pub fn selected(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    pub fn is_bound(&self, id: &MarkerId) -> bool {
        self.bindings.contains_key(id)
    }

    /// Bound markers, oldest binding first.
    pub fn bound_markers(&self) -> impl Iterator<Item = &MarkerId> {
        self.bind_order.iter()
    }

    pub fn bound_count(&self) -> usize {
        self.bindings.len()
    }

    /// Scene handle currently bound to `id`.
    pub fn handle_for(&self, id: &MarkerId) -> Option<&B::Handle> {
        self.bindings.get(id).map(|b| &b.handle)
    }

    /// Whether the instance bound to `id` is currently shown.
    pub fn is_visible(&self, id: &MarkerId) -> bool {
        self.bindings.get(id).is_some_and(|b| b.visible)
    }

    /// Idle instances currently held by the pool.
    pub fn idle_instances(&self) -> usize {
        self.pool.idle_count()
    }

    /// Current status prompt text; empty while tracking is live.
    pub fn prompt(&self) -> &str {
        self.prompt.text()
    }

    pub fn descriptors(&self) -> &DescriptorSet {
        &self.descriptors
    }

    pub fn policy(&self) -> &SyncPolicy {
        &self.policy
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: SceneBackend> Drop for OverlaySynchronizer<B> {
    fn drop(&mut self) {
        self.release_all();
    }
}
