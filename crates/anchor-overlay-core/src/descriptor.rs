//! Overlay descriptor catalog and its validation.

use std::collections::HashSet;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// How an overlay is oriented while anchored to its marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrientationMode {
    /// Overlay rotation follows the marker rotation.
    #[default]
    MarkerRotation,
    /// Overlay turns its +Z axis toward the camera (when a camera pose is
    /// supplied with the tick); falls back to the marker rotation otherwise.
    FaceCamera,
}

/// Static configuration for one selectable overlay.
///
/// `template` is an opaque name handed to the scene backend when a fresh
/// instance is needed; the core never interprets it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlayDescriptor {
    pub key: String,
    pub template: String,
    /// Local offset relative to the marker pose, in the marker's frame.
    #[serde(default = "Vector3::zeros")]
    pub offset: Vector3<f32>,
    #[serde(default)]
    pub orientation: OrientationMode,
}

impl OverlayDescriptor {
    pub fn new(key: impl Into<String>, template: impl Into<String>, offset: Vector3<f32>) -> Self {
        Self {
            key: key.into(),
            template: template.into(),
            offset,
            orientation: OrientationMode::MarkerRotation,
        }
    }

    pub fn with_orientation(mut self, orientation: OrientationMode) -> Self {
        self.orientation = orientation;
        self
    }
}

/// Descriptor catalog validation errors.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("descriptor set is empty")]
    NoDescriptors,
    #[error("duplicate descriptor key {0:?}")]
    DuplicateKey(String),
    #[error("descriptor {key:?} has a non-finite offset")]
    NonFiniteOffset { key: String },
    #[error("default offset is non-finite")]
    NonFiniteDefaultOffset,
}

/// Validated set of overlay descriptors plus the global fallback offset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DescriptorSet {
    descriptors: Vec<OverlayDescriptor>,
    default_offset: Vector3<f32>,
}

impl DescriptorSet {
    /// Validate and build a catalog. Keys must be unique and all offsets
    /// finite.
    pub fn new(
        descriptors: Vec<OverlayDescriptor>,
        default_offset: Vector3<f32>,
    ) -> Result<Self, ConfigError> {
        if descriptors.is_empty() {
            return Err(ConfigError::NoDescriptors);
        }
        if !default_offset.iter().all(|c| c.is_finite()) {
            return Err(ConfigError::NonFiniteDefaultOffset);
        }
        let mut seen = HashSet::new();
        for desc in &descriptors {
            if !seen.insert(desc.key.as_str()) {
                return Err(ConfigError::DuplicateKey(desc.key.clone()));
            }
            if !desc.offset.iter().all(|c| c.is_finite()) {
                return Err(ConfigError::NonFiniteOffset {
                    key: desc.key.clone(),
                });
            }
        }
        Ok(Self {
            descriptors,
            default_offset,
        })
    }

    pub fn get(&self, key: &str) -> Option<&OverlayDescriptor> {
        self.descriptors.iter().find(|d| d.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Total offset applied to an overlay of `desc`: its own offset plus
    /// the global default.
    pub fn total_offset(&self, desc: &OverlayDescriptor) -> Vector3<f32> {
        desc.offset + self.default_offset
    }

    pub fn default_offset(&self) -> Vector3<f32> {
        self.default_offset
    }

    pub fn iter(&self) -> impl Iterator<Item = &OverlayDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(key: &str) -> OverlayDescriptor {
        OverlayDescriptor::new(key, "template", Vector3::zeros())
    }

    #[test]
    fn rejects_duplicate_keys() {
        let err = DescriptorSet::new(vec![desc("C"), desc("C")], Vector3::zeros()).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateKey(k) if k == "C"));
    }

    #[test]
    fn rejects_empty_catalog() {
        let err = DescriptorSet::new(Vec::new(), Vector3::zeros()).unwrap_err();
        assert!(matches!(err, ConfigError::NoDescriptors));
    }

    #[test]
    fn rejects_non_finite_offsets() {
        let mut bad = desc("C");
        bad.offset = Vector3::new(f32::NAN, 0.0, 0.0);
        let err = DescriptorSet::new(vec![bad], Vector3::zeros()).unwrap_err();
        assert!(matches!(err, ConfigError::NonFiniteOffset { key } if key == "C"));

        let err =
            DescriptorSet::new(vec![desc("C")], Vector3::new(0.0, f32::INFINITY, 0.0)).unwrap_err();
        assert!(matches!(err, ConfigError::NonFiniteDefaultOffset));
    }

    #[test]
    fn total_offset_adds_the_default() {
        let set = DescriptorSet::new(
            vec![OverlayDescriptor::new(
                "C",
                "chord_c",
                Vector3::new(0.0, 0.0, 0.1),
            )],
            Vector3::new(0.0, 0.1, 0.0),
        )
        .unwrap();
        let d = set.get("C").unwrap();
        assert_eq!(set.total_offset(d), Vector3::new(0.0, 0.1, 0.1));
    }
}
