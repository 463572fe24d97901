//! External asset collaborators: animation sampling and skeleton topology.
//!
//! Hand sockets never own these assets. They hold [`AssetHandle`]s (weak references) and
//! resolve them per query, so an unloaded asset shows up as
//! [`SocketError::MissingAsset`](crate::SocketError::MissingAsset) instead of a dangling read.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};

use crate::transform::Transform;

/// A static animation pose source.
///
/// Sockets sample a single pose at the sequence's reference time, so there is no time argument.
pub trait AnimationSequence: Send + Sync {
    fn name(&self) -> &str;

    fn skeleton_name(&self) -> &str;

    /// Local transform of `bone` at the reference time, or `None` when the sequence has no
    /// authored track for it.
    fn sample_bone(&self, bone: &str) -> Option<Transform>;
}

/// One bone in a skeleton hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoneInfo {
    pub name: String,
    /// Index of the parent in [`SkeletonTopology::bones`]; `None` for the root.
    pub parent: Option<usize>,
}

/// Bone list and reference pose of a skeletal mesh.
pub trait SkeletonTopology: Send + Sync {
    fn name(&self) -> &str;

    /// Bones in hierarchy order (parents before children).
    fn bones(&self) -> &[BoneInfo];

    fn reference_pose(&self, bone: &str) -> Option<Transform>;

    fn root_bone(&self) -> Option<&BoneInfo> {
        self.bones().iter().find(|b| b.parent.is_none())
    }
}

/// Non-owning reference to a shared asset.
pub struct AssetHandle<T: ?Sized>(Option<Weak<T>>);

pub type AnimationHandle = AssetHandle<dyn AnimationSequence>;
pub type SkeletonHandle = AssetHandle<dyn SkeletonTopology>;

impl<T: ?Sized> AssetHandle<T> {
    pub fn new(shared: &Arc<T>) -> Self {
        Self(Some(Arc::downgrade(shared)))
    }

    pub fn empty() -> Self {
        Self(None)
    }

    pub fn is_assigned(&self) -> bool {
        self.0.is_some()
    }

    /// Upgrades the handle. `None` if nothing was assigned or the asset has been dropped.
    pub fn resolve(&self) -> Option<Arc<T>> {
        self.0.as_ref().and_then(Weak::upgrade)
    }
}

impl<T: ?Sized> Default for AssetHandle<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized> Clone for AssetHandle<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: ?Sized> fmt::Debug for AssetHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.0 {
            None => "unassigned",
            Some(weak) if weak.strong_count() > 0 => "loaded",
            Some(_) => "unloaded",
        };
        f.debug_tuple("AssetHandle").field(&state).finish()
    }
}

/// In-memory animation pose: one transform per animated bone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticAnimation {
    pub name: String,
    pub skeleton_name: String,
    pub tracks: HashMap<String, Transform>,
}

impl StaticAnimation {
    pub fn new(name: impl Into<String>, skeleton_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            skeleton_name: skeleton_name.into(),
            tracks: HashMap::new(),
        }
    }

    pub fn with_track(mut self, bone: impl Into<String>, pose: Transform) -> Self {
        self.tracks.insert(bone.into(), pose);
        self
    }
}

impl AnimationSequence for StaticAnimation {
    fn name(&self) -> &str {
        &self.name
    }

    fn skeleton_name(&self) -> &str {
        &self.skeleton_name
    }

    fn sample_bone(&self, bone: &str) -> Option<Transform> {
        self.tracks.get(bone).copied()
    }
}

/// In-memory skeleton with a reference pose per bone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticSkeleton {
    pub name: String,
    bones: Vec<BoneInfo>,
    reference_pose: Vec<Transform>,
}

impl StaticSkeleton {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bones: Vec::new(),
            reference_pose: Vec::new(),
        }
    }

    /// Appends a bone. `parent` must already be present; an unknown parent makes the bone a
    /// root.
    pub fn with_bone(mut self, name: impl Into<String>, parent: Option<&str>, pose: Transform) -> Self {
        let parent = parent.and_then(|p| self.bones.iter().position(|b| b.name == p));
        self.bones.push(BoneInfo {
            name: name.into(),
            parent,
        });
        self.reference_pose.push(pose);
        self
    }
}

impl SkeletonTopology for StaticSkeleton {
    fn name(&self) -> &str {
        &self.name
    }

    fn bones(&self) -> &[BoneInfo] {
        &self.bones
    }

    fn reference_pose(&self, bone: &str) -> Option<Transform> {
        let index = self.bones.iter().position(|b| b.name == bone)?;
        self.reference_pose.get(index).copied()
    }
}
