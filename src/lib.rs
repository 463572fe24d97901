//! Hand sockets for VR grip interaction.
//!
//! A hand socket is a spatial anchor plus a hand pose: when a hand grips an object it snaps to
//! the socket's placement and takes the socket's finger pose. One authored socket serves both
//! hands by mirroring.
//!
//! This crate defines:
//! - [`HandSocket`]: the authored descriptor (placement, mirroring settings, bone deltas).
//! - [`compose_pose`] / [`HandSocket::blended_pose`]: base animation + bone deltas, optionally
//!   mirrored, as a [`PoseSnapshot`].
//! - [`HandSocket::resolve_hand_transform`]: the hand's placement for the requesting hand.
//! - [`SocketRegistry`]: range and closest-socket queries over an injected scene.
//!
//! Animation sampling, skeleton topology and scene enumeration are external services, modelled
//! by the [`AnimationSequence`], [`SkeletonTopology`] and [`SceneEnumerator`] traits.

pub mod assets;
pub mod axis;
pub mod error;
pub mod placement;
pub mod pose;
pub mod registry;
pub mod socket;
pub mod transform;

pub use assets::{
    AnimationHandle, AnimationSequence, AssetHandle, BoneInfo, SkeletonHandle, SkeletonTopology,
    StaticAnimation, StaticSkeleton,
};
pub use axis::{resolve_cross_axis, Axis, SpatialAxis};
pub use error::{AssetKind, Result, SocketError};
pub use placement::{GripQuery, Hand, ResolveOptions, SocketAttachment};
pub use pose::{capture_as_pose_snapshot, compose_pose, ComposeOptions, PoseSnapshot};
pub use registry::{SceneEnumerator, SceneSocket, SocketRegistry};
pub use socket::{BoneDelta, BoneDeltaTable, HandSocket};
pub use transform::Transform;

// Re-export so callers can build transforms without declaring a direct dependency on
// `nalgebra`.
pub use nalgebra;
