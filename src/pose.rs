//! Pose composition: base animation sample + bone delta overlay + optional mirroring.

use std::sync::Arc;

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::assets::{AnimationSequence, SkeletonTopology};
use crate::axis::{resolve_cross_axis, Axis};
use crate::error::{AssetKind, Result, SocketError};
use crate::socket::{BoneDeltaTable, HandSocket};
use crate::transform::Transform;

/// A complete set of per-bone local transforms for one skeleton, in hierarchy order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseSnapshot {
    pub skeleton_name: String,
    pub snapshot_name: String,
    bones: Vec<(String, Transform)>,
}

impl PoseSnapshot {
    pub fn get(&self, bone: &str) -> Option<&Transform> {
        self.bones.iter().find(|(name, _)| name == bone).map(|(_, t)| t)
    }

    pub fn contains(&self, bone: &str) -> bool {
        self.get(bone).is_some()
    }

    pub fn bone_names(&self) -> impl Iterator<Item = &str> {
        self.bones.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Transform)> {
        self.bones.iter().map(|(name, t)| (name.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }
}

/// How a pose should be assembled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComposeOptions {
    /// Leave the skeleton root out of the snapshot (finger-only posing on a full body).
    pub skip_root_bone: bool,
    /// Mirror every bone, typically to drive a left hand from a right-hand pose.
    pub flip_hand: bool,
    pub mirror_axis: Axis,
    pub flip_axis: Axis,
    /// Only the signs are read, to pick the mirror cross axis.
    pub mirrored_scale: Vector3<f32>,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            skip_root_bone: false,
            flip_hand: false,
            mirror_axis: Axis::X,
            flip_axis: Axis::Y,
            mirrored_scale: Vector3::new(1.0, 1.0, -1.0),
        }
    }
}

impl ComposeOptions {
    /// Mirroring settings taken from a socket.
    pub fn for_socket(socket: &HandSocket, skip_root_bone: bool, flip_hand: bool) -> Self {
        Self {
            skip_root_bone,
            flip_hand,
            mirror_axis: socket.mirror_axis,
            flip_axis: socket.flip_axis,
            mirrored_scale: socket.mirrored_scale,
        }
    }
}

/// Builds a snapshot from `animation` sampled over every bone of `skeleton`.
///
/// `deltas` is `None` when custom pose deltas are disabled; deltas are then ignored even if
/// authored. Bones without an animation track keep the skeleton's reference pose, and deltas
/// naming bones the skeleton does not have are skipped.
pub fn compose_pose(
    animation: &dyn AnimationSequence,
    deltas: Option<&BoneDeltaTable>,
    skeleton: &dyn SkeletonTopology,
    options: &ComposeOptions,
) -> PoseSnapshot {
    let root = skeleton.root_bone().map(|b| b.name.as_str());
    let mirror_axis = options.mirror_axis.to_spatial();
    let cross_axis = resolve_cross_axis(&options.mirrored_scale, options.flip_axis);

    let mut bones = Vec::with_capacity(skeleton.bones().len());
    for bone in skeleton.bones() {
        let name = bone.name.as_str();
        if options.skip_root_bone && Some(name) == root {
            continue;
        }

        let mut local = animation
            .sample_bone(name)
            .or_else(|| {
                debug!(bone = name, animation = animation.name(), "no track, using reference pose");
                skeleton.reference_pose(name)
            })
            .unwrap_or_else(|| {
                debug!(bone = name, skeleton = skeleton.name(), "no reference pose, using identity");
                Transform::identity()
            });

        if let Some(delta) = deltas.and_then(|table| table.find(name)) {
            local.rotation =
                UnitQuaternion::new_normalize((local.rotation * delta.delta_rotation).into_inner());
        }

        if options.flip_hand {
            local = local.mirror(mirror_axis, cross_axis);
        }

        bones.push((bone.name.clone(), local));
    }

    PoseSnapshot {
        skeleton_name: skeleton.name().to_string(),
        snapshot_name: animation.name().to_string(),
        bones,
    }
}

/// Converts a raw animation into a snapshot with no socket deltas.
///
/// Mirroring uses the default socket axes (mirror X, cross axis from a `(1, 1, -1)` mirrored
/// scale).
pub fn capture_as_pose_snapshot(
    animation: &dyn AnimationSequence,
    skeleton: &dyn SkeletonTopology,
    skip_root_bone: bool,
    flip_hand: bool,
) -> PoseSnapshot {
    let options = ComposeOptions {
        skip_root_bone,
        flip_hand,
        ..ComposeOptions::default()
    };
    compose_pose(animation, None, skeleton, &options)
}

impl HandSocket {
    /// The socket's target animation blended with its bone deltas.
    ///
    /// `target_skeleton` overrides the skeleton handle stored on the socket. Fails with
    /// [`SocketError::MissingAsset`] when the animation, or the skeleton to pose, cannot be
    /// resolved.
    pub fn blended_pose(
        &self,
        target_skeleton: Option<&dyn SkeletonTopology>,
        skip_root_bone: bool,
        flip_hand: bool,
    ) -> Result<PoseSnapshot> {
        let animation = self.target_animation().ok_or_else(|| {
            warn!(slot = %self.slot_prefix, "hand socket animation is not loaded");
            SocketError::MissingAsset {
                asset: AssetKind::Animation,
                socket: self.slot_prefix.clone(),
            }
        })?;

        let stored: Arc<dyn SkeletonTopology>;
        let skeleton = match target_skeleton {
            Some(skeleton) => skeleton,
            None => {
                stored = self.skeleton.resolve().ok_or_else(|| {
                    warn!(slot = %self.slot_prefix, "hand socket skeleton is not loaded");
                    SocketError::MissingAsset {
                        asset: AssetKind::Skeleton,
                        socket: self.slot_prefix.clone(),
                    }
                })?;
                stored.as_ref()
            }
        };

        let deltas = self.use_custom_pose_deltas.then_some(&self.bone_deltas);
        let options = ComposeOptions::for_socket(self, skip_root_bone, flip_hand);
        Ok(compose_pose(animation.as_ref(), deltas, skeleton, &options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{StaticAnimation, StaticSkeleton};
    use crate::axis::SpatialAxis;
    use approx::assert_relative_eq;

    fn hand_skeleton() -> StaticSkeleton {
        StaticSkeleton::new("hand_skel")
            .with_bone("hand_r", None, Transform::identity())
            .with_bone(
                "index_01_r",
                Some("hand_r"),
                Transform::from_translation(Vector3::new(9.0, 2.0, 0.0)),
            )
            .with_bone(
                "index_02_r",
                Some("index_01_r"),
                Transform::from_translation(Vector3::new(4.0, 0.0, 0.0)),
            )
            .with_bone(
                "thumb_01_r",
                Some("hand_r"),
                Transform::from_translation(Vector3::new(2.0, -3.0, 1.0)),
            )
    }

    fn grip_animation() -> StaticAnimation {
        StaticAnimation::new("grip_pose", "hand_skel")
            .with_track(
                "hand_r",
                Transform::from_translation(Vector3::new(0.0, 0.0, 1.0)),
            )
            .with_track(
                "index_01_r",
                Transform::from_parts(
                    Vector3::new(9.0, 2.0, 0.0),
                    UnitQuaternion::from_euler_angles(0.0, 0.0, 0.6),
                    Vector3::repeat(1.0),
                ),
            )
            .with_track(
                "index_02_r",
                Transform::from_parts(
                    Vector3::new(4.0, 0.0, 0.0),
                    UnitQuaternion::from_euler_angles(0.0, 0.4, 0.0),
                    Vector3::repeat(1.0),
                ),
            )
    }

    fn curl() -> UnitQuaternion<f32> {
        UnitQuaternion::from_euler_angles(0.0, 0.0, 0.3)
    }

    #[test]
    fn skip_root_bone_controls_root_presence() {
        let (anim, skel) = (grip_animation(), hand_skeleton());

        let with_root = compose_pose(&anim, None, &skel, &ComposeOptions::default());
        assert!(with_root.contains("hand_r"));
        assert_eq!(with_root.len(), 4);

        let options = ComposeOptions {
            skip_root_bone: true,
            ..ComposeOptions::default()
        };
        let without_root = compose_pose(&anim, None, &skel, &options);
        assert!(!without_root.contains("hand_r"));
        assert_eq!(
            without_root.bone_names().collect::<Vec<_>>(),
            vec!["index_01_r", "index_02_r", "thumb_01_r"]
        );
    }

    #[test]
    fn untracked_bone_keeps_reference_pose() {
        let pose = compose_pose(&grip_animation(), None, &hand_skeleton(), &ComposeOptions::default());
        let thumb = pose.get("thumb_01_r").copied().unwrap_or_default();
        assert_eq!(thumb, Transform::from_translation(Vector3::new(2.0, -3.0, 1.0)));
        assert_eq!(pose.snapshot_name, "grip_pose");
        assert_eq!(pose.skeleton_name, "hand_skel");
    }

    #[test]
    fn delta_composes_on_top_of_sampled_rotation() {
        let mut table = BoneDeltaTable::new();
        table.set("index_01_r", curl());
        table.set("pinky_01_r", curl());

        let anim = grip_animation();
        let pose = compose_pose(&anim, Some(&table), &hand_skeleton(), &ComposeOptions::default());

        let base = anim.sample_bone("index_01_r").unwrap_or_default();
        let posed = pose.get("index_01_r").copied().unwrap_or_default();
        assert!(posed.rotation.angle_to(&(base.rotation * curl())) < 1e-5);
        assert_eq!(posed.translation, base.translation);
        // Deltas for bones outside the skeleton are ignored.
        assert!(!pose.contains("pinky_01_r"));
        assert_eq!(pose.len(), 4);
    }

    #[test]
    fn disabled_deltas_are_ignored() {
        let anim: Arc<dyn AnimationSequence> = Arc::new(grip_animation());
        let skel = hand_skeleton();

        let mut plain = HandSocket::new();
        plain.set_target_animation(&anim);
        let mut authored = plain.clone().with_bone_delta("index_01_r", curl());
        authored.use_custom_pose_deltas = false;

        let a = plain.blended_pose(Some(&skel), false, false).expect("animation loaded");
        let b = authored.blended_pose(Some(&skel), false, false).expect("animation loaded");
        assert_eq!(a, b);

        authored.use_custom_pose_deltas = true;
        let c = authored.blended_pose(Some(&skel), false, false).expect("animation loaded");
        assert_ne!(a, c);
    }

    #[test]
    fn enabled_but_empty_deltas_are_a_no_op() {
        let anim: Arc<dyn AnimationSequence> = Arc::new(grip_animation());
        let mut socket = HandSocket::new();
        socket.set_target_animation(&anim);
        socket.use_custom_pose_deltas = true;

        let pose = socket.blended_pose(Some(&hand_skeleton()), false, false).expect("loaded");
        let raw = capture_as_pose_snapshot(anim.as_ref(), &hand_skeleton(), false, false);
        assert_eq!(pose, raw);
    }

    #[test]
    fn flip_mirrors_every_bone() {
        let (anim, skel) = (grip_animation(), hand_skeleton());
        let options = ComposeOptions {
            flip_hand: true,
            mirror_axis: Axis::Y,
            flip_axis: Axis::X,
            mirrored_scale: Vector3::repeat(1.0),
            ..ComposeOptions::default()
        };
        let plain = compose_pose(&anim, None, &skel, &ComposeOptions::default());
        let flipped = compose_pose(&anim, None, &skel, &options);

        for ((name, original), (flipped_name, mirrored)) in plain.iter().zip(flipped.iter()) {
            assert_eq!(name, flipped_name);
            let expected = original.mirror(SpatialAxis::Y, SpatialAxis::X);
            assert_relative_eq!(mirrored.translation, expected.translation, epsilon = 1e-5);
            assert!(mirrored.angular_distance(&expected) < 1e-4);
        }
        let index = flipped.get("index_01_r").copied().unwrap_or_default();
        assert_relative_eq!(index.translation, Vector3::new(9.0, -2.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn capture_flip_uses_default_socket_axes() {
        let (anim, skel) = (grip_animation(), hand_skeleton());
        let flipped = capture_as_pose_snapshot(&anim, &skel, true, true);
        let thumb = flipped.get("thumb_01_r").copied().unwrap_or_default();

        assert!(!flipped.contains("hand_r"));
        assert_relative_eq!(thumb.translation, Vector3::new(-2.0, -3.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn missing_animation_is_reported() {
        let socket = HandSocket::new();
        let err = socket.blended_pose(Some(&hand_skeleton()), false, false).unwrap_err();
        assert!(matches!(err, SocketError::MissingAsset { asset: AssetKind::Animation, .. }));

        let mut socket = HandSocket::new();
        {
            let anim: Arc<dyn AnimationSequence> = Arc::new(grip_animation());
            socket.set_target_animation(&anim);
        }
        let err = socket.blended_pose(Some(&hand_skeleton()), false, false).unwrap_err();
        assert!(matches!(err, SocketError::MissingAsset { asset: AssetKind::Animation, .. }));
    }

    #[test]
    fn stored_skeleton_is_used_when_none_supplied() {
        let anim: Arc<dyn AnimationSequence> = Arc::new(grip_animation());
        let skel: Arc<dyn SkeletonTopology> = Arc::new(hand_skeleton());
        let mut socket = HandSocket::new();
        socket.set_target_animation(&anim);

        let err = socket.blended_pose(None, false, false).unwrap_err();
        assert!(matches!(err, SocketError::MissingAsset { asset: AssetKind::Skeleton, .. }));

        socket.set_skeleton(&skel);
        let pose = socket.blended_pose(None, true, false).expect("assets loaded");
        assert_eq!(pose.len(), 3);
    }

    #[test]
    fn unloaded_skeleton_is_reported() {
        let anim: Arc<dyn AnimationSequence> = Arc::new(grip_animation());
        let mut socket = HandSocket::new().with_slot_prefix("Handle");
        socket.set_target_animation(&anim);
        {
            let skel: Arc<dyn SkeletonTopology> = Arc::new(hand_skeleton());
            socket.set_skeleton(&skel);
            assert!(socket.blended_pose(None, false, false).is_ok());
        }

        let err = socket.blended_pose(None, false, false).unwrap_err();
        match err {
            SocketError::MissingAsset { asset, socket } => {
                assert_eq!(asset, AssetKind::Skeleton);
                assert_eq!(socket, "Handle");
            }
            other => panic!("unexpected error: {other}"),
        }

        // An explicit skeleton still works while the stored one is gone.
        assert!(socket.blended_pose(Some(&hand_skeleton()), false, false).is_ok());
    }
}
