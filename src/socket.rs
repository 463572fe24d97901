//! The hand socket descriptor and its bone delta overlay table.

use std::sync::Arc;

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::assets::{AnimationHandle, AnimationSequence, SkeletonHandle, SkeletonTopology};
use crate::axis::{resolve_cross_axis, Axis, SpatialAxis};
use crate::error::Result;
use crate::transform::Transform;

/// An authored rotation layered on top of one bone's sampled pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneDelta {
    pub bone_name: String,
    pub delta_rotation: UnitQuaternion<f32>,
}

impl BoneDelta {
    pub fn new(bone_name: impl Into<String>, delta_rotation: UnitQuaternion<f32>) -> Self {
        Self {
            bone_name: bone_name.into(),
            delta_rotation,
        }
    }
}

/// Ordered bone delta overlays. Lookups are by bone name and the first match wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoneDeltaTable {
    deltas: Vec<BoneDelta>,
}

impl BoneDeltaTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, bone: &str) -> Option<&BoneDelta> {
        self.deltas.iter().find(|d| d.bone_name == bone)
    }

    /// Replaces the first delta for `bone`, or appends one.
    pub fn set(&mut self, bone: &str, delta_rotation: UnitQuaternion<f32>) {
        match self.deltas.iter_mut().find(|d| d.bone_name == bone) {
            Some(existing) => existing.delta_rotation = delta_rotation,
            None => self.deltas.push(BoneDelta::new(bone, delta_rotation)),
        }
    }

    pub fn remove(&mut self, bone: &str) -> Option<BoneDelta> {
        let index = self.deltas.iter().position(|d| d.bone_name == bone)?;
        Some(self.deltas.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoneDelta> {
        self.deltas.iter()
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }
}

impl FromIterator<BoneDelta> for BoneDeltaTable {
    fn from_iter<I: IntoIterator<Item = BoneDelta>>(iter: I) -> Self {
        Self {
            deltas: iter.into_iter().collect(),
        }
    }
}

/// A spatial anchor plus hand pose that a gripping hand snaps to.
///
/// Authored once and read-only while querying: none of the pose, placement or registry
/// operations mutate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandSocket {
    /// Plane to reflect across when mirroring for the off hand.
    pub mirror_axis: Axis,
    /// Secondary axis used when `mirrored_scale` has no negative component.
    pub flip_axis: Axis,
    /// Placement of the hand relative to the socket.
    pub hand_relative_placement: Transform,
    /// Grip type this socket answers to.
    pub slot_prefix: String,

    /// Mesh placement ignores the socket's own relative transform.
    pub decouple_mesh_placement: bool,
    /// Only snap the hand mesh; the grip itself behaves like a free grip.
    pub only_snap_mesh: bool,
    /// Consumers should only take the pose from this socket, not its transform.
    pub only_use_hand_pose: bool,
    pub ignore_attach_bone: bool,
    /// The authored pose is for the left hand; the right hand gets the mirrored copy.
    pub left_hand_dominant: bool,
    pub flip_for_off_hand: bool,
    /// Mirroring changes orientation only and keeps the position.
    pub only_flip_rotation: bool,
    pub always_in_range: bool,
    pub match_rotation: bool,
    pub disabled: bool,
    pub lock_in_place: bool,
    pub use_custom_pose_deltas: bool,

    /// Snap distance override; zero or negative means use the search radius.
    pub override_distance: f32,
    pub bone_deltas: BoneDeltaTable,
    /// Sign-carrying scale applied to a mirrored hand. The signs also pick the mirror cross
    /// axis, see [`resolve_cross_axis`].
    pub mirrored_scale: Vector3<f32>,

    #[serde(skip)]
    pub target_animation: AnimationHandle,
    #[serde(skip)]
    pub skeleton: SkeletonHandle,
}

impl Default for HandSocket {
    fn default() -> Self {
        Self {
            mirror_axis: Axis::X,
            flip_axis: Axis::Y,
            hand_relative_placement: Transform::identity(),
            slot_prefix: String::from("VRGripP"),
            decouple_mesh_placement: false,
            only_snap_mesh: false,
            only_use_hand_pose: false,
            ignore_attach_bone: false,
            left_hand_dominant: false,
            flip_for_off_hand: false,
            only_flip_rotation: false,
            always_in_range: false,
            match_rotation: false,
            disabled: false,
            lock_in_place: false,
            use_custom_pose_deltas: false,
            override_distance: 0.0,
            bone_deltas: BoneDeltaTable::new(),
            mirrored_scale: Vector3::new(1.0, 1.0, -1.0),
            target_animation: AnimationHandle::empty(),
            skeleton: SkeletonHandle::empty(),
        }
    }
}

impl HandSocket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads authored socket data. Missing fields keep their defaults; asset handles start
    /// unassigned.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_placement(mut self, placement: Transform) -> Self {
        self.hand_relative_placement = placement;
        self
    }

    pub fn with_slot_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.slot_prefix = prefix.into();
        self
    }

    pub fn with_mirroring(mut self, mirror_axis: Axis, flip_axis: Axis, mirrored_scale: Vector3<f32>) -> Self {
        self.mirror_axis = mirror_axis;
        self.flip_axis = flip_axis;
        self.mirrored_scale = mirrored_scale;
        self.flip_for_off_hand = true;
        self
    }

    pub fn with_bone_delta(mut self, bone: &str, delta_rotation: UnitQuaternion<f32>) -> Self {
        self.set_bone_delta(bone, delta_rotation);
        self
    }

    pub fn set_bone_delta(&mut self, bone: &str, delta_rotation: UnitQuaternion<f32>) {
        self.bone_deltas.set(bone, delta_rotation);
    }

    pub fn remove_bone_delta(&mut self, bone: &str) -> Option<BoneDelta> {
        self.bone_deltas.remove(bone)
    }

    pub fn set_target_animation(&mut self, animation: &Arc<dyn AnimationSequence>) {
        self.target_animation = AnimationHandle::new(animation);
    }

    pub fn set_skeleton(&mut self, skeleton: &Arc<dyn SkeletonTopology>) {
        self.skeleton = SkeletonHandle::new(skeleton);
    }

    /// The base hand animation, if one is assigned and still loaded.
    pub fn target_animation(&self) -> Option<Arc<dyn AnimationSequence>> {
        self.target_animation.resolve()
    }

    pub fn cross_axis(&self) -> SpatialAxis {
        resolve_cross_axis(&self.mirrored_scale, self.flip_axis)
    }

    pub fn mirror_vector(&self) -> Vector3<f32> {
        self.mirror_axis.direction()
    }

    pub fn flip_vector(&self) -> Vector3<f32> {
        self.flip_axis.direction()
    }

    /// Search distance for this socket given the caller's default radius.
    pub fn effective_distance(&self, radius: f32) -> f32 {
        if self.override_distance > 0.0 {
            self.override_distance
        } else {
            radius
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn delta_table_first_match_wins() {
        let a = UnitQuaternion::from_euler_angles(0.1, 0.0, 0.0);
        let b = UnitQuaternion::from_euler_angles(0.0, 0.2, 0.0);
        let table: BoneDeltaTable = [BoneDelta::new("index_01_r", a), BoneDelta::new("index_01_r", b)]
            .into_iter()
            .collect();

        assert_eq!(table.find("index_01_r").map(|d| d.delta_rotation), Some(a));
        assert!(table.find("thumb_01_r").is_none());
    }

    #[test]
    fn set_bone_delta_replaces_existing_entry() {
        let mut socket = HandSocket::new();
        socket.set_bone_delta("index_01_r", UnitQuaternion::identity());
        socket.set_bone_delta("index_01_r", UnitQuaternion::from_euler_angles(0.0, 0.0, 0.5));
        socket.set_bone_delta("thumb_01_r", UnitQuaternion::identity());

        assert_eq!(socket.bone_deltas.len(), 2);
        assert_relative_eq!(
            socket.bone_deltas.find("index_01_r").map(|d| d.delta_rotation.angle()).unwrap_or_default(),
            0.5,
            epsilon = 1e-5
        );
        assert!(socket.remove_bone_delta("thumb_01_r").is_some());
        assert!(socket.remove_bone_delta("thumb_01_r").is_none());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let socket = HandSocket::from_json(
            r#"{ "slot_prefix": "Handle", "flip_for_off_hand": true, "mirror_axis": "Y", "override_distance": 12.5 }"#,
        )
        .expect("valid socket json");

        assert_eq!(socket.slot_prefix, "Handle");
        assert!(socket.flip_for_off_hand);
        assert_eq!(socket.mirror_axis, Axis::Y);
        assert_eq!(socket.flip_axis, Axis::Y);
        assert_eq!(socket.mirrored_scale, Vector3::new(1.0, 1.0, -1.0));
        assert_eq!(socket.effective_distance(4.0), 12.5);
        assert!(!socket.target_animation.is_assigned());
    }

    #[test]
    fn json_round_trip_preserves_authored_data() {
        let socket = HandSocket::new()
            .with_slot_prefix("Trigger")
            .with_mirroring(Axis::Z, Axis::X, Vector3::new(-1.0, 1.0, 1.0))
            .with_bone_delta("index_01_r", UnitQuaternion::from_euler_angles(0.2, 0.0, 0.0));

        let json = socket.to_json().expect("serializable");
        let loaded = HandSocket::from_json(&json).expect("round trip");

        assert_eq!(loaded.slot_prefix, "Trigger");
        assert_eq!(loaded.mirror_axis, Axis::Z);
        assert_eq!(loaded.cross_axis(), SpatialAxis::X);
        assert_eq!(loaded.bone_deltas.len(), 1);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = HandSocket::from_json("{ \"disabled\": 3 }").unwrap_err();
        assert!(matches!(err, crate::SocketError::Config(_)));
    }

    #[test]
    fn non_positive_override_uses_radius() {
        let socket = HandSocket::new();
        assert_eq!(socket.effective_distance(6.0), 6.0);

        let negative = HandSocket {
            override_distance: -3.0,
            ..HandSocket::default()
        };
        assert_eq!(negative.effective_distance(6.0), 6.0);
    }
}
