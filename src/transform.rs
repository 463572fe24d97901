//! Translation / rotation / non-uniform scale transform.
//!
//! Internally uses [`nalgebra`] types so the rest of the crate can do vector math directly on
//! the fields.

use std::ops::Mul;

use nalgebra::{Matrix4, Rotation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::axis::SpatialAxis;

/// A scaled rigid transform. Points are scaled, then rotated, then translated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::repeat(1.0),
        }
    }

    pub fn from_parts(
        translation: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        scale: Vector3<f32>,
    ) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn from_translation(translation: Vector3<f32>) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    pub fn from_rotation(rotation: UnitQuaternion<f32>) -> Self {
        Self {
            rotation,
            ..Self::identity()
        }
    }

    pub fn with_scale(mut self, scale: Vector3<f32>) -> Self {
        self.scale = scale;
        self
    }

    pub fn transform_point(&self, point: &Vector3<f32>) -> Vector3<f32> {
        self.rotation * self.scale.component_mul(point) + self.translation
    }

    /// Homogeneous column-vector matrix including scale.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        let linear = self.rotation.to_rotation_matrix().into_inner()
            * nalgebra::Matrix3::from_diagonal(&self.scale);
        let mut m = linear.to_homogeneous();
        m[(0, 3)] = self.translation.x;
        m[(1, 3)] = self.translation.y;
        m[(2, 3)] = self.translation.z;
        m
    }

    /// Reflects this transform across `mirror_axis`, correcting handedness with `flip_axis`.
    ///
    /// The translation is reflected across the mirror plane. The basis becomes
    /// `S_mirror * R * S_flip`, which always has a positive determinant, so it stays a pure
    /// rotation and the scale is carried over untouched. Applying the same mirror twice
    /// returns the original transform.
    pub fn mirror(&self, mirror_axis: SpatialAxis, flip_axis: SpatialAxis) -> Self {
        let reflect = mirror_axis.reflection();
        let basis =
            reflect * self.rotation.to_rotation_matrix().into_inner() * flip_axis.reflection();
        let rotation =
            UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(basis));

        Self {
            translation: reflect * self.translation,
            rotation,
            scale: self.scale,
        }
    }

    /// Smallest angle (radians) between the two orientations.
    pub fn angular_distance(&self, other: &Transform) -> f32 {
        self.rotation.angle_to(&other.rotation)
    }
}

/// `child * parent`: applies `child` first, then `parent`.
impl Mul for Transform {
    type Output = Transform;

    fn mul(self, parent: Transform) -> Transform {
        Transform {
            translation: parent.rotation * parent.scale.component_mul(&self.translation)
                + parent.translation,
            rotation: parent.rotation * self.rotation,
            scale: self.scale.component_mul(&parent.scale),
        }
    }
}
