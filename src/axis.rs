//! Authored axis enum and its mapping onto concrete math axes.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Axis as authored on a hand socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
}

/// Axis as consumed by the transform math.
///
/// Kept separate from [`Axis`] so the authored data does not depend on how the math layer
/// represents reflections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpatialAxis {
    X,
    Y,
    Z,
}

impl SpatialAxis {
    pub fn index(self) -> usize {
        match self {
            SpatialAxis::X => 0,
            SpatialAxis::Y => 1,
            SpatialAxis::Z => 2,
        }
    }

    pub fn unit(self) -> Vector3<f32> {
        let mut v = Vector3::zeros();
        v[self.index()] = 1.0;
        v
    }

    /// Diagonal matrix that negates this axis and keeps the other two.
    pub fn reflection(self) -> Matrix3<f32> {
        let mut diagonal = Vector3::repeat(1.0);
        diagonal[self.index()] = -1.0;
        Matrix3::from_diagonal(&diagonal)
    }
}

impl Axis {
    pub fn to_spatial(self) -> SpatialAxis {
        match self {
            Axis::X => SpatialAxis::X,
            Axis::Y => SpatialAxis::Y,
            Axis::Z => SpatialAxis::Z,
        }
    }

    /// Engine-convention direction for this axis: X is forward, Y is right, Z is up.
    ///
    /// Only used for visualization and diagnostics, never by the mirror math.
    pub fn direction(self) -> Vector3<f32> {
        match self {
            Axis::X => forward_vector(),
            Axis::Y => right_vector(),
            Axis::Z => up_vector(),
        }
    }
}

pub fn forward_vector() -> Vector3<f32> {
    Vector3::new(1.0, 0.0, 0.0)
}

pub fn right_vector() -> Vector3<f32> {
    Vector3::new(0.0, 1.0, 0.0)
}

pub fn up_vector() -> Vector3<f32> {
    Vector3::new(0.0, 0.0, 1.0)
}

/// Picks the secondary axis used when mirroring.
///
/// Only the *sign* of each `mirrored_scale` component matters. Components are checked in the
/// fixed order X, Z, Y and the first negative one wins; with no negative component the
/// authored `flip_axis` is used. Sign tests stay stable on low precision hardware where
/// magnitude comparisons do not.
pub fn resolve_cross_axis(mirrored_scale: &Vector3<f32>, flip_axis: Axis) -> SpatialAxis {
    if mirrored_scale.x < 0.0 {
        SpatialAxis::X
    } else if mirrored_scale.z < 0.0 {
        SpatialAxis::Z
    } else if mirrored_scale.y < 0.0 {
        SpatialAxis::Y
    } else {
        flip_axis.to_spatial()
    }
}
