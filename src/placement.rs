//! Hand placement relative to a socket, with off-hand mirroring.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::socket::HandSocket;
use crate::transform::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn is_right(self) -> bool {
        self == Hand::Right
    }

    pub fn opposite(self) -> Hand {
        match self {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        }
    }
}

/// Inputs to [`HandSocket::resolve_hand_transform`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveOptions {
    pub hand: Hand,
    /// Multiply the result's scale by `parent_scale`.
    pub use_parent_scale: bool,
    /// Multiply a mirrored hand's scale by the socket's sign-carrying `mirrored_scale`. The
    /// dominant hand is never rescaled. When off, the caller has to deal with scale
    /// decomposition itself.
    pub use_mirror_scale: bool,
    /// Accumulated scale of the socket's owning scene transform.
    pub parent_scale: Vector3<f32>,
}

impl ResolveOptions {
    pub fn for_hand(hand: Hand) -> Self {
        Self {
            hand,
            use_parent_scale: false,
            use_mirror_scale: false,
            parent_scale: Vector3::repeat(1.0),
        }
    }

    pub fn with_parent_scale(mut self, parent_scale: Vector3<f32>) -> Self {
        self.use_parent_scale = true;
        self.parent_scale = parent_scale;
        self
    }

    pub fn with_mirror_scale(mut self) -> Self {
        self.use_mirror_scale = true;
        self
    }
}

/// Where a socket sits in the scene: its transform relative to its attach parent, and the
/// parent's world transform.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SocketAttachment {
    pub relative: Transform,
    pub parent_world: Transform,
}

impl SocketAttachment {
    pub fn new(relative: Transform, parent_world: Transform) -> Self {
        Self {
            relative,
            parent_world,
        }
    }

    /// A socket placed directly in world space.
    pub fn at_world(world: Transform) -> Self {
        Self::new(world, Transform::identity())
    }

    pub fn world(&self) -> Transform {
        self.relative * self.parent_world
    }
}

/// The controller asking for a socket transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GripQuery {
    pub hand: Hand,
    /// Controller pivot in world space, used for snap-mesh-only sockets.
    pub controller_pivot: Option<Transform>,
}

impl HandSocket {
    /// True when `hand` is the off hand for this socket and off-hand flipping is enabled.
    pub fn needs_mirroring(&self, hand: Hand) -> bool {
        self.flip_for_off_hand && hand.is_right() == self.left_hand_dominant
    }

    /// Mirrors `transform` with this socket's axes. With `only_flip_rotation` the mirror runs
    /// about `pivot`, so the translation comes back unchanged.
    pub fn mirror_hand_transform(&self, transform: &Transform, pivot: &Vector3<f32>) -> Transform {
        let mirror_axis = self.mirror_axis.to_spatial();
        let cross_axis = self.cross_axis();

        if self.only_flip_rotation {
            let mut local = *transform;
            local.translation -= pivot;
            let mut mirrored = local.mirror(mirror_axis, cross_axis);
            mirrored.translation += pivot;
            mirrored
        } else {
            transform.mirror(mirror_axis, cross_axis)
        }
    }

    /// The hand's transform relative to this socket, for the requesting hand.
    ///
    /// Pure with respect to the socket: nothing on `self` changes.
    pub fn resolve_hand_transform(&self, options: &ResolveOptions) -> Transform {
        let mut placement = self.hand_relative_placement;

        if self.needs_mirroring(options.hand) {
            placement = self.mirror_hand_transform(&placement, &self.hand_relative_placement.translation);

            if options.use_mirror_scale {
                placement.scale.component_mul_assign(&self.mirrored_scale);
            }
        }

        if options.use_parent_scale {
            placement.scale.component_mul_assign(&options.parent_scale);
        }

        placement
    }

    /// World transform the hand mesh should take when gripping at this socket.
    ///
    /// Parent scale comes from composing with the attachment, so `use_parent_scale` is ignored.
    pub fn mesh_world_transform(&self, attachment: &SocketAttachment, options: &ResolveOptions) -> Transform {
        if self.decouple_mesh_placement {
            return self.hand_relative_placement * attachment.parent_world;
        }

        let options = ResolveOptions {
            use_parent_scale: false,
            ..*options
        };
        self.resolve_hand_transform(&options) * attachment.world()
    }

    /// World transform of the socket as seen by `query`'s controller.
    ///
    /// Snap-mesh-only sockets report the controller pivot (or identity without one) unless
    /// `ignore_only_snap_mesh` is set. For the off hand the socket's relative transform is
    /// mirrored before being re-attached to its parent.
    pub fn socket_world_transform(
        &self,
        attachment: &SocketAttachment,
        query: Option<&GripQuery>,
        ignore_only_snap_mesh: bool,
    ) -> Transform {
        if self.only_snap_mesh && !ignore_only_snap_mesh {
            return query
                .and_then(|q| q.controller_pivot)
                .unwrap_or_else(Transform::identity);
        }

        let Some(query) = query else {
            return attachment.world();
        };

        if self.needs_mirroring(query.hand) {
            let mut relative = attachment
                .relative
                .mirror(self.mirror_axis.to_spatial(), self.cross_axis());
            if self.only_flip_rotation {
                relative.translation = attachment.relative.translation;
            }
            return relative * attachment.parent_world;
        }

        attachment.world()
    }
}
