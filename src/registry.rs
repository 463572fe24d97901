//! Scene-wide hand socket queries.
//!
//! Every query walks the full scene enumeration, so it scales with the number of sockets in the
//! scene. Do not run these every frame; cache the results across frames instead.

use std::sync::Arc;

use nalgebra::{UnitQuaternion, Vector3};
use tracing::trace;

use crate::placement::SocketAttachment;
use crate::socket::HandSocket;
use crate::transform::Transform;

/// A live socket instance as reported by the scene.
#[derive(Debug, Clone)]
pub struct SceneSocket {
    /// Identifier of the object the socket is attached to.
    pub owner: String,
    /// Name of the socket on its owner.
    pub name: String,
    pub socket: Arc<HandSocket>,
    pub attachment: SocketAttachment,
}

impl SceneSocket {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        socket: Arc<HandSocket>,
        attachment: SocketAttachment,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            socket,
            attachment,
        }
    }

    pub fn world_transform(&self) -> Transform {
        self.attachment.world()
    }

    pub fn location(&self) -> Vector3<f32> {
        self.world_transform().translation
    }
}

/// Scene enumeration service: every live socket with its current placement.
pub trait SceneEnumerator {
    fn sockets(&self) -> Vec<SceneSocket>;
}

impl SceneEnumerator for Vec<SceneSocket> {
    fn sockets(&self) -> Vec<SceneSocket> {
        self.clone()
    }
}

/// Query layer over an injected scene.
#[derive(Debug, Clone)]
pub struct SocketRegistry<S> {
    scene: S,
}

impl<S: SceneEnumerator> SocketRegistry<S> {
    pub fn new(scene: S) -> Self {
        Self { scene }
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// All sockets that are not disabled, in scene order.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn find_all_enabled(&self) -> Vec<SceneSocket> {
        self.scene
            .sockets()
            .into_iter()
            .filter(|s| !s.socket.disabled)
            .collect()
    }

    /// Enabled sockets within reach of `origin`.
    ///
    /// Each socket uses its `override_distance` when positive, `radius` otherwise. Sockets marked
    /// `always_in_range` are included at any distance.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn find_all_in_range(&self, origin: &Vector3<f32>, radius: f32) -> Vec<SceneSocket> {
        self.find_all_enabled()
            .into_iter()
            .filter(|s| is_in_range(s, origin, radius))
            .collect()
    }

    /// The nearest socket in range, or `None`.
    ///
    /// Equal distances keep the socket enumerated first. When both tied sockets have
    /// `match_rotation` set and a `reference` orientation is given, the one whose world rotation
    /// is closest to `reference` wins instead.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn find_closest_in_range(
        &self,
        origin: &Vector3<f32>,
        radius: f32,
        reference: Option<&UnitQuaternion<f32>>,
    ) -> Option<SceneSocket> {
        let mut best: Option<(f32, SceneSocket)> = None;

        for candidate in self.find_all_in_range(origin, radius) {
            let distance = (candidate.location() - origin).norm_squared();
            let replace = match &best {
                None => true,
                Some((best_distance, current)) if distance == *best_distance => {
                    match reference {
                        Some(reference)
                            if candidate.socket.match_rotation && current.socket.match_rotation =>
                        {
                            rotation_gap(&candidate, reference) < rotation_gap(current, reference)
                        }
                        _ => false,
                    }
                }
                Some((best_distance, _)) => distance < *best_distance,
            };

            if replace {
                trace!(owner = %candidate.owner, socket = %candidate.name, distance, "new closest socket");
                best = Some((distance, candidate));
            }
        }

        best.map(|(_, socket)| socket)
    }

    /// The enabled or disabled socket called `name` on `owner`.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn find_on_owner(&self, owner: &str, name: &str) -> Option<SceneSocket> {
        self.scene
            .sockets()
            .into_iter()
            .find(|s| s.owner == owner && s.name == name)
    }

    /// Enabled sockets answering to the grip type `prefix`.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn find_by_slot_prefix(&self, prefix: &str) -> Vec<SceneSocket> {
        self.find_all_enabled()
            .into_iter()
            .filter(|s| s.socket.slot_prefix == prefix)
            .collect()
    }
}

fn is_in_range(socket: &SceneSocket, origin: &Vector3<f32>, radius: f32) -> bool {
    if socket.socket.always_in_range {
        return true;
    }
    let reach = socket.socket.effective_distance(radius);
    (socket.location() - origin).norm_squared() <= reach * reach
}

fn rotation_gap(socket: &SceneSocket, reference: &UnitQuaternion<f32>) -> f32 {
    socket.world_transform().rotation.angle_to(reference)
}
