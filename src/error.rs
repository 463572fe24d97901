//! Error types shared by the pose and placement entry points.
//!
//! "Nothing found" is never an error here: registry queries return `Option` / empty `Vec`.
//! Only a descriptor whose asset handles no longer resolve produces a failure.

use std::fmt;

/// The kind of external asset a hand socket depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Animation,
    Skeleton,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Animation => f.write_str("animation"),
            AssetKind::Skeleton => f.write_str("skeleton"),
        }
    }
}

/// Errors produced by hand socket operations.
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    /// The asset was never assigned, or has been unloaded since. Callers should skip this socket
    /// and try the next candidate.
    #[error("{asset} asset of hand socket '{socket}' is not assigned or is no longer loaded")]
    MissingAsset { asset: AssetKind, socket: String },

    #[error("Invalid hand socket configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SocketError>;
