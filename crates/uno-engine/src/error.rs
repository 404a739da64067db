use std::fmt;

use crate::backend::BackendError;
use crate::handle::TextureHandle;

/// Errors surfaced by the handle and frame APIs.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Every registry slot is live. Release handles or raise `max_handles`.
    OutOfCapacity { capacity: usize },
    /// Stale, never-issued or already-destroyed handle.
    InvalidHandle(TextureHandle),
    /// The backend could not create the resource; no slot was kept.
    BackendResourceCreationFailed(BackendError),
    /// `submit`/`end_frame` outside of `begin_frame` .. `end_frame`.
    NotRecording,
    /// `begin_frame` while a frame is already being recorded.
    FrameInProgress,
    /// The backend failed to begin or end the frame's pass.
    Backend(BackendError),
    InvalidConfig(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfCapacity { capacity } => {
                write!(f, "handle registry exhausted ({capacity} live handles)")
            }
            Self::InvalidHandle(h) => write!(f, "invalid texture handle {h:?}"),
            Self::BackendResourceCreationFailed(err) => {
                write!(f, "backend resource creation failed: {err}")
            }
            Self::NotRecording => f.write_str("no frame is being recorded"),
            Self::FrameInProgress => f.write_str("a frame is already being recorded"),
            Self::Backend(err) => write!(f, "backend error: {err}"),
            Self::InvalidConfig(msg) => write!(f, "invalid renderer config: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::BackendResourceCreationFailed(err) | Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}
