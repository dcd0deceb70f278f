//! Error types for the animation runtime.

use std::any::Any;

use thiserror::Error;

use crate::types::NodeId;

/// Result type for animation operations.
pub type Result<T> = std::result::Result<T, AnimationError>;

/// Errors surfaced by the animation runtime.
///
/// `Cancelled` and `CallbackPanicked` are only ever delivered through a
/// deferred result's rejection channel; `InvalidDuration` is returned when an
/// animation is constructed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// The animation was stopped without finishing.
    #[error("animation on `{target}` was cancelled")]
    Cancelled { target: NodeId },

    /// The frame callback panicked; the animation was abandoned.
    #[error("frame callback for `{target}` panicked: {message}")]
    CallbackPanicked { target: NodeId, message: String },

    /// Durations must be finite and strictly positive.
    #[error("invalid animation duration: {0}ms")]
    InvalidDuration(f64),
}

impl AnimationError {
    /// The target the rejection refers to, if any.
    pub fn target(&self) -> Option<&NodeId> {
        match self {
            Self::Cancelled { target } | Self::CallbackPanicked { target, .. } => Some(target),
            Self::InvalidDuration(_) => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
