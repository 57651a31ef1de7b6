//! Session controller errors.

use thiserror::Error;

use crate::alarm::SessionError;
use crate::position::PositionError;

/// Errors returned by [`SessionController`](super::SessionController).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControllerError {
    /// The state machine refused the transition.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The position source could not serve the request.
    #[error(transparent)]
    Position(#[from] PositionError),

    /// No position source was supplied to the builder.
    #[error("A position source is required")]
    MissingSource,

    /// The controller was built outside a Tokio runtime.
    #[error("No Tokio runtime available: {0}")]
    NoRuntime(String),
}
