//! Error types for chain construction and execution.
//!
//! All fallible engine operations return [`ChainError`]. The variants fall
//! into three kinds (see [`ErrorKind`]): topology errors surface at link or
//! info-sync time, sequence errors surface when lifecycle operations run out
//! of order, and the shutdown signal is the defined outcome of pulling from
//! a parallel stage after it has been stopped.

use crate::module::State;

/// Errors that can occur while building or running a module chain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// A backward slot that holds at most one module is already occupied.
    #[error("backward slot already occupied")]
    BackwardOccupied,

    /// A chain operation was invoked on a node with no backward module.
    #[error("no backward module linked")]
    MissingBackward,

    /// Buffers or declared module shapes disagree (mix-down inputs must match).
    #[error(
        "shape mismatch: expected {expected_channels}ch x {expected_frames} frames, \
         got {channels}ch x {frames} frames"
    )]
    ShapeMismatch {
        /// Channel count declared by the first input.
        expected_channels: usize,
        /// Frame count declared by the first input.
        expected_frames: usize,
        /// Channel count of the offending input.
        channels: usize,
        /// Frame count of the offending input.
        frames: usize,
    },

    /// A lifecycle transition attempted to move a module's state backward.
    #[error("invalid state transition {from:?} -> {to:?}")]
    InvalidTransition {
        /// State the module was in.
        from: State,
        /// State the transition requested.
        to: State,
    },

    /// An operation required a state the module is not in
    /// (e.g. `meta_process` before `meta_start`).
    #[error("operation requires state {required:?}, module is {actual:?}")]
    NotInState {
        /// Minimum state the operation requires.
        required: State,
        /// State the module is actually in.
        actual: State,
    },

    /// A backward module completed `meta_process` without leaving a buffer.
    #[error("backward module produced no buffer")]
    MissingBuffer,

    /// The parallel stage has shut down and its queue is drained; no further
    /// buffers will be produced until it is started again.
    #[error("parallel stage has shut down; no further buffers")]
    Shutdown,
}

/// Coarse classification of a [`ChainError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Linking or shape errors, detectable before processing starts.
    Topology,
    /// Lifecycle operations invoked out of order. Recoverable by
    /// re-establishing the correct order; module state is not corrupted.
    Sequence,
    /// The recoverable "no data after shutdown" signal from a parallel stage.
    Shutdown,
}

impl ChainError {
    /// Returns which of the three error kinds this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BackwardOccupied
            | Self::MissingBackward
            | Self::ShapeMismatch { .. }
            | Self::MissingBuffer => ErrorKind::Topology,
            Self::InvalidTransition { .. } | Self::NotInState { .. } => ErrorKind::Sequence,
            Self::Shutdown => ErrorKind::Shutdown,
        }
    }
}

/// Convenience result type for chain operations.
pub type Result<T> = core::result::Result<T, ChainError>;
