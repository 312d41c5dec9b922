//! Error Types
//!
//! This module defines the error types produced at the orchestrator's
//! trust boundary.
//!
//! # Overview
//!
//! Per the error-handling design, most failure categories never surface as
//! an [`OrchestratorError`] at all: module hook failures and async job
//! failures are captured as [`Diagnostic`](crate::orchestrator::diagnostics::Diagnostic)
//! records and logged, never propagated to the frame loop. [`OrchestratorError`]
//! exists for the failures that *do* abort the frame loop: fatal invariant
//! violations detected at a barrier, and construction-time misuse
//! (duplicate module registration, an out-of-range phase).
//!
//! All public APIs that can fail return [`Result<T>`].

use thiserror::Error;

/// The orchestrator's error type.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Two modules were registered with the same name.
    #[error("duplicate module name: {0}")]
    DuplicateModule(String),

    /// A phase index fell outside the canonical pipeline sequence.
    #[error("phase index out of range: {0}")]
    PhaseOutOfRange(u8),

    /// An engine-state mutation was attempted without a capability token.
    ///
    /// Only ever constructed in debug builds; release builds perform a
    /// silent no-op with a warning diagnostic instead (see spec §7).
    #[error("attempted capability-gated mutation without a token: {0}")]
    CapabilityMisuse(String),

    /// An invariant the barrier contract depends on was violated (e.g. a
    /// snapshot was not published before `ParallelWork` began).
    #[error("fatal orchestrator invariant violated: {0}")]
    FatalInvariantViolation(String),

    /// A spawned task could not be joined (panicked or was cancelled
    /// unexpectedly).
    #[error("task join error: {0}")]
    TaskJoinError(String),
}

impl From<tokio::task::JoinError> for OrchestratorError {
    fn from(err: tokio::task::JoinError) -> Self {
        OrchestratorError::TaskJoinError(err.to_string())
    }
}

/// Alias for `Result<T, OrchestratorError>`.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
