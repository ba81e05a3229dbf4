//! The consumed back-end contract and the verification error model.
//!
//! A back-end is an external solver-driven verifier. The orchestrator relies
//! on nothing beyond [`Backend`]: an identity string (part of the cache key),
//! `verify`, and `stop`.

use serde::{Deserialize, Serialize};
use std::fmt;
use vero_ast::Program;
use vero_core::Position;

/// The error classes a back-end can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AssignmentFailed,
    CallFailed,
    PreconditionViolated,
    PostconditionViolated,
    LoopInvariantNotPreserved,
    LoopInvariantNotEstablished,
    FoldFailed,
    UnfoldFailed,
    PackageFailed,
    ApplyFailed,
    AssertFailed,
    InhaleFailed,
    ExhaleFailed,
    TerminationFailed,
    FunctionNotWellformed,
    PredicateNotWellformed,
    MagicWandNotWellformed,
    HeuristicsFailed,
    Internal,
    /// An error carrying a counterexample model from the solver.
    Counterexample,
}

/// A solver counterexample: variable assignments rendered by the back-end.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Counterexample {
    pub model: Vec<(String, String)>,
}

/// A single verification error as produced by a back-end.
///
/// `pos` is the position of the offending node and `reason_pos` the position
/// of the node the failure reason points at (e.g. the permission that was
/// missing). `cached` distinguishes replayed cache hits from fresh back-end
/// output and is `false` on everything a back-end returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationError {
    pub kind: ErrorKind,
    pub message: String,
    pub reason: String,
    pub pos: Position,
    pub reason_pos: Position,
    #[serde(default)]
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterexample: Option<Counterexample>,
}

impl VerificationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, pos: Position) -> Self {
        Self {
            kind,
            message: message.into(),
            reason: String::new(),
            pos,
            reason_pos: Position::Unknown,
            cached: false,
            counterexample: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>, reason_pos: Position) -> Self {
        self.reason = reason.into();
        self.reason_pos = reason_pos;
        self
    }

    pub fn with_counterexample(mut self, counterexample: Counterexample) -> Self {
        self.counterexample = Some(counterexample);
        self
    }

    /// Pure with-field update marking the error as replayed from the cache.
    /// Idempotent.
    pub fn set_cached(mut self) -> Self {
        self.cached = true;
        self
    }
}

impl fmt::Display for VerificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.pos, self.message)?;
        if !self.reason.is_empty() {
            write!(f, " ({})", self.reason)?;
        }
        Ok(())
    }
}

/// Outcome of a back-end run over one program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VerificationResult {
    Success,
    Failure { errors: Vec<VerificationError> },
}

impl VerificationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn errors(&self) -> &[VerificationError] {
        match self {
            Self::Success => &[],
            Self::Failure { errors } => errors,
        }
    }
}

/// Failures of the back-end itself, as opposed to verification errors it
/// reports about the program.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend rejected its arguments: {0}")]
    InvalidArguments(String),
    #[error("backend failed: {0}")]
    Internal(String),
}

/// The consumed verifier contract.
pub trait Backend: Send {
    /// Identity string; part of every cache key produced under this backend.
    fn id(&self) -> &str;

    fn verify(&mut self, program: &Program) -> Result<VerificationResult, BackendError>;

    /// Release solver resources. Called once after the job completes.
    fn stop(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_cached_is_idempotent() {
        let err = VerificationError::new(
            ErrorKind::AssertFailed,
            "assertion might fail",
            Position::point(3, 5),
        );
        let once = err.clone().set_cached();
        let twice = once.clone().set_cached();
        assert!(once.cached);
        assert_eq!(once, twice);
    }

    #[test]
    fn counterexample_errors_carry_their_model() {
        let err = VerificationError::new(
            ErrorKind::Counterexample,
            "assertion refuted",
            Position::point(2, 2),
        )
        .with_counterexample(Counterexample {
            model: vec![("x".into(), "0".into())],
        });
        assert_eq!(
            err.counterexample.expect("model attached").model,
            vec![("x".to_string(), "0".to_string())]
        );
    }

    #[test]
    fn fresh_errors_are_not_cached() {
        let err = VerificationError::new(ErrorKind::ExhaleFailed, "exhale", Position::point(1, 1));
        assert!(!err.cached);
    }
}
