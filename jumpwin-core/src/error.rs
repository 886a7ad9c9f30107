//! Failure taxonomy for difficulty evaluation.
use std::time::Duration;

use thiserror::Error;

use crate::action::Button;
use crate::config::ConfigError;
use crate::outcome::{TerminalFlags, UnknownTerminalState};
use crate::segment::{JumpInterval, SegmentError};

/// Failures raised by a replay oracle implementation.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("simulator unavailable: {0}")]
    Unavailable(String),
    #[error("level rejected by simulator: {0}")]
    MalformedLevel(String),
    #[error("{actor} cannot drive this simulator")]
    UnsupportedActor { actor: &'static str },
    #[error("simulator did not echo the moves it applied")]
    MissingRecording,
    #[error(transparent)]
    UnknownTerminal(#[from] UnknownTerminalState),
    #[error("simulator I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Which handling path an [`EvalError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Segmentation bug or malformed oracle response; never repaired.
    Structural,
    /// Oracle ended a run in a state outside the known causes.
    UnknownTerminal,
    /// Oracle could not produce a usable outcome; scored as NaN.
    Oracle,
    /// Caller deadline elapsed; partial counts are discarded.
    Inconclusive,
    /// Completed run the selected window strategy cannot put a number on.
    Unscorable,
}

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("inconsistent jump segmentation: {0}")]
    Segment(#[from] SegmentError),
    #[error("unmapped terminal state {flags:?} for a run that was not won")]
    UnknownTerminalState { flags: TerminalFlags },
    #[error("replay oracle failed: {0}")]
    Oracle(OracleError),
    #[error("evaluation exceeded its {limit:?} budget")]
    Inconclusive { limit: Duration },
    #[error("replaying the unmodified window {interval} of jump {jump} failed")]
    OriginalWindowRejected { jump: usize, interval: JumpInterval },
    #[error("none of {jumps} jumps has a feasible start inside its window bounds")]
    NoFeasibleStarts { jumps: usize },
    #[error(
        "replay applied different moves: {expected} frames sent, {actual} applied, first divergence at frame {frame:?} on {buttons:?}"
    )]
    PlaybackMismatch {
        expected: usize,
        actual: usize,
        frame: Option<usize>,
        buttons: Vec<Button>,
    },
    #[error("identical moves produced both wins and losses across {replays} replays")]
    InconsistentReplay { replays: usize },
    #[error("replays consistently {observed} although the recorded run {expected}")]
    UnexpectedCompletion {
        expected: &'static str,
        observed: &'static str,
    },
    #[error("invalid evaluator configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to start window-search workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl From<OracleError> for EvalError {
    fn from(err: OracleError) -> Self {
        match err {
            OracleError::UnknownTerminal(UnknownTerminalState { flags }) => {
                EvalError::UnknownTerminalState { flags }
            }
            other => EvalError::Oracle(other),
        }
    }
}

impl EvalError {
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            EvalError::UnknownTerminalState { .. } => Severity::UnknownTerminal,
            EvalError::Oracle(_) => Severity::Oracle,
            EvalError::Inconclusive { .. } => Severity::Inconclusive,
            EvalError::NoFeasibleStarts { .. } => Severity::Unscorable,
            EvalError::Segment(_)
            | EvalError::OriginalWindowRejected { .. }
            | EvalError::PlaybackMismatch { .. }
            | EvalError::InconsistentReplay { .. }
            | EvalError::UnexpectedCompletion { .. }
            | EvalError::Config(_)
            | EvalError::WorkerPool(_) => Severity::Structural,
        }
    }

    /// Whether this error should stop a long-running search.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.severity(),
            Severity::Structural | Severity::UnknownTerminal
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_terminal_from_oracle_is_lifted() {
        let err = EvalError::from(OracleError::from(UnknownTerminalState {
            flags: TerminalFlags::default(),
        }));
        assert!(matches!(err, EvalError::UnknownTerminalState { .. }));
        assert_eq!(err.severity(), Severity::UnknownTerminal);
        assert!(err.is_fatal());
    }

    #[test]
    fn io_failures_are_not_fatal() {
        let err = EvalError::from(OracleError::Unavailable("pipe closed".to_string()));
        assert_eq!(err.severity(), Severity::Oracle);
        assert!(!err.is_fatal());
    }

    #[test]
    fn missing_feasible_starts_are_not_fatal() {
        let err = EvalError::NoFeasibleStarts { jumps: 1 };
        assert_eq!(err.severity(), Severity::Unscorable);
        assert!(!err.is_fatal());
    }

    #[test]
    fn segmentation_errors_are_structural() {
        let err = EvalError::from(SegmentError::PressReleaseMismatch {
            presses: 2,
            releases: 1,
        });
        assert_eq!(err.severity(), Severity::Structural);
    }
}
