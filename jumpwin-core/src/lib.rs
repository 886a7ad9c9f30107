//! Jumpwin Core
//!
//! Estimates how hard a platformer level is from one recorded playthrough by
//! measuring how far each necessary jump can be moved and still win.
//! The level simulator stays behind the [`ReplayOracle`] trait; this crate
//! never models physics.

pub mod action;
pub mod config;
pub mod consistency;
pub mod deadline;
pub mod error;
pub mod evaluator;
pub mod level_source;
pub mod moves;
pub mod numbers;
pub mod oracle;
pub mod outcome;
pub mod prune;
pub mod score;
pub mod segment;
pub mod window;

// Re-export commonly used types
pub use action::{ActionVector, Button, NAMED_BUTTONS};
pub use config::{ConfigError, EvaluatorConfig};
pub use consistency::check_consistency;
pub use deadline::Deadline;
pub use error::{EvalError, OracleError, Severity};
pub use evaluator::DifficultyEvaluator;
pub use level_source::{LevelSource, LevelSourceError, LineLevelSource, map_to_unit};
pub use moves::MoveSequence;
pub use oracle::{
    Actor, FnOracle, ForcedActions, ReplayOracle, can_complete, forward_forced,
    forward_jumping_forced, replay_outcome,
};
pub use outcome::{Outcome, Replay, TerminalFlags, UnknownTerminalState};
pub use prune::{PruneResult, prune_redundant_jumps};
pub use score::{DifficultyScorer, Evaluation, FailureCause, difficulty_from_report, objective};
pub use segment::{
    JumpInterval, SegmentError, check_separation, jump_flags_from_intervals, segment_jumps,
    segment_jumps_checked,
};
pub use window::{
    PairTally, SearchLimits, StartTally, WindowBounds, WindowReport, WindowSearch, WindowStrategy,
    window_bounds,
};
