//! Turning window-search results and failed runs into one difficulty value.
use log::{debug, info, warn};
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};

use crate::action::Button;
use crate::config::EvaluatorConfig;
use crate::deadline::Deadline;
use crate::error::EvalError;
use crate::moves::MoveSequence;
use crate::numbers::{count_to_f64, ratio, usize_to_f64};
use crate::oracle::{ReplayOracle, replay_outcome};
use crate::outcome::Outcome;
use crate::prune::prune_redundant_jumps;
use crate::segment::segment_jumps_checked;
use crate::window::{SearchLimits, WindowReport, WindowSearch, WindowStrategy};

pub const ENEMY_PENALTY: f64 = -5.0;
pub const FALL_PENALTY: f64 = -6.0;
pub const TIMEOUT_PENALTY: f64 = -7.0;
pub const UNREPRODUCIBLE_PENALTY: f64 = 0.0;

/// Pair-counting difficulty of a jump-free completion: `i32::MAX / 1`.
pub const PAIR_COUNTING_NO_JUMPS: f64 = 2_147_483_647.0;
/// Start-counting difficulty of a jump-free completion: the reciprocal of an
/// unbounded average.
pub const START_COUNTING_NO_JUMPS: f64 = 0.0;

/// Why a playthrough was scored by penalty instead of by window search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    DiedToEnemy,
    DiedToFall,
    TimedOut,
    /// Won once, then lost replaying the exact same moves.
    Unreproducible,
}

impl FailureCause {
    #[must_use]
    pub const fn penalty(self) -> f64 {
        match self {
            FailureCause::DiedToEnemy => ENEMY_PENALTY,
            FailureCause::DiedToFall => FALL_PENALTY,
            FailureCause::TimedOut => TIMEOUT_PENALTY,
            FailureCause::Unreproducible => UNREPRODUCIBLE_PENALTY,
        }
    }

    /// Cause for a run that ended with `outcome`; `None` for a win.
    #[must_use]
    pub const fn from_outcome(outcome: Outcome) -> Option<Self> {
        match outcome {
            Outcome::Win => None,
            Outcome::DiedToEnemy => Some(FailureCause::DiedToEnemy),
            Outcome::DiedToFall => Some(FailureCause::DiedToFall),
            Outcome::TimedOut => Some(FailureCause::TimedOut),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            FailureCause::DiedToEnemy => "died_to_enemy",
            FailureCause::DiedToFall => "died_to_fall",
            FailureCause::TimedOut => "timed_out",
            FailureCause::Unreproducible => "unreproducible",
        }
    }
}

/// Value handed to a minimizing optimizer.
#[must_use]
pub fn objective(difficulty: f64) -> f64 {
    -difficulty
}

/// Collapse a window report into a difficulty value.
///
/// Pair counting yields `valid / total`; start counting yields the reciprocal
/// of the average number of feasible starts per jump.
///
/// # Errors
///
/// Returns [`EvalError::NoFeasibleStarts`] when start counting finds no
/// feasible start for any of at least one jump. The bounds stop one frame
/// short of the neighbours, so a jump recorded tight against them can leave
/// a completed level with nothing to count; the error is not fatal.
pub fn difficulty_from_report(report: &WindowReport) -> Result<f64, EvalError> {
    match report {
        WindowReport::NoJumps {
            strategy: WindowStrategy::PairCounting,
        } => Ok(PAIR_COUNTING_NO_JUMPS),
        WindowReport::NoJumps {
            strategy: WindowStrategy::StartCounting,
        } => Ok(START_COUNTING_NO_JUMPS),
        WindowReport::Pairs { .. } => {
            let totals = report.pair_totals().unwrap_or_default();
            Ok(ratio(totals.valid, totals.total).unwrap_or_else(|| {
                warn!("no candidate windows fit between the jumps, scoring 0");
                0.0
            }))
        }
        WindowReport::Starts { per_jump } => {
            let feasible = report.feasible_starts().unwrap_or_default();
            if feasible == 0 {
                return Err(EvalError::NoFeasibleStarts {
                    jumps: per_jump.len(),
                });
            }
            let average = count_to_f64(feasible) / usize_to_f64(per_jump.len());
            Ok(1.0 / average)
        }
    }
}

/// Full breakdown of one scored playthrough.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub original: Outcome,
    pub reproducible: bool,
    pub jumps_found: usize,
    pub jumps_pruned: usize,
    pub window: Option<WindowReport>,
    pub failure: Option<FailureCause>,
    /// Pre-negation difficulty.
    pub difficulty: f64,
    pub objective: f64,
}

impl Evaluation {
    fn penalized(original: Outcome, cause: FailureCause) -> Self {
        let difficulty = cause.penalty();
        Self {
            original,
            reproducible: false,
            jumps_found: 0,
            jumps_pruned: 0,
            window: None,
            failure: Some(cause),
            difficulty,
            objective: objective(difficulty),
        }
    }
}

/// Scores a recorded playthrough against its level.
pub struct DifficultyScorer<'a, O: ReplayOracle + ?Sized> {
    oracle: &'a O,
    config: &'a EvaluatorConfig,
    pool: &'a ThreadPool,
}

impl<'a, O: ReplayOracle + ?Sized> DifficultyScorer<'a, O> {
    pub fn new(oracle: &'a O, config: &'a EvaluatorConfig, pool: &'a ThreadPool) -> Self {
        Self {
            oracle,
            config,
            pool,
        }
    }

    /// Penalize a failed or unreproducible run, otherwise segment, prune and
    /// search windows for `moves`.
    ///
    /// # Errors
    ///
    /// Structural segmentation and search failures, oracle failures, and
    /// [`EvalError::Inconclusive`] once `deadline` is spent.
    pub fn score(
        &self,
        level: &O::Level,
        moves: &MoveSequence,
        original: Outcome,
        deadline: &Deadline,
    ) -> Result<Evaluation, EvalError> {
        if let Some(cause) = FailureCause::from_outcome(original) {
            info!("recorded run ended with {original}, penalty {}", cause.penalty());
            return Ok(Evaluation::penalized(original, cause));
        }

        deadline.check()?;
        let replayed = replay_outcome(self.oracle, level, moves.clone())?;
        if !replayed.is_win() {
            warn!(
                "recorded win {:016x} replayed as {replayed}; timing too tight to reproduce",
                moves.fingerprint()
            );
            return Ok(Evaluation::penalized(original, FailureCause::Unreproducible));
        }

        let jumps = segment_jumps_checked(moves, self.config.check_separation)?;
        let jumps_found = jumps.len();
        debug!("jump strip {}", moves.view(Button::Jump));
        debug!("found {jumps_found} jumps");

        let pruned = prune_redundant_jumps(self.oracle, level, moves.clone(), jumps, deadline)?;
        debug!(
            "{} jumps necessary after pruning {}",
            pruned.jumps.len(),
            pruned.removed
        );

        let limits = SearchLimits {
            max_hold_frames: self.config.max_hold_frames,
            verify_original_window: self.config.verify_original_window,
        };
        let report = WindowSearch::new(self.oracle, level, &pruned.moves, &pruned.jumps)
            .with_deadline(*deadline)
            .run(self.config.strategy, limits, self.pool)?;
        let difficulty = difficulty_from_report(&report)?;
        info!(
            "{} difficulty {difficulty} over {} jumps",
            self.config.strategy,
            report.jumps()
        );

        Ok(Evaluation {
            original,
            reproducible: true,
            jumps_found,
            jumps_pruned: pruned.removed,
            window: Some(report),
            failure: None,
            difficulty,
            objective: objective(difficulty),
        })
    }
}
