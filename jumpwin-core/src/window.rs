//! Exhaustive search over alternative timing windows for each necessary jump.
use log::{debug, info, trace};
use rayon::ThreadPool;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::deadline::Deadline;
use crate::error::EvalError;
use crate::moves::MoveSequence;
use crate::oracle::{ReplayOracle, can_complete};
use crate::segment::JumpInterval;

/// How feasible windows are counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowStrategy {
    /// Every (start, end) slot between the neighbouring jumps, hold-capped.
    #[default]
    PairCounting,
    /// Every start between the neighbouring jumps that admits at least one end.
    StartCounting,
}

impl WindowStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            WindowStrategy::PairCounting => "pair-counting",
            WindowStrategy::StartCounting => "start-counting",
        }
    }
}

impl std::fmt::Display for WindowStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Frames a relocated jump may occupy, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub lower: usize,
    pub upper: usize,
}

/// Bounds for jump `index`: one frame clear of the previous jump's release and
/// one frame short of the next jump's press; the sequence edges otherwise.
#[must_use]
pub fn window_bounds(jumps: &[JumpInterval], index: usize, frames: usize) -> WindowBounds {
    let lower = match index.checked_sub(1).and_then(|prev| jumps.get(prev)) {
        Some(previous) => previous.end + 1,
        None => 0,
    };
    let upper = match jumps.get(index + 1) {
        Some(next) => next.start.saturating_sub(1),
        None => frames.saturating_sub(1),
    };
    WindowBounds { lower, upper }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairTally {
    pub valid: u64,
    pub total: u64,
}

impl PairTally {
    fn record(&mut self, won: bool) {
        self.valid += u64::from(won);
        self.total += 1;
    }
}

impl std::ops::Add for PairTally {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            valid: self.valid + rhs.valid,
            total: self.total + rhs.total,
        }
    }
}

impl std::iter::Sum for PairTally {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, tally| acc + tally)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartTally {
    pub feasible: u64,
    pub tried: u64,
}

/// Per-jump results of a window search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowReport {
    Pairs { per_jump: Vec<PairTally> },
    Starts { per_jump: Vec<StartTally> },
    NoJumps { strategy: WindowStrategy },
}

impl WindowReport {
    #[must_use]
    pub fn strategy(&self) -> WindowStrategy {
        match self {
            WindowReport::Pairs { .. } => WindowStrategy::PairCounting,
            WindowReport::Starts { .. } => WindowStrategy::StartCounting,
            WindowReport::NoJumps { strategy } => *strategy,
        }
    }

    #[must_use]
    pub fn jumps(&self) -> usize {
        match self {
            WindowReport::Pairs { per_jump } => per_jump.len(),
            WindowReport::Starts { per_jump } => per_jump.len(),
            WindowReport::NoJumps { .. } => 0,
        }
    }

    /// Valid and total pairs across all jumps, for pair-counting reports.
    #[must_use]
    pub fn pair_totals(&self) -> Option<PairTally> {
        match self {
            WindowReport::Pairs { per_jump } => Some(per_jump.iter().copied().sum()),
            _ => None,
        }
    }

    /// Feasible starts across all jumps, for start-counting reports.
    #[must_use]
    pub fn feasible_starts(&self) -> Option<u64> {
        match self {
            WindowReport::Starts { per_jump } => Some(per_jump.iter().map(|t| t.feasible).sum()),
            _ => None,
        }
    }
}

/// Knobs for a single search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_hold_frames: usize,
    pub verify_original_window: bool,
}

#[derive(Debug, Clone, Copy)]
struct PairCandidate {
    index: usize,
    jump: JumpInterval,
    start: usize,
    end: usize,
}

#[derive(Debug, Clone, Copy)]
struct StartCandidate {
    index: usize,
    jump: JumpInterval,
    start: usize,
    upper: usize,
}

/// Read-only view of a pruned playthrough, shared by every window worker.
pub struct WindowSearch<'a, O: ReplayOracle + ?Sized> {
    oracle: &'a O,
    level: &'a O::Level,
    moves: &'a MoveSequence,
    jumps: &'a [JumpInterval],
    deadline: Deadline,
}

impl<'a, O: ReplayOracle + ?Sized> WindowSearch<'a, O> {
    pub fn new(
        oracle: &'a O,
        level: &'a O::Level,
        moves: &'a MoveSequence,
        jumps: &'a [JumpInterval],
    ) -> Self {
        Self {
            oracle,
            level,
            moves,
            jumps,
            deadline: Deadline::unbounded(),
        }
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    #[must_use]
    pub fn bounds(&self, index: usize) -> WindowBounds {
        window_bounds(self.jumps, index, self.moves.len())
    }

    /// Run `strategy` on `pool`.
    ///
    /// # Errors
    ///
    /// See [`WindowSearch::count_pairs`] and [`WindowSearch::count_starts`].
    pub fn run(
        &self,
        strategy: WindowStrategy,
        limits: SearchLimits,
        pool: &ThreadPool,
    ) -> Result<WindowReport, EvalError> {
        if self.jumps.is_empty() {
            return Ok(WindowReport::NoJumps { strategy });
        }
        match strategy {
            WindowStrategy::PairCounting => Ok(WindowReport::Pairs {
                per_jump: self.count_pairs(limits, pool)?,
            }),
            WindowStrategy::StartCounting => Ok(WindowReport::Starts {
                per_jump: self.count_starts(pool)?,
            }),
        }
    }

    /// Replay every `lower <= start < end <= upper` slot with
    /// `end - start <= max_hold_frames` and count the wins, per jump.
    ///
    /// # Errors
    ///
    /// Propagates oracle failures and the deadline. With
    /// `verify_original_window` set, an enumerated slot equal to the jump's
    /// own window that fails to win is [`EvalError::OriginalWindowRejected`].
    pub fn count_pairs(
        &self,
        limits: SearchLimits,
        pool: &ThreadPool,
    ) -> Result<Vec<PairTally>, EvalError> {
        let candidates = self.pair_candidates(limits.max_hold_frames);
        debug!(
            "pair search over {} jumps, {} candidate windows",
            self.jumps.len(),
            candidates.len()
        );

        let verdicts = pool.install(|| {
            candidates
                .par_iter()
                .map(|candidate| {
                    let won = self.judge_pair(candidate, limits)?;
                    Ok((candidate.index, won))
                })
                .collect::<Result<Vec<_>, EvalError>>()
        })?;

        let mut per_jump = vec![PairTally::default(); self.jumps.len()];
        for (index, won) in verdicts {
            per_jump[index].record(won);
        }
        for (index, tally) in per_jump.iter().enumerate() {
            debug!(
                "jump {index} {}: {}/{} windows complete the level",
                self.jumps[index], tally.valid, tally.total
            );
        }
        let totals: PairTally = per_jump.iter().copied().sum();
        info!("valid pairs {} of {}", totals.valid, totals.total);
        Ok(per_jump)
    }

    /// For every `lower <= start < upper`, check whether any
    /// `start < end < upper` wins, stopping at the first success.
    ///
    /// # Errors
    ///
    /// Propagates oracle failures and the deadline.
    pub fn count_starts(&self, pool: &ThreadPool) -> Result<Vec<StartTally>, EvalError> {
        let candidates = self.start_candidates();
        debug!(
            "start search over {} jumps, {} candidate starts",
            self.jumps.len(),
            candidates.len()
        );

        let verdicts = pool.install(|| {
            candidates
                .par_iter()
                .map(|candidate| {
                    let feasible = self.judge_start(candidate)?;
                    Ok((candidate.index, feasible))
                })
                .collect::<Result<Vec<_>, EvalError>>()
        })?;

        let mut per_jump = vec![StartTally::default(); self.jumps.len()];
        for (index, feasible) in verdicts {
            per_jump[index].feasible += u64::from(feasible);
            per_jump[index].tried += 1;
        }
        for (index, tally) in per_jump.iter().enumerate() {
            debug!(
                "jump {index} {} has {} feasible starts of {}",
                self.jumps[index], tally.feasible, tally.tried
            );
        }
        Ok(per_jump)
    }

    fn pair_candidates(&self, max_hold_frames: usize) -> Vec<PairCandidate> {
        let mut candidates = Vec::new();
        for (index, &jump) in self.jumps.iter().enumerate() {
            let WindowBounds { lower, upper } = self.bounds(index);
            debug!("jump {index} {jump} may move within [{lower}, {upper}]");
            for start in lower..=upper {
                let last_end = upper.min(start + max_hold_frames);
                for end in (start + 1)..=last_end {
                    candidates.push(PairCandidate {
                        index,
                        jump,
                        start,
                        end,
                    });
                }
            }
        }
        candidates
    }

    fn start_candidates(&self) -> Vec<StartCandidate> {
        let mut candidates = Vec::new();
        for (index, &jump) in self.jumps.iter().enumerate() {
            let WindowBounds { lower, upper } = self.bounds(index);
            debug!("jump {index} {jump} may start within [{lower}, {upper})");
            candidates.extend((lower..upper).map(|start| StartCandidate {
                index,
                jump,
                start,
                upper,
            }));
        }
        candidates
    }

    fn judge_pair(
        &self,
        candidate: &PairCandidate,
        limits: SearchLimits,
    ) -> Result<bool, EvalError> {
        let won = self.try_window(candidate.jump, candidate.start, candidate.end)?;
        trace!(
            "jump {} moved to [{}, {}): {}",
            candidate.index,
            candidate.start,
            candidate.end,
            if won { "succeeded" } else { "failed" }
        );
        let is_original =
            candidate.start == candidate.jump.start && candidate.end == candidate.jump.end;
        if !won && is_original && limits.verify_original_window {
            return Err(EvalError::OriginalWindowRejected {
                jump: candidate.index,
                interval: candidate.jump,
            });
        }
        Ok(won)
    }

    fn judge_start(&self, candidate: &StartCandidate) -> Result<bool, EvalError> {
        for end in (candidate.start + 1)..candidate.upper {
            if self.try_window(candidate.jump, candidate.start, end)? {
                trace!(
                    "jump {} can start at {} (ends at {end})",
                    candidate.index, candidate.start
                );
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn try_window(&self, jump: JumpInterval, start: usize, end: usize) -> Result<bool, EvalError> {
        self.deadline.check()?;
        let candidate = self.moves.with_jump_moved(jump, start, end);
        Ok(can_complete(self.oracle, self.level, candidate)?)
    }
}
