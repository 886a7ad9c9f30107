//! Difficulty evaluation as seen by a level optimizer.
use log::{debug, error, warn};
use rayon::ThreadPool;

use crate::config::EvaluatorConfig;
use crate::consistency::check_consistency;
use crate::deadline::Deadline;
use crate::error::{EvalError, OracleError};
use crate::level_source::{LevelSource, map_slice_to_unit};
use crate::moves::MoveSequence;
use crate::oracle::{Actor, ReplayOracle};
use crate::outcome::Replay;
use crate::score::{DifficultyScorer, Evaluation};

/// Records a playthrough with `actor` and scores it.
///
/// Owns the window-search worker pool, so build one evaluator and reuse it
/// across levels.
pub struct DifficultyEvaluator<O: ReplayOracle> {
    oracle: O,
    config: EvaluatorConfig,
    actor: Actor,
    pool: ThreadPool,
}

impl<O: ReplayOracle> std::fmt::Debug for DifficultyEvaluator<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DifficultyEvaluator")
            .field("config", &self.config)
            .field("actor", &self.actor.name())
            .finish_non_exhaustive()
    }
}

impl<O: ReplayOracle> DifficultyEvaluator<O> {
    /// # Errors
    ///
    /// Returns [`EvalError::Config`] for an invalid configuration and
    /// [`EvalError::WorkerPool`] if the worker threads cannot be spawned.
    pub fn new(oracle: O, config: EvaluatorConfig) -> Result<Self, EvalError> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_concurrency)
            .thread_name(|index| format!("jumpwin-window-{index}"))
            .build()?;
        Ok(Self {
            oracle,
            config,
            actor: Actor::Human,
            pool,
        })
    }

    /// Who records the playthrough; [`Actor::Human`] unless set.
    #[must_use]
    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = actor;
        self
    }

    #[must_use]
    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    #[must_use]
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Record, optionally self-check, and score a playthrough of `level`.
    ///
    /// # Errors
    ///
    /// Every [`EvalError`]; see [`EvalError::severity`] for how to treat them.
    pub fn try_evaluate(&self, level: &O::Level) -> Result<Evaluation, EvalError> {
        let deadline = Deadline::start(self.config.timeout());
        let replay = self.oracle.simulate(level, &self.actor, false)?;
        let original = replay.outcome;
        debug!(
            "{} finished after {} frames: {original}",
            self.actor.name(),
            replay.frames
        );
        let moves = self.recorded_moves(replay)?;

        if self.config.consistency_checks {
            check_consistency(
                &self.oracle,
                level,
                &moves,
                original.is_win(),
                self.config.consistency_replays,
            )?;
        }

        DifficultyScorer::new(&self.oracle, &self.config, &self.pool).score(
            level,
            &moves,
            original,
            &deadline,
        )
    }

    /// Objective value for `level`, or NaN when no score can be produced.
    #[must_use]
    pub fn evaluate(&self, level: &O::Level) -> f64 {
        match self.try_evaluate(level) {
            Ok(evaluation) => evaluation.objective,
            Err(err) => {
                if err.is_fatal() {
                    error!("evaluation failed: {err}");
                } else {
                    warn!("evaluation scored NaN: {err}");
                }
                f64::NAN
            }
        }
    }

    /// Decode `latent` through `source` and evaluate the result. Each
    /// coordinate is squashed into (-1, 1) first.
    pub fn evaluate_latent<S>(&self, source: &mut S, latent: &[f64]) -> f64
    where
        S: LevelSource<Level = O::Level>,
    {
        match source.decode_level(&map_slice_to_unit(latent)) {
            Ok(level) => self.evaluate(&level),
            Err(err) => {
                warn!("level decoding failed, scoring NaN: {err}");
                f64::NAN
            }
        }
    }

    fn recorded_moves(&self, replay: Replay) -> Result<MoveSequence, OracleError> {
        if let Some(recorded) = replay.recorded {
            return Ok(recorded);
        }
        match &self.actor {
            Actor::Forced(forced) if !forced.moves().is_empty() => Ok((0..replay.frames)
                .filter_map(|tick| forced.action_at(tick).cloned())
                .collect()),
            _ => Err(OracleError::MissingRecording),
        }
    }
}
