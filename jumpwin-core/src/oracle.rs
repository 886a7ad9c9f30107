//! The replay oracle boundary and the strategies that can drive it.
use std::marker::PhantomData;

use crate::action::{ActionVector, Button};
use crate::error::OracleError;
use crate::moves::MoveSequence;
use crate::outcome::{Outcome, Replay};

/// A deterministic level simulator.
///
/// Each call runs a fresh simulation; identical inputs are expected to give
/// identical outcomes. Implementations are shared across window-search
/// workers, hence the `Sync` bound.
pub trait ReplayOracle: Sync {
    type Level: Sync;

    /// Play `level` to completion with `actor` at the controls.
    ///
    /// # Errors
    ///
    /// Returns an [`OracleError`] when the simulator cannot produce an outcome.
    fn simulate(
        &self,
        level: &Self::Level,
        actor: &Actor,
        render: bool,
    ) -> Result<Replay, OracleError>;
}

/// Who is at the controls for one oracle call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// Interactive player; the simulator records what they press.
    Human,
    /// The simulator's own search-based agent.
    SearchAgent,
    /// Replays a fixed move list.
    Forced(ForcedActions),
}

impl Actor {
    #[must_use]
    pub fn forced(moves: MoveSequence) -> Self {
        Actor::Forced(ForcedActions::new(moves))
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Actor::Human => "human player",
            Actor::SearchAgent => "search agent",
            Actor::Forced(_) => "forced actions",
        }
    }
}

/// Replays a recorded move list, cycling back to the first frame when the
/// simulation outlasts the recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForcedActions {
    moves: MoveSequence,
}

impl ForcedActions {
    #[must_use]
    pub fn new(moves: MoveSequence) -> Self {
        Self { moves }
    }

    #[must_use]
    pub fn moves(&self) -> &MoveSequence {
        &self.moves
    }

    #[must_use]
    pub fn into_moves(self) -> MoveSequence {
        self.moves
    }

    /// Action applied on simulation tick `tick`; `None` for an empty recording.
    #[must_use]
    pub fn action_at(&self, tick: usize) -> Option<&ActionVector> {
        if self.moves.is_empty() {
            return None;
        }
        self.moves.get(tick % self.moves.len())
    }
}

/// Holds right forever.
#[must_use]
pub fn forward_forced() -> Actor {
    Actor::forced(MoveSequence::new(vec![ActionVector::from_buttons(&[
        Button::Right,
    ])]))
}

/// Holds right while tapping jump every other frame.
#[must_use]
pub fn forward_jumping_forced() -> Actor {
    Actor::forced(MoveSequence::new(vec![
        ActionVector::from_buttons(&[Button::Jump, Button::Right]),
        ActionVector::from_buttons(&[Button::Right]),
    ]))
}

/// Replay `moves` and return only the terminal outcome.
///
/// # Errors
///
/// Propagates the oracle's failure.
pub fn replay_outcome<O: ReplayOracle + ?Sized>(
    oracle: &O,
    level: &O::Level,
    moves: MoveSequence,
) -> Result<Outcome, OracleError> {
    let replay = oracle.simulate(level, &Actor::forced(moves), false)?;
    Ok(replay.outcome)
}

/// Whether replaying `moves` wins `level`.
///
/// # Errors
///
/// Propagates the oracle's failure.
pub fn can_complete<O: ReplayOracle + ?Sized>(
    oracle: &O,
    level: &O::Level,
    moves: MoveSequence,
) -> Result<bool, OracleError> {
    replay_outcome(oracle, level, moves).map(Outcome::is_win)
}

/// Oracle backed by a plain function of the forced move list.
///
/// Handy for scripting feasibility rules; a human playthrough can be attached
/// with [`FnOracle::with_recording`].
pub struct FnOracle<L, F> {
    rule: F,
    recording: Option<MoveSequence>,
    _level: PhantomData<fn(&L)>,
}

impl<L, F> FnOracle<L, F>
where
    F: Fn(&L, &MoveSequence) -> Outcome + Sync,
{
    pub fn new(rule: F) -> Self {
        Self {
            rule,
            recording: None,
            _level: PhantomData,
        }
    }

    /// Moves replayed whenever a [`Actor::Human`] plays.
    #[must_use]
    pub fn with_recording(mut self, moves: MoveSequence) -> Self {
        self.recording = Some(moves);
        self
    }
}

impl<L, F> ReplayOracle for FnOracle<L, F>
where
    L: Sync,
    F: Fn(&L, &MoveSequence) -> Outcome + Sync,
{
    type Level = L;

    fn simulate(&self, level: &L, actor: &Actor, _render: bool) -> Result<Replay, OracleError> {
        let moves = match actor {
            Actor::Forced(forced) => forced.moves(),
            Actor::Human => self.recording.as_ref().ok_or(OracleError::UnsupportedActor {
                actor: actor.name(),
            })?,
            Actor::SearchAgent => {
                return Err(OracleError::UnsupportedActor {
                    actor: actor.name(),
                });
            }
        };
        let outcome = (self.rule)(level, moves);
        Ok(Replay::new(outcome, moves.len()).with_recording(moves.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_actions_cycle_past_the_recording() {
        let Actor::Forced(forced) = forward_jumping_forced() else {
            panic!("expected forced actor");
        };
        assert!(forced.action_at(0).unwrap().is_pressed(Button::Jump));
        assert!(!forced.action_at(1).unwrap().is_pressed(Button::Jump));
        assert!(forced.action_at(4).unwrap().is_pressed(Button::Jump));
        assert!(forced.action_at(7).unwrap().is_pressed(Button::Right));
    }

    #[test]
    fn empty_recording_has_no_actions() {
        let forced = ForcedActions::new(MoveSequence::default());
        assert!(forced.action_at(0).is_none());
    }

    #[test]
    fn fn_oracle_replays_forced_moves() {
        let oracle = FnOracle::new(|_: &(), moves: &MoveSequence| {
            if moves.len() >= 3 {
                Outcome::Win
            } else {
                Outcome::TimedOut
            }
        });
        let short = MoveSequence::repeat(&ActionVector::idle(), 2);
        let long = MoveSequence::repeat(&ActionVector::idle(), 3);
        assert!(!can_complete(&oracle, &(), short).unwrap());
        assert!(can_complete(&oracle, &(), long).unwrap());
    }

    #[test]
    fn fn_oracle_needs_a_recording_for_humans() {
        let oracle = FnOracle::new(|_: &(), _: &MoveSequence| Outcome::Win);
        assert!(matches!(
            oracle.simulate(&(), &Actor::Human, false),
            Err(OracleError::UnsupportedActor { .. })
        ));

        let recorded = MoveSequence::repeat(&ActionVector::idle(), 4);
        let oracle = oracle.with_recording(recorded.clone());
        let replay = oracle.simulate(&(), &Actor::Human, false).unwrap();
        assert_eq!(replay.recorded, Some(recorded));
        assert_eq!(replay.frames, 4);
    }
}
