//! Terminal results of a single replay.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::moves::MoveSequence;

/// How a simulated playthrough ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Reached the goal
    Win,
    /// Killed by an enemy
    DiedToEnemy,
    /// Fell out of the level
    DiedToFall,
    /// Ran out of time before reaching the goal
    TimedOut,
}

impl Outcome {
    #[must_use]
    pub const fn is_win(self) -> bool {
        matches!(self, Outcome::Win)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::DiedToEnemy => "died_to_enemy",
            Outcome::DiedToFall => "died_to_fall",
            Outcome::TimedOut => "timed_out",
        }
    }

    /// Map a simulator's raw terminal flags onto the closed outcome set.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownTerminalState`] when the run was not won and no
    /// death or timeout flag is raised.
    pub fn classify(flags: TerminalFlags) -> Result<Self, UnknownTerminalState> {
        if flags.won {
            Ok(Outcome::Win)
        } else if flags.died_to_enemy {
            Ok(Outcome::DiedToEnemy)
        } else if flags.died_to_fall {
            Ok(Outcome::DiedToFall)
        } else if flags.ran_out_of_time {
            Ok(Outcome::TimedOut)
        } else {
            Err(UnknownTerminalState { flags })
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw end-of-run status as reported by a simulator process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalFlags {
    #[serde(default)]
    pub won: bool,
    #[serde(default)]
    pub died_to_enemy: bool,
    #[serde(default)]
    pub died_to_fall: bool,
    #[serde(default)]
    pub ran_out_of_time: bool,
}

/// A simulator reported an ending outside the known taxonomy.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("simulator reported an unmapped terminal state: {flags:?}")]
pub struct UnknownTerminalState {
    pub flags: TerminalFlags,
}

/// Everything one oracle call returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replay {
    pub outcome: Outcome,
    /// Frames simulated before the run ended.
    pub frames: usize,
    /// Actions the simulator actually applied, when the caller can supply them.
    pub recorded: Option<MoveSequence>,
}

impl Replay {
    #[must_use]
    pub fn new(outcome: Outcome, frames: usize) -> Self {
        Self {
            outcome,
            frames,
            recorded: None,
        }
    }

    #[must_use]
    pub fn with_recording(mut self, recorded: MoveSequence) -> Self {
        self.recorded = Some(recorded);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_takes_priority_over_other_flags() {
        let flags = TerminalFlags {
            won: true,
            ran_out_of_time: true,
            ..TerminalFlags::default()
        };
        assert_eq!(Outcome::classify(flags), Ok(Outcome::Win));
    }

    #[test]
    fn death_causes_map_in_order() {
        let enemy_and_fall = TerminalFlags {
            died_to_enemy: true,
            died_to_fall: true,
            ..TerminalFlags::default()
        };
        assert_eq!(Outcome::classify(enemy_and_fall), Ok(Outcome::DiedToEnemy));

        let timeout = TerminalFlags {
            ran_out_of_time: true,
            ..TerminalFlags::default()
        };
        assert_eq!(Outcome::classify(timeout), Ok(Outcome::TimedOut));
    }

    #[test]
    fn no_flags_is_unknown() {
        let err = Outcome::classify(TerminalFlags::default()).unwrap_err();
        assert_eq!(err.flags, TerminalFlags::default());
    }

    #[test]
    fn flags_parse_from_sparse_json() {
        let flags: TerminalFlags = serde_json::from_str(r#"{"died_to_fall": true}"#).unwrap();
        assert_eq!(Outcome::classify(flags), Ok(Outcome::DiedToFall));
    }
}
