//! Greedy removal of jumps the playthrough does not need.
use log::debug;

use crate::deadline::Deadline;
use crate::error::EvalError;
use crate::moves::MoveSequence;
use crate::oracle::{ReplayOracle, can_complete};
use crate::segment::JumpInterval;

/// Moves and jumps left after pruning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneResult {
    pub moves: MoveSequence,
    pub jumps: Vec<JumpInterval>,
    pub removed: usize,
}

/// Drop every jump whose removal still wins the level.
///
/// Jumps are tried in list order. A successful removal is committed at once
/// and the same position is tried again, since the next jump has shifted into
/// it. A jump kept earlier is never revisited after a later removal, so the
/// result is locally minimal: pruning its own output removes nothing more.
///
/// # Errors
///
/// Propagates oracle failures and [`EvalError::Inconclusive`] once `deadline`
/// is spent.
pub fn prune_redundant_jumps<O: ReplayOracle + ?Sized>(
    oracle: &O,
    level: &O::Level,
    moves: MoveSequence,
    jumps: Vec<JumpInterval>,
    deadline: &Deadline,
) -> Result<PruneResult, EvalError> {
    let mut moves = moves;
    let mut jumps = jumps;
    let mut removed = 0;

    let mut cursor = 0;
    while cursor < jumps.len() {
        deadline.check()?;
        let jump = jumps[cursor];
        let candidate = moves.without_jump(jump);
        if can_complete(oracle, level, candidate.clone())? {
            debug!("jump {jump} is redundant, removing");
            moves = candidate;
            jumps.remove(cursor);
            removed += 1;
        } else {
            debug!("jump {jump} is necessary");
            cursor += 1;
        }
    }

    Ok(PruneResult {
        moves,
        jumps,
        removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionVector, Button};
    use crate::oracle::FnOracle;
    use crate::outcome::Outcome;
    use crate::segment::segment_jumps;

    fn run_with_jumps(len: usize, jumps: &[(usize, usize)]) -> MoveSequence {
        let mut moves = MoveSequence::repeat(&ActionVector::from_buttons(&[Button::Right]), len);
        for &(start, end) in jumps {
            moves = moves.with_jump_held(start..end);
        }
        moves
    }

    /// Wins iff some jump is held on every frame listed in `required`.
    fn needs_frames(required: &'static [usize]) -> impl Fn(&(), &MoveSequence) -> Outcome + Sync {
        move |_, moves| {
            let flags = moves.jump_flags();
            if required.iter().all(|&frame| flags.get(frame).copied().unwrap_or(false)) {
                Outcome::Win
            } else {
                Outcome::DiedToFall
            }
        }
    }

    #[test]
    fn removes_only_unneeded_jumps() {
        let oracle = FnOracle::new(needs_frames(&[11]));
        let moves = run_with_jumps(30, &[(2, 4), (10, 13), (20, 22)]);
        let jumps = segment_jumps(&moves).unwrap();

        let result =
            prune_redundant_jumps(&oracle, &(), moves, jumps, &Deadline::unbounded()).unwrap();

        assert_eq!(result.removed, 2);
        assert_eq!(result.jumps, vec![JumpInterval::new(10, 13)]);
        assert_eq!(result.moves, run_with_jumps(30, &[(10, 13)]));
    }

    #[test]
    fn consecutive_redundant_jumps_are_all_removed() {
        let oracle = FnOracle::new(needs_frames(&[]));
        let moves = run_with_jumps(20, &[(1, 2), (4, 6), (8, 9)]);
        let jumps = segment_jumps(&moves).unwrap();

        let result =
            prune_redundant_jumps(&oracle, &(), moves, jumps, &Deadline::unbounded()).unwrap();

        assert_eq!(result.removed, 3);
        assert!(result.jumps.is_empty());
        assert!(result.moves.jump_flags().iter().all(|&pressed| !pressed));
    }

    #[test]
    fn second_pass_removes_nothing() {
        let oracle = FnOracle::new(needs_frames(&[3, 15]));
        let moves = run_with_jumps(25, &[(2, 5), (8, 9), (14, 17), (20, 21)]);
        let jumps = segment_jumps(&moves).unwrap();

        let first =
            prune_redundant_jumps(&oracle, &(), moves, jumps, &Deadline::unbounded()).unwrap();
        let second = prune_redundant_jumps(
            &oracle,
            &(),
            first.moves.clone(),
            first.jumps.clone(),
            &Deadline::unbounded(),
        )
        .unwrap();

        assert_eq!(first.removed, 2);
        assert_eq!(second.removed, 0);
        assert_eq!(second.moves, first.moves);
    }
}
