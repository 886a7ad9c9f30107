//! Optional checks that an oracle replays moves faithfully and deterministically.
use log::{debug, warn};

use crate::action::Button;
use crate::error::{EvalError, OracleError};
use crate::moves::MoveSequence;
use crate::oracle::{Actor, ReplayOracle, replay_outcome};

const STRIP_BUTTONS: [Button; 5] = [
    Button::Jump,
    Button::Left,
    Button::Right,
    Button::Run,
    Button::Crouch,
];

/// Verify the oracle applies `moves` verbatim and gives the same verdict on
/// every one of `replays` further replays, matching `expect_complete`.
///
/// # Errors
///
/// [`EvalError::PlaybackMismatch`] when the echoed moves differ from `moves`,
/// [`EvalError::InconsistentReplay`] for mixed verdicts,
/// [`EvalError::UnexpectedCompletion`] for a uniform verdict opposite to
/// `expect_complete`, and any oracle failure.
pub fn check_consistency<O: ReplayOracle + ?Sized>(
    oracle: &O,
    level: &O::Level,
    moves: &MoveSequence,
    expect_complete: bool,
    replays: usize,
) -> Result<(), EvalError> {
    let echo = oracle
        .simulate(level, &Actor::forced(moves.clone()), false)?
        .recorded
        .ok_or(OracleError::MissingRecording)?;
    check_playback(moves, &echo)?;

    let mut wins = 0;
    for _ in 0..replays {
        if replay_outcome(oracle, level, moves.clone())?.is_win() {
            wins += 1;
        }
    }
    debug!("{wins} of {replays} replays completed the level");

    if wins != 0 && wins != replays {
        warn!("replays of {:016x} disagree", moves.fingerprint());
        return Err(EvalError::InconsistentReplay { replays });
    }
    let completed = wins == replays;
    if completed != expect_complete {
        return Err(EvalError::UnexpectedCompletion {
            expected: verdict(expect_complete),
            observed: verdict(completed),
        });
    }
    Ok(())
}

fn verdict(completed: bool) -> &'static str {
    if completed { "completed" } else { "failed" }
}

fn check_playback(sent: &MoveSequence, applied: &MoveSequence) -> Result<(), EvalError> {
    if sent == applied {
        return Ok(());
    }
    for button in STRIP_BUTTONS {
        debug!("{:>6} sent    {}", button.label(), sent.view(button));
        debug!("{:>6} applied {}", button.label(), applied.view(button));
    }
    let first = sent.differences(applied).into_iter().next();
    let (frame, buttons) = match first {
        Some((frame, buttons)) => (Some(frame), buttons),
        None => (None, Vec::new()),
    };
    Err(EvalError::PlaybackMismatch {
        expected: sent.len(),
        actual: applied.len(),
        frame,
        buttons,
    })
}
