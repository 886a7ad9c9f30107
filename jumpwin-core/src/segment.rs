//! Extraction of jump press/release spans from a recorded playthrough.
use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::Button;
use crate::moves::MoveSequence;

/// Span of frames during which jump is held: `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JumpInterval {
    pub start: usize,
    pub end: usize,
}

impl JumpInterval {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of frames the jump is held.
    #[must_use]
    pub const fn hold(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn frames(self) -> Range<usize> {
        self.start..self.end
    }
}

impl std::fmt::Display for JumpInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Jump lists that cannot describe a real playthrough.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SegmentError {
    #[error("mismatch between jump presses ({presses}) and releases ({releases})")]
    PressReleaseMismatch { presses: usize, releases: usize },
    #[error("jump {jump} starts at frame {frame}, where jump {other} is released")]
    StartMeetsEnd {
        jump: usize,
        other: usize,
        frame: usize,
    },
    #[error("jumps {first} and {second} both start at frame {frame}")]
    SharedStart {
        first: usize,
        second: usize,
        frame: usize,
    },
    #[error("jumps {first} and {second} both end at frame {frame}")]
    SharedEnd {
        first: usize,
        second: usize,
        frame: usize,
    },
    #[error("jump {jump} {interval} is empty or overlaps its predecessor")]
    Disordered { jump: usize, interval: JumpInterval },
}

/// Scan `moves` for jump press/release spans.
///
/// A jump still held on the last frame is closed one frame after its press,
/// matching how the simulator reports an unreleased key at level end.
///
/// # Errors
///
/// Returns [`SegmentError::PressReleaseMismatch`] if presses and releases
/// do not pair up once that closing release is added.
pub fn segment_jumps(moves: &MoveSequence) -> Result<Vec<JumpInterval>, SegmentError> {
    let mut starts = Vec::new();
    let mut ends = Vec::new();

    let mut already_pressed = false;
    for (frame, action) in moves.iter().enumerate() {
        let pressed = action.is_pressed(Button::Jump);
        if pressed && !already_pressed {
            starts.push(frame);
        }
        if already_pressed && !pressed {
            ends.push(frame);
        }
        already_pressed = pressed;
    }

    if let Some(&last_start) = starts.last()
        && ends.len() < starts.len()
    {
        ends.push(last_start + 1);
    }

    if starts.len() != ends.len() {
        return Err(SegmentError::PressReleaseMismatch {
            presses: starts.len(),
            releases: ends.len(),
        });
    }

    Ok(starts
        .into_iter()
        .zip(ends)
        .map(|(start, end)| JumpInterval::new(start, end))
        .collect())
}

/// [`segment_jumps`] followed by [`check_separation`] when `strict` is set.
///
/// # Errors
///
/// Propagates any [`SegmentError`] from either step.
pub fn segment_jumps_checked(
    moves: &MoveSequence,
    strict: bool,
) -> Result<Vec<JumpInterval>, SegmentError> {
    let jumps = segment_jumps(moves)?;
    if strict {
        check_separation(&jumps)?;
    }
    Ok(jumps)
}

/// Verify that no press coincides with a release, that no two jumps share a
/// start or an end, and that the list is strictly ordered.
///
/// # Errors
///
/// Returns the first violated rule as a [`SegmentError`].
pub fn check_separation(jumps: &[JumpInterval]) -> Result<(), SegmentError> {
    for (i, jump) in jumps.iter().enumerate() {
        for (j, other) in jumps.iter().enumerate() {
            if jump.start == other.end {
                return Err(SegmentError::StartMeetsEnd {
                    jump: i,
                    other: j,
                    frame: jump.start,
                });
            }
            if i == j {
                continue;
            }
            if jump.start == other.start {
                return Err(SegmentError::SharedStart {
                    first: i.min(j),
                    second: i.max(j),
                    frame: jump.start,
                });
            }
            if jump.end == other.end {
                return Err(SegmentError::SharedEnd {
                    first: i.min(j),
                    second: i.max(j),
                    frame: jump.end,
                });
            }
        }
    }

    for (i, jump) in jumps.iter().enumerate() {
        let overlaps = i > 0 && jump.start < jumps[i - 1].end;
        if jump.end <= jump.start || overlaps {
            return Err(SegmentError::Disordered {
                jump: i,
                interval: *jump,
            });
        }
    }
    Ok(())
}

/// Rebuild per-frame jump flags of a `len`-frame sequence from its intervals.
#[must_use]
pub fn jump_flags_from_intervals(len: usize, jumps: &[JumpInterval]) -> Vec<bool> {
    let mut flags = vec![false; len];
    for jump in jumps {
        let end = jump.end.min(len);
        for flag in &mut flags[jump.start.min(end)..end] {
            *flag = true;
        }
    }
    flags
}
