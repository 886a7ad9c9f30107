//! Recorded playthroughs as frame-indexed action lists.
use std::ops::Range;

use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

use crate::action::{ActionVector, Button};
use crate::segment::JumpInterval;

const FINGERPRINT_SEED: u64 = 0x6a75_6d70_7769_6e00;

/// Ordered per-frame actions of one full playthrough attempt.
///
/// Every edit returns a new sequence; the receiver is never modified, so a
/// sequence under comparison can be shared freely across workers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveSequence {
    frames: Vec<ActionVector>,
}

impl MoveSequence {
    #[must_use]
    pub fn new(frames: Vec<ActionVector>) -> Self {
        Self { frames }
    }

    /// `count` copies of the same action.
    #[must_use]
    pub fn repeat(action: &ActionVector, count: usize) -> Self {
        Self {
            frames: vec![action.clone(); count],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn frames(&self) -> &[ActionVector] {
        &self.frames
    }

    #[must_use]
    pub fn get(&self, frame: usize) -> Option<&ActionVector> {
        self.frames.get(frame)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActionVector> {
        self.frames.iter()
    }

    pub fn push(&mut self, action: ActionVector) {
        self.frames.push(action);
    }

    #[must_use]
    pub fn into_frames(self) -> Vec<ActionVector> {
        self.frames
    }

    /// Jump flag of every frame, in order.
    #[must_use]
    pub fn jump_flags(&self) -> Vec<bool> {
        self.button_flags(Button::Jump)
    }

    #[must_use]
    pub fn button_flags(&self, button: Button) -> Vec<bool> {
        self.frames
            .iter()
            .map(|action| action.is_pressed(button))
            .collect()
    }

    /// Copy with the jump flag released across `frames`. Ranges running past
    /// the last frame are clipped.
    #[must_use]
    pub fn with_jump_released(&self, frames: Range<usize>) -> Self {
        let mut edited = self.clone();
        edited.write_jump(frames, false);
        edited
    }

    /// Copy with the jump flag held across `frames`. Ranges running past the
    /// last frame are clipped.
    #[must_use]
    pub fn with_jump_held(&self, frames: Range<usize>) -> Self {
        let mut edited = self.clone();
        edited.write_jump(frames, true);
        edited
    }

    /// Copy with `jump` removed.
    #[must_use]
    pub fn without_jump(&self, jump: JumpInterval) -> Self {
        self.with_jump_released(jump.frames())
    }

    /// Copy where `original` is released and the jump is held across
    /// `new_start..new_end` instead.
    #[must_use]
    pub fn with_jump_moved(
        &self,
        original: JumpInterval,
        new_start: usize,
        new_end: usize,
    ) -> Self {
        let mut edited = self.clone();
        edited.write_jump(original.frames(), false);
        edited.write_jump(new_start..new_end, true);
        edited
    }

    fn write_jump(&mut self, frames: Range<usize>, pressed: bool) {
        let end = frames.end.min(self.frames.len());
        let start = frames.start.min(end);
        for action in &mut self.frames[start..end] {
            action.set(Button::Jump, pressed);
        }
    }

    /// One character per frame: `X` pressed, `_` released.
    #[must_use]
    pub fn view(&self, button: Button) -> String {
        self.frames
            .iter()
            .map(|action| if action.is_pressed(button) { 'X' } else { '_' })
            .collect()
    }

    /// Stable hash of every flag of every frame, for correlating log lines.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut bytes = Vec::with_capacity(self.frames.len() * 9);
        for action in &self.frames {
            bytes.push(u8::try_from(action.width()).unwrap_or(u8::MAX));
            bytes.extend(action.flags().iter().map(|&pressed| u8::from(pressed)));
        }
        XxHash64::oneshot(FINGERPRINT_SEED, &bytes)
    }

    /// Frames at which two sequences disagree, with the buttons that differ.
    /// Frames present in only one sequence are not listed.
    #[must_use]
    pub fn differences(&self, other: &Self) -> Vec<(usize, Vec<Button>)> {
        self.frames
            .iter()
            .zip(other.frames.iter())
            .enumerate()
            .filter_map(|(frame, (ours, theirs))| {
                let buttons = ours.differing_buttons(theirs);
                (!buttons.is_empty() || ours != theirs).then_some((frame, buttons))
            })
            .collect()
    }
}

impl FromIterator<ActionVector> for MoveSequence {
    fn from_iter<I: IntoIterator<Item = ActionVector>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a MoveSequence {
    type Item = &'a ActionVector;
    type IntoIter = std::slice::Iter<'a, ActionVector>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
