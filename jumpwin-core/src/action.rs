//! Per-frame controller state.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Number of buttons the core knows by name.
pub const NAMED_BUTTONS: usize = 5;

/// Named controller buttons, indexed the way the simulator lays out its key array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    Left,
    Right,
    Crouch,
    Jump,
    Run,
}

impl Button {
    pub const ALL: [Button; NAMED_BUTTONS] = [
        Button::Left,
        Button::Right,
        Button::Crouch,
        Button::Jump,
        Button::Run,
    ];

    /// Slot of this button inside an [`ActionVector`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Button::Left => 0,
            Button::Right => 1,
            Button::Crouch => 2,
            Button::Jump => 3,
            Button::Run => 4,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Button::Left => "left",
            Button::Right => "right",
            Button::Crouch => "crouch",
            Button::Jump => "jump",
            Button::Run => "run",
        }
    }
}

impl std::fmt::Display for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed-width set of pressed buttons for a single simulated frame.
///
/// Simulators may expose more buttons than [`Button`] names. Those extra
/// slots are carried along untouched by every edit in this crate.
/// Deserialized arrays are padded like [`ActionVector::from_flags`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "KeyArray", into = "KeyArray")]
pub struct ActionVector {
    flags: KeyArray,
}

type KeyArray = SmallVec<[bool; 8]>;

impl Default for ActionVector {
    fn default() -> Self {
        Self::with_width(NAMED_BUTTONS)
    }
}

impl ActionVector {
    /// All buttons released.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// All buttons released, with room for `width` slots (never fewer than the named set).
    #[must_use]
    pub fn with_width(width: usize) -> Self {
        Self {
            flags: SmallVec::from_elem(false, width.max(NAMED_BUTTONS)),
        }
    }

    /// Press exactly the given buttons.
    #[must_use]
    pub fn from_buttons(buttons: &[Button]) -> Self {
        let mut action = Self::idle();
        for &button in buttons {
            action.set(button, true);
        }
        action
    }

    /// Wrap a raw simulator key array, padding it up to the named width.
    #[must_use]
    pub fn from_flags(flags: impl IntoIterator<Item = bool>) -> Self {
        let mut flags: KeyArray = flags.into_iter().collect();
        if flags.len() < NAMED_BUTTONS {
            flags.resize(NAMED_BUTTONS, false);
        }
        Self { flags }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.flags.len()
    }

    #[must_use]
    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    #[must_use]
    pub fn is_pressed(&self, button: Button) -> bool {
        self.flags[button.index()]
    }

    pub fn set(&mut self, button: Button, pressed: bool) {
        self.flags[button.index()] = pressed;
    }

    /// Copy of this action with `button` pressed.
    #[must_use]
    pub fn with(&self, button: Button) -> Self {
        let mut action = self.clone();
        action.set(button, true);
        action
    }

    /// Copy of this action with `button` released.
    #[must_use]
    pub fn without(&self, button: Button) -> Self {
        let mut action = self.clone();
        action.set(button, false);
        action
    }

    /// Buttons whose state differs between `self` and `other`.
    #[must_use]
    pub fn differing_buttons(&self, other: &Self) -> Vec<Button> {
        Button::ALL
            .into_iter()
            .filter(|&button| self.is_pressed(button) != other.is_pressed(button))
            .collect()
    }
}

impl From<KeyArray> for ActionVector {
    fn from(flags: KeyArray) -> Self {
        Self::from_flags(flags)
    }
}

impl From<ActionVector> for KeyArray {
    fn from(action: ActionVector) -> Self {
        action.flags
    }
}

impl From<&[Button]> for ActionVector {
    fn from(buttons: &[Button]) -> Self {
        Self::from_buttons(buttons)
    }
}
