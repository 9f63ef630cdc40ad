use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

pub const YELLOW: &str = "#fee086";
pub const GREEN: &str = "#cff09f";
pub const BLUE: &str = "#cee8f9";
pub const RED: &str = "#f4b3b1";

/// Toolbar state: off, or highlighting in one of four colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorState {
    #[default]
    Off,
    Yellow,
    Green,
    Blue,
    Red,
}

impl ColorState {
    /// Cycle order used by the toolbar button.
    pub const ALL: [ColorState; 5] = [
        ColorState::Off,
        ColorState::Yellow,
        ColorState::Green,
        ColorState::Blue,
        ColorState::Red,
    ];

    /// Highlight color for this state. `Off` reports yellow, which is what
    /// the context-menu "add highlight" action uses.
    pub fn color(self) -> &'static str {
        match self {
            Self::Off | Self::Yellow => YELLOW,
            Self::Green => GREEN,
            Self::Blue => BLUE,
            Self::Red => RED,
        }
    }

    pub fn is_active(self) -> bool {
        self != Self::Off
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Red => "red",
        }
    }

    pub fn next(self) -> Self {
        let index = Self::ALL
            .iter()
            .position(|state| *state == self)
            .unwrap_or_default();
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    /// State picked by a keyboard shortcut key, if any.
    pub fn from_shortcut(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'y' => Some(Self::Yellow),
            'r' => Some(Self::Red),
            'g' => Some(Self::Green),
            'b' => Some(Self::Blue),
            _ => None,
        }
    }
}

impl fmt::Display for ColorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownColorState(s.to_string()))
    }
}

/// What a page needs to know about the controller's mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionState {
    pub active: bool,
    pub color: String,
}

impl From<ColorState> for ExtensionState {
    fn from(state: ColorState) -> Self {
        Self {
            active: state.is_active(),
            color: state.color().to_string(),
        }
    }
}

/// The controller's mutable mode, behind accessors so transitions can be
/// tested without a browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateMachine {
    current: ColorState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ColorState {
        self.current
    }

    pub fn snapshot(&self) -> ExtensionState {
        self.current.into()
    }

    pub fn cycle(&mut self) -> ColorState {
        self.current = self.current.next();
        self.current
    }

    pub fn set(&mut self, state: ColorState) -> ColorState {
        self.current = state;
        self.current
    }

    /// Selecting the current color again turns highlighting off.
    pub fn toggle(&mut self, state: ColorState) -> ColorState {
        self.current = if self.current == state {
            ColorState::Off
        } else {
            state
        };
        self.current
    }
}
