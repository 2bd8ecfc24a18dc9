use std::fmt;

use serde::{Deserialize, Serialize};

/// Display palette for shift types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftColor {
    Green,
    Yellow,
    Pink,
    Blue,
    Purple,
    Red,
}

impl ShiftColor {
    pub const ALL: [ShiftColor; 6] = [
        ShiftColor::Green,
        ShiftColor::Yellow,
        ShiftColor::Pink,
        ShiftColor::Blue,
        ShiftColor::Purple,
        ShiftColor::Red,
    ];

    /// Parses a color name, ignoring case.
    pub fn parse(s: &str) -> Option<ShiftColor> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ShiftColor::Green => "Green",
            ShiftColor::Yellow => "Yellow",
            ShiftColor::Pink => "Pink",
            ShiftColor::Blue => "Blue",
            ShiftColor::Purple => "Purple",
            ShiftColor::Red => "Red",
        }
    }

    /// Background hex code used when rendering a cell of this color.
    #[must_use]
    pub const fn hex(self) -> &'static str {
        match self {
            ShiftColor::Green => "#d4edda",
            ShiftColor::Yellow => "#fff3cd",
            ShiftColor::Pink => "#f8d7da",
            ShiftColor::Blue => "#d1ecf1",
            ShiftColor::Purple => "#ddd6f3",
            ShiftColor::Red => "#f8b6b7",
        }
    }
}

impl fmt::Display for ShiftColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
