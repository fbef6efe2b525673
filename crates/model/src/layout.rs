//! Composite layouts.
//!
//! A layout is a grid of `cols x rows` cells; each cell holds one photo.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the fixed cell arrangements a composite can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// One photo.
    #[default]
    Single,
    /// Three photos stacked vertically (1x3).
    Column,
    /// Three photos side by side (3x1).
    Row,
    /// Four photos in a 2x2 grid.
    Grid,
}

impl Layout {
    /// All layouts in menu order.
    pub const ALL: [Layout; 4] = [Layout::Single, Layout::Column, Layout::Row, Layout::Grid];

    /// Stable identifier used in configuration and on the command line.
    pub fn id(self) -> &'static str {
        match self {
            Layout::Single => "single",
            Layout::Column => "column",
            Layout::Row => "row",
            Layout::Grid => "grid",
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Layout::Single => "Single",
            Layout::Column => "Column x3",
            Layout::Row => "Row x3",
            Layout::Grid => "Grid 2x2",
        }
    }

    /// Number of cell columns.
    pub fn cols(self) -> u32 {
        match self {
            Layout::Single | Layout::Column => 1,
            Layout::Row => 3,
            Layout::Grid => 2,
        }
    }

    /// Number of cell rows.
    pub fn rows(self) -> u32 {
        match self {
            Layout::Single | Layout::Row => 1,
            Layout::Column => 3,
            Layout::Grid => 2,
        }
    }

    /// Number of photos the layout holds.
    pub fn count(self) -> usize {
        (self.cols() * self.rows()) as usize
    }

    /// Grid position `(col, row)` of slot `index`, row-major.
    pub fn cell_of(self, index: usize) -> (u32, u32) {
        let cols = self.cols() as usize;
        ((index % cols) as u32, (index / cols) as u32)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Error returned when a layout id is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown layout: {0}. Use: single, column, row, grid")]
pub struct UnknownLayout(pub String);

impl FromStr for Layout {
    type Err = UnknownLayout;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Layout::ALL
            .into_iter()
            .find(|layout| layout.id() == wanted)
            .ok_or_else(|| UnknownLayout(s.to_string()))
    }
}
