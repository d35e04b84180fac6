//! Tree cell state
//!
//! A cell is one tree slot stored as a single byte. The byte is split into
//! bands rather than an enum so that burn progress and ignition heat can live
//! in the same value:
//!
//! ```text
//!   0        empty
//!   1..=63   growing (value accumulates ignition heat from burning neighbours)
//!   64..=254 burning (value is burn progress)
//!   255      burned (ash, terminal)
//! ```

use serde::{Deserialize, Serialize};

/// State of a single tree slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Cell(u8);

/// Render-facing category of a non-empty cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellCategory {
    /// Live tree
    Alive,
    /// Tree on fire
    Burning,
    /// Burned out
    Ash,
}

impl CellCategory {
    /// Instance colour used by the renderer (linear RGB).
    pub fn color(self) -> [f32; 3] {
        match self {
            CellCategory::Alive => [0.0, 0.8, 0.0],
            CellCategory::Burning => [1.0, 0.0, 0.0],
            CellCategory::Ash => [0.0, 0.0, 0.0],
        }
    }
}

impl Cell {
    /// No tree
    pub const EMPTY: Cell = Cell(0);
    /// Freshly planted or extinguished tree
    pub const GROWING: Cell = Cell(1);
    /// First burning value, assigned on ignition
    pub const FIRE: Cell = Cell(64);
    /// Highest value a burning cell can hold before turning to ash
    pub const LAST_BURNING: Cell = Cell(254);
    /// Ash
    pub const BURNED: Cell = Cell(255);

    /// Wrap a raw cell byte.
    #[inline]
    pub const fn from_raw(value: u8) -> Self {
        Cell(value)
    }

    /// Raw cell byte.
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == Self::EMPTY.0
    }

    /// Live tree that has not caught fire yet.
    #[inline]
    pub const fn is_growing(self) -> bool {
        self.0 >= Self::GROWING.0 && self.0 < Self::FIRE.0
    }

    #[inline]
    pub const fn is_burning(self) -> bool {
        self.0 >= Self::FIRE.0 && self.0 < Self::BURNED.0
    }

    #[inline]
    pub const fn is_burned(self) -> bool {
        self.0 == Self::BURNED.0
    }

    /// Category for rendering, `None` for empty slots.
    pub fn category(self) -> Option<CellCategory> {
        if self.is_empty() {
            None
        } else if self.is_growing() {
            Some(CellCategory::Alive)
        } else if self.is_burning() {
            Some(CellCategory::Burning)
        } else {
            Some(CellCategory::Ash)
        }
    }

    /// Add accumulated ignition heat to a growing cell.
    ///
    /// Saturates at [`Cell::LAST_BURNING`] so a strong gust ignites the tree
    /// without skipping the burning band or wrapping back to empty.
    #[inline]
    pub fn add_heat(self, heat: u8) -> Self {
        Cell(self.0.saturating_add(heat).min(Self::LAST_BURNING.0))
    }

    /// Advance burn progress by one step. Reaching [`Cell::BURNED`] is terminal.
    #[inline]
    pub fn advance_burn(self) -> Self {
        if self.is_burning() {
            Cell(self.0 + 1)
        } else {
            self
        }
    }
}

impl From<Cell> for u8 {
    fn from(cell: Cell) -> Self {
        cell.0
    }
}
