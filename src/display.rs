use anyhow::Result;

use crate::engine::OverReason;
use crate::snake::Cell;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CellColor {
    SnakeHead,
    SnakeBody,
    Food,
    DeadSnake,
}

/// One change to what the board shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayDelta {
    Place { cell: Cell, color: CellColor },
    Remove { cell: Cell },
    GameEnded(OverReason),
}

/// Something that can show colored cells on the grid.
pub trait DisplaySurface {
    fn place_cell(&mut self, cell: Cell, color: CellColor) -> Result<()>;
    fn remove_cell(&mut self, cell: Cell) -> Result<()>;
}

/// Applies deltas in order. `GameEnded` is left to the caller, which decides
/// how the end of a game is shown.
pub fn apply_deltas<S: DisplaySurface + ?Sized>(surface: &mut S, deltas: &[DisplayDelta]) -> Result<()> {
    for delta in deltas {
        match delta {
            DisplayDelta::Place { cell, color } => surface.place_cell(*cell, *color)?,
            DisplayDelta::Remove { cell } => surface.remove_cell(*cell)?,
            DisplayDelta::GameEnded(_) => {}
        }
    }
    Ok(())
}
