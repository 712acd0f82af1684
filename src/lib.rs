//! Snake on a fixed grid.
//!
//! The simulation lives in [`engine`] and knows nothing about terminals: it
//! reports each move as a list of [`display::DisplayDelta`]s. [`game`] drives
//! it from a fixed-interval clock and draws on a crossterm terminal.

pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod game;
pub mod input;
pub mod logging;
pub mod snake;
pub mod term;

pub type TermInt = u16;
pub type Coords = (u16, u16);
