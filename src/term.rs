use crate::{TermInt, Coords};
use crate::config::GameConfig;
use crate::display::{CellColor, DisplaySurface};
use crate::error::TerminalError;
use crate::game::Frontend;
use crate::input::{map_key, InputEvent, InputSource};
use crate::snake::Cell;
use std::{io::{Stdout, Write, stdout}, time::Duration};

use anyhow::Result;
use crossterm::{cursor, execute, queue, style, terminal};
use crossterm::style::Color;
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::event::{Event, KeyEvent, read, poll};

const CELL_CHAR: char = '\u{2588}';

/// Where the grid sits on the terminal. The border occupies one row/column
/// on each side; each grid cell is `cell_width` characters wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    origin: Coords,
    cols: TermInt,
    rows: TermInt,
    cell_width: TermInt,
}

impl Board {
    /// Centers the board on a terminal of `term_size`.
    pub fn fit(config: &GameConfig, term_size: Coords) -> Result<Board, TerminalError> {
        let outer_width = config.grid_width as u32 * config.cell_width as u32 + 2;
        let outer_height = config.grid_height as u32 + 2;
        let (tw, th) = term_size;

        if outer_width > tw as u32 || outer_height > th as u32 {
            return Err(TerminalError::TooSmall {
                needed_width: outer_width.min(TermInt::MAX as u32) as TermInt,
                needed_height: outer_height as TermInt,
                actual_width: tw,
                actual_height: th,
            });
        }

        let origin = ((tw - outer_width as TermInt) / 2, (th - outer_height as TermInt) / 2);
        Ok(Board { origin, cols: config.grid_width, rows: config.grid_height, cell_width: config.cell_width })
    }

    /// Terminal position of the leftmost character of `cell`, if it is on the grid.
    pub fn to_screen(&self, cell: Cell) -> Option<Coords> {
        if cell.col < 0 || cell.row < 0 || cell.col >= self.cols as i32 || cell.row >= self.rows as i32 {
            return None;
        }

        let x = self.origin.0 + 1 + cell.col as TermInt * self.cell_width;
        let y = self.origin.1 + 1 + cell.row as TermInt;
        Some((x, y))
    }

    fn outer_size(&self) -> Coords {
        (self.cols * self.cell_width + 2, self.rows + 2)
    }
}

#[derive(Clone, Copy)]
struct Glyph {
    ch: char,
    color: Option<Color>,
}

const BLANK: Glyph = Glyph { ch: ' ', color: None };

pub struct TermManager {
    width: TermInt,
    height: TermInt,
    board: Board,
    stdout: Stdout,
    screen: Vec<Glyph>,
    current_msg: Option<Message>,
    active: bool,
}

struct Message {
    top_left: Coords,
    width: TermInt,
    height: TermInt,
}

impl TermManager {
    pub fn new(config: &GameConfig) -> Result<Self> {
        let (width, height) = terminal::size()?;
        let board = Board::fit(config, (width, height))?;
        let stdout = stdout();
        let screen = vec![BLANK; width as usize * height as usize];
        Ok(TermManager { width, height, board, stdout, screen, current_msg: None, active: false })
    }

    pub fn read_key_blocking(&self) -> Result<KeyEvent> {
        loop {
            if let Event::Key(ev) = read()? {
                return Ok(ev);
            }
        }
    }

    pub fn read_key_events_queue(&self) -> Result<Vec<KeyEvent>> {
        let mut events = vec![];

        while poll(Duration::from_millis(1))? {
            if let Event::Key(ev) = read()? {
                events.push(ev);
            }
        }

        Ok(events)
    }

    pub fn has_message(&self) -> bool {
        self.current_msg.is_some()
    }

    ///////////////////////////////////////////////////////////////////////////

    fn print_at(&mut self, pos: Coords, ch: char, color: Option<Color>) -> Result<()> {
        let glyph = Glyph { ch, color };
        self.screen[self.width as usize * pos.1 as usize + pos.0 as usize] = glyph;

        // Cells under a message are only buffered; hiding the message draws them
        if self.covered_by_message(pos) {
            return Ok(());
        }
        self.queue_glyph(pos, glyph)
    }

    fn print_at_no_save(&mut self, pos: Coords, ch: char) -> Result<()> {
        // For messages, so the buffer still holds what to restore on hide
        queue!(self.stdout, cursor::MoveTo(pos.0, pos.1), style::Print(ch))?;
        Ok(())
    }

    fn queue_glyph(&mut self, pos: Coords, glyph: Glyph) -> Result<()> {
        match glyph.color {
            Some(color) => queue!(
                self.stdout,
                cursor::MoveTo(pos.0, pos.1),
                style::SetForegroundColor(color),
                style::Print(glyph.ch),
                style::ResetColor
            )?,
            None => queue!(self.stdout, cursor::MoveTo(pos.0, pos.1), style::Print(glyph.ch))?,
        }
        Ok(())
    }

    fn covered_by_message(&self, pos: Coords) -> bool {
        match &self.current_msg {
            Some(msg) => {
                let (x, y) = msg.top_left();
                pos.0 >= x && pos.0 < x + msg.width() && pos.1 >= y && pos.1 < y + msg.height()
            }
            None => false,
        }
    }

    fn paint_cell(&mut self, cell: Cell, glyph: Glyph) -> Result<()> {
        if let Some((x, y)) = self.board.to_screen(cell) {
            for x_diff in 0..self.board.cell_width {
                self.print_at((x + x_diff, y), glyph.ch, glyph.color)?;
            }
        }
        Ok(())
    }
}

impl Frontend for TermManager {
    fn setup(&mut self) -> Result<()> {
        execute!(self.stdout, EnterAlternateScreen)?;
        self.active = true;
        terminal::enable_raw_mode()?;
        execute!(self.stdout, cursor::Hide, cursor::DisableBlinking)?;
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }

        self.active = false;
        terminal::disable_raw_mode()?;
        execute!(self.stdout, cursor::Show, cursor::EnableBlinking, LeaveAlternateScreen)?;
        Ok(())
    }

    fn draw_borders(&mut self) -> Result<()> {
        let (width, height) = self.board.outer_size();
        let (start_x, start_y) = self.board.origin;
        let end_x = start_x + width - 1;
        let end_y = start_y + height - 1;

        for x in start_x..=end_x {
            let ch = if x == start_x || x == end_x {'+'} else {'-'};
            self.print_at((x, start_y), ch, None)?;
            self.print_at((x, end_y), ch, None)?;
        }

        for y in start_y + 1..end_y {
            self.print_at((start_x, y), '|', None)?;
            self.print_at((end_x, y), '|', None)?;
        }

        Ok(())
    }

    fn show_message(&mut self, lines: &[&str]) -> Result<()> {
        if self.has_message() {
            self.hide_message()?;
        }

        let msg_height = (lines.len() + 2) as TermInt;
        let msg_width = (lines.iter().map(|x| x.chars().count()).max().unwrap_or(0) + 2) as TermInt;
        let msg_width = msg_width.min(self.width);
        let msg_height = msg_height.min(self.height);
        let center = (self.width / 2, self.height / 2);
        let top_left = (center.0 - msg_width / 2, center.1 - msg_height / 2);

        // Top and bottom padding rows
        for y in [top_left.1, top_left.1 + msg_height - 1].iter() {
            for x_diff in 0..msg_width {
                self.print_at_no_save((top_left.0 + x_diff, *y), ' ')?;
            }
        }

        for (i, line) in lines.iter().enumerate().take(msg_height.saturating_sub(2) as usize) {
            let padded_line = format!("{line: ^width$}", line = line, width = msg_width as usize);
            let y = top_left.1 + i as TermInt + 1;
            for (x_diff, ch) in padded_line.chars().take(msg_width as usize).enumerate() {
                self.print_at_no_save((top_left.0 + x_diff as TermInt, y), ch)?;
            }
        }

        self.current_msg = Some(Message::new(msg_width, msg_height, top_left));
        self.flush()
    }

    fn hide_message(&mut self) -> Result<()> {
        let msg = match self.current_msg.take() {
            Some(msg) => msg,
            None => return Ok(()),
        };
        let top_left = msg.top_left();

        // Put back what the message covered
        for y_diff in 0..msg.height() {
            for x_diff in 0..msg.width() {
                let (x, y) = (top_left.0 + x_diff, top_left.1 + y_diff);
                let glyph = self.screen[self.width as usize * y as usize + x as usize];
                self.queue_glyph((x, y), glyph)?;
            }
        }

        self.flush()
    }

    fn clear(&mut self) -> Result<()> {
        execute!(self.stdout, terminal::Clear(ClearType::All))?;
        self.screen = vec![BLANK; self.width as usize * self.height as usize];
        self.current_msg = None;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.stdout.flush()?;
        Ok(())
    }
}

impl DisplaySurface for TermManager {
    fn place_cell(&mut self, cell: Cell, color: CellColor) -> Result<()> {
        self.paint_cell(cell, Glyph { ch: CELL_CHAR, color: Some(term_color(color)) })
    }

    fn remove_cell(&mut self, cell: Cell) -> Result<()> {
        self.paint_cell(cell, BLANK)
    }
}

impl InputSource for TermManager {
    fn poll_events(&mut self) -> Result<Vec<InputEvent>> {
        Ok(self.read_key_events_queue()?.iter().filter_map(map_key).collect())
    }

    fn wait_key(&mut self) -> Result<Option<InputEvent>> {
        Ok(map_key(&self.read_key_blocking()?))
    }
}

impl Drop for TermManager {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

impl Message {
    pub fn new(width: TermInt, height: TermInt, top_left: Coords) -> Self {
        Message { width, height, top_left }
    }

    pub fn width(&self) -> TermInt {
        self.width
    }

    pub fn height(&self) -> TermInt {
        self.height
    }

    pub fn top_left(&self) -> Coords {
        self.top_left
    }
}

fn term_color(color: CellColor) -> Color {
    match color {
        CellColor::SnakeHead => Color::Green,
        CellColor::SnakeBody => Color::DarkGreen,
        CellColor::Food => Color::Red,
        CellColor::DeadSnake => Color::DarkGrey,
    }
}
