use std::{thread::sleep, time::{Duration, Instant}};

use crate::config::GameConfig;
use crate::display::{apply_deltas, CellColor, DisplaySurface};
use crate::engine::{GameEngine, OverReason};
use crate::input::{InputEvent, InputSource};
use crate::term::TermManager;

use anyhow::Result;
use tracing::{debug, info, warn};

/// How often input is polled between ticks
const POLL_INTERVAL_MS: u64 = 5;

/// Everything the run loop needs from the screen it plays on.
pub trait Frontend: DisplaySurface + InputSource {
    fn setup(&mut self) -> Result<()>;
    fn restore(&mut self) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
    fn draw_borders(&mut self) -> Result<()>;
    /// Overlays centered lines until `hide_message`.
    fn show_message(&mut self, lines: &[&str]) -> Result<()>;
    fn hide_message(&mut self) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Drives a `GameEngine` from a fixed-interval clock and draws it on a
/// frontend.
pub struct SnakeGame<F> {
    tick_interval: Duration,
    paused: bool,
    engine: GameEngine,
    frontend: F,
}

impl SnakeGame<TermManager> {
    pub fn new(config: &GameConfig) -> Result<Self> {
        let term = TermManager::new(config)?;
        Ok(SnakeGame::with_frontend(config, term))
    }
}

impl<F: Frontend> SnakeGame<F> {
    pub fn with_frontend(config: &GameConfig, frontend: F) -> Self {
        let engine = GameEngine::new(config);
        SnakeGame { tick_interval: config.tick_interval(), paused: false, engine, frontend }
    }

    /// Runs games until the player quits. The frontend is restored on the
    /// way out, also when an error ends the session; that error wins over a
    /// failed restore.
    pub fn run(&mut self) -> Result<()> {
        self.frontend.setup()?;
        let res = self.session();
        let restored = self.frontend.restore();

        if let (Err(_), Err(e)) = (&res, &restored) {
            warn!(error = %e, "failed to restore terminal");
        }
        res.and(restored)
    }

    ///////////////////////////////////////////////////////////////////////////

    fn session(&mut self) -> Result<()> {
        if self.show_intro()? == Flow::Quit {
            return Ok(());
        }

        loop {
            if self.play()? == Flow::Quit {
                return Ok(());
            }

            if self.await_restart()? == Flow::Quit {
                return Ok(());
            }

            self.engine.restart();
        }
    }

    fn show_intro(&mut self) -> Result<Flow> {
        self.frontend.show_message(&[
            "Arrow keys or WASD to move",
            "Esc to pause",
            "Q or CTRL+C to quit",
            "",
            "Press any key to begin",
        ])?;

        if self.frontend.wait_key()? == Some(InputEvent::Quit) {
            return Ok(Flow::Quit);
        }

        self.frontend.hide_message()?;
        Ok(Flow::Continue)
    }

    fn play(&mut self) -> Result<Flow> {
        self.paused = false;
        self.frontend.clear()?;
        self.frontend.draw_borders()?;
        apply_deltas(&mut self.frontend, &self.engine.snapshot())?;
        self.frontend.flush()?;

        let mut next_tick = Instant::now() + self.tick_interval;

        loop {
            sleep(Duration::from_millis(POLL_INTERVAL_MS));

            let was_paused = self.paused;
            let events = self.frontend.poll_events()?;
            if self.handle_input(&events)? == Flow::Quit {
                return Ok(Flow::Quit);
            }
            if self.paused != was_paused {
                next_tick = Instant::now() + self.tick_interval;
            }

            let now = Instant::now();
            if self.paused || now < next_tick {
                continue;
            }

            // Don't try to catch up after a stall
            next_tick += self.tick_interval;
            if next_tick < now {
                next_tick = now + self.tick_interval;
            }

            self.step()?;
            if self.engine.is_over() {
                self.game_over()?;
                return Ok(Flow::Continue);
            }
        }
    }

    /// Routes input received while a game is running.
    fn handle_input(&mut self, events: &[InputEvent]) -> Result<Flow> {
        for event in events {
            match *event {
                InputEvent::Quit => return Ok(Flow::Quit),
                InputEvent::TogglePause => self.toggle_pause()?,
                InputEvent::Turn(dir) => self.engine.set_direction(dir),
                // Only meaningful once the game is over
                InputEvent::Restart => {}
            }
        }
        Ok(Flow::Continue)
    }

    fn step(&mut self) -> Result<()> {
        let outcome = self.engine.tick();
        apply_deltas(&mut self.frontend, &outcome.deltas)?;
        self.frontend.flush()
    }

    fn game_over(&mut self) -> Result<()> {
        let reason = self.engine.over_reason();
        let win = reason == Some(OverReason::BoardFilled);
        let score = self.engine.score();
        info!(?reason, score, "showing game over");

        if !win {
            let engine = &self.engine;
            let body: Vec<_> = engine.snake().segments().copied().filter(|c| engine.in_bounds(*c)).collect();
            for cell in body {
                self.frontend.place_cell(cell, CellColor::DeadSnake)?;
            }
        }

        let s = if win {"You won!"} else {"Game over!"};
        self.frontend.show_message(&[
            s,
            &*format!("Score: {}", score),
            "",
            "Press Enter to play again,",
            "or Q to quit.",
        ])
    }

    fn await_restart(&mut self) -> Result<Flow> {
        loop {
            match self.frontend.wait_key()? {
                Some(InputEvent::Restart) => return Ok(Flow::Continue),
                Some(InputEvent::Quit) => return Ok(Flow::Quit),
                _ => {}
            }
        }
    }

    fn toggle_pause(&mut self) -> Result<()> {
        if !self.paused {
            self.frontend.show_message(&["Paused", "Press Esc to resume", "or Q to quit"])?;
        } else {
            self.frontend.hide_message()?;
        }

        self.paused = !self.paused;
        debug!(paused = self.paused, "pause toggled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};

    use anyhow::anyhow;

    use super::*;
    use crate::snake::{Cell, Direction};

    /// Plays back canned input. Once a script runs dry it answers with `Quit`.
    #[derive(Default)]
    struct ScriptedFrontend {
        cells: HashMap<Cell, CellColor>,
        polls: VecDeque<Vec<InputEvent>>,
        keys: VecDeque<InputEvent>,
        messages: Vec<String>,
        showing: bool,
        fail_poll: bool,
        fail_restore: bool,
        restored: bool,
    }

    impl ScriptedFrontend {
        fn new(polls: Vec<Vec<InputEvent>>, keys: Vec<InputEvent>) -> Self {
            ScriptedFrontend { polls: polls.into(), keys: keys.into(), ..Default::default() }
        }
    }

    impl DisplaySurface for ScriptedFrontend {
        fn place_cell(&mut self, cell: Cell, color: CellColor) -> Result<()> {
            self.cells.insert(cell, color);
            Ok(())
        }

        fn remove_cell(&mut self, cell: Cell) -> Result<()> {
            self.cells.remove(&cell);
            Ok(())
        }
    }

    impl InputSource for ScriptedFrontend {
        fn poll_events(&mut self) -> Result<Vec<InputEvent>> {
            if self.fail_poll {
                return Err(anyhow!("poll failed"));
            }
            Ok(self.polls.pop_front().unwrap_or_else(|| vec![InputEvent::Quit]))
        }

        fn wait_key(&mut self) -> Result<Option<InputEvent>> {
            Ok(Some(self.keys.pop_front().unwrap_or(InputEvent::Quit)))
        }
    }

    impl Frontend for ScriptedFrontend {
        fn setup(&mut self) -> Result<()> {
            Ok(())
        }

        fn restore(&mut self) -> Result<()> {
            self.restored = true;
            if self.fail_restore {
                return Err(anyhow!("restore failed"));
            }
            Ok(())
        }

        fn clear(&mut self) -> Result<()> {
            self.cells.clear();
            self.showing = false;
            Ok(())
        }

        fn draw_borders(&mut self) -> Result<()> {
            Ok(())
        }

        fn show_message(&mut self, lines: &[&str]) -> Result<()> {
            self.messages.push(lines[0].to_string());
            self.showing = true;
            Ok(())
        }

        fn hide_message(&mut self) -> Result<()> {
            self.showing = false;
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn config(width: u16, height: u16) -> GameConfig {
        GameConfig { seed: Some(21), tick_interval_ms: 1, ..GameConfig::new(width, height) }
    }

    #[test]
    fn turn_reaches_engine() {
        let mut game = SnakeGame::with_frontend(&config(20, 20), ScriptedFrontend::default());

        let flow = game.handle_input(&[InputEvent::Turn(Direction::Up)]).unwrap();

        assert_eq!(flow, Flow::Continue);
        assert_eq!(game.engine.pending_direction(), Direction::Up);
    }

    #[test]
    fn restart_ignored_while_running() {
        let mut game = SnakeGame::with_frontend(&config(20, 20), ScriptedFrontend::default());
        game.step().unwrap();

        let flow = game.handle_input(&[InputEvent::Restart]).unwrap();

        assert_eq!(flow, Flow::Continue);
        assert!(!game.engine.is_over());
        assert_eq!(game.engine.snake().head(), Cell::new(11, 10));
    }

    #[test]
    fn quit_stops_before_later_events() {
        let mut game = SnakeGame::with_frontend(&config(20, 20), ScriptedFrontend::default());

        let flow = game.handle_input(&[InputEvent::Quit, InputEvent::Turn(Direction::Down)]).unwrap();

        assert_eq!(flow, Flow::Quit);
        assert_eq!(game.engine.pending_direction(), Direction::Right);
    }

    #[test]
    fn ticks_follow_scripted_turns() {
        let frontend = ScriptedFrontend::new(
            vec![vec![InputEvent::Turn(Direction::Down)], vec![], vec![]],
            vec![InputEvent::Turn(Direction::Right)],
        );
        let mut game = SnakeGame::with_frontend(&config(20, 20), frontend);

        game.run().unwrap();

        // One tick per poll, and the run-dry Quit comes before the fourth tick
        assert_eq!(game.engine.snake().head(), Cell::new(10, 13));
        assert!(game.frontend.restored);
        assert_eq!(game.frontend.cells.get(&Cell::new(10, 13)), Some(&CellColor::SnakeHead));
    }

    #[test]
    fn paused_game_does_not_tick() {
        let frontend = ScriptedFrontend::new(
            vec![vec![InputEvent::TogglePause], vec![], vec![], vec![]],
            vec![InputEvent::Turn(Direction::Right)],
        );
        let mut game = SnakeGame::with_frontend(&config(20, 20), frontend);

        game.run().unwrap();

        assert!(game.paused);
        assert_eq!(game.engine.snake().head(), Cell::new(10, 10));
        assert_eq!(game.frontend.messages.last().map(String::as_str), Some("Paused"));
    }

    #[test]
    fn restart_after_game_over() {
        // On a 4x4 board the snake starts at (2,2) and hits the wall on the second tick
        let frontend = ScriptedFrontend::new(
            vec![vec![], vec![]],
            vec![InputEvent::Turn(Direction::Right), InputEvent::Turn(Direction::Up), InputEvent::Restart],
        );
        let mut game = SnakeGame::with_frontend(&config(4, 4), frontend);

        game.run().unwrap();

        assert!(game.frontend.messages.iter().any(|m| m == "Game over!"));
        assert!(!game.engine.is_over());
        assert_eq!(game.engine.snake().head(), Cell::new(2, 2));
        assert_eq!(game.engine.snake().len(), 1);
        assert_eq!(game.frontend.cells.get(&Cell::new(2, 2)), Some(&CellColor::SnakeHead));
    }

    #[test]
    fn dead_snake_repainted_without_stale_tail() {
        let frontend = ScriptedFrontend::new(vec![vec![], vec![]], vec![InputEvent::Turn(Direction::Right)]);
        let mut game = SnakeGame::with_frontend(&config(4, 4), frontend);

        game.run().unwrap();

        assert!(game.engine.is_over());
        let body: Vec<Cell> = game.engine.snake().segments().copied().filter(|c| game.engine.in_bounds(*c)).collect();
        for cell in &body {
            assert_eq!(game.frontend.cells.get(cell), Some(&CellColor::DeadSnake));
        }
        let snake_cells = game.frontend.cells.values().filter(|c| **c != CellColor::Food).count();
        assert_eq!(snake_cells, body.len());
    }

    #[test]
    fn session_error_wins_over_restore_error() {
        let mut frontend = ScriptedFrontend::new(vec![], vec![InputEvent::Turn(Direction::Right)]);
        frontend.fail_poll = true;
        frontend.fail_restore = true;
        let mut game = SnakeGame::with_frontend(&config(20, 20), frontend);

        let err = game.run().unwrap_err();

        assert_eq!(err.to_string(), "poll failed");
        assert!(game.frontend.restored);
    }

    #[test]
    fn restore_error_reported_after_clean_session() {
        let mut frontend = ScriptedFrontend::new(vec![], vec![InputEvent::Quit]);
        frontend.fail_restore = true;
        let mut game = SnakeGame::with_frontend(&config(20, 20), frontend);

        let err = game.run().unwrap_err();

        assert_eq!(err.to_string(), "restore failed");
    }
}
