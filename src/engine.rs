use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info, trace};

use crate::config::GameConfig;
use crate::display::{CellColor, DisplayDelta};
use crate::snake::{Cell, Direction, Snake};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameState {
    Running,
    Over,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OverReason {
    Wall,
    SelfCollision,
    /// The snake covers every cell, so no food can be placed. A win.
    BoardFilled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    pub state: GameState,
    pub deltas: Vec<DisplayDelta>,
}

/// The snake simulation, advanced one step per `tick()`.
///
/// Direction changes only set a pending heading; the snake adopts it at the
/// start of the next tick. Once the game is over every operation except
/// `restart()` and `initialize()` is a no-op.
pub struct GameEngine {
    width: i32,
    height: i32,
    rng: StdRng,
    snake: Snake,
    food: Option<Cell>,
    pending: Direction,
    state: GameState,
    over_reason: Option<OverReason>,
}

impl GameEngine {
    pub fn new(config: &GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut engine = GameEngine {
            width: config.grid_width as i32,
            height: config.grid_height as i32,
            rng,
            snake: Snake::new(Cell::new(0, 0), Direction::Right),
            food: None,
            pending: Direction::Right,
            state: GameState::Running,
            over_reason: None,
        };
        engine.initialize();
        engine
    }

    /// Single head cell at the center heading right, fresh food.
    pub fn initialize(&mut self) {
        let center = Cell::new(self.width / 2, self.height / 2);
        self.snake = Snake::new(center, Direction::Right);
        self.pending = Direction::Right;
        self.state = GameState::Running;
        self.over_reason = None;
        self.food = spawn_food(&mut self.rng, self.width, self.height, &self.snake);

        info!(width = self.width, height = self.height, ?center, food = ?self.food, "game initialized");
    }

    /// Starts a new game if the current one is over. Returns whether it did.
    pub fn restart(&mut self) -> bool {
        if self.state == GameState::Running {
            return false;
        }

        info!(score = self.score(), "restarting");
        self.initialize();
        true
    }

    pub fn set_direction(&mut self, direction: Direction) {
        if self.state == GameState::Over {
            return;
        }

        if direction.is_opposite(self.snake.direction()) {
            trace!(?direction, heading = ?self.snake.direction(), "reversal ignored");
            return;
        }

        self.pending = direction;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.state == GameState::Over {
            return TickOutcome { state: GameState::Over, deltas: Vec::new() };
        }

        self.snake.set_direction(self.pending);

        let old_head = self.snake.head();
        let new_head = self.snake.next_head();
        let ate = self.food == Some(new_head);
        let vacated = self.snake.advance(ate);

        if ate {
            self.food = spawn_food(&mut self.rng, self.width, self.height, &self.snake);
            debug!(length = self.snake.len(), food = ?self.food, "food eaten");
        }

        let mut deltas = Vec::with_capacity(4);
        if let Some(cell) = vacated {
            deltas.push(DisplayDelta::Remove { cell });
        }
        if self.snake.len() > 1 {
            deltas.push(DisplayDelta::Place { cell: old_head, color: CellColor::SnakeBody });
        }

        // A crashed head is either off the grid or on a segment already drawn
        if let Some(reason) = self.collision() {
            return self.end(reason, deltas);
        }

        deltas.push(DisplayDelta::Place { cell: new_head, color: CellColor::SnakeHead });

        if ate {
            match self.food {
                Some(cell) => deltas.push(DisplayDelta::Place { cell, color: CellColor::Food }),
                None => return self.end(OverReason::BoardFilled, deltas),
            }
        }

        TickOutcome { state: self.state, deltas }
    }

    pub fn is_over(&self) -> bool {
        self.state == GameState::Over
    }

    pub fn over_reason(&self) -> Option<OverReason> {
        self.over_reason
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn food(&self) -> Option<Cell> {
        self.food
    }

    pub fn pending_direction(&self) -> Direction {
        self.pending
    }

    /// Segments eaten so far.
    pub fn score(&self) -> usize {
        self.snake.len() - 1
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.col >= 0 && cell.col < self.width && cell.row >= 0 && cell.row < self.height
    }

    /// Deltas that draw the whole current board onto an empty surface.
    pub fn snapshot(&self) -> Vec<DisplayDelta> {
        let mut deltas: Vec<DisplayDelta> = self.snake.segments()
            .enumerate()
            .filter(|(_, cell)| self.in_bounds(**cell))
            .map(|(i, &cell)| {
                let color = if i == 0 { CellColor::SnakeHead } else { CellColor::SnakeBody };
                DisplayDelta::Place { cell, color }
            })
            .collect();

        if let Some(cell) = self.food {
            deltas.push(DisplayDelta::Place { cell, color: CellColor::Food });
        }

        deltas
    }

    ///////////////////////////////////////////////////////////////////////////

    fn collision(&self) -> Option<OverReason> {
        let head = self.snake.head();

        if !self.in_bounds(head) {
            Some(OverReason::Wall)
        } else if self.snake.hits_body(head) {
            Some(OverReason::SelfCollision)
        } else {
            None
        }
    }

    fn end(&mut self, reason: OverReason, mut deltas: Vec<DisplayDelta>) -> TickOutcome {
        self.state = GameState::Over;
        self.over_reason = Some(reason);
        info!(?reason, score = self.score(), head = ?self.snake.head(), "game over");

        deltas.push(DisplayDelta::GameEnded(reason));
        TickOutcome { state: GameState::Over, deltas }
    }
}

/// Picks a uniformly random cell not covered by the snake, resampling on a
/// hit. `None` once the snake fills the board.
fn spawn_food<R: Rng>(rng: &mut R, width: i32, height: i32, snake: &Snake) -> Option<Cell> {
    if snake.len() >= width as usize * height as usize {
        return None;
    }

    loop {
        let cell = Cell::new(rng.gen_range(0..width), rng.gen_range(0..height));
        if !snake.contains(cell) {
            return Some(cell);
        }
    }
}

#[cfg(test)]
impl GameEngine {
    fn with_snake(config: &GameConfig, snake: Snake) -> Self {
        let mut engine = GameEngine::new(config);
        engine.pending = snake.direction();
        engine.snake = snake;
        engine.food = spawn_food(&mut engine.rng, engine.width, engine.height, &engine.snake);
        engine
    }

    fn place_food(&mut self, cell: Cell) {
        self.food = Some(cell);
    }
}
