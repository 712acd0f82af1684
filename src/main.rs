use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use grid_snake::{config::GameConfig, game::SnakeGame, logging};

#[derive(Parser)]
#[command(name = "snake")]
#[command(version, about = "Classic snake on a fixed grid, in the terminal")]
struct Cli {
    /// TOML file with gridWidth, gridHeight, tickIntervalMs, cellWidth, seed
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid width in cells
    #[arg(long)]
    width: Option<u16>,

    /// Grid height in cells
    #[arg(long)]
    height: Option<u16>,

    /// Milliseconds between moves
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Terminal columns per cell
    #[arg(long)]
    cell_width: Option<u16>,

    /// Seed for food placement
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs to this file (filter with RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn game_config(&self) -> Result<GameConfig> {
        let mut config = GameConfig::load(self.config.as_deref())?;

        if let Some(width) = self.width {
            config.grid_width = width;
        }
        if let Some(height) = self.height {
            config.grid_height = height;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_interval_ms = tick_ms;
        }
        if let Some(cell_width) = self.cell_width {
            config.cell_width = cell_width;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_file.as_deref())?;

    let config = cli.game_config().context("invalid configuration")?;
    info!(?config, "starting");

    let mut game = SnakeGame::new(&config)?;
    game.run()
}
