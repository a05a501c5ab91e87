//! matchtui: match-3 tile swapping puzzle in the terminal.

mod app;
mod board;
mod cascade;
mod engine;
mod generator;
mod hud;
mod input;
mod matcher;
mod present;
mod stalemate;
mod terminal;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use engine::{EngineConfig, MatchThreeEngine};
use std::path::{Path, PathBuf};
use std::time::Duration;
use terminal::AnimationTiming;
use tracing::info;

/// Options derived from CLI that affect engine and round behaviour.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub engine: EngineConfig,
    pub time_limit: Duration,
    pub bonus_per_tile: Duration,
    pub animation: AnimationTiming,
}

impl GameConfig {
    fn from_args(args: &Args) -> Self {
        let step = Duration::from_millis(args.animation_ms);
        Self {
            engine: EngineConfig {
                size: args.size,
                tile_types: args.tile_types,
                // Long enough for the last drop to finish on screen.
                stalemate_delay: step * 2,
                seed: args.seed,
            },
            time_limit: Duration::from_secs(args.time_limit),
            bonus_per_tile: Duration::try_from_secs_f64(args.bonus_per_tile.max(0.0))
                .unwrap_or(Duration::ZERO),
            animation: AnimationTiming {
                step,
                enabled: !args.no_animation,
            },
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let config = GameConfig::from_args(&args);
    info!(?config, "starting");
    let engine = MatchThreeEngine::new(config.engine.clone())
        .context("could not build a starting board")?;
    let mut app = App::new(config, theme, engine);
    app.run()?;
    Ok(())
}

/// Log to a file only; the terminal belongs to the TUI. No file, no subscriber.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let log_file = std::fs::File::create(path)
        .with_context(|| format!("could not create log file {}", path.display()))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

/// Match-3 tile swapping puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "matchtui",
    version,
    about = "Match-3 tile swapping puzzle in the terminal. Swap neighbours to line up three or more.",
    long_about = "matchtui is a terminal match-3 game.\n\n\
        Swap two neighbouring tiles to make a row or column of three or more of the same kind. \
        Matched tiles vanish, the tiles above fall down and new ones drop in from the top, \
        which can set off further matches. Swaps that match nothing are undone. \
        Every cleared tile adds time to the clock; play until it runs out.\n\n\
        CONTROLS:\n  Arrows / hjkl  Move cursor   Space / Enter  Select / swap   Mouse  Click a tile\n  \
        ? / t          Hint          P              Pause           R      Restart (game over)\n  \
        Q / Esc        Menu\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Board side length in cells.
    #[arg(long, default_value = "8", value_name = "N", value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(4..=12))]
    pub size: usize,

    /// Number of distinct tile kinds. Fewer than 3 cannot build a board without matches.
    #[arg(long, default_value = "6", value_name = "K", value_parser = clap::value_parser!(u8).range(1..=8))]
    pub tile_types: u8,

    /// Round length in seconds.
    #[arg(long, default_value = "60", value_name = "SECS")]
    pub time_limit: u64,

    /// Seconds added per cleared tile (capped at the round length).
    #[arg(long, default_value = "0.5", value_name = "SECS")]
    pub bonus_per_tile: f64,

    /// Length of swap, clear and drop animations in ms.
    #[arg(long, default_value = "300", value_name = "MS")]
    pub animation_ms: u64,

    /// Disable animations (board changes are drawn immediately).
    #[arg(long)]
    pub no_animation: bool,

    /// Fixed RNG seed for reproducible boards.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Write logs here (filter with RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["matchtui"]).unwrap();
        let config = GameConfig::from_args(&args);
        assert_eq!(config.engine.size, 8);
        assert_eq!(config.engine.tile_types, 6);
        assert_eq!(config.time_limit, Duration::from_secs(60));
        assert_eq!(config.bonus_per_tile, Duration::from_millis(500));
        assert_eq!(config.animation.step, Duration::from_millis(300));
        assert_eq!(config.engine.stalemate_delay, Duration::from_millis(600));
        assert!(config.animation.enabled);
        assert_eq!(args.palette, Palette::Normal);
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "matchtui",
            "--size",
            "5",
            "--tile-types",
            "4",
            "--seed",
            "7",
            "--no-animation",
            "--palette",
            "high-contrast",
        ])
        .unwrap();
        let config = GameConfig::from_args(&args);
        assert_eq!(config.engine.size, 5);
        assert_eq!(config.engine.tile_types, 4);
        assert_eq!(config.engine.seed, Some(7));
        assert!(!config.animation.enabled);
        assert_eq!(args.palette, Palette::HighContrast);
    }

    #[test]
    fn test_out_of_range_size_rejected() {
        assert!(Args::try_parse_from(["matchtui", "--size", "3"]).is_err());
        assert!(Args::try_parse_from(["matchtui", "--size", "13"]).is_err());
        assert!(Args::try_parse_from(["matchtui", "--tile-types", "9"]).is_err());
    }
}
