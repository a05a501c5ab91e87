//! Match-3 engine: selection, swap validation, cascades and stalemate reloads.
//!
//! All state lives in [`MatchThreeEngine`]. Entry points (`cell_clicked`,
//! `poll_stalemate`, `restart`) check the processing flag first; while a move
//! or reload is being resolved every new request is rejected.

use crate::board::{Board, BoardError, DEFAULT_SIZE, Pos};
use crate::cascade::{self, Cascade};
use crate::generator::{self, DEFAULT_TILE_TYPES, GenerateError};
use crate::present::{Animation, Presenter, ScoreSink};
use crate::stalemate::{StalemateTimer, find_move, has_any_move};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

/// Fresh boards drawn before giving up on finding one with a legal move.
const MAX_RELOAD_ATTEMPTS: u32 = 32;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub size: usize,
    pub tile_types: u8,
    /// Debounce before checking for a stalemate after a move settles.
    pub stalemate_delay: Duration,
    /// Fixed RNG seed for reproducible boards.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            tile_types: DEFAULT_TILE_TYPES,
            stalemate_delay: Duration::from_millis(600),
            seed: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error("presentation failed: {0}")]
    Present(#[from] io::Error),
    #[error("cells {a} and {b} are not adjacent")]
    NotAdjacent { a: Pos, b: Pos },
    #[error("no board with a legal move after {attempts} attempts")]
    NoPlayableBoard { attempts: u32 },
}

/// Selection state between player clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Selecting(Pos),
}

/// What a click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Engine busy; input dropped.
    Ignored,
    Selected(Pos),
    /// Same or non-adjacent cell: selection cancelled, board untouched.
    Deselected,
    /// Swap stood; the cascade it triggered.
    Committed(Cascade),
    /// Swap produced no match and was reversed.
    RolledBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StalemateOutcome {
    NotDue,
    /// Came due while the engine was busy; dropped until the next settle.
    Skipped,
    Playable,
    Reloaded,
}

#[derive(Debug)]
pub struct MatchThreeEngine {
    config: EngineConfig,
    board: Board,
    rng: StdRng,
    phase: Phase,
    processing: bool,
    stalemate: StalemateTimer,
}

impl MatchThreeEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);
        let board = fresh_board(&config, &mut rng)?;
        info!(size = config.size, tile_types = config.tile_types, seed, "engine ready");
        Ok(Self {
            stalemate: StalemateTimer::new(config.stalemate_delay),
            config,
            board,
            rng,
            phase: Phase::Idle,
            processing: false,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn selected(&self) -> Option<Pos> {
        match self.phase {
            Phase::Selecting(p) => Some(p),
            Phase::Idle => None,
        }
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn stalemate_pending(&self) -> bool {
        self.stalemate.is_pending()
    }

    /// A swap that would produce a match, if any.
    pub fn hint(&self) -> Option<(Pos, Pos)> {
        find_move(&self.board)
    }

    /// Normalized input: the player clicked `pos`.
    pub fn cell_clicked<P>(&mut self, pos: Pos, io: &mut P) -> Result<ClickOutcome, EngineError>
    where
        P: Presenter + ScoreSink + ?Sized,
    {
        if self.processing {
            debug!(%pos, "click rejected while processing");
            return Ok(ClickOutcome::Ignored);
        }
        self.board.get(pos)?;
        match self.phase {
            Phase::Idle => {
                self.phase = Phase::Selecting(pos);
                Ok(ClickOutcome::Selected(pos))
            }
            Phase::Selecting(first) => {
                self.phase = Phase::Idle;
                if first == pos {
                    return Ok(ClickOutcome::Deselected);
                }
                if !first.is_adjacent(pos) {
                    self.stalemate.schedule(Instant::now());
                    return Ok(ClickOutcome::Deselected);
                }
                self.attempt_swap(first, pos, io)
            }
        }
    }

    fn attempt_swap<P>(&mut self, a: Pos, b: Pos, io: &mut P) -> Result<ClickOutcome, EngineError>
    where
        P: Presenter + ScoreSink + ?Sized,
    {
        if !a.is_adjacent(b) {
            return Err(EngineError::NotAdjacent { a, b });
        }
        self.processing = true;
        let outcome = self.swap_and_resolve(a, b, io);
        self.processing = false;
        if outcome.is_ok() {
            self.stalemate.schedule(Instant::now());
        }
        outcome
    }

    fn swap_and_resolve<P>(&mut self, a: Pos, b: Pos, io: &mut P) -> Result<ClickOutcome, EngineError>
    where
        P: Presenter + ScoreSink + ?Sized,
    {
        self.board.swap(a, b)?;
        io.render_board(&self.board)?;
        io.animate(Animation::Swap(a, b))?;

        let cascade = cascade::resolve(&mut self.board, &mut self.rng, self.config.tile_types, io)?;
        if cascade.matched() {
            info!(%a, %b, passes = cascade.passes, cleared = cascade.cleared, "move committed");
            return Ok(ClickOutcome::Committed(cascade));
        }

        debug!(%a, %b, "no match, rolling back");
        self.board.swap(a, b)?;
        io.render_board(&self.board)?;
        io.animate(Animation::Swap(b, a))?;
        Ok(ClickOutcome::RolledBack)
    }

    /// Run the debounced stalemate check if it is due; reload on a dead board.
    pub fn poll_stalemate<P>(&mut self, now: Instant, io: &mut P) -> Result<StalemateOutcome, EngineError>
    where
        P: Presenter + ScoreSink + ?Sized,
    {
        if !self.stalemate.take_due(now) {
            return Ok(StalemateOutcome::NotDue);
        }
        if self.processing {
            return Ok(StalemateOutcome::Skipped);
        }
        if has_any_move(&self.board) {
            return Ok(StalemateOutcome::Playable);
        }
        info!("stalemate, reloading board\n{}", self.board);
        self.reload(io)?;
        Ok(StalemateOutcome::Reloaded)
    }

    /// Throw the board away and start over.
    pub fn restart<P>(&mut self, io: &mut P) -> Result<(), EngineError>
    where
        P: Presenter + ScoreSink + ?Sized,
    {
        if self.processing {
            debug!("restart rejected while processing");
            return Ok(());
        }
        self.phase = Phase::Idle;
        self.stalemate.cancel();
        self.reload(io)?;
        info!("game restarted");
        Ok(())
    }

    fn reload<P>(&mut self, io: &mut P) -> Result<(), EngineError>
    where
        P: Presenter + ScoreSink + ?Sized,
    {
        self.processing = true;
        let result = self.replace_board(io);
        self.processing = false;
        if result.is_ok() {
            self.stalemate.schedule(Instant::now());
        }
        result
    }

    fn replace_board<P>(&mut self, io: &mut P) -> Result<(), EngineError>
    where
        P: Presenter + ScoreSink + ?Sized,
    {
        self.board = fresh_board(&self.config, &mut self.rng)?;
        io.render_board(&self.board)?;
        io.animate(Animation::Reload(&self.board))?;
        // Generated boards are match-free; re-validate before handing back control.
        cascade::resolve(&mut self.board, &mut self.rng, self.config.tile_types, io)?;
        Ok(())
    }

    #[cfg(test)]
    fn with_board(config: EngineConfig, board: Board) -> Self {
        Self {
            stalemate: StalemateTimer::new(config.stalemate_delay),
            rng: StdRng::seed_from_u64(config.seed.unwrap_or(0)),
            config,
            board,
            phase: Phase::Idle,
            processing: false,
        }
    }
}

/// Generated board that has at least one legal move.
fn fresh_board<R: Rng + ?Sized>(config: &EngineConfig, rng: &mut R) -> Result<Board, EngineError> {
    for attempt in 1..=MAX_RELOAD_ATTEMPTS {
        let board = generator::generate(config.size, config.tile_types, rng)?;
        if has_any_move(&board) {
            return Ok(board);
        }
        debug!(attempt, "generated board has no move");
    }
    Err(EngineError::NoPlayableBoard {
        attempts: MAX_RELOAD_ATTEMPTS,
    })
}
