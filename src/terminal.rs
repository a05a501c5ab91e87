//! Terminal-backed presenter: draws every board change and plays animations
//! as blocking waits so the engine resumes only once they have finished.

use crate::app::Screen;
use crate::board::{Board, Cell, Pos};
use crate::hud::Hud;
use crate::matcher::MatchSet;
use crate::present::{Animation, Presenter, ScoreSink};
use crate::theme::Theme;
use crate::ui::{self, Scene};
use crossterm::event;
use ratatui::DefaultTerminal;
use std::io;
use std::time::{Duration, Instant};
use tachyonfx::Effect;
use tracing::{debug, warn};

/// Frame interval while an animation is playing (~60 FPS).
const FRAME: Duration = Duration::from_millis(16);
/// The clear fade gives up after this many times its nominal length.
const TIMEOUT_FACTOR: u32 = 4;

#[derive(Debug, Clone, Copy)]
pub struct AnimationTiming {
    /// Length of swap, clear and drop animations.
    pub step: Duration,
    pub enabled: bool,
}

impl AnimationTiming {
    fn duration_of(self, animation: &Animation<'_>) -> Duration {
        match animation {
            Animation::Reload(_) => self.step * 2,
            _ => self.step,
        }
    }
}

pub struct TerminalPresenter<'a> {
    terminal: &'a mut DefaultTerminal,
    hud: &'a mut Hud,
    theme: &'a Theme,
    cursor: Pos,
    /// Last board the engine rendered; cleared cells are blanked after their fade.
    shown: Board,
    timing: AnimationTiming,
}

impl<'a> TerminalPresenter<'a> {
    pub fn new(
        terminal: &'a mut DefaultTerminal,
        hud: &'a mut Hud,
        theme: &'a Theme,
        board: &Board,
        cursor: Pos,
        timing: AnimationTiming,
    ) -> Self {
        Self {
            terminal,
            hud,
            theme,
            cursor,
            shown: board.clone_snapshot(),
            timing,
        }
    }

    fn draw(
        &mut self,
        marked: Option<(Pos, Pos)>,
        clearing: Option<(&MatchSet, &mut Option<Effect>, &mut Option<Instant>)>,
        now: Instant,
    ) -> io::Result<()> {
        let scene = Scene {
            board: &self.shown,
            theme: self.theme,
            hud: &*self.hud,
            cursor: self.cursor,
            selected: None,
            marked,
        };
        let fade = self.timing.step;
        self.terminal.draw(|f| {
            ui::draw(f, Screen::Playing, &scene, false, None);
            if let Some((cells, effect, process_time)) = clearing {
                ui::apply_clear_effect(f, &scene, cells, fade, effect, process_time, now);
            }
        })?;
        Ok(())
    }

    /// Drop any input that arrives while the board is moving.
    fn discard_input(&mut self, timeout: Duration) -> io::Result<()> {
        let mut dropped = 0usize;
        if event::poll(timeout)? {
            while event::poll(Duration::ZERO)? {
                event::read()?;
                dropped += 1;
            }
        }
        if dropped > 0 {
            debug!(dropped, "input discarded during animation");
        }
        Ok(())
    }

    /// Keep the current frame up for `duration`, ticking the countdown.
    fn hold(&mut self, duration: Duration, marked: Option<(Pos, Pos)>) -> io::Result<()> {
        let start = Instant::now();
        loop {
            let now = Instant::now();
            self.hud.countdown.tick(now);
            self.draw(marked, None, now)?;
            let elapsed = now.saturating_duration_since(start);
            if elapsed >= duration {
                return Ok(());
            }
            self.discard_input(FRAME.min(duration - elapsed))?;
        }
    }

    /// Fade the cleared tiles out, then blank them on the shown board.
    fn fade_out(&mut self, cells: &MatchSet) -> io::Result<()> {
        let start = Instant::now();
        let deadline = start + self.timing.step * TIMEOUT_FACTOR;
        let mut effect: Option<Effect> = None;
        let mut process_time: Option<Instant> = None;
        loop {
            let now = Instant::now();
            self.hud.countdown.tick(now);
            self.draw(None, Some((cells, &mut effect, &mut process_time)), now)?;
            if effect.as_ref().is_some_and(Effect::done) {
                break;
            }
            if now >= deadline {
                warn!(
                    animation = "clear",
                    elapsed = ?now.saturating_duration_since(start),
                    "animation wait timed out"
                );
                break;
            }
            self.discard_input(FRAME)?;
        }
        self.blank(cells);
        Ok(())
    }

    fn blank(&mut self, cells: &MatchSet) {
        for pos in cells.iter() {
            if self.shown.contains(pos) {
                self.shown[pos] = Cell::Empty;
            }
        }
    }
}

impl Presenter for TerminalPresenter<'_> {
    fn render_board(&mut self, board: &Board) -> io::Result<()> {
        self.shown = board.clone_snapshot();
        self.draw(None, None, Instant::now())
    }

    fn animate(&mut self, animation: Animation<'_>) -> io::Result<()> {
        if !self.timing.enabled {
            if let Animation::Clear(cells) = animation {
                self.blank(cells);
            }
            return self.draw(None, None, Instant::now());
        }
        let duration = self.timing.duration_of(&animation);
        match animation {
            Animation::Swap(a, b) => self.hold(duration, Some((a, b))),
            Animation::Clear(cells) => self.fade_out(cells),
            Animation::Drop(board) | Animation::Reload(board) => {
                debug!(animation = animation.name(), "holding frame");
                self.shown = board.clone_snapshot();
                self.hold(duration, None)
            }
        }
    }
}

impl ScoreSink for TerminalPresenter<'_> {
    fn on_tiles_cleared(&mut self, count: usize) {
        self.hud.on_tiles_cleared(count);
    }
}
