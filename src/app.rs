//! App: terminal init, main loop, key and mouse handling.

use crate::GameConfig;
use crate::board::Pos;
use crate::engine::{ClickOutcome, MatchThreeEngine, StalemateOutcome};
use crate::hud::Hud;
use crate::input::{Action, key_to_action};
use crate::terminal::TerminalPresenter;
use crate::theme::Theme;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tracing::info;

/// Render interval (~60 FPS).
const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    Restart,
    Exit,
}

impl QuitOption {
    pub const ALL: [Self; 3] = [Self::Resume, Self::Restart, Self::Exit];

    pub fn label(self) -> &'static str {
        match self {
            Self::Resume => " Resume ",
            Self::Restart => " Restart ",
            Self::Exit => " Exit ",
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Resume => Self::Restart,
            Self::Restart => Self::Exit,
            Self::Exit => Self::Resume,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Resume => Self::Exit,
            Self::Restart => Self::Resume,
            Self::Exit => Self::Restart,
        }
    }
}

/// Clamped cursor step on an `n`x`n` board.
fn step(cursor: Pos, action: Action, n: usize) -> Pos {
    let last = n.saturating_sub(1);
    match action {
        Action::Up => Pos::new(cursor.row.saturating_sub(1), cursor.col),
        Action::Down => Pos::new((cursor.row + 1).min(last), cursor.col),
        Action::Left => Pos::new(cursor.row, cursor.col.saturating_sub(1)),
        Action::Right => Pos::new(cursor.row, (cursor.col + 1).min(last)),
        _ => cursor,
    }
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    engine: MatchThreeEngine,
    hud: Hud,
    screen: Screen,
    paused: bool,
    cursor: Pos,
    hint: Option<(Pos, Pos)>,
    quit_selected: QuitOption,
    /// Frame area of the last draw; mouse clicks are hit-tested against it.
    last_area: Rect,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme, engine: MatchThreeEngine) -> Self {
        let hud = Hud::new(config.time_limit, config.bonus_per_tile, Instant::now());
        Self {
            config,
            theme,
            engine,
            hud,
            screen: Screen::Playing,
            paused: false,
            cursor: Pos::new(0, 0),
            hint: None,
            quit_selected: QuitOption::Resume,
            last_area: Rect::default(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        self.hud.reset(Instant::now());

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            self.hud.countdown.tick(now);
            if self.screen == Screen::Playing && self.hud.countdown.is_expired() {
                info!(cleared = self.hud.cleared, "time up");
                self.screen = Screen::GameOver;
                self.paused = false;
            }

            self.draw(terminal)?;

            if self.screen == Screen::Playing
                && !self.paused
                && !self.engine.is_processing()
                && self.engine.stalemate_pending()
            {
                let outcome = {
                    let mut io = TerminalPresenter::new(
                        terminal,
                        &mut self.hud,
                        &self.theme,
                        self.engine.board(),
                        self.cursor,
                        self.config.animation,
                    );
                    self.engine.poll_stalemate(now, &mut io)?
                };
                if outcome == StalemateOutcome::Reloaded {
                    self.hint = None;
                }
            }

            let timeout = FRAME.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if self.apply_action(key_to_action(key), terminal)? {
                                return Ok(());
                            }
                        }
                        Event::Mouse(mouse)
                            if mouse.kind == MouseEventKind::Down(MouseButton::Left) =>
                        {
                            self.apply_mouse(mouse.column, mouse.row, terminal)?;
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    fn draw(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let scene = crate::ui::Scene {
            board: self.engine.board(),
            theme: &self.theme,
            hud: &self.hud,
            cursor: self.cursor,
            selected: self.engine.selected(),
            marked: self.hint,
        };
        let quit = (self.screen == Screen::QuitMenu).then_some(self.quit_selected);
        let mut area = self.last_area;
        terminal.draw(|f| {
            area = f.area();
            crate::ui::draw(f, self.screen, &scene, self.paused, quit);
        })?;
        self.last_area = area;
        Ok(())
    }

    /// Handle one key action. Returns true when the player chose to exit.
    fn apply_action(&mut self, action: Action, terminal: &mut DefaultTerminal) -> Result<bool> {
        let now = Instant::now();
        match self.screen {
            Screen::Playing if self.paused => match action {
                Action::Pause => self.set_paused(false, now),
                Action::Quit => self.open_quit_menu(now),
                _ => {}
            },
            Screen::Playing => match action {
                Action::Up | Action::Down | Action::Left | Action::Right => {
                    self.cursor = step(self.cursor, action, self.engine.board().size());
                }
                Action::Select => self.click(self.cursor, terminal)?,
                Action::Hint => self.hint = self.engine.hint(),
                Action::Pause => self.set_paused(true, now),
                Action::Quit => self.open_quit_menu(now),
                Action::Restart | Action::None => {}
            },
            Screen::GameOver => match action {
                Action::Restart | Action::Select => self.restart(terminal)?,
                Action::Quit => return Ok(true),
                _ => {}
            },
            Screen::QuitMenu => match action {
                Action::Up | Action::Left => self.quit_selected = self.quit_selected.prev(),
                Action::Down | Action::Right => self.quit_selected = self.quit_selected.next(),
                Action::Quit => self.resume(now),
                Action::Select => match self.quit_selected {
                    QuitOption::Resume => self.resume(now),
                    QuitOption::Restart => self.restart(terminal)?,
                    QuitOption::Exit => return Ok(true),
                },
                _ => {}
            },
        }
        Ok(false)
    }

    fn apply_mouse(&mut self, x: u16, y: u16, terminal: &mut DefaultTerminal) -> Result<()> {
        if self.screen != Screen::Playing || self.paused {
            return Ok(());
        }
        if let Some(pos) = crate::ui::cell_at(self.last_area, self.engine.board().size(), x, y) {
            self.click(pos, terminal)?;
        }
        Ok(())
    }

    fn click(&mut self, pos: Pos, terminal: &mut DefaultTerminal) -> Result<()> {
        self.cursor = pos;
        self.hud.begin_move();
        let outcome = {
            let mut io = TerminalPresenter::new(
                terminal,
                &mut self.hud,
                &self.theme,
                self.engine.board(),
                self.cursor,
                self.config.animation,
            );
            self.engine.cell_clicked(pos, &mut io)?
        };
        self.hud.end_move();
        if matches!(outcome, ClickOutcome::Committed(_) | ClickOutcome::RolledBack) {
            self.hint = None;
        }
        Ok(())
    }

    fn set_paused(&mut self, paused: bool, now: Instant) {
        self.paused = paused;
        self.hud.countdown.set_paused(paused, now);
    }

    fn open_quit_menu(&mut self, now: Instant) {
        self.screen = Screen::QuitMenu;
        self.quit_selected = QuitOption::Resume;
        self.hud.countdown.set_paused(true, now);
    }

    fn resume(&mut self, now: Instant) {
        self.screen = Screen::Playing;
        self.hud.countdown.set_paused(self.paused, now);
    }

    fn restart(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        self.hud.reset(Instant::now());
        self.screen = Screen::Playing;
        self.paused = false;
        self.hint = None;
        {
            let mut io = TerminalPresenter::new(
                terminal,
                &mut self.hud,
                &self.theme,
                self.engine.board(),
                self.cursor,
                self.config.animation,
            );
            self.engine.restart(&mut io)?;
        }
        // Round starts once the new board is on screen.
        self.hud.countdown.reset(Instant::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_is_clamped_to_board() {
        let corner = Pos::new(0, 0);
        assert_eq!(step(corner, Action::Up, 8), corner);
        assert_eq!(step(corner, Action::Left, 8), corner);
        assert_eq!(step(corner, Action::Right, 8), Pos::new(0, 1));
        let far = Pos::new(7, 7);
        assert_eq!(step(far, Action::Down, 8), far);
        assert_eq!(step(far, Action::Right, 8), far);
        assert_eq!(step(far, Action::Select, 8), far);
    }

    #[test]
    fn test_quit_options_cycle() {
        let mut opt = QuitOption::Resume;
        for _ in 0..QuitOption::ALL.len() {
            opt = opt.next();
        }
        assert_eq!(opt, QuitOption::Resume);
        assert_eq!(QuitOption::Resume.prev(), QuitOption::Exit);
    }
}
