//! Layout and drawing: board, sidebar, pause, quit menu, game over.

use crate::app::{QuitOption, Screen};
use crate::board::{Board, Cell, Pos};
use crate::hud::{CRITICAL_FRACTION, Hud, WARNING_FRACTION};
use crate::matcher::MatchSet;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal cells per board cell. Two rows so tiles read roughly square.
const CELL_WIDTH: u16 = 5;
const CELL_HEIGHT: u16 = 2;

const SIDEBAR_WIDTH: u16 = 26;

/// Everything a frame shows of the game itself.
pub struct Scene<'a> {
    pub board: &'a Board,
    pub theme: &'a Theme,
    pub hud: &'a Hud,
    pub cursor: Pos,
    pub selected: Option<Pos>,
    /// Pair to highlight: a hint, or the swap being animated.
    pub marked: Option<(Pos, Pos)>,
}

/// Board rect including its border, centred together with the sidebar.
fn board_outer_rect(area: Rect, size: usize) -> Rect {
    let n = size as u16;
    let bw = n * CELL_WIDTH + 2;
    let bh = n * CELL_HEIGHT + 2;
    let total_w = bw + SIDEBAR_WIDTH;
    Rect {
        x: area.x + area.width.saturating_sub(total_w) / 2,
        y: area.y + area.height.saturating_sub(bh) / 2,
        width: bw.min(area.width),
        height: bh.min(area.height),
    }
}

/// Board grid without border; matches what `draw_game` paints.
pub fn board_rect(area: Rect, size: usize) -> Rect {
    let outer = board_outer_rect(area, size);
    Rect {
        x: outer.x + 1,
        y: outer.y + 1,
        width: outer.width.saturating_sub(2),
        height: outer.height.saturating_sub(2),
    }
}

/// True when the whole board and sidebar fit the terminal.
pub fn fits(area: Rect, size: usize) -> bool {
    let n = size as u16;
    area.width >= n * CELL_WIDTH + 2 + SIDEBAR_WIDTH && area.height >= n * CELL_HEIGHT + 2
}

/// Board cell under a terminal position (mouse hit-testing).
pub fn cell_at(area: Rect, size: usize, x: u16, y: u16) -> Option<Pos> {
    if !fits(area, size) {
        return None;
    }
    let inner = board_rect(area, size);
    if !inner.contains(Position::new(x, y)) {
        return None;
    }
    let col = ((x - inner.x) / CELL_WIDTH) as usize;
    let row = ((y - inner.y) / CELL_HEIGHT) as usize;
    (row < size && col < size).then(|| Pos::new(row, col))
}

fn cell_origin(inner: Rect, pos: Pos) -> (u16, u16) {
    (
        inner.x + pos.col as u16 * CELL_WIDTH,
        inner.y + pos.row as u16 * CELL_HEIGHT,
    )
}

/// Buffer (x, y) positions covered by the given board cells.
fn buffer_positions(inner: Rect, cells: &MatchSet) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for pos in cells.iter() {
        let (x0, y0) = cell_origin(inner, pos);
        for bx in x0..(x0 + CELL_WIDTH).min(inner.right()) {
            for by in y0..(y0 + CELL_HEIGHT).min(inner.bottom()) {
                set.insert((bx, by));
            }
        }
    }
    set
}

/// Create or advance the clear fade (TachyonFX: fade cleared tiles to bg).
pub fn apply_clear_effect(
    frame: &mut Frame,
    scene: &Scene<'_>,
    cells: &MatchSet,
    fade: Duration,
    clear_effect: &mut Option<Effect>,
    process_time: &mut Option<Instant>,
    now: Instant,
) {
    let inner = board_rect(frame.area(), scene.board.size());
    let delta = process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *process_time = Some(now);

    if clear_effect.is_none() {
        let clearing = buffer_positions(inner, cells);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            clearing.contains(&(pos.x, pos.y))
        }));
        let bg = scene.theme.bg;
        let fade_ms = fade.as_millis().min(u32::MAX as u128) as u32;
        let effect = fx::fade_to(bg, bg, (fade_ms, Interpolation::Linear))
            .with_filter(filter)
            .with_area(inner);
        *clear_effect = Some(effect);
    }

    if let Some(effect) = clear_effect {
        frame.render_effect(effect, inner, TfxDuration::from_millis(delta_ms));
    }
}

/// Draw current screen with optional pause overlay or quit menu on top.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    scene: &Scene<'_>,
    paused: bool,
    quit_selected: Option<QuitOption>,
) {
    let area = frame.area();
    if !fits(area, scene.board.size()) {
        draw_too_small(frame, scene, area);
        return;
    }
    draw_game(frame, scene, area);
    match screen {
        Screen::Playing if paused => draw_pause_overlay(frame, scene.theme, area),
        Screen::Playing => {}
        Screen::GameOver => draw_game_over(frame, scene, area),
        Screen::QuitMenu => {
            draw_quit_menu(frame, scene.theme, quit_selected.unwrap_or(QuitOption::Resume));
        }
    }
}

fn draw_too_small(frame: &mut Frame, scene: &Scene<'_>, area: Rect) {
    let n = scene.board.size() as u16;
    let need = format!(
        "Terminal too small: need {}x{}",
        n * CELL_WIDTH + 2 + SIDEBAR_WIDTH,
        n * CELL_HEIGHT + 2
    );
    Paragraph::new(vec![Line::from(""), Line::from(need)])
        .alignment(Alignment::Center)
        .style(Style::default().fg(scene.theme.critical).bg(scene.theme.bg))
        .render(area, frame.buffer_mut());
}

fn draw_game(frame: &mut Frame, scene: &Scene<'_>, area: Rect) {
    let theme = scene.theme;
    let outer = board_outer_rect(area, scene.board.size());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" matchtui ", Style::default().fg(theme.title)));
    block.render(outer, frame.buffer_mut());

    let inner = board_rect(area, scene.board.size());
    draw_board(frame, scene, inner);

    let sidebar = Rect {
        x: outer.right() + 1,
        y: outer.y,
        width: SIDEBAR_WIDTH.saturating_sub(1),
        height: outer.height,
    };
    draw_sidebar(frame, scene, sidebar);
}

fn draw_board(frame: &mut Frame, scene: &Scene<'_>, inner: Rect) {
    let theme = scene.theme;
    let buf = frame.buffer_mut();
    let marked = |p: Pos| scene.marked.is_some_and(|(a, b)| a == p || b == p);

    for pos in scene.board.positions() {
        let (x0, y0) = cell_origin(inner, pos);
        let selected = scene.selected == Some(pos);
        let (bg, glyph, glyph_fg) = match scene.board[pos] {
            Cell::Empty => (theme.bg, " ", theme.bg),
            Cell::Tile(t) if selected => (theme.main_fg, Theme::tile_glyph(t.0), theme.tile_color(t.0)),
            Cell::Tile(t) => (theme.tile_color(t.0), Theme::tile_glyph(t.0), theme.bg),
        };
        for dy in 0..CELL_HEIGHT {
            for dx in 0..CELL_WIDTH {
                buf[(x0 + dx, y0 + dy)]
                    .set_symbol(" ")
                    .set_style(Style::default().bg(bg));
            }
        }
        let glyph_style = Style::default()
            .fg(glyph_fg)
            .bg(bg)
            .add_modifier(Modifier::BOLD);
        buf.set_string(x0 + CELL_WIDTH / 2, y0, glyph, glyph_style);

        if pos == scene.cursor {
            let cursor_style = Style::default()
                .fg(theme.bg)
                .bg(bg)
                .add_modifier(Modifier::BOLD);
            buf.set_string(x0, y0, "[", cursor_style);
            buf.set_string(x0 + CELL_WIDTH - 1, y0, "]", cursor_style);
        }
        if marked(pos) {
            buf.set_string(x0 + 1, y0 + 1, "···", Style::default().fg(theme.bg).bg(bg));
        }
    }
}

fn draw_sidebar(frame: &mut Frame, scene: &Scene<'_>, area: Rect) {
    let theme = scene.theme;
    let hud = scene.hud;
    let title_style = Style::default().fg(theme.title);
    let text_style = Style::default().fg(theme.main_fg);

    // --- Timer (own border) ---
    let timer_outer = Rect {
        height: 3.min(area.height),
        ..area
    };
    let timer_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line))
        .title(Span::styled(" Time ", title_style));
    let timer_inner = timer_block.inner(timer_outer);
    timer_block.render(timer_outer, frame.buffer_mut());
    let ratio = hud.countdown.fraction();
    let bar_color = if ratio < CRITICAL_FRACTION {
        theme.critical
    } else if ratio < WARNING_FRACTION {
        theme.warning
    } else {
        theme.tiles[0]
    };
    let secs = hud.countdown.remaining().as_secs_f64();
    Gauge::default()
        .ratio(ratio)
        .label(format!("{secs:.1}s"))
        .gauge_style(Style::default().fg(bar_color).bg(theme.bg))
        .render(timer_inner, frame.buffer_mut());

    // --- Stats ---
    let stats_outer = Rect {
        y: timer_outer.bottom(),
        height: 5.min(area.height.saturating_sub(timer_outer.height)),
        ..area
    };
    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line))
        .title(Span::styled(" Stats ", title_style));
    let stats_inner = stats_block.inner(stats_outer);
    stats_block.render(stats_outer, frame.buffer_mut());
    let selection = scene
        .selected
        .map_or_else(|| "-".to_string(), |p| p.to_string());
    let stat = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value, text_style),
        ])
    };
    Paragraph::new(vec![
        stat("Cleared:  ", hud.cleared.to_string()),
        stat("Chain:    ", format!("x{}", hud.last_chain)),
        stat("Selected: ", selection),
    ])
    .render(stats_inner, frame.buffer_mut());

    // --- Controls ---
    let help_outer = Rect {
        y: stats_outer.bottom(),
        height: area.bottom().saturating_sub(stats_outer.bottom()),
        ..area
    };
    let help_style = Style::default().fg(theme.inactive_fg);
    let help = [
        "Arrows/hjkl  Move",
        "Space/Enter  Select",
        "Mouse        Click",
        "? / t        Hint",
        "p            Pause",
        "q / Esc      Menu",
    ];
    Paragraph::new(
        help.iter()
            .map(|h| Line::from(Span::styled(*h, help_style)))
            .collect::<Vec<_>>(),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line))
            .title(Span::styled(" Controls ", title_style)),
    )
    .render(help_outer, frame.buffer_mut());
}

/// Centred popup of the given size, clipped to `area`.
fn popup_rect(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = popup_rect(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(theme.bg).bg(theme.warning),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P: Resume    Q: Menu ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, scene: &Scene<'_>, area: Rect) {
    let theme = scene.theme;
    let popup = popup_rect(area, 30, 8);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Time's up! ",
            Style::default()
                .fg(theme.bg)
                .bg(theme.critical)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Tiles cleared: ", Style::default().fg(theme.title)),
            Span::styled(
                scene.hud.cleared.to_string(),
                Style::default().fg(theme.main_fg),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "R: Play again   Q: Quit",
            Style::default().fg(theme.inactive_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.title).bg(theme.bg))
                .title(" Game over "),
        )
        .render(popup, frame.buffer_mut());
}

pub fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let area = frame.area();
    let quit_rect = popup_rect(area, 24, 8);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(" Quit? ");

    // Clear background
    for y in quit_rect.y..quit_rect.bottom() {
        for x in quit_rect.x..quit_rect.right() {
            frame.buffer_mut()[(x, y)]
                .set_symbol(" ")
                .set_style(Style::default().bg(theme.bg));
        }
    }

    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    for (i, opt) in QuitOption::ALL.iter().enumerate() {
        let style = if *opt == selected {
            Style::default()
                .fg(theme.bg)
                .bg(theme.title)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.title)
        };
        let label = opt.label();
        let rx = inner.x + (inner.width.saturating_sub(label.len() as u16)) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if ry < inner.bottom() {
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}
