//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Most tile types the theme can tell apart.
pub const MAX_TILE_TYPES: usize = 8;

/// Glyph drawn in the middle of each tile so types differ by shape, not only colour.
const TILE_GLYPHS: [&str; MAX_TILE_TYPES] = ["●", "▲", "■", "◆", "★", "♥", "♣", "✚"];

/// One Dark palette and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Tile colours by tile type: green, yellow, red, blue, magenta, cyan, orange, grey.
    pub tiles: [Color; MAX_TILE_TYPES],
    /// Board background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (timer, counters).
    pub main_fg: Color,
    /// Highlight / titles / cursor.
    pub title: Color,
    /// Secondary text (controls help).
    pub inactive_fg: Color,
    /// Timer gauge below half time.
    pub warning: Color,
    /// Timer gauge below a fifth of the time.
    pub critical: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

/// Hex literals known to be valid; keeps the defaults free of `unwrap`.
const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

impl Theme {
    /// One Dark defaults (values from onedark.theme).
    pub fn onedark_default() -> Self {
        Self {
            tiles: [
                rgb(0x98C379), // green
                rgb(0xE5C07B), // yellow
                rgb(0xE06C75), // red
                rgb(0x61AFEF), // blue
                rgb(0xC678DD), // magenta
                rgb(0x56B6C2), // cyan
                rgb(0xD19A66), // orange
                rgb(0xABB2BF), // grey
            ],
            bg: rgb(0x31353F),
            div_line: rgb(0x3F444F),
            main_fg: rgb(0xABB2BF),
            title: rgb(0xE5C07B),
            inactive_fg: rgb(0x5C6370),
            warning: rgb(0xE5C07B),
            critical: rgb(0xE06C75),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    /// `palette` selects colour variant: Normal (theme), HighContrast, or Colorblind.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override tile colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.tiles = [
                    rgb(0x00FF00),
                    rgb(0xFFFF00),
                    rgb(0xFF0000),
                    rgb(0x0088FF),
                    rgb(0xFF00FF),
                    rgb(0x00FFFF),
                    rgb(0xFF8800),
                    rgb(0xFFFFFF),
                ];
            }
            crate::Palette::Colorblind => {
                // Paul Tol's bright/vibrant sets; glyphs carry the rest.
                self.tiles = [
                    rgb(0x0077BB),
                    rgb(0xEE7733),
                    rgb(0x009988),
                    rgb(0xCC3311),
                    rgb(0xEE3377),
                    rgb(0xBBBB00),
                    rgb(0x33BBEE),
                    rgb(0xBBBBBB),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v.trim_matches('"').trim_matches('\'').trim()).ok())
        };
        let d = Self::onedark_default();
        Self {
            tiles: [
                get("mem_box").or_else(|| get("cpu_start")).unwrap_or(d.tiles[0]),
                get("title").or_else(|| get("cpu_mid")).unwrap_or(d.tiles[1]),
                get("cpu_end").or_else(|| get("temp_end")).unwrap_or(d.tiles[2]),
                get("cpu_box").unwrap_or(d.tiles[3]),
                get("net_box").unwrap_or(d.tiles[4]),
                get("hi_fg").or_else(|| get("proc_misc")).unwrap_or(d.tiles[5]),
                get("temp_mid").unwrap_or(d.tiles[6]),
                get("main_fg").unwrap_or(d.tiles[7]),
            ],
            bg: get("meter_bg").unwrap_or(d.bg),
            div_line: get("div_line").unwrap_or(d.div_line),
            main_fg: get("main_fg").unwrap_or(d.main_fg),
            title: get("title").unwrap_or(d.title),
            inactive_fg: get("inactive_fg").unwrap_or(d.inactive_fg),
            warning: get("cpu_mid").unwrap_or(d.warning),
            critical: get("cpu_end").unwrap_or(d.critical),
        }
    }

    #[inline]
    pub fn tile_color(&self, tile_type: u8) -> Color {
        self.tiles[(tile_type as usize) % MAX_TILE_TYPES]
    }

    #[inline]
    pub fn tile_glyph(tile_type: u8) -> &'static str {
        TILE_GLYPHS[(tile_type as usize) % MAX_TILE_TYPES]
    }
}

/// Collect `theme[key]=value` lines into a map; comments and blank values are skipped.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.strip_prefix("theme[")?.split_once(']')?;
            let value = value.trim().strip_prefix('=')?.trim();
            let value = value.trim_matches('"').trim_matches('\'');
            (!value.is_empty()).then(|| (key.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let bad = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(bad)
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(bad()),
    };
    Ok(Color::Rgb(r, g, b))
}
