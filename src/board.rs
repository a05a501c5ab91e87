//! Board store: the N×N grid of tile types and its primitive operations.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;
use thiserror::Error;

/// Default board edge length.
pub const DEFAULT_SIZE: usize = 8;

/// Tile identity. Only equality matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileType(pub u8);

impl TileType {
    /// Letter used by `Display`/`FromStr` (`A` for type 0).
    pub fn letter(self) -> char {
        char::from(b'A' + self.0)
    }
}

/// Single cell: a tile, or empty between a clear and the following refill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Tile(TileType),
}

impl Cell {
    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }
}

/// Board coordinate. Row 0 is the top edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Orthogonal neighbour (Manhattan distance exactly 1).
    pub fn is_adjacent(self, other: Self) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("cell {pos} is outside the {size}x{size} board")]
    OutOfBounds { pos: Pos, size: usize },
    #[error("invalid board text: {0}")]
    Parse(String),
}

/// Square grid of cells stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// All-empty board; callers fill it before handing it to the player.
    pub fn empty(size: usize) -> Self {
        Self {
            size,
            cells: vec![Cell::Empty; size * size],
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn contains(&self, pos: Pos) -> bool {
        pos.row < self.size && pos.col < self.size
    }

    fn check(&self, pos: Pos) -> Result<usize, BoardError> {
        if self.contains(pos) {
            Ok(pos.row * self.size + pos.col)
        } else {
            Err(BoardError::OutOfBounds {
                pos,
                size: self.size,
            })
        }
    }

    pub fn get(&self, pos: Pos) -> Result<Cell, BoardError> {
        self.check(pos).map(|i| self.cells[i])
    }

    pub fn set(&mut self, pos: Pos, cell: Cell) -> Result<(), BoardError> {
        let i = self.check(pos)?;
        self.cells[i] = cell;
        Ok(())
    }

    /// Exchange two cells. No adjacency or legality check.
    pub fn swap(&mut self, a: Pos, b: Pos) -> Result<(), BoardError> {
        let (i, j) = (self.check(a)?, self.check(b)?);
        self.cells.swap(i, j);
        Ok(())
    }

    /// Deep copy for speculative simulation; never aliases the live grid.
    pub fn clone_snapshot(&self) -> Self {
        self.clone()
    }

    /// Every coordinate in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + use<> {
        let size = self.size;
        (0..size).flat_map(move |row| (0..size).map(move |col| Pos::new(row, col)))
    }

    #[cfg(test)]
    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_empty()).count()
    }

    /// Cells of one column, top to bottom.
    pub(crate) fn column(&self, col: usize) -> Vec<Cell> {
        (0..self.size).map(|row| self[Pos::new(row, col)]).collect()
    }

    pub(crate) fn set_column(&mut self, col: usize, values: &[Cell]) {
        for (row, &cell) in values.iter().enumerate() {
            self[Pos::new(row, col)] = cell;
        }
    }
}

/// Internal scans index directly; out-of-range coordinates panic.
impl Index<Pos> for Board {
    type Output = Cell;

    fn index(&self, pos: Pos) -> &Cell {
        assert!(self.contains(pos), "{pos} outside {0}x{0} board", self.size);
        &self.cells[pos.row * self.size + pos.col]
    }
}

impl IndexMut<Pos> for Board {
    fn index_mut(&mut self, pos: Pos) -> &mut Cell {
        assert!(self.contains(pos), "{pos} outside {0}x{0} board", self.size);
        &mut self.cells[pos.row * self.size + pos.col]
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.size {
            if row > 0 {
                writeln!(f)?;
            }
            for col in 0..self.size {
                let ch = match self[Pos::new(row, col)] {
                    Cell::Tile(t) => t.letter(),
                    Cell::Empty => '.',
                };
                write!(f, "{ch}")?;
            }
        }
        Ok(())
    }
}

/// Parses the `Display` format. Rows are separated by newlines or `/`.
impl FromStr for Board {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows: Vec<&str> = s
            .split(['\n', '/'])
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .collect();
        let size = rows.len();
        if size == 0 {
            return Err(BoardError::Parse("no rows".to_string()));
        }
        let mut board = Self::empty(size);
        for (row, line) in rows.iter().enumerate() {
            let chars: Vec<char> = line.chars().collect();
            if chars.len() != size {
                return Err(BoardError::Parse(format!(
                    "row {row} has {} cells, expected {size}",
                    chars.len()
                )));
            }
            for (col, ch) in chars.into_iter().enumerate() {
                let cell = match ch {
                    '.' => Cell::Empty,
                    'A'..='Z' => Cell::Tile(TileType(ch as u8 - b'A')),
                    other => {
                        return Err(BoardError::Parse(format!(
                            "unexpected {other:?} at row {row}"
                        )));
                    }
                };
                board.set(Pos::new(row, col), cell)?;
            }
        }
        Ok(board)
    }
}
