//! Match detection: cells belonging to horizontal or vertical runs of three or more.

use crate::board::{Board, Cell, Pos};
use std::collections::BTreeSet;

/// Shortest run that counts as a match.
pub const MIN_RUN: usize = 3;

/// Distinct matched coordinates, ordered row-major.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet(BTreeSet<Pos>);

impl MatchSet {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub fn contains(&self, pos: Pos) -> bool {
        self.0.contains(&pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = Pos> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Pos> for MatchSet {
    fn from_iter<I: IntoIterator<Item = Pos>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// All cells in a qualifying run. A cell on both a horizontal and a vertical
/// run appears once. `Empty` never matches and always ends a run.
pub fn find_matches(board: &Board) -> MatchSet {
    let n = board.size();
    let mut found = BTreeSet::new();
    for row in 0..n {
        scan_line(board, (0..n).map(|col| Pos::new(row, col)), &mut found);
    }
    for col in 0..n {
        scan_line(board, (0..n).map(|row| Pos::new(row, col)), &mut found);
    }
    MatchSet(found)
}

/// Walk one row or column, flushing every maximal run of length >= MIN_RUN.
fn scan_line(board: &Board, line: impl Iterator<Item = Pos>, out: &mut BTreeSet<Pos>) {
    let mut run: Vec<Pos> = Vec::new();
    let mut current = Cell::Empty;
    for pos in line {
        let cell = board[pos];
        if cell != current || cell.is_empty() {
            flush(&run, current, out);
            run.clear();
            current = cell;
        }
        run.push(pos);
    }
    flush(&run, current, out);
}

fn flush(run: &[Pos], kind: Cell, out: &mut BTreeSet<Pos>) {
    if !kind.is_empty() && run.len() >= MIN_RUN {
        out.extend(run.iter().copied());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> Board {
        s.parse().unwrap()
    }

    #[test]
    fn test_no_runs_no_matches() {
        let b = board("ABAB/BABA/ABAB/BABA");
        assert!(find_matches(&b).is_empty());
    }

    #[test]
    fn test_long_run_contributes_every_cell() {
        let b = board("AAAAB/BCDEC/CDECD/DECDE/ECDEC");
        let m = find_matches(&b);
        assert_eq!(m.len(), 4);
        assert!((0..4).all(|c| m.contains(Pos::new(0, c))));
        assert!(!m.contains(Pos::new(0, 4)));
    }

    #[test]
    fn test_crossing_runs_share_cell_once() {
        // Horizontal run on row 1 and vertical run on column 1 cross at (1, 1).
        let b = board("BAC/AAA/CAB");
        let m = find_matches(&b);
        assert_eq!(m.len(), 5);
        assert!(m.contains(Pos::new(1, 1)));
    }

    #[test]
    fn test_empty_breaks_runs_and_never_matches() {
        let b = board("AA.A/..../.B../CDBA");
        assert!(find_matches(&b).is_empty());
        let all_empty = Board::empty(4);
        assert!(find_matches(&all_empty).is_empty());
    }

    #[test]
    fn test_vertical_run_at_bottom_edge() {
        let b = board("ABCDE/BCDAE/CBADC/DBCAD/ABCAE");
        let m: Vec<Pos> = find_matches(&b).iter().collect();
        assert_eq!(m, vec![Pos::new(2, 1), Pos::new(3, 1), Pos::new(4, 1)]);
    }
}
