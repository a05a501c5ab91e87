//! Cascade resolution: detect, clear, drop, refill, repeat until the board is stable.

use crate::board::{Board, Cell};
use crate::generator::random_tile;
use crate::matcher::find_matches;
use crate::present::{Animation, Presenter, ScoreSink};
use rand::Rng;
use std::io;
use tracing::{debug, info};

/// Summary of one run of the resolver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cascade {
    /// Clear steps performed (0 = the board was already stable).
    pub passes: u32,
    /// Cells cleared over all passes.
    pub cleared: usize,
}

impl Cascade {
    /// Whether at least one match was found anywhere in the chain.
    pub fn matched(&self) -> bool {
        self.passes > 0
    }
}

/// Compact each column downward preserving order, then fill the gaps at the
/// top with fresh random tiles. Refills are not filtered; any run they create
/// is picked up by the next detection pass. Returns the number of new tiles.
pub fn collapse_and_refill<R: Rng + ?Sized>(board: &mut Board, rng: &mut R, tile_types: u8) -> usize {
    let n = board.size();
    let mut refilled = 0;
    for col in 0..n {
        let kept: Vec<Cell> = board
            .column(col)
            .into_iter()
            .filter(|c| !c.is_empty())
            .collect();
        let gap = n - kept.len();
        let mut column: Vec<Cell> = (0..gap)
            .map(|_| Cell::Tile(random_tile(rng, tile_types)))
            .collect();
        column.extend(kept);
        board.set_column(col, &column);
        refilled += gap;
    }
    refilled
}

/// Run detect→clear→drop→refill until no match remains. Always runs to the
/// fixed point; a partial cascade would leave runs or empties on the board.
pub fn resolve<R, P>(
    board: &mut Board,
    rng: &mut R,
    tile_types: u8,
    io: &mut P,
) -> io::Result<Cascade>
where
    R: Rng + ?Sized,
    P: Presenter + ScoreSink + ?Sized,
{
    let mut cascade = Cascade::default();
    loop {
        let matches = find_matches(board);
        if matches.is_empty() {
            break;
        }
        cascade.passes += 1;
        cascade.cleared += matches.len();
        debug!(pass = cascade.passes, cleared = matches.len(), "cascade pass");

        for pos in matches.iter() {
            board[pos] = Cell::Empty;
        }
        io.on_tiles_cleared(matches.len());
        io.animate(Animation::Clear(&matches))?;
        io.render_board(board)?;

        collapse_and_refill(board, rng, tile_types);
        io.render_board(board)?;
        io.animate(Animation::Drop(board))?;
    }
    if cascade.matched() {
        info!(passes = cascade.passes, cleared = cascade.cleared, "cascade settled");
    }
    Ok(cascade)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Pos, TileType};
    use crate::generator::generate;
    use crate::present::testing::{Event, Recorder};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_collapse_keeps_order_and_refills_top() {
        let mut board: Board = "ABC/.B./CA.".parse().unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let refilled = collapse_and_refill(&mut board, &mut rng, 4);
        assert_eq!(refilled, 3);
        assert_eq!(board.empty_count(), 0);
        // Column 0: A, C fall to the bottom in order.
        assert_eq!(board[Pos::new(1, 0)], Cell::Tile(TileType(0)));
        assert_eq!(board[Pos::new(2, 0)], Cell::Tile(TileType(2)));
        // Column 1 had no gaps.
        assert_eq!(board.column(1), "ABC/.B./CA.".parse::<Board>().unwrap().column(1));
        // Column 2: only C survives, at the bottom.
        assert_eq!(board[Pos::new(2, 2)], Cell::Tile(TileType(2)));
    }

    #[test]
    fn test_gravity_leaves_no_gap_below_a_tile() {
        let mut board: Board = "A..A/.B../..C./D...".parse().unwrap();
        let before: Vec<Vec<Cell>> = (0..4)
            .map(|c| board.column(c).into_iter().filter(|x| !x.is_empty()).collect())
            .collect();
        let mut rng = StdRng::seed_from_u64(9);
        collapse_and_refill(&mut board, &mut rng, 6);
        for (col, kept) in before.iter().enumerate() {
            let column = board.column(col);
            assert_eq!(&column[4 - kept.len()..], kept.as_slice());
        }
    }

    #[test]
    fn test_resolve_reaches_stable_board() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut board: Board = "AAAB/BCDC/CDBD/DBCA".parse().unwrap();
        let mut rec = Recorder::default();
        let cascade = resolve(&mut board, &mut rng, 4, &mut rec).unwrap();
        assert!(cascade.matched());
        assert!(find_matches(&board).is_empty());
        assert_eq!(board.empty_count(), 0);
        assert_eq!(rec.cleared_payloads()[0], 3);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(22);
        let mut board: Board = "AAAB/BCDC/CDBD/DBCA".parse().unwrap();
        let mut rec = Recorder::default();
        resolve(&mut board, &mut rng, 4, &mut rec).unwrap();
        let settled = board.clone();
        let mut again = Recorder::default();
        let cascade = resolve(&mut board, &mut rng, 4, &mut again).unwrap();
        assert!(!cascade.matched());
        assert_eq!(board, settled);
        assert!(again.events.is_empty());
    }

    #[test]
    fn test_cleared_payloads_match_emptied_cells() {
        let mut rng = StdRng::seed_from_u64(33);
        for _ in 0..40 {
            // Small alphabet so refills chain often.
            let mut board = generate(6, 3, &mut rng).unwrap();
            let a = Pos::new(rng.random_range(0..6), rng.random_range(0..5));
            let b = Pos::new(a.row, a.col + 1);
            board.swap(a, b).unwrap();
            let mut rec = Recorder::default();
            let cascade = resolve(&mut board, &mut rng, 3, &mut rec).unwrap();
            // Count holes in the board rendered right after each clear.
            let emptied: Vec<usize> = rec
                .events
                .windows(2)
                .filter_map(|w| match w {
                    [Event::Clear(_), Event::Render(shown)] => Some(shown.empty_count()),
                    _ => None,
                })
                .collect();
            assert_eq!(rec.cleared_payloads(), emptied);
            assert_eq!(rec.cleared_total(), cascade.cleared);
            assert_eq!(rec.cleared_payloads().len(), cascade.passes as usize);
            assert!(find_matches(&board).is_empty());
        }
    }

    #[test]
    fn test_blanked_board_is_rendered_after_clear() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut board: Board = "AAAB/BCDC/CDBD/DBCA".parse().unwrap();
        let before = board.clone();
        let mut rec = Recorder::default();
        resolve(&mut board, &mut rng, 4, &mut rec).unwrap();
        assert_eq!(rec.events[0], Event::Cleared(3));
        assert_eq!(
            rec.events[1],
            Event::Clear(vec![Pos::new(0, 0), Pos::new(0, 1), Pos::new(0, 2)])
        );
        let Event::Render(blanked) = &rec.events[2] else {
            panic!("expected render after clear, got {:?}", rec.events[2]);
        };
        for pos in before.positions() {
            let expected = if pos.row == 0 && pos.col < 3 {
                Cell::Empty
            } else {
                before[pos]
            };
            assert_eq!(blanked[pos], expected, "at {pos}");
        }
    }

    #[test]
    fn test_each_pass_drops_after_clear() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut board: Board = "AAAB/BCDC/CDBD/DBCA".parse().unwrap();
        let mut rec = Recorder::default();
        let cascade = resolve(&mut board, &mut rng, 4, &mut rec).unwrap();
        let drops = rec.count(|e| matches!(e, Event::Drop(_)));
        assert_eq!(drops, cascade.passes as usize);
        let last_drop = rec.events.iter().rev().find_map(|e| match e {
            Event::Drop(b) => Some(b.clone()),
            _ => None,
        });
        assert_eq!(last_drop, Some(board));
    }
}
