//! Stalemate detection and the debounced check that triggers a reload.

use crate::board::{Board, Pos};
use crate::matcher::find_matches;
use std::time::{Duration, Instant};
use tracing::debug;

/// First adjacent swap (right or down neighbour, row-major) that produces a
/// match. Simulated on a snapshot; the live board is never touched.
pub fn find_move(board: &Board) -> Option<(Pos, Pos)> {
    let n = board.size();
    let mut sim = board.clone_snapshot();
    for a in board.positions() {
        let right = (a.col + 1 < n).then(|| Pos::new(a.row, a.col + 1));
        let down = (a.row + 1 < n).then(|| Pos::new(a.row + 1, a.col));
        for b in [right, down].into_iter().flatten() {
            exchange(&mut sim, a, b);
            let hit = !find_matches(&sim).is_empty();
            exchange(&mut sim, a, b);
            if hit {
                return Some((a, b));
            }
        }
    }
    None
}

fn exchange(board: &mut Board, a: Pos, b: Pos) {
    let tmp = board[a];
    board[a] = board[b];
    board[b] = tmp;
}

/// True unless the board is a stalemate.
pub fn has_any_move(board: &Board) -> bool {
    find_move(board).is_some()
}

/// Cancellable, re-armable handle for the delayed stalemate check. Arming it
/// again replaces any pending deadline.
#[derive(Debug, Clone)]
pub struct StalemateTimer {
    delay: Duration,
    due: Option<Instant>,
}

impl StalemateTimer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, due: None }
    }

    pub fn schedule(&mut self, now: Instant) {
        if self.due.is_some() {
            debug!("stalemate check superseded");
        }
        self.due = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }

    pub fn is_pending(&self) -> bool {
        self.due.is_some()
    }

    /// Consume the pending check if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.due {
            Some(t) if now >= t => {
                self.due = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Every ordered pair of orthogonal neighbours, each on a fresh copy.
    fn brute_force(board: &Board) -> bool {
        let n = board.size() as isize;
        board.positions().any(|a| {
            [(-1, 0), (1, 0), (0, -1), (0, 1)].into_iter().any(|(dr, dc)| {
                let (r, c) = (a.row as isize + dr, a.col as isize + dc);
                if r < 0 || c < 0 || r >= n || c >= n {
                    return false;
                }
                let mut copy = board.clone();
                copy.swap(a, Pos::new(r as usize, c as usize)).unwrap();
                !find_matches(&copy).is_empty()
            })
        })
    }

    fn random_board(rng: &mut StdRng, size: usize, tile_types: u8) -> Board {
        let rows: Vec<String> = (0..size)
            .map(|_| {
                (0..size)
                    .map(|_| char::from(b'A' + rng.random_range(0..tile_types)))
                    .collect()
            })
            .collect();
        rows.join("/").parse().unwrap()
    }

    #[test]
    fn test_agrees_with_brute_force_on_small_boards() {
        let mut rng = StdRng::seed_from_u64(42);
        let (mut dead, mut live) = (0, 0);
        // Three types almost never dead-end on 4x4; five types give both outcomes.
        for tile_types in [3, 5] {
            for _ in 0..2000 {
                let board = random_board(&mut rng, 4, tile_types);
                let expected = brute_force(&board);
                assert_eq!(has_any_move(&board), expected, "\n{board}");
                if expected { live += 1 } else { dead += 1 }
            }
        }
        assert!(dead > 0 && live > 0);
    }

    #[test]
    fn test_agrees_with_brute_force_on_generated_boards() {
        let mut rng = StdRng::seed_from_u64(43);
        for _ in 0..500 {
            let board = generate(4, 3, &mut rng).unwrap();
            assert_eq!(has_any_move(&board), brute_force(&board), "\n{board}");
        }
    }

    #[test]
    fn test_dead_board_has_no_move() {
        let board: Board = "ABCD/CDAB/ABCD/CDAB".parse().unwrap();
        assert_eq!(find_move(&board), None);
    }

    #[test]
    fn test_find_move_reports_first_working_swap() {
        // Swapping (0, 2) down brings the A from row 1 next to the A pair.
        let board: Board = "AABC/BCAD/CDBA/DBCA".parse().unwrap();
        let (a, b) = find_move(&board).unwrap();
        let mut sim = board.clone();
        sim.swap(a, b).unwrap();
        assert!(!find_matches(&sim).is_empty());
        assert!(a.is_adjacent(b));
    }

    #[test]
    fn test_find_move_leaves_board_untouched() {
        let board: Board = "AABC/BCAD/CDBA/DBCA".parse().unwrap();
        let copy = board.clone();
        find_move(&board);
        assert_eq!(board, copy);
    }

    #[test]
    fn test_timer_reschedule_supersedes() {
        let t0 = Instant::now();
        let delay = Duration::from_millis(600);
        let mut timer = StalemateTimer::new(delay);
        assert!(!timer.take_due(t0 + delay));

        timer.schedule(t0);
        timer.schedule(t0 + Duration::from_millis(400));
        assert!(!timer.take_due(t0 + delay));
        assert!(timer.is_pending());
        assert!(timer.take_due(t0 + Duration::from_millis(1000)));
        assert!(!timer.is_pending());
        assert!(!timer.take_due(t0 + Duration::from_secs(5)));
    }

    #[test]
    fn test_timer_cancel() {
        let t0 = Instant::now();
        let mut timer = StalemateTimer::new(Duration::ZERO);
        timer.schedule(t0);
        timer.cancel();
        assert!(!timer.take_due(t0));
    }
}
