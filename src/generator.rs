//! Board generation by rejection sampling: no cell completes a run of three.

use crate::board::{Board, Cell, Pos, TileType};
use rand::Rng;
use thiserror::Error;

/// Default number of tile types.
pub const DEFAULT_TILE_TYPES: u8 = 6;

/// Draws allowed per cell before generation gives up. With three or more types
/// at most two are ever forbidden, so this is only reached for degenerate configs.
const MAX_DRAWS_PER_CELL: u32 = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("at least one tile type is required")]
    NoTileTypes,
    #[error(
        "no tile fits at {pos} after {attempts} draws; {tile_types} tile types cannot fill a board without runs (need 3 or more)"
    )]
    ResampleBudgetExceeded {
        pos: Pos,
        attempts: u32,
        tile_types: u8,
    },
}

/// Uniformly random tile type in `0..tile_types`.
pub fn random_tile<R: Rng + ?Sized>(rng: &mut R, tile_types: u8) -> TileType {
    TileType(rng.random_range(0..tile_types))
}

/// Fresh board with no horizontal or vertical run of three, filled row-major.
pub fn generate<R: Rng + ?Sized>(
    size: usize,
    tile_types: u8,
    rng: &mut R,
) -> Result<Board, GenerateError> {
    if tile_types == 0 {
        return Err(GenerateError::NoTileTypes);
    }
    let mut board = Board::empty(size);
    for pos in board.positions() {
        let mut attempts = 0;
        let tile = loop {
            if attempts == MAX_DRAWS_PER_CELL {
                return Err(GenerateError::ResampleBudgetExceeded {
                    pos,
                    attempts,
                    tile_types,
                });
            }
            attempts += 1;
            let candidate = random_tile(rng, tile_types);
            if !completes_run(&board, pos, candidate) {
                break candidate;
            }
        };
        board[pos] = Cell::Tile(tile);
    }
    Ok(board)
}

/// True if placing `tile` at `pos` would make a run with the two cells to the
/// left or the two cells above.
fn completes_run(board: &Board, pos: Pos, tile: TileType) -> bool {
    let Pos { row, col } = pos;
    let t = Cell::Tile(tile);
    let left = col >= 2
        && board[Pos::new(row, col - 1)] == t
        && board[Pos::new(row, col - 2)] == t;
    let above = row >= 2
        && board[Pos::new(row - 1, col)] == t
        && board[Pos::new(row - 2, col)] == t;
    left || above
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::find_matches;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_generated_boards_have_no_matches() {
        let mut rng = StdRng::seed_from_u64(7);
        for size in [3, 4, 8, 12] {
            for tile_types in [3, 4, 6] {
                for _ in 0..25 {
                    let board = generate(size, tile_types, &mut rng).unwrap();
                    assert!(find_matches(&board).is_empty(), "\n{board}");
                    assert_eq!(board.empty_count(), 0);
                }
            }
        }
    }

    #[test]
    fn test_tiles_stay_within_type_range() {
        let mut rng = StdRng::seed_from_u64(11);
        let board = generate(8, 4, &mut rng).unwrap();
        assert!(
            board
                .positions()
                .all(|p| matches!(board[p], Cell::Tile(TileType(t)) if t < 4))
        );
    }

    #[test]
    fn test_single_type_fails_loudly() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = generate(8, 1, &mut rng).unwrap_err();
        assert_eq!(
            err,
            GenerateError::ResampleBudgetExceeded {
                pos: Pos::new(0, 2),
                attempts: MAX_DRAWS_PER_CELL,
                tile_types: 1,
            }
        );
    }

    #[test]
    fn test_zero_types_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(generate(8, 0, &mut rng), Err(GenerateError::NoTileTypes));
    }

    #[test]
    fn test_two_types_terminate() {
        // Either a valid board or the budget error; never a hang.
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            match generate(8, 2, &mut rng) {
                Ok(board) => assert!(find_matches(&board).is_empty()),
                Err(e) => assert!(matches!(e, GenerateError::ResampleBudgetExceeded { .. })),
            }
        }
    }
}
