//! Boundary between the engine and whatever shows the board.

use crate::board::{Board, Pos};
use crate::matcher::MatchSet;
use std::io;

/// Structural change the presenter animates before the engine continues.
#[derive(Debug, Clone, Copy)]
pub enum Animation<'a> {
    Swap(Pos, Pos),
    Clear(&'a MatchSet),
    Drop(&'a Board),
    Reload(&'a Board),
}

impl Animation<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Swap(..) => "swap",
            Self::Clear(_) => "clear",
            Self::Drop(_) => "drop",
            Self::Reload(_) => "reload",
        }
    }
}

/// Presentation sink. `animate` returns exactly once, after the animation has
/// finished; the engine issues no further mutation until then.
pub trait Presenter {
    fn render_board(&mut self, board: &Board) -> io::Result<()>;
    fn animate(&mut self, animation: Animation<'_>) -> io::Result<()>;
}

/// Receives one call per cascade clear step with the number of tiles removed.
pub trait ScoreSink {
    fn on_tiles_cleared(&mut self, count: usize);
}

#[cfg(test)]
pub mod testing {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Event {
        Render(Board),
        Swap(Pos, Pos),
        Clear(Vec<Pos>),
        Drop(Board),
        Reload(Board),
        Cleared(usize),
    }

    /// Records every call in order and completes animations immediately.
    #[derive(Debug, Default)]
    pub struct Recorder {
        pub events: Vec<Event>,
    }

    impl Recorder {
        pub fn cleared_total(&self) -> usize {
            self.events
                .iter()
                .map(|e| match e {
                    Event::Cleared(n) => *n,
                    _ => 0,
                })
                .sum()
        }

        pub fn cleared_payloads(&self) -> Vec<usize> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    Event::Cleared(n) => Some(*n),
                    _ => None,
                })
                .collect()
        }

        pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
            self.events.iter().filter(|e| pred(e)).count()
        }
    }

    impl Presenter for Recorder {
        fn render_board(&mut self, board: &Board) -> io::Result<()> {
            self.events.push(Event::Render(board.clone()));
            Ok(())
        }

        fn animate(&mut self, animation: Animation<'_>) -> io::Result<()> {
            self.events.push(match animation {
                Animation::Swap(a, b) => Event::Swap(a, b),
                Animation::Clear(cells) => Event::Clear(cells.iter().collect()),
                Animation::Drop(board) => Event::Drop(board.clone()),
                Animation::Reload(board) => Event::Reload(board.clone()),
            });
            Ok(())
        }
    }

    impl ScoreSink for Recorder {
        fn on_tiles_cleared(&mut self, count: usize) {
            self.events.push(Event::Cleared(count));
        }
    }
}
