//! Countdown timer and tallies shown beside the board. Consumes tile clears as time bonus.

use crate::present::ScoreSink;
use std::time::{Duration, Instant};

/// Gauge turns to the warning colour below this fraction of the limit.
pub const WARNING_FRACTION: f64 = 0.5;
/// Gauge turns to the critical colour below this fraction of the limit.
pub const CRITICAL_FRACTION: f64 = 0.2;

/// Time left in the round. Bonuses never push it above the limit.
#[derive(Debug, Clone)]
pub struct Countdown {
    limit: Duration,
    remaining: Duration,
    last_tick: Instant,
    paused: bool,
}

impl Countdown {
    pub fn new(limit: Duration, now: Instant) -> Self {
        Self {
            limit,
            remaining: limit,
            last_tick: now,
            paused: false,
        }
    }

    pub fn reset(&mut self, now: Instant) {
        self.remaining = self.limit;
        self.last_tick = now;
        self.paused = false;
    }

    pub fn tick(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        if !self.paused {
            self.remaining = self.remaining.saturating_sub(elapsed);
        }
    }

    pub fn set_paused(&mut self, paused: bool, now: Instant) {
        self.tick(now);
        self.paused = paused;
    }

    /// Bonus time, capped at the limit. An expired clock stays expired.
    pub fn add(&mut self, bonus: Duration) {
        if self.is_expired() {
            return;
        }
        self.remaining = (self.remaining + bonus).min(self.limit);
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.remaining.is_zero()
    }

    /// Remaining time as a fraction of the limit, 0.0..=1.0.
    pub fn fraction(&self) -> f64 {
        if self.limit.is_zero() {
            return 0.0;
        }
        (self.remaining.as_secs_f64() / self.limit.as_secs_f64()).clamp(0.0, 1.0)
    }
}

/// Everything the sidebar shows that is not on the board.
#[derive(Debug, Clone)]
pub struct Hud {
    pub countdown: Countdown,
    bonus_per_tile: Duration,
    /// Tiles cleared this round.
    pub cleared: u64,
    /// Cascade passes triggered by the last committed move.
    pub last_chain: u32,
    /// Clear steps seen since the current move started.
    chain: u32,
}

impl Hud {
    pub fn new(time_limit: Duration, bonus_per_tile: Duration, now: Instant) -> Self {
        Self {
            countdown: Countdown::new(time_limit, now),
            bonus_per_tile,
            cleared: 0,
            last_chain: 0,
            chain: 0,
        }
    }

    pub fn reset(&mut self, now: Instant) {
        self.countdown.reset(now);
        self.cleared = 0;
        self.last_chain = 0;
        self.chain = 0;
    }

    /// Mark the start of a move so chain length counts from zero.
    pub fn begin_move(&mut self) {
        self.chain = 0;
    }

    /// Close the move; keeps its chain length for display if it cleared anything.
    pub fn end_move(&mut self) {
        if self.chain > 0 {
            self.last_chain = self.chain;
        }
    }
}

impl ScoreSink for Hud {
    fn on_tiles_cleared(&mut self, count: usize) {
        self.cleared += count as u64;
        self.chain += 1;
        self.countdown.add(self.bonus_per_tile * count as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: Duration = Duration::from_secs(1);

    #[test]
    fn test_countdown_runs_down_and_expires() {
        let t0 = Instant::now();
        let mut c = Countdown::new(SEC * 60, t0);
        c.tick(t0 + SEC * 10);
        assert_eq!(c.remaining(), SEC * 50);
        c.tick(t0 + SEC * 100);
        assert!(c.is_expired());
        assert_eq!(c.fraction(), 0.0);
    }

    #[test]
    fn test_bonus_is_capped_at_limit() {
        let t0 = Instant::now();
        let mut hud = Hud::new(SEC * 60, Duration::from_millis(500), t0);
        hud.countdown.tick(t0 + SEC * 2);
        hud.on_tiles_cleared(3);
        assert_eq!(hud.countdown.remaining(), Duration::from_millis(59_500));
        hud.on_tiles_cleared(10);
        assert_eq!(hud.countdown.remaining(), SEC * 60);
        assert_eq!(hud.cleared, 13);
    }

    #[test]
    fn test_bonus_does_not_revive_expired_clock() {
        let t0 = Instant::now();
        let mut hud = Hud::new(SEC * 60, Duration::from_millis(500), t0);
        hud.countdown.tick(t0 + SEC * 61);
        assert!(hud.countdown.is_expired());
        hud.on_tiles_cleared(3);
        assert!(hud.countdown.is_expired());
        assert_eq!(hud.countdown.remaining(), Duration::ZERO);
        assert_eq!(hud.cleared, 3);
    }

    #[test]
    fn test_pause_freezes_time() {
        let t0 = Instant::now();
        let mut c = Countdown::new(SEC * 60, t0);
        c.set_paused(true, t0 + SEC);
        c.tick(t0 + SEC * 30);
        assert_eq!(c.remaining(), SEC * 59);
        c.set_paused(false, t0 + SEC * 31);
        c.tick(t0 + SEC * 32);
        assert_eq!(c.remaining(), SEC * 58);
    }

    #[test]
    fn test_chain_length_tracks_last_clearing_move() {
        let mut hud = Hud::new(SEC * 60, Duration::ZERO, Instant::now());
        hud.begin_move();
        hud.on_tiles_cleared(3);
        hud.on_tiles_cleared(4);
        hud.end_move();
        assert_eq!(hud.last_chain, 2);
        hud.begin_move();
        hud.end_move();
        assert_eq!(hud.last_chain, 2);
    }
}
