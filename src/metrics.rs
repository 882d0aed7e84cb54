//! In-process atomic counters for the round engine.
//!
//! No exposition format (Prometheus, etc.) is wired up here — these are
//! plain numbers a status command or future admin surface can read.

use std::sync::atomic::{AtomicU64, Ordering};

static ROUNDS_STARTED: AtomicU64 = AtomicU64::new(0);
static BETS_PLACED: AtomicU64 = AtomicU64::new(0);
static ROUND_WINS: AtomicU64 = AtomicU64::new(0);
static ROUND_LOSSES: AtomicU64 = AtomicU64::new(0);

pub fn record_round_started() {
    ROUNDS_STARTED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_bet_placed() {
    BETS_PLACED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_round_win() {
    ROUND_WINS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_round_loss() {
    ROUND_LOSSES.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub rounds_started: u64,
    pub bets_placed: u64,
    pub round_wins: u64,
    pub round_losses: u64,
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        rounds_started: ROUNDS_STARTED.load(Ordering::Relaxed),
        bets_placed: BETS_PLACED.load(Ordering::Relaxed),
        round_wins: ROUND_WINS.load(Ordering::Relaxed),
        round_losses: ROUND_LOSSES.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let before = snapshot();
        record_round_started();
        record_bet_placed();
        record_round_win();
        record_round_loss();
        let after = snapshot();
        assert_eq!(after.rounds_started, before.rounds_started + 1);
        assert_eq!(after.bets_placed, before.bets_placed + 1);
        assert_eq!(after.round_wins, before.round_wins + 1);
        assert_eq!(after.round_losses, before.round_losses + 1);
    }
}
