//! Win accounting across the spins of one round

use serde::{Deserialize, Serialize};

use crate::config::GameType;

/// Running totals for a round.
///
/// `spin_win` is the current spin (reset between free spins),
/// `running_bet_win` everything paid so far in the round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WinManager {
    pub base_game_wins: f64,
    pub free_game_wins: f64,
    pub spin_win: f64,
    pub running_bet_win: f64,
}

impl WinManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_spin_win(&mut self, amount: f64) {
        self.spin_win += amount;
        self.running_bet_win += amount;
    }

    /// Book the current spin's win against the phase it was won in
    pub fn commit_spin(&mut self, game_type: GameType) {
        match game_type {
            GameType::BaseGame => self.base_game_wins += self.spin_win,
            GameType::FreeGame => self.free_game_wins += self.spin_win,
        }
    }

    pub fn reset_spin_win(&mut self) {
        self.spin_win = 0.0;
    }

    pub fn total(&self) -> f64 {
        self.base_game_wins + self.free_game_wins
    }
}

/// Round to hundredths of a bet
pub fn round_win(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Amount in hundredths of a bet, as used by events and books
pub fn to_cents(amount: f64) -> u64 {
    (amount * 100.0).round().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_phase_accounting() {
        let mut wins = WinManager::new();
        wins.update_spin_win(2.5);
        wins.commit_spin(GameType::BaseGame);

        wins.reset_spin_win();
        wins.update_spin_win(4.0);
        wins.update_spin_win(1.0);
        wins.commit_spin(GameType::FreeGame);

        assert_relative_eq!(wins.base_game_wins, 2.5);
        assert_relative_eq!(wins.free_game_wins, 5.0);
        assert_relative_eq!(wins.running_bet_win, 7.5);
        assert_relative_eq!(wins.total(), 7.5);
    }

    #[test]
    fn test_rounding() {
        assert_relative_eq!(round_win(1.234_9), 1.23);
        assert_eq!(to_cents(2.25), 225);
        assert_eq!(to_cents(5000.0), 500_000);
        assert_eq!(to_cents(0.0), 0);
    }
}
