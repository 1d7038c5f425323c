//! Game outcome.

/// Outcome of a game, or [`GameResult::Ongoing`] while moves remain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    Ongoing,
}

impl GameResult {
    /// External result code: 1 white win, -1 black win, 0 draw, 2 ongoing.
    #[inline]
    pub const fn code(self) -> i32 {
        match self {
            GameResult::WhiteWins => 1,
            GameResult::BlackWins => -1,
            GameResult::Draw => 0,
            GameResult::Ongoing => 2,
        }
    }

    /// Returns true once the game has a final result.
    #[inline]
    pub const fn is_final(self) -> bool {
        !matches!(self, GameResult::Ongoing)
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameResult::WhiteWins => write!(f, "1-0"),
            GameResult::BlackWins => write!(f, "0-1"),
            GameResult::Draw => write!(f, "1/2-1/2"),
            GameResult::Ongoing => write!(f, "*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes() {
        assert_eq!(GameResult::WhiteWins.code(), 1);
        assert_eq!(GameResult::BlackWins.code(), -1);
        assert_eq!(GameResult::Draw.code(), 0);
        assert_eq!(GameResult::Ongoing.code(), 2);
    }

    #[test]
    fn finality() {
        assert!(GameResult::Draw.is_final());
        assert!(!GameResult::Ongoing.is_final());
    }
}
