//! Uniform random playout.

use crate::movegen::{is_king_attacked, legal_moves};
use crate::Position;
use perch_core::{Color, GameResult};
use rand::Rng;

/// Playouts ignore the fifty-move and repetition rules, so an explicit
/// ply cap keeps them finite; an unfinished game scores as ongoing.
const MAX_PLAYOUT_PLIES: u32 = 200;

/// Plays uniformly random legal moves from `position` until the game
/// ends, returning the result.
///
/// Returns [`GameResult::Ongoing`] if the cap is reached first; value
/// mappings treat that as a draw-like 0.
pub fn random_playout<R: Rng>(mut position: Position, rng: &mut R) -> GameResult {
    for _ in 0..MAX_PLAYOUT_PLIES {
        let moves = legal_moves(&position);
        if moves.is_empty() {
            return if is_king_attacked(&position, position.side_to_move()) {
                match position.side_to_move() {
                    Color::White => GameResult::BlackWins,
                    Color::Black => GameResult::WhiteWins,
                }
            } else {
                GameResult::Draw
            };
        }
        let m = moves[rng.gen_range(0..moves.len())];
        position.make(m);
    }
    GameResult::Ongoing
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn playout_from_finished_game_reports_result() {
        let mut rng = StdRng::seed_from_u64(1);
        let mate = Position::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 1",
        )
        .unwrap();
        assert_eq!(random_playout(mate, &mut rng), GameResult::BlackWins);

        let stalemate = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(random_playout(stalemate, &mut rng), GameResult::Draw);
    }

    #[test]
    fn playout_terminates_and_is_seed_deterministic() {
        let a = random_playout(Position::startpos(), &mut StdRng::seed_from_u64(7));
        let b = random_playout(Position::startpos(), &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }
}
