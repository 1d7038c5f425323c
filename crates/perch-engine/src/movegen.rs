//! Legal move generation.
//!
//! Generation is pseudo-legal first - per-piece target sets from the
//! attack tables - followed by a legality filter that makes each
//! candidate on a probe position, rejects it if the mover's king is
//! attacked, and unmakes. Castling additionally requires the king not to
//! be in check and the pass-through square to be safe before the move is
//! even emitted; the destination square is covered by the filter.

use crate::attacks::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, pawn_pushes, queen_attacks,
    rook_attacks,
};
use crate::{Bitboard, Position};
use perch_core::{Color, GameResult, Move, Piece, Rank, Square};

/// Generates the legal moves of `position`, sorted by
/// (from, to, promotion), without duplicates.
pub fn legal_moves(position: &Position) -> Vec<Move> {
    let mut moves = Vec::with_capacity(48);

    pawn_moves(position, &mut moves);
    knight_moves(position, &mut moves);
    slider_moves(position, &mut moves);
    king_moves(position, &mut moves);
    castling_moves(position, &mut moves);

    let us = position.side_to_move();
    let mut probe = position.clone();
    moves.retain(|&m| {
        probe.make(m);
        let king_safe = !is_king_attacked(&probe, us);
        probe.unmake(m).expect("unmake follows make");
        king_safe
    });

    moves.sort_by_key(|m| (m.from, m.to, m.promotion.map(Piece::index)));
    moves
}

/// Result for the side to move: checkmate, stalemate, or ongoing.
///
/// The half-move clock is tracked by the position but never consulted
/// here; repetition and fifty-move draws are the caller's concern.
pub fn game_result(position: &Position) -> GameResult {
    if !legal_moves(position).is_empty() {
        return GameResult::Ongoing;
    }
    if is_king_attacked(position, position.side_to_move()) {
        match position.side_to_move() {
            Color::White => GameResult::BlackWins,
            Color::Black => GameResult::WhiteWins,
        }
    } else {
        GameResult::Draw
    }
}

/// Whether `by` attacks `sq`, using the current occupancy for sliders.
pub fn is_square_attacked(position: &Position, sq: Square, by: Color) -> bool {
    // A pawn of `by` attacks sq iff a pawn of the other color standing
    // on sq would attack the pawn's square.
    if (pawn_attacks(sq, by.opposite()) & position.pieces_of(by, Piece::Pawn)).any() {
        return true;
    }
    if (knight_attacks(sq) & position.pieces_of(by, Piece::Knight)).any() {
        return true;
    }
    if (king_attacks(sq) & position.pieces_of(by, Piece::King)).any() {
        return true;
    }

    let occupied = position.occupied();
    let diagonal = position.pieces_of(by, Piece::Bishop) | position.pieces_of(by, Piece::Queen);
    if (bishop_attacks(sq, occupied) & diagonal).any() {
        return true;
    }
    let orthogonal = position.pieces_of(by, Piece::Rook) | position.pieces_of(by, Piece::Queen);
    (rook_attacks(sq, occupied) & orthogonal).any()
}

/// Whether the king of `color` is attacked.
pub fn is_king_attacked(position: &Position, color: Color) -> bool {
    match position.pieces_of(color, Piece::King).lsb() {
        Some(king_sq) => is_square_attacked(position, king_sq, color.opposite()),
        None => false,
    }
}

fn pawn_moves(position: &Position, moves: &mut Vec<Move>) {
    let us = position.side_to_move();
    let them = us.opposite();
    let empty = !position.occupied();
    let enemy = position.color_pieces(them);
    let (promo_from, promo_to) = match us {
        Color::White => (Rank::R7, Rank::R8),
        Color::Black => (Rank::R2, Rank::R1),
    };

    for from in position.pieces_of(us, Piece::Pawn) {
        let transit = from.offset(8 * us.pawn_direction());

        for to in pawn_pushes(from, us) & empty {
            let distance = (to.index() as i8 - from.index() as i8).abs();
            if distance == 16 && !transit.map_or(false, |t| empty.contains(t)) {
                continue;
            }
            moves.push(Move::quiet(from, to, Piece::Pawn));
        }

        // Promotion pushes live outside the push table.
        if from.rank() == promo_from {
            if let Some(to) = transit {
                if empty.contains(to) {
                    for target in Piece::PROMOTIONS {
                        moves.push(Move::quiet(from, to, Piece::Pawn).promoting_to(target));
                    }
                }
            }
        }

        for to in pawn_attacks(from, us) & enemy {
            if let Some(captured) = position.piece_at(to) {
                let capture = Move::capture(from, to, Piece::Pawn, captured);
                if to.rank() == promo_to {
                    for target in Piece::PROMOTIONS {
                        moves.push(capture.promoting_to(target));
                    }
                } else {
                    moves.push(capture);
                }
            }
        }

        if let Some(ep) = position.en_passant_target() {
            if pawn_attacks(from, us).contains(ep) {
                moves.push(Move::capture(from, ep, Piece::Pawn, Piece::Pawn));
            }
        }
    }
}

fn knight_moves(position: &Position, moves: &mut Vec<Move>) {
    let us = position.side_to_move();
    let own = position.color_pieces(us);
    for from in position.pieces_of(us, Piece::Knight) {
        push_targets(position, moves, from, Piece::Knight, knight_attacks(from) & !own);
    }
}

fn slider_moves(position: &Position, moves: &mut Vec<Move>) {
    let us = position.side_to_move();
    let own = position.color_pieces(us);
    let occupied = position.occupied();

    for from in position.pieces_of(us, Piece::Bishop) {
        push_targets(
            position,
            moves,
            from,
            Piece::Bishop,
            bishop_attacks(from, occupied) & !own,
        );
    }
    for from in position.pieces_of(us, Piece::Rook) {
        push_targets(
            position,
            moves,
            from,
            Piece::Rook,
            rook_attacks(from, occupied) & !own,
        );
    }
    for from in position.pieces_of(us, Piece::Queen) {
        push_targets(
            position,
            moves,
            from,
            Piece::Queen,
            queen_attacks(from, occupied) & !own,
        );
    }
}

fn king_moves(position: &Position, moves: &mut Vec<Move>) {
    let us = position.side_to_move();
    let own = position.color_pieces(us);
    for from in position.pieces_of(us, Piece::King) {
        push_targets(position, moves, from, Piece::King, king_attacks(from) & !own);
    }
}

fn push_targets(
    position: &Position,
    moves: &mut Vec<Move>,
    from: Square,
    piece: Piece,
    targets: Bitboard,
) {
    for to in targets {
        moves.push(match position.piece_at(to) {
            Some(captured) => Move::capture(from, to, piece, captured),
            None => Move::quiet(from, to, piece),
        });
    }
}

fn castling_moves(position: &Position, moves: &mut Vec<Move>) {
    let us = position.side_to_move();
    if is_king_attacked(position, us) {
        return;
    }
    let occupied = position.occupied();
    let them = us.opposite();

    if position.castling_rights().kingside(us) {
        let (king_from, king_to, pass_through) = match us {
            Color::White => (Square::E1, Square::G1, Square::F1),
            Color::Black => (Square::E8, Square::G8, Square::F8),
        };
        let between = Bitboard::from_square(pass_through) | Bitboard::from_square(king_to);
        if (occupied & between).is_empty() && !is_square_attacked(position, pass_through, them) {
            moves.push(Move::quiet(king_from, king_to, Piece::King));
        }
    }

    if position.castling_rights().queenside(us) {
        let (king_from, king_to, pass_through, rook_transit) = match us {
            Color::White => (Square::E1, Square::C1, Square::D1, Square::B1),
            Color::Black => (Square::E8, Square::C8, Square::D8, Square::B8),
        };
        let between = Bitboard::from_square(pass_through)
            | Bitboard::from_square(king_to)
            | Bitboard::from_square(rook_transit);
        if (occupied & between).is_empty() && !is_square_attacked(position, pass_through, them) {
            moves.push(Move::quiet(king_from, king_to, Piece::King));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn startpos_has_twenty_moves() {
        let moves = legal_moves(&Position::startpos());
        assert_eq!(moves.len(), 20);
    }

    #[test]
    fn moves_are_sorted_and_unique() {
        let moves = legal_moves(&Position::startpos());
        let keys: Vec<_> = moves
            .iter()
            .map(|m| (m.from, m.to, m.promotion.map(Piece::index)))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn legal_moves_never_leave_own_king_in_check() {
        let fens = [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        ];
        for fen in fens {
            let mut pos = Position::from_fen(fen).unwrap();
            let us = pos.side_to_move();
            for m in legal_moves(&pos.clone()) {
                pos.make(m);
                assert!(!is_king_attacked(&pos, us), "{} leaves king in check", m);
                pos.unmake(m).unwrap();
            }
        }
    }

    #[test]
    fn pinned_piece_cannot_move() {
        // The e-file knight is pinned against the king by the rook.
        let pos = Position::from_fen("4r2k/8/8/8/4N3/8/8/4K3 w - - 0 1").unwrap();
        let moves = legal_moves(&pos);
        assert!(moves.iter().all(|m| m.from != sq("e4")));
    }

    #[test]
    fn scholars_mate_is_checkmate() {
        let mut pos = Position::startpos();
        for uci in ["e2e4", "e7e5", "f1c4", "b8c6", "d1h5", "g8f6", "h5f7"] {
            pos.make_uci(uci).unwrap();
        }
        assert!(legal_moves(&pos).is_empty());
        assert_eq!(game_result(&pos), GameResult::WhiteWins);
        assert_eq!(game_result(&pos).code(), 1);
    }

    #[test]
    fn en_passant_is_generated_and_captures() {
        let mut pos = Position::startpos();
        for uci in ["e2e4", "a7a6", "e4e5", "d7d5"] {
            pos.make_uci(uci).unwrap();
        }
        let moves = legal_moves(&pos);
        let ep = moves
            .iter()
            .find(|m| m.to_uci() == "e5d6")
            .copied()
            .expect("en passant e5d6 must be legal");
        assert_eq!(ep.captured, Some(Piece::Pawn));
        pos.make(ep);
        assert_eq!(pos.piece_at(sq("d5")), None);
    }

    #[test]
    fn promotion_square_yields_four_moves() {
        let pos = Position::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
        let moves = legal_moves(&pos);
        let promotions: Vec<_> = moves.iter().filter(|m| m.from == sq("a7")).collect();
        assert_eq!(promotions.len(), 4);
        let targets: Vec<_> = promotions.iter().filter_map(|m| m.promotion).collect();
        assert!(targets.contains(&Piece::Knight));
        assert!(targets.contains(&Piece::Bishop));
        assert!(targets.contains(&Piece::Rook));
        assert!(targets.contains(&Piece::Queen));
        assert!(promotions.iter().all(|m| m.to == sq("a8")));
        // The rest are king moves.
        assert!(moves.iter().all(|m| m.from == sq("a7") || m.piece == Piece::King));
    }

    #[test]
    fn both_castles_available_and_rights_update() {
        let mut pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let ucis: Vec<String> = legal_moves(&pos).iter().map(Move::to_uci).collect();
        assert!(ucis.contains(&"e1g1".to_string()));
        assert!(ucis.contains(&"e1c1".to_string()));

        pos.make_uci("e1g1").unwrap();
        assert_eq!(pos.castling_rights().bits(), 0b1100);
    }

    #[test]
    fn no_castling_through_attacked_square() {
        // A rook on f8 covers f1, so kingside castling is out; the
        // d-file is clear, so queenside remains.
        let pos = Position::from_fen("5r2/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let ucis: Vec<String> = legal_moves(&pos).iter().map(Move::to_uci).collect();
        assert!(!ucis.contains(&"e1g1".to_string()));
        assert!(ucis.contains(&"e1c1".to_string()));
    }

    #[test]
    fn no_castling_while_in_check() {
        let pos = Position::from_fen("4r3/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let ucis: Vec<String> = legal_moves(&pos).iter().map(Move::to_uci).collect();
        assert!(!ucis.contains(&"e1g1".to_string()));
        assert!(!ucis.contains(&"e1c1".to_string()));
    }

    #[test]
    fn stalemate_is_a_draw() {
        let pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(legal_moves(&pos).is_empty());
        assert_eq!(game_result(&pos), GameResult::Draw);
        assert_eq!(game_result(&pos).code(), 0);
    }

    #[test]
    fn double_push_blocked_by_transit_square() {
        // A piece on e3 blocks both e2e3 and e2e4.
        let pos =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/4n3/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
                .unwrap();
        let ucis: Vec<String> = legal_moves(&pos).iter().map(Move::to_uci).collect();
        assert!(!ucis.contains(&"e2e3".to_string()));
        assert!(!ucis.contains(&"e2e4".to_string()));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        /// Random walks from the start position: make/unmake is an
        /// involution, the incremental hash matches a recomputation, and
        /// FEN round-trips.
        #[test]
        fn random_walk_invariants(choices in prop::collection::vec(0usize..128, 1..32)) {
            let mut pos = Position::startpos();
            for choice in choices {
                let moves = legal_moves(&pos);
                if moves.is_empty() {
                    break;
                }
                let m = moves[choice % moves.len()];

                let before = pos.clone();
                pos.make(m);
                let mut undone = pos.clone();
                undone.unmake(m).unwrap();
                prop_assert_eq!(&undone, &before);
                prop_assert_eq!(undone.zobrist_hash(), before.zobrist_hash());

                prop_assert_eq!(pos.zobrist_hash(), pos.hash_from_scratch());

                let reparsed = Position::from_fen(&pos.to_fen()).unwrap();
                prop_assert_eq!(reparsed.occupied(), pos.occupied());
                prop_assert_eq!(reparsed.side_to_move(), pos.side_to_move());
                prop_assert_eq!(reparsed.castling_rights(), pos.castling_rights());
                prop_assert_eq!(reparsed.en_passant_target(), pos.en_passant_target());
                prop_assert_eq!(reparsed.half_move_clock(), pos.half_move_clock());
            }
        }
    }
}
