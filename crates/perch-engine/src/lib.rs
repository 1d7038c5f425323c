//! Bitboard chess engine core.
//!
//! This crate provides the position model and move generator the search
//! is built on:
//! - [`Bitboard`] - 64-bit square sets with constant-time primitives
//! - [`Position`] - full game state: piece bitboards, side to move,
//!   castling rights, en-passant target, half-move clock, an incremental
//!   Zobrist hash, and an undo stack for make/unmake
//! - [`legal_moves`] - sorted legal move generation with full
//!   special-move handling
//! - [`game_result`] / [`random_playout`] - terminal detection and
//!   uniform rollouts
//! - [`perft`] - move generator validation against reference counts
//!
//! # Example
//!
//! ```
//! use perch_engine::{legal_moves, Position};
//!
//! let mut position = Position::startpos();
//! let moves = legal_moves(&position);
//! assert_eq!(moves.len(), 20);
//! position.make(moves[0]);
//! position.unmake(moves[0]).unwrap();
//! assert_eq!(position, Position::startpos());
//! ```

mod attacks;
mod bitboard;
pub mod movegen;
pub mod perft;
mod playout;
mod position;
mod zobrist;

pub use attacks::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, pawn_pushes, queen_attacks,
    rook_attacks,
};
pub use bitboard::Bitboard;
pub use movegen::{game_result, is_king_attacked, is_square_attacked, legal_moves};
pub use perft::{perft, perft_divide};
pub use playout::random_playout;
pub use position::{CastlingRights, Position, PositionError};
