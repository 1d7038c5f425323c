//! Core types for the perch chess engine.
//!
//! Everything in this crate is board-representation agnostic:
//! - [`Color`] and [`Piece`] for piece identity
//! - [`Square`], [`File`], and [`Rank`] for board coordinates
//! - [`Move`] and its UCI wire form [`UciMove`]
//! - [`GameResult`] and the external result codes
//! - [`FenFields`] for splitting and validating FEN strings

mod color;
mod fen;
mod moves;
mod piece;
mod result;
mod square;

pub use color::Color;
pub use fen::{FenError, FenFields};
pub use moves::{Move, MoveParseError, UciMove};
pub use piece::Piece;
pub use result::GameResult;
pub use square::{File, Rank, Square};
