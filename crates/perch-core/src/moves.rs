//! Move representation and the UCI wire format.

use crate::{Piece, Square};
use std::fmt;
use thiserror::Error;

/// A fully-described move.
///
/// The generator only ever produces moves the position accepts, so the
/// record carries everything make and unmake need and no separate move
/// type tag:
/// - an en-passant capture is a pawn capturing a pawn on an empty
///   destination square;
/// - castling is a king move of two files from its home square.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    /// Kind of the moving piece.
    pub piece: Piece,
    /// Kind of the captured piece, if any.
    pub captured: Option<Piece>,
    /// Promotion target, if the move promotes.
    pub promotion: Option<Piece>,
}

impl Move {
    /// A non-capturing, non-promoting move.
    #[inline]
    pub const fn quiet(from: Square, to: Square, piece: Piece) -> Self {
        Move {
            from,
            to,
            piece,
            captured: None,
            promotion: None,
        }
    }

    /// A capture without promotion.
    #[inline]
    pub const fn capture(from: Square, to: Square, piece: Piece, captured: Piece) -> Self {
        Move {
            from,
            to,
            piece,
            captured: Some(captured),
            promotion: None,
        }
    }

    /// Copy of this move promoting to `target`.
    #[inline]
    pub const fn promoting_to(self, target: Piece) -> Self {
        Move {
            from: self.from,
            to: self.to,
            piece: self.piece,
            captured: self.captured,
            promotion: Some(target),
        }
    }

    #[inline]
    pub const fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    /// UCI notation: from + to, plus a promotion letter when promoting.
    pub fn to_uci(&self) -> String {
        match self.promotion {
            Some(p) => format!("{}{}{}", self.from, self.to, p.to_uci_char()),
            None => format!("{}{}", self.from, self.to),
        }
    }

    /// Returns true if this move matches a parsed UCI move.
    ///
    /// Promotion must match exactly; a promotion-less UCI move never
    /// matches a promoting one.
    #[inline]
    pub fn matches_uci(&self, uci: &UciMove) -> bool {
        self.from == uci.from && self.to == uci.to && self.promotion == uci.promotion
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({})", self.to_uci())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

/// Errors from parsing a UCI move string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoveParseError {
    #[error("UCI move must be 4 or 5 characters, got {0}")]
    BadLength(usize),

    #[error("invalid square coordinate: {0}")]
    InvalidSquare(String),

    #[error("invalid promotion piece: {0}")]
    InvalidPromotion(char),
}

/// A move as written on the wire: from, to, and an optional promotion.
///
/// A UCI string does not identify the moving or captured piece, so it
/// must be matched against the legal moves of a position to obtain a
/// full [`Move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UciMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
}

impl UciMove {
    /// Parses a 4-5 character UCI move such as `"e2e4"` or `"e7e8q"`.
    pub fn parse(s: &str) -> Result<Self, MoveParseError> {
        if s.len() != 4 && s.len() != 5 {
            return Err(MoveParseError::BadLength(s.len()));
        }
        if !s.is_ascii() {
            return Err(MoveParseError::InvalidSquare(s.to_string()));
        }
        let from = Square::from_algebraic(&s[0..2])
            .ok_or_else(|| MoveParseError::InvalidSquare(s[0..2].to_string()))?;
        let to = Square::from_algebraic(&s[2..4])
            .ok_or_else(|| MoveParseError::InvalidSquare(s[2..4].to_string()))?;
        let promotion = match s[4..].chars().next() {
            None => None,
            Some(c) => match c.to_ascii_lowercase() {
                'n' => Some(Piece::Knight),
                'b' => Some(Piece::Bishop),
                'r' => Some(Piece::Rook),
                'q' => Some(Piece::Queen),
                other => return Err(MoveParseError::InvalidPromotion(other)),
            },
        };
        Ok(UciMove {
            from,
            to,
            promotion,
        })
    }
}

impl fmt::Display for UciMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.promotion {
            Some(p) => write!(f, "{}{}{}", self.from, self.to, p.to_uci_char()),
            None => write!(f, "{}{}", self.from, self.to),
        }
    }
}
