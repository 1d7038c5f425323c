//! Chess position representation with make/unmake.

use crate::zobrist::ZOBRIST;
use crate::Bitboard;
use perch_core::{
    Color, FenError, FenFields, GameResult, Move, MoveParseError, Piece, Rank, Square, UciMove,
};
use thiserror::Error;

/// Errors from position operations on caller-supplied input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PositionError {
    /// The UCI string does not name a legal move in the current position.
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// Unmake was called with an empty undo stack.
    #[error("unmake without a preceding make")]
    UnmakeWithoutMake,

    /// The UCI string itself could not be parsed.
    #[error(transparent)]
    Parse(#[from] MoveParseError),
}

/// Castling availability as a 4-bit mask.
///
/// Bit 0: white kingside, bit 1: white queenside, bit 2: black kingside,
/// bit 3: black queenside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    const WHITE_KINGSIDE: u8 = 0b0001;
    const WHITE_QUEENSIDE: u8 = 0b0010;
    const BLACK_KINGSIDE: u8 = 0b0100;
    const BLACK_QUEENSIDE: u8 = 0b1000;

    /// Builds rights from a raw mask (upper bits ignored).
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        CastlingRights(bits & 0b1111)
    }

    /// The raw 4-bit mask.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether the bit at `right` (0-3) is set.
    #[inline]
    pub const fn bit(self, right: usize) -> bool {
        (self.0 >> right) & 1 != 0
    }

    #[inline]
    pub const fn kingside(self, color: Color) -> bool {
        let flag = match color {
            Color::White => Self::WHITE_KINGSIDE,
            Color::Black => Self::BLACK_KINGSIDE,
        };
        self.0 & flag != 0
    }

    #[inline]
    pub const fn queenside(self, color: Color) -> bool {
        let flag = match color {
            Color::White => Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_QUEENSIDE,
        };
        self.0 & flag != 0
    }

    /// Clears both rights of one side.
    #[inline]
    fn clear_color(&mut self, color: Color) {
        let mask = match color {
            Color::White => Self::WHITE_KINGSIDE | Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_KINGSIDE | Self::BLACK_QUEENSIDE,
        };
        self.0 &= !mask;
    }

    /// Clears the right tied to a rook home square, if `sq` is one.
    #[inline]
    fn clear_rook_square(&mut self, sq: Square) {
        let mask = match sq {
            Square::H1 => Self::WHITE_KINGSIDE,
            Square::A1 => Self::WHITE_QUEENSIDE,
            Square::H8 => Self::BLACK_KINGSIDE,
            Square::A8 => Self::BLACK_QUEENSIDE,
            _ => return,
        };
        self.0 &= !mask;
    }
}

/// State that make destroys and unmake must restore verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UndoState {
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
}

/// Complete game state.
///
/// Mutated only through [`Position::make`] and [`Position::unmake`],
/// which maintain the aggregate bitboards and the Zobrist hash
/// incrementally. The hash always equals a from-scratch recomputation
/// over the current attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Piece bitboards, `[color][piece]`. Pairwise disjoint.
    pieces: [[Bitboard; 6]; 2],
    /// Aggregate per color: the OR of that color's piece boards.
    by_color: [Bitboard; 2],
    /// Aggregate of both colors.
    occupied: Bitboard,
    side_to_move: Color,
    castling: CastlingRights,
    /// The square a capturing pawn would move to, if a double push just
    /// happened.
    en_passant: Option<Square>,
    /// Plies since the last capture or pawn move. Tracked, never used to
    /// declare draws.
    halfmove_clock: u32,
    hash: u64,
    undo_stack: Vec<UndoState>,
}

impl Position {
    /// The standard starting position.
    pub fn startpos() -> Self {
        Self::from_fen(FenFields::STARTPOS).expect("start position FEN is valid")
    }

    /// Parses a position from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let fields = FenFields::parse(fen)?;
        let mut position = Position {
            pieces: [[Bitboard::EMPTY; 6]; 2],
            by_color: [Bitboard::EMPTY; 2],
            occupied: Bitboard::EMPTY,
            side_to_move: Color::from_white(fields.active_color == 'w'),
            castling: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: fields.halfmove_clock,
            hash: 0,
            undo_stack: Vec::new(),
        };

        for (rank_idx, rank_str) in fields.placement.split('/').enumerate() {
            let rank = 7 - rank_idx as u8;
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as u8;
                } else if let Some((piece, color)) = Piece::from_fen_char(c) {
                    // SAFETY: FenFields validated each rank covers 8 squares
                    let sq = unsafe { Square::from_index_unchecked(rank * 8 + file) };
                    position.put(sq, color, piece);
                    file += 1;
                }
            }
        }

        let mut castling = 0u8;
        for c in fields.castling.chars() {
            match c {
                'K' => castling |= CastlingRights::WHITE_KINGSIDE,
                'Q' => castling |= CastlingRights::WHITE_QUEENSIDE,
                'k' => castling |= CastlingRights::BLACK_KINGSIDE,
                'q' => castling |= CastlingRights::BLACK_QUEENSIDE,
                _ => {}
            }
        }
        position.castling = CastlingRights::from_bits(castling);

        if fields.en_passant != "-" {
            position.en_passant = Square::from_algebraic(&fields.en_passant);
        }

        position.hash = position.hash_from_scratch();
        Ok(position)
    }

    /// Replaces this position with one parsed from `fen`.
    ///
    /// On error the position is left unchanged.
    pub fn set_from_fen(&mut self, fen: &str) -> Result<(), FenError> {
        *self = Self::from_fen(fen)?;
        Ok(())
    }

    /// Serialises the position to FEN. The full-move counter is not
    /// tracked and is emitted as `1`.
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                // SAFETY: rank and file are both in 0..8
                let sq = unsafe { Square::from_index_unchecked(rank * 8 + file) };
                match self.piece_at_colored(sq) {
                    Some((piece, color)) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push(piece.to_fen_char(color));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(if self.side_to_move.is_white() { 'w' } else { 'b' });

        fen.push(' ');
        if self.castling.bits() == 0 {
            fen.push('-');
        } else {
            if self.castling.kingside(Color::White) {
                fen.push('K');
            }
            if self.castling.queenside(Color::White) {
                fen.push('Q');
            }
            if self.castling.kingside(Color::Black) {
                fen.push('k');
            }
            if self.castling.queenside(Color::Black) {
                fen.push('q');
            }
        }

        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&sq.to_algebraic()),
            None => fen.push('-'),
        }

        fen.push(' ');
        fen.push_str(&self.halfmove_clock.to_string());
        fen.push_str(" 1");
        fen
    }

    /// Kind and color of the piece on `sq`, if any.
    pub fn piece_at_colored(&self, sq: Square) -> Option<(Piece, Color)> {
        let bb = Bitboard::from_square(sq);
        let color = if (self.by_color[Color::White.index()] & bb).any() {
            Color::White
        } else if (self.by_color[Color::Black.index()] & bb).any() {
            Color::Black
        } else {
            return None;
        };
        Piece::ALL
            .into_iter()
            .find(|p| (self.pieces[color.index()][p.index()] & bb).any())
            .map(|p| (p, color))
    }

    /// Kind of the piece on `sq`, if any.
    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.piece_at_colored(sq).map(|(piece, _)| piece)
    }

    /// Bitboard of one kind and color.
    #[inline]
    pub fn pieces_of(&self, color: Color, piece: Piece) -> Bitboard {
        self.pieces[color.index()][piece.index()]
    }

    /// Aggregate bitboard of one color.
    #[inline]
    pub fn color_pieces(&self, color: Color) -> Bitboard {
        self.by_color[color.index()]
    }

    /// Aggregate bitboard of every piece.
    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.occupied
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn white_to_move(&self) -> bool {
        self.side_to_move.is_white()
    }

    #[inline]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    /// The en-passant target square, or `None`.
    #[inline]
    pub fn en_passant_target(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    pub fn half_move_clock(&self) -> u32 {
        self.halfmove_clock
    }

    /// The incrementally maintained Zobrist hash.
    #[inline]
    pub fn zobrist_hash(&self) -> u64 {
        self.hash
    }

    /// All legal moves, sorted by (from, to, promotion).
    pub fn legal_moves(&self) -> Vec<Move> {
        crate::movegen::legal_moves(self)
    }

    /// Game result for the side to move; [`GameResult::Ongoing`] while
    /// legal moves remain.
    pub fn result(&self) -> GameResult {
        crate::movegen::game_result(self)
    }

    /// Whether the king of `color` is attacked.
    pub fn is_in_check(&self, color: Color) -> bool {
        crate::movegen::is_king_attacked(self, color)
    }

    /// Advances the position by a move previously obtained from
    /// [`Position::legal_moves`].
    ///
    /// The state for a move from any other source is unspecified;
    /// callers holding untrusted input should go through
    /// [`Position::make_uci`].
    pub fn make(&mut self, m: Move) {
        let mover = self.side_to_move;
        let enemy = mover.opposite();

        self.undo_stack.push(UndoState {
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
        });

        self.hash ^= castling_ep_hash(self.castling, self.en_passant);

        // En passant is the one capture whose destination is empty.
        let is_en_passant = m.piece == Piece::Pawn
            && m.captured == Some(Piece::Pawn)
            && !self.occupied.contains(m.to);
        let capture_sq = if is_en_passant {
            behind(m.to, mover)
        } else {
            m.to
        };

        self.hash ^= ZOBRIST.piece(m.piece, mover, m.from);
        if let Some(captured) = m.captured {
            self.hash ^= ZOBRIST.piece(captured, enemy, capture_sq);
            self.take(capture_sq, enemy, captured);
        }
        let placed = m.promotion.unwrap_or(m.piece);
        self.hash ^= ZOBRIST.piece(placed, mover, m.to);
        self.hash ^= ZOBRIST.side();
        self.take(m.from, mover, m.piece);
        self.put(m.to, mover, placed);

        if let Some((rook_from, rook_to)) = castling_rook_path(m) {
            self.hash ^= ZOBRIST.piece(Piece::Rook, mover, rook_from);
            self.hash ^= ZOBRIST.piece(Piece::Rook, mover, rook_to);
            self.take(rook_from, mover, Piece::Rook);
            self.put(rook_to, mover, Piece::Rook);
        }

        self.side_to_move = enemy;

        self.en_passant = if m.piece == Piece::Pawn
            && m.from.rank() == Rank::R2
            && m.to.rank() == Rank::R4
        {
            m.from.offset(8)
        } else if m.piece == Piece::Pawn && m.from.rank() == Rank::R7 && m.to.rank() == Rank::R5 {
            m.from.offset(-8)
        } else {
            None
        };

        if m.piece == Piece::King {
            self.castling.clear_color(mover);
        } else if m.piece == Piece::Rook {
            self.castling.clear_rook_square(m.from);
        }
        if m.captured == Some(Piece::Rook) {
            self.castling.clear_rook_square(m.to);
        }

        self.hash ^= castling_ep_hash(self.castling, self.en_passant);

        if m.captured.is_some() || m.piece == Piece::Pawn {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
    }

    /// Reverts the most recent [`Position::make`] of `m`, restoring
    /// every attribute including the hash.
    ///
    /// Make overwrote the en-passant target, but the undo entry still
    /// holds the pre-make value: a pawn-takes-pawn was en passant iff
    /// its destination is that saved target. An ordinary pawn capture
    /// landing on rank 3 or 6 must not be mistaken for one.
    pub fn unmake(&mut self, m: Move) -> Result<(), PositionError> {
        let undo = self
            .undo_stack
            .pop()
            .ok_or(PositionError::UnmakeWithoutMake)?;

        self.hash ^= castling_ep_hash(self.castling, self.en_passant);

        self.side_to_move = self.side_to_move.opposite();
        let mover = self.side_to_move;
        let enemy = mover.opposite();

        let is_en_passant = m.piece == Piece::Pawn
            && m.captured == Some(Piece::Pawn)
            && undo.en_passant == Some(m.to);
        let capture_sq = if is_en_passant {
            behind(m.to, mover)
        } else {
            m.to
        };

        if let Some((rook_from, rook_to)) = castling_rook_path(m) {
            self.take(rook_to, mover, Piece::Rook);
            self.put(rook_from, mover, Piece::Rook);
            self.hash ^= ZOBRIST.piece(Piece::Rook, mover, rook_to);
            self.hash ^= ZOBRIST.piece(Piece::Rook, mover, rook_from);
        }

        self.hash ^= ZOBRIST.side();
        let placed = m.promotion.unwrap_or(m.piece);
        self.hash ^= ZOBRIST.piece(placed, mover, m.to);
        self.hash ^= ZOBRIST.piece(m.piece, mover, m.from);
        if let Some(captured) = m.captured {
            self.hash ^= ZOBRIST.piece(captured, enemy, capture_sq);
        }

        self.take(m.to, mover, placed);
        self.put(m.from, mover, m.piece);
        if let Some(captured) = m.captured {
            self.put(capture_sq, enemy, captured);
        }

        self.castling = undo.castling;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;
        self.hash ^= castling_ep_hash(self.castling, self.en_passant);
        Ok(())
    }

    /// Parses a UCI move, matches it against the legal moves, and makes
    /// it. The position is unchanged on error.
    pub fn make_uci(&mut self, uci: &str) -> Result<Move, PositionError> {
        let parsed = UciMove::parse(uci)?;
        let m = self
            .legal_moves()
            .into_iter()
            .find(|m| m.matches_uci(&parsed))
            .ok_or_else(|| PositionError::IllegalMove(uci.to_string()))?;
        self.make(m);
        Ok(m)
    }

    /// Recomputes the hash over the current attributes; the incremental
    /// hash must always agree with this.
    pub fn hash_from_scratch(&self) -> u64 {
        let mut hash = 0u64;
        for color in [Color::White, Color::Black] {
            for piece in Piece::ALL {
                for sq in self.pieces[color.index()][piece.index()] {
                    hash ^= ZOBRIST.piece(piece, color, sq);
                }
            }
        }
        if self.side_to_move == Color::Black {
            hash ^= ZOBRIST.side();
        }
        hash ^ castling_ep_hash(self.castling, self.en_passant)
    }

    fn put(&mut self, sq: Square, color: Color, piece: Piece) {
        let bb = Bitboard::from_square(sq);
        self.pieces[color.index()][piece.index()] |= bb;
        self.by_color[color.index()] |= bb;
        self.occupied |= bb;
    }

    fn take(&mut self, sq: Square, color: Color, piece: Piece) {
        let mask = !Bitboard::from_square(sq);
        self.pieces[color.index()][piece.index()] &= mask;
        self.by_color[color.index()] &= mask;
        self.occupied &= mask;
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}

/// The square one pawn-step behind `sq` from `mover`'s point of view.
#[inline]
fn behind(sq: Square, mover: Color) -> Square {
    sq.offset(-8 * mover.pawn_direction()).unwrap_or(sq)
}

/// Rook relocation for a two-file king move from its home square.
fn castling_rook_path(m: Move) -> Option<(Square, Square)> {
    if m.piece != Piece::King {
        return None;
    }
    match (m.from, m.to) {
        (Square::E1, Square::G1) => Some((Square::H1, Square::F1)),
        (Square::E1, Square::C1) => Some((Square::A1, Square::D1)),
        (Square::E8, Square::G8) => Some((Square::H8, Square::F8)),
        (Square::E8, Square::C8) => Some((Square::A8, Square::D8)),
        _ => None,
    }
}

fn castling_ep_hash(castling: CastlingRights, en_passant: Option<Square>) -> u64 {
    let mut hash = 0u64;
    for right in 0..4 {
        if castling.bit(right) {
            hash ^= ZOBRIST.castling(right);
        }
    }
    if let Some(sq) = en_passant {
        hash ^= ZOBRIST.en_passant(sq);
    }
    hash
}
