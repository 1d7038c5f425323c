//! Zobrist keys for position hashing.
//!
//! A position's hash is the XOR of one key per piece on its square, the
//! side key when black is to move, one key per set castling right, and
//! one key for the en-passant file. Keys come from a fixed-seed PRNG so
//! hashes are identical across runs and processes; the table is built at
//! compile time, which makes initialisation idempotent by construction.

use perch_core::{Color, Piece, Rank, Square};

/// The full key table.
pub struct ZobristKeys {
    /// Piece-square keys, `[piece][color][square]`.
    pieces: [[[u64; 64]; 2]; 6],
    /// XORed in when black is to move.
    side: u64,
    /// One key per castling-right bit (WK, WQ, BK, BQ).
    castling: [u64; 4],
    /// En-passant keys: files of rank 3 at 0-7, files of rank 6 at 8-15.
    en_passant: [u64; 16],
}

impl ZobristKeys {
    const fn new() -> Self {
        // xorshift64 from a fixed seed; good enough spread for hashing
        // and usable in const context.
        const fn next(state: u64) -> u64 {
            let mut x = state;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            x
        }

        let mut state = 0x9E37_79B9_7F4A_7C15u64;
        let mut pieces = [[[0u64; 64]; 2]; 6];
        let mut castling = [0u64; 4];
        let mut en_passant = [0u64; 16];

        let mut piece = 0;
        while piece < 6 {
            let mut color = 0;
            while color < 2 {
                let mut sq = 0;
                while sq < 64 {
                    state = next(state);
                    pieces[piece][color][sq] = state;
                    sq += 1;
                }
                color += 1;
            }
            piece += 1;
        }

        state = next(state);
        let side = state;

        let mut i = 0;
        while i < 4 {
            state = next(state);
            castling[i] = state;
            i += 1;
        }

        let mut i = 0;
        while i < 16 {
            state = next(state);
            en_passant[i] = state;
            i += 1;
        }

        ZobristKeys {
            pieces,
            side,
            castling,
            en_passant,
        }
    }

    /// Key for a piece of the given color on a square.
    #[inline]
    pub fn piece(&self, piece: Piece, color: Color, sq: Square) -> u64 {
        self.pieces[piece.index()][color.index()][sq.index() as usize]
    }

    /// Key for the side to move being black.
    #[inline]
    pub fn side(&self) -> u64 {
        self.side
    }

    /// Key for a castling-right bit index (0-3).
    #[inline]
    pub fn castling(&self, right: usize) -> u64 {
        self.castling[right]
    }

    /// Key for an en-passant target square (a rank-3 or rank-6 square).
    #[inline]
    pub fn en_passant(&self, sq: Square) -> u64 {
        let file = sq.file().index() as usize;
        let idx = match sq.rank() {
            Rank::R6 => 8 + file,
            _ => file,
        };
        self.en_passant[idx]
    }
}

/// Process-wide key table, fixed at compile time.
pub static ZOBRIST: ZobristKeys = ZobristKeys::new();
