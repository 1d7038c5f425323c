//! Attack and push tables.
//!
//! Knight, king, and pawn tables are 64-entry constants computed at
//! compile time. Sliding attacks are computed on demand by walking rays
//! against an occupancy bitboard; rays step in rank/file coordinates, so
//! board edges never wrap.

use crate::Bitboard;
use perch_core::{Color, Square};

const KNIGHT_ATTACKS: [Bitboard; 64] = compute_knight_attacks();
const KING_ATTACKS: [Bitboard; 64] = compute_king_attacks();
/// Diagonal capture targets, `[color][square]`, pure geometry.
const PAWN_ATTACKS: [[Bitboard; 64]; 2] = compute_pawn_attacks();
/// Forward push targets, `[color][square]`, including the double push
/// from the start rank. Pawns one step from promotion have no entries;
/// the generator emits promotion pushes itself.
const PAWN_PUSHES: [[Bitboard; 64]; 2] = compute_pawn_pushes();

const ROOK_RAYS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_RAYS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Knight attack set from a square.
#[inline]
pub fn knight_attacks(sq: Square) -> Bitboard {
    KNIGHT_ATTACKS[sq.index() as usize]
}

/// King attack set from a square.
#[inline]
pub fn king_attacks(sq: Square) -> Bitboard {
    KING_ATTACKS[sq.index() as usize]
}

/// Diagonal capture targets of a pawn of the given color.
#[inline]
pub fn pawn_attacks(sq: Square, color: Color) -> Bitboard {
    PAWN_ATTACKS[color.index()][sq.index() as usize]
}

/// Push targets of a pawn of the given color, unmasked by occupancy.
#[inline]
pub fn pawn_pushes(sq: Square, color: Color) -> Bitboard {
    PAWN_PUSHES[color.index()][sq.index() as usize]
}

/// Rook attacks against the given occupancy. Blocker squares are
/// included; squares behind a blocker are not.
pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    ray_attacks(sq, occupied, &ROOK_RAYS)
}

/// Bishop attacks against the given occupancy.
pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    ray_attacks(sq, occupied, &BISHOP_RAYS)
}

/// Queen attacks: union of rook and bishop rays.
pub fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    rook_attacks(sq, occupied) | bishop_attacks(sq, occupied)
}

fn ray_attacks(sq: Square, occupied: Bitboard, rays: &[(i8, i8)]) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    let rank = sq.rank().index() as i8;
    let file = sq.file().index() as i8;
    for &(dr, df) in rays {
        let mut r = rank + dr;
        let mut f = file + df;
        while (0..8).contains(&r) && (0..8).contains(&f) {
            // SAFETY: r and f are both in 0..8
            let target = unsafe { Square::from_index_unchecked((r * 8 + f) as u8) };
            attacks.set(target);
            if occupied.contains(target) {
                break;
            }
            r += dr;
            f += df;
        }
    }
    attacks
}

const fn compute_knight_attacks() -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    let jumps: [(i8, i8); 8] = [
        (2, 1),
        (2, -1),
        (-2, 1),
        (-2, -1),
        (1, 2),
        (1, -2),
        (-1, 2),
        (-1, -2),
    ];
    let mut sq = 0usize;
    while sq < 64 {
        let rank = (sq / 8) as i8;
        let file = (sq % 8) as i8;
        let mut bits = 0u64;
        let mut i = 0;
        while i < 8 {
            let (dr, df) = jumps[i];
            let r = rank + dr;
            let f = file + df;
            if r >= 0 && r < 8 && f >= 0 && f < 8 {
                bits |= 1u64 << (r * 8 + f);
            }
            i += 1;
        }
        table[sq] = Bitboard(bits);
        sq += 1;
    }
    table
}

const fn compute_king_attacks() -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    let steps: [(i8, i8); 8] = [
        (1, 0),
        (-1, 0),
        (0, 1),
        (0, -1),
        (1, 1),
        (1, -1),
        (-1, 1),
        (-1, -1),
    ];
    let mut sq = 0usize;
    while sq < 64 {
        let rank = (sq / 8) as i8;
        let file = (sq % 8) as i8;
        let mut bits = 0u64;
        let mut i = 0;
        while i < 8 {
            let (dr, df) = steps[i];
            let r = rank + dr;
            let f = file + df;
            if r >= 0 && r < 8 && f >= 0 && f < 8 {
                bits |= 1u64 << (r * 8 + f);
            }
            i += 1;
        }
        table[sq] = Bitboard(bits);
        sq += 1;
    }
    table
}

const fn compute_pawn_attacks() -> [[Bitboard; 64]; 2] {
    let mut table = [[Bitboard::EMPTY; 64]; 2];
    let mut sq = 0usize;
    while sq < 64 {
        let rank = sq / 8;
        let file = sq % 8;

        let mut white = 0u64;
        if rank < 7 && file < 7 {
            white |= 1u64 << (sq + 9);
        }
        if rank < 7 && file > 0 {
            white |= 1u64 << (sq + 7);
        }
        table[0][sq] = Bitboard(white);

        let mut black = 0u64;
        if rank > 0 && file < 7 {
            black |= 1u64 << (sq - 7);
        }
        if rank > 0 && file > 0 {
            black |= 1u64 << (sq - 9);
        }
        table[1][sq] = Bitboard(black);

        sq += 1;
    }
    table
}

const fn compute_pawn_pushes() -> [[Bitboard; 64]; 2] {
    let mut table = [[Bitboard::EMPTY; 64]; 2];
    let mut sq = 0usize;
    while sq < 64 {
        let rank = sq / 8;

        // Single pushes stop one rank short of promotion.
        let mut white = 0u64;
        if rank >= 1 && rank <= 5 {
            white |= 1u64 << (sq + 8);
            if rank == 1 {
                white |= 1u64 << (sq + 16);
            }
        }
        table[0][sq] = Bitboard(white);

        let mut black = 0u64;
        if rank >= 2 && rank <= 6 {
            black |= 1u64 << (sq - 8);
            if rank == 6 {
                black |= 1u64 << (sq - 16);
            }
        }
        table[1][sq] = Bitboard(black);

        sq += 1;
    }
    table
}
