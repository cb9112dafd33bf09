use std::sync::OnceLock;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::types::{Color, PieceKind, Square, piece::NUM_PIECE_KINDS};

/// Fixed so keys are reproducible across runs and builds, per spec.md §3.
const ZOBRIST_SEED: u64 = 0x5EED_DEAD_BEEF_C0DE;

pub struct ZobristKeys {
    /// [color][piece kind][square]
    piece: [[[u64; 64]; NUM_PIECE_KINDS]; 2],
    /// One of 16 castling-rights combinations.
    castling: [u64; 16],
    /// One per file, used only when an en-passant capture is actually available.
    en_passant: [u64; 8],
    pub side_to_move: u64,
}

static KEYS: OnceLock<ZobristKeys> = OnceLock::new();

pub fn keys() -> &'static ZobristKeys {
    KEYS.get_or_init(ZobristKeys::new)
}

impl ZobristKeys {
    fn new() -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(ZOBRIST_SEED);

        let mut piece = [[[0u64; 64]; NUM_PIECE_KINDS]; 2];
        for color in &mut piece {
            for kind in color {
                for sq in kind {
                    *sq = rng.next_u64();
                }
            }
        }

        let mut castling = [0u64; 16];
        for k in &mut castling {
            *k = rng.next_u64();
        }
        castling[0] = 0;

        let mut en_passant = [0u64; 8];
        for k in &mut en_passant {
            *k = rng.next_u64();
        }

        Self { piece, castling, en_passant, side_to_move: rng.next_u64() }
    }

    pub fn piece_key(&self, color: Color, kind: PieceKind, sq: Square) -> u64 {
        self.piece[color.idx()][kind.idx()][sq.idx()]
    }

    pub fn castling_key(&self, rights: u8) -> u64 {
        self.castling[(rights & 0b1111) as usize]
    }

    pub fn en_passant_key(&self, file: u8) -> u64 {
        self.en_passant[(file & 0b111) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_reproducible_across_calls() {
        let a = keys().piece_key(Color::White, PieceKind::Pawn, Square(12));
        let b = keys().piece_key(Color::White, PieceKind::Pawn, Square(12));
        assert_eq!(a, b);
    }

    #[test]
    fn no_castling_rights_contributes_nothing() {
        assert_eq!(keys().castling_key(0), 0);
    }
}
