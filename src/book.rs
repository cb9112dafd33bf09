use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;

use crate::board::ChessBoard;
use crate::moves::mv::Move;
use crate::position::Position;
use crate::types::{PieceKind, Square};

/// How deep into the game the book is consulted (spec.md §4.6 leaves the
/// exact cutoff as an open question; 10 full moves covers the lines below
/// with headroom for either side to deviate before book runs dry).
pub const OPENING_BOOK_MAX_MOVES: u32 = 10;

/// `from`(6 bits) | `to`(6 bits) << 6. Promotion is always implied queen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedMove(u16);

impl PackedMove {
    fn pack(from: Square, to: Square) -> Self {
        Self(from.idx() as u16 | ((to.idx() as u16) << 6))
    }

    fn from(self) -> Square {
        Square((self.0 & 0x3f) as u8)
    }

    fn to(self) -> Square {
        Square(((self.0 >> 6) & 0x3f) as u8)
    }
}

fn find_legal_move<P: Position>(pos: &P, from: Square, to: Square) -> Option<Move> {
    pos.legal_moves()
        .into_iter()
        .find(|m| m.from() == from && m.to() == to && (m.promotion().is_none() || m.promotion() == Some(PieceKind::Queen)))
}

/// A handful of well-known main-line openings, as UCI long algebraic moves.
/// Each line seeds book entries at every prefix position it passes through,
/// so transpositions across lines accumulate multiple candidate replies.
const BOOK_LINES: &[&[&str]] = &[
    &["e2e4", "c7c5", "g1f3", "d7d6", "d2d4", "c5d4", "f3d4", "g8f6", "b1c3"],
    &["e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "a7a6", "b5a4", "g8f6", "e1g1"],
    &["d2d4", "g8f6", "c2c4", "e7e6", "b1c3", "f8b4", "e2e3", "e8g8"],
    &["d2d4", "d7d5", "c2c4", "e7e6", "b1c3", "g8f6", "c1g5", "f8e7"],
    &["c2c4", "e7e5", "b1c3", "g8f6", "g1f3", "b8c6", "g2g3", "d7d5"],
    &["e2e4", "c7c6", "d2d4", "d7d5", "b1c3", "d5e4", "c3e4", "b8d7"],
    &["g1f3", "d7d5", "c2c4", "d5c4", "e2e3", "e7e5", "f1c4", "c7c6"],
];

/// Zobrist-keyed opening book. Construction replays `BOOK_LINES` from the
/// starting position on a scratch `ChessBoard`; lookup is on the live
/// search root's Zobrist hash (spec.md §4.6).
pub struct OpeningBook {
    replies: FxHashMap<u64, Vec<PackedMove>>,
    rng: ChaCha8Rng,
}

impl OpeningBook {
    pub fn new() -> Self {
        let mut replies: FxHashMap<u64, Vec<PackedMove>> = FxHashMap::default();
        for line in BOOK_LINES {
            let mut board = ChessBoard::starting_position();
            for uci in *line {
                let from = Square::from_algebraic(&uci[0..2]).expect("book line has a valid square");
                let to = Square::from_algebraic(&uci[2..4]).expect("book line has a valid square");
                let Some(m) = find_legal_move(&board, from, to) else { break };
                replies.entry(board.zobrist_hash()).or_default().push(PackedMove::pack(from, to));
                board.do_move(m);
            }
        }
        Self { replies, rng: ChaCha8Rng::from_entropy() }
    }

    /// Returns a legal reply for `pos`, or `None` if the root is outside the
    /// book or none of the recorded candidates are currently legal.
    pub fn lookup<P: Position>(&mut self, pos: &P) -> Option<Move> {
        if pos.fullmove_number() > OPENING_BOOK_MAX_MOVES {
            return None;
        }
        let candidates = self.replies.get(&pos.zobrist_hash())?;
        if candidates.is_empty() {
            return None;
        }
        let start = self.rng.gen_range(0..candidates.len());
        (0..candidates.len())
            .map(|i| candidates[(start + i) % candidates.len()])
            .find_map(|packed| find_legal_move(pos, packed.from(), packed.to()))
    }

    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }
}

impl Default for OpeningBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_has_a_book_reply() {
        let mut book = OpeningBook::new();
        let board = ChessBoard::starting_position();
        assert!(book.lookup(&board).is_some());
    }

    #[test]
    fn book_is_not_consulted_past_the_move_gate() {
        let mut book = OpeningBook::new();
        let board = ChessBoard::from_fen(
            "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 20",
        )
        .unwrap();
        assert_eq!(board.fullmove_number(), 20);
        assert!(book.lookup(&board).is_none());
    }
}
