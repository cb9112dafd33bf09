use crate::moves::mv::Move;
use crate::types::{Bitboard, Color, PieceKind, Square};

/// The contract the search core requires from a chess rules engine. Move
/// generation, legality, and check detection all live on the other side of
/// this trait; the search treats a `Position` as an opaque, mutable board it
/// borrows for the duration of `Engine::best_move` and must leave byte-for-
/// byte identical to how it found it (the LIFO make/unmake invariant of
/// spec.md §8, invariant 1).
pub trait Position: Clone {
    fn side_to_move(&self) -> Color;

    fn piece_at(&self, sq: Square) -> Option<(Color, PieceKind)>;

    /// Finite list of strictly legal moves from the current position.
    fn legal_moves(&self) -> Vec<Move>;

    /// Plays `m`, pushing enough state onto an internal stack that `undo_move`
    /// restores the exact prior position (castling rights, en-passant file,
    /// halfmove clock, and any incremental Zobrist hash).
    fn do_move(&mut self, m: Move);

    /// Pops the LIFO state pushed by the most recent `do_move`.
    fn undo_move(&mut self);

    /// Passes the move without moving a piece (used by null-move pruning).
    fn do_null_move(&mut self);

    fn undo_null_move(&mut self);

    fn is_king_attacked(&self) -> bool;

    fn is_mated(&self) -> bool;

    /// Draw by repetition or the fifty-move rule.
    fn is_draw(&self) -> bool;

    fn attackers_to(&self, sq: Square, by: Color) -> Bitboard;

    /// 4-bit mask, one bit per {WK, WQ, BK, BQ}.
    fn castling_rights(&self) -> u8;

    fn en_passant_file(&self) -> Option<u8>;

    fn fullmove_number(&self) -> u32;

    fn halfmove_clock(&self) -> u32;

    fn zobrist_hash(&self) -> u64;
}
