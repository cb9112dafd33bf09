use crate::moves::attack_tables::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, queen_attacks, rook_attacks};
use crate::moves::mv::{Move, MoveFlag};
use crate::moves::movelist::MoveList;
use crate::position::Position;
use crate::types::{Bitboard, Color, PieceKind, Square};

use super::zobrist::keys;

pub const CASTLE_WK: u8 = 1;
pub const CASTLE_WQ: u8 = 2;
pub const CASTLE_BK: u8 = 4;
pub const CASTLE_BQ: u8 = 8;

#[derive(Clone, Copy, PartialEq, Debug)]
struct UndoInfo {
    m: Move,
    captured: Option<PieceKind>,
    castling_rights: u8,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    zobrist_hash: u64,
}

/// A concrete, bitboard-backed implementation of the [`Position`] contract.
/// Move generation, legality, and make/unmake all live here so the search
/// core in `crate::search` can depend purely on the trait (spec.md §6.1).
#[derive(Clone, PartialEq, Debug)]
pub struct ChessBoard {
    piece_bb: [[Bitboard; 6]; 2],
    color_bb: [Bitboard; 2],
    side_to_move: Color,
    castling_rights: u8,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
    zobrist_hash: u64,
    /// Hashes of every position reached so far this game, oldest first. Used
    /// for repetition detection; never popped past game start.
    repetition_history: Vec<u64>,
    undo_stack: Vec<UndoInfo>,
}

impl ChessBoard {
    pub fn empty() -> Self {
        Self {
            piece_bb: [[Bitboard::EMPTY; 6]; 2],
            color_bb: [Bitboard::EMPTY; 2],
            side_to_move: Color::White,
            castling_rights: 0,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            zobrist_hash: 0,
            repetition_history: Vec::new(),
            undo_stack: Vec::new(),
        }
    }

    pub fn starting_position() -> Self {
        Self::from_fen(super::fen::STARTING_FEN).expect("starting FEN is well-formed")
    }

    pub fn occupied(&self) -> Bitboard {
        self.color_bb[0] | self.color_bb[1]
    }

    pub fn color_occupancy(&self, c: Color) -> Bitboard {
        self.color_bb[c.idx()]
    }

    pub fn bitboard(&self, c: Color, pk: PieceKind) -> Bitboard {
        self.piece_bb[c.idx()][pk.idx()]
    }

    pub fn king_square(&self, c: Color) -> Square {
        self.piece_bb[c.idx()][PieceKind::King.idx()].lsb()
    }

    fn place(&mut self, c: Color, pk: PieceKind, sq: Square) {
        self.piece_bb[c.idx()][pk.idx()].set(sq);
        self.color_bb[c.idx()].set(sq);
        self.zobrist_hash ^= keys().piece_key(c, pk, sq);
    }

    fn remove(&mut self, c: Color, pk: PieceKind, sq: Square) {
        self.piece_bb[c.idx()][pk.idx()].clear(sq);
        self.color_bb[c.idx()].clear(sq);
        self.zobrist_hash ^= keys().piece_key(c, pk, sq);
    }

    fn piece_kind_at(&self, sq: Square) -> Option<(Color, PieceKind)> {
        for c in [Color::White, Color::Black] {
            if !self.color_bb[c.idx()].contains(sq) {
                continue;
            }
            for pk in [
                PieceKind::Pawn,
                PieceKind::Knight,
                PieceKind::Bishop,
                PieceKind::Rook,
                PieceKind::Queen,
                PieceKind::King,
            ] {
                if self.piece_bb[c.idx()][pk.idx()].contains(sq) {
                    return Some((c, pk));
                }
            }
        }
        None
    }

    pub fn has_non_pawn_material(&self, c: Color) -> bool {
        let minor_major = self.piece_bb[c.idx()][PieceKind::Knight.idx()]
            | self.piece_bb[c.idx()][PieceKind::Bishop.idx()]
            | self.piece_bb[c.idx()][PieceKind::Rook.idx()]
            | self.piece_bb[c.idx()][PieceKind::Queen.idx()];
        !minor_major.is_empty()
    }

    fn attacks_to(&self, sq: Square, occupied: Bitboard) -> [Bitboard; 2] {
        let mut result = [Bitboard::EMPTY, Bitboard::EMPTY];
        for c in [Color::White, Color::Black] {
            let mut att = Bitboard::EMPTY;
            att |= knight_attacks(sq) & self.piece_bb[c.idx()][PieceKind::Knight.idx()];
            att |= king_attacks(sq) & self.piece_bb[c.idx()][PieceKind::King.idx()];
            att |= bishop_attacks(sq, occupied)
                & (self.piece_bb[c.idx()][PieceKind::Bishop.idx()] | self.piece_bb[c.idx()][PieceKind::Queen.idx()]);
            att |= rook_attacks(sq, occupied)
                & (self.piece_bb[c.idx()][PieceKind::Rook.idx()] | self.piece_bb[c.idx()][PieceKind::Queen.idx()]);
            // Pawn attacks are keyed by the attacker's color looking backward from `sq`.
            att |= pawn_attacks(sq, c.opposite_pawn_origin()) & self.piece_bb[c.idx()][PieceKind::Pawn.idx()];
            result[c.idx()] = att;
        }
        result
    }

    fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        !self.attacks_to(sq, self.occupied())[by.idx()].is_empty()
    }

    /// Generates every pseudo-legal move: legality (not leaving one's own
    /// king in check) is filtered afterward by `legal_moves`.
    fn generate_pseudo_legal(&self) -> MoveList {
        let mut list = MoveList::default();
        let us = self.side_to_move;
        let them = !us;
        let occ = self.occupied();
        let own = self.color_bb[us.idx()];
        let enemy = self.color_bb[them.idx()];

        self.gen_pawn_moves(&mut list, us, occ, enemy);

        for sq in self.piece_bb[us.idx()][PieceKind::Knight.idx()].iter() {
            self.add_targets(&mut list, sq, knight_attacks(sq) & !own);
        }
        for sq in self.piece_bb[us.idx()][PieceKind::Bishop.idx()].iter() {
            self.add_targets(&mut list, sq, bishop_attacks(sq, occ) & !own);
        }
        for sq in self.piece_bb[us.idx()][PieceKind::Rook.idx()].iter() {
            self.add_targets(&mut list, sq, rook_attacks(sq, occ) & !own);
        }
        for sq in self.piece_bb[us.idx()][PieceKind::Queen.idx()].iter() {
            self.add_targets(&mut list, sq, queen_attacks(sq, occ) & !own);
        }
        let king_sq = self.king_square(us);
        self.add_targets(&mut list, king_sq, king_attacks(king_sq) & !own);
        self.gen_castles(&mut list, us);

        list
    }

    fn add_targets(&self, list: &mut MoveList, from: Square, targets: Bitboard) {
        for to in targets.iter() {
            list.push(Move::new(from, to, MoveFlag::Normal));
        }
    }

    fn gen_pawn_moves(&self, list: &mut MoveList, us: Color, occ: Bitboard, enemy: Bitboard) {
        let promo_rank = if us == Color::White { 7 } else { 0 };
        let start_rank = if us == Color::White { 1 } else { 6 };
        let fwd: i32 = if us == Color::White { 8 } else { -8 };

        for from in self.piece_bb[us.idx()][PieceKind::Pawn.idx()].iter() {
            let one_idx = from.0 as i32 + fwd;
            if (0..64).contains(&one_idx) {
                let one = Square(one_idx as u8);
                if !occ.contains(one) {
                    self.push_pawn_move(list, from, one, promo_rank, MoveFlag::Normal);
                    if from.rank() == start_rank {
                        let two_idx = one_idx + fwd;
                        let two = Square(two_idx as u8);
                        if !occ.contains(two) {
                            list.push(Move::new(from, two, MoveFlag::DoublePush));
                        }
                    }
                }
            }
            for to in pawn_attacks(from, us).iter() {
                if enemy.contains(to) {
                    self.push_pawn_move(list, from, to, promo_rank, MoveFlag::Normal);
                } else if Some(to) == self.en_passant {
                    list.push(Move::new(from, to, MoveFlag::EnPassant));
                }
            }
        }
    }

    fn push_pawn_move(&self, list: &mut MoveList, from: Square, to: Square, promo_rank: u8, flag: MoveFlag) {
        if to.rank() == promo_rank {
            for pk in [PieceKind::Queen, PieceKind::Rook, PieceKind::Bishop, PieceKind::Knight] {
                list.push(Move::new(from, to, MoveFlag::Promotion(pk)));
            }
        } else {
            list.push(Move::new(from, to, flag));
        }
    }

    fn gen_castles(&self, list: &mut MoveList, us: Color) {
        let occ = self.occupied();
        let (king_side, queen_side, king_home) = match us {
            Color::White => (CASTLE_WK, CASTLE_WQ, Square(4)),
            Color::Black => (CASTLE_BK, CASTLE_BQ, Square(60)),
        };
        if self.is_square_attacked(king_home, !us) {
            return;
        }
        if self.castling_rights & king_side != 0 {
            let f1 = Square(king_home.0 + 1);
            let g1 = Square(king_home.0 + 2);
            if !occ.contains(f1) && !occ.contains(g1) && !self.is_square_attacked(f1, !us) && !self.is_square_attacked(g1, !us) {
                list.push(Move::new(king_home, g1, MoveFlag::Castle));
            }
        }
        if self.castling_rights & queen_side != 0 {
            let d1 = Square(king_home.0 - 1);
            let c1 = Square(king_home.0 - 2);
            let b1 = Square(king_home.0 - 3);
            if !occ.contains(d1) && !occ.contains(c1) && !occ.contains(b1) && !self.is_square_attacked(d1, !us) && !self.is_square_attacked(c1, !us) {
                list.push(Move::new(king_home, c1, MoveFlag::Castle));
            }
        }
    }

    /// Applies `m` without legality checking; `legal_moves` only ever emits
    /// moves vetted by `is_square_attacked`, and `see`/search never plays a
    /// move it has not first retrieved from this board's own generator.
    fn apply(&mut self, m: Move) -> UndoInfo {
        let us = self.side_to_move;
        let them = !us;
        let (_, moving_kind) = self.piece_kind_at(m.from()).expect("move origin must hold a piece");
        let captured = if m.is_en_passant() {
            None
        } else {
            self.piece_kind_at(m.to()).map(|(_, pk)| pk)
        };

        let undo = UndoInfo {
            m,
            captured: if m.is_en_passant() { Some(PieceKind::Pawn) } else { captured },
            castling_rights: self.castling_rights,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            zobrist_hash: self.zobrist_hash,
        };

        if let Some(file) = self.en_passant.map(|s| s.file()) {
            self.zobrist_hash ^= keys().en_passant_key(file);
        }
        self.en_passant = None;

        if m.is_en_passant() {
            let cap_sq = Square(if us == Color::White { m.to().0 - 8 } else { m.to().0 + 8 });
            self.remove(them, PieceKind::Pawn, cap_sq);
        } else if let Some(cap_pk) = captured {
            self.remove(them, cap_pk, m.to());
        }

        self.remove(us, moving_kind, m.from());
        if let Some(promo) = m.promotion() {
            self.place(us, promo, m.to());
        } else {
            self.place(us, moving_kind, m.to());
        }

        if m.is_castle() {
            let (rook_from, rook_to) = match (us, m.to()) {
                (Color::White, Square(6)) => (Square(7), Square(5)),
                (Color::White, Square(2)) => (Square(0), Square(3)),
                (Color::Black, Square(62)) => (Square(63), Square(61)),
                (Color::Black, Square(58)) => (Square(56), Square(59)),
                _ => unreachable!("castle destination must be a known rook home"),
            };
            self.remove(us, PieceKind::Rook, rook_from);
            self.place(us, PieceKind::Rook, rook_to);
        }

        if m.is_double_push() {
            let ep_sq = Square(if us == Color::White { m.from().0 + 8 } else { m.from().0 - 8 });
            self.en_passant = Some(ep_sq);
            self.zobrist_hash ^= keys().en_passant_key(ep_sq.file());
        }

        self.zobrist_hash ^= keys().castling_key(self.castling_rights);
        self.castling_rights &= !castling_mask_for(m.from());
        self.castling_rights &= !castling_mask_for(m.to());
        self.zobrist_hash ^= keys().castling_key(self.castling_rights);

        if moving_kind == PieceKind::Pawn || captured.is_some() || m.is_en_passant() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if us == Color::Black {
            self.fullmove_number += 1;
        }

        self.zobrist_hash ^= keys().side_to_move;
        self.side_to_move = them;

        undo
    }

    fn unapply(&mut self, undo: UndoInfo) {
        self.side_to_move = !self.side_to_move;
        let us = self.side_to_move;
        let them = !us;
        let m = undo.m;

        let moved_kind = if let Some(promo) = m.promotion() {
            self.remove(us, promo, m.to());
            PieceKind::Pawn
        } else {
            let (_, k) = self.piece_kind_at(m.to()).expect("moved piece must still occupy destination");
            self.remove(us, k, m.to());
            k
        };
        self.place(us, moved_kind, m.from());

        if m.is_en_passant() {
            let cap_sq = Square(if us == Color::White { m.to().0 - 8 } else { m.to().0 + 8 });
            self.place(them, PieceKind::Pawn, cap_sq);
        } else if let Some(cap_pk) = undo.captured {
            self.place(them, cap_pk, m.to());
        }

        if m.is_castle() {
            let (rook_from, rook_to) = match (us, m.to()) {
                (Color::White, Square(6)) => (Square(7), Square(5)),
                (Color::White, Square(2)) => (Square(0), Square(3)),
                (Color::Black, Square(62)) => (Square(63), Square(61)),
                (Color::Black, Square(58)) => (Square(56), Square(59)),
                _ => unreachable!(),
            };
            self.remove(us, PieceKind::Rook, rook_to);
            self.place(us, PieceKind::Rook, rook_from);
        }

        self.castling_rights = undo.castling_rights;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;
        self.zobrist_hash = undo.zobrist_hash;
    }

    pub fn set_fullmove_number(&mut self, n: u32) {
        self.fullmove_number = n;
    }

    pub fn set_side_to_move(&mut self, c: Color) {
        if self.side_to_move != c {
            self.zobrist_hash ^= keys().side_to_move;
        }
        self.side_to_move = c;
    }

    pub fn set_castling_rights(&mut self, rights: u8) {
        self.zobrist_hash ^= keys().castling_key(self.castling_rights);
        self.castling_rights = rights;
        self.zobrist_hash ^= keys().castling_key(self.castling_rights);
    }

    pub fn set_en_passant(&mut self, sq: Option<Square>) {
        if let Some(old) = self.en_passant {
            self.zobrist_hash ^= keys().en_passant_key(old.file());
        }
        self.en_passant = sq;
        if let Some(new) = sq {
            self.zobrist_hash ^= keys().en_passant_key(new.file());
        }
    }

    pub fn set_halfmove_clock(&mut self, n: u32) {
        self.halfmove_clock = n;
    }

    pub fn put_piece(&mut self, c: Color, pk: PieceKind, sq: Square) {
        self.place(c, pk, sq);
    }

    pub fn recompute_hash(&self) -> u64 {
        let mut hash = 0u64;
        for c in [Color::White, Color::Black] {
            for pk in [
                PieceKind::Pawn,
                PieceKind::Knight,
                PieceKind::Bishop,
                PieceKind::Rook,
                PieceKind::Queen,
                PieceKind::King,
            ] {
                for sq in self.piece_bb[c.idx()][pk.idx()].iter() {
                    hash ^= keys().piece_key(c, pk, sq);
                }
            }
        }
        if self.side_to_move == Color::Black {
            hash ^= keys().side_to_move;
        }
        hash ^= keys().castling_key(self.castling_rights);
        if let Some(ep) = self.en_passant {
            hash ^= keys().en_passant_key(ep.file());
        }
        hash
    }
}

impl Color {
    /// The pawn-attack table is indexed by the attacker's color; to find who
    /// attacks a square via a pawn, look up the table for the opposite color
    /// (a white pawn attacks diagonally forward, so "whose pawn could attack
    /// `sq`" is answered by the table keyed on that color's own forward
    /// direction, queried from `sq` backward).
    fn opposite_pawn_origin(self) -> Self {
        !self
    }
}

fn castling_mask_for(sq: Square) -> u8 {
    match sq.0 {
        0 => CASTLE_WQ,
        4 => CASTLE_WK | CASTLE_WQ,
        7 => CASTLE_WK,
        56 => CASTLE_BQ,
        60 => CASTLE_BK | CASTLE_BQ,
        63 => CASTLE_BK,
        _ => 0,
    }
}

impl Position for ChessBoard {
    fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    fn piece_at(&self, sq: Square) -> Option<(Color, PieceKind)> {
        self.piece_kind_at(sq)
    }

    fn legal_moves(&self) -> Vec<Move> {
        let pseudo = self.generate_pseudo_legal();
        let mut legal = Vec::with_capacity(pseudo.len());
        let mut scratch = self.clone();
        for entry in pseudo.arr.iter() {
            let m = entry.m;
            let undo = scratch.apply(m);
            if !scratch.is_square_attacked(scratch.king_square(self.side_to_move), scratch.side_to_move) {
                legal.push(m);
            }
            scratch.unapply(undo);
        }
        legal
    }

    fn do_move(&mut self, m: Move) {
        self.repetition_history.push(self.zobrist_hash);
        let undo = self.apply(m);
        self.undo_stack.push(undo);
    }

    fn undo_move(&mut self) {
        let undo = self.undo_stack.pop().expect("undo_move called without a matching do_move");
        self.unapply(undo);
        self.repetition_history.pop();
    }

    fn do_null_move(&mut self) {
        self.repetition_history.push(self.zobrist_hash);
        if let Some(file) = self.en_passant.map(|s| s.file()) {
            self.zobrist_hash ^= keys().en_passant_key(file);
        }
        let undo = UndoInfo {
            m: Move::NULL,
            captured: None,
            castling_rights: self.castling_rights,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            zobrist_hash: self.zobrist_hash,
        };
        self.en_passant = None;
        self.zobrist_hash ^= keys().side_to_move;
        self.side_to_move = !self.side_to_move;
        self.undo_stack.push(undo);
    }

    fn undo_null_move(&mut self) {
        let undo = self.undo_stack.pop().expect("undo_null_move called without a matching do_null_move");
        self.side_to_move = !self.side_to_move;
        self.castling_rights = undo.castling_rights;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;
        self.zobrist_hash = undo.zobrist_hash;
        self.repetition_history.pop();
    }

    fn is_king_attacked(&self) -> bool {
        self.is_square_attacked(self.king_square(self.side_to_move), !self.side_to_move)
    }

    fn is_mated(&self) -> bool {
        self.is_king_attacked() && self.legal_moves().is_empty()
    }

    fn is_draw(&self) -> bool {
        if self.halfmove_clock >= 100 {
            return true;
        }
        let mut reps = 0;
        for &hash in self.repetition_history.iter().rev().take(self.halfmove_clock as usize + 1) {
            if hash == self.zobrist_hash {
                reps += 1;
                if reps >= 2 {
                    return true;
                }
            }
        }
        false
    }

    fn attackers_to(&self, sq: Square, by: Color) -> Bitboard {
        self.attacks_to(sq, self.occupied())[by.idx()]
    }

    fn castling_rights(&self) -> u8 {
        self.castling_rights
    }

    fn en_passant_file(&self) -> Option<u8> {
        self.en_passant.map(|s| s.file())
    }

    fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    fn zobrist_hash(&self) -> u64 {
        self.zobrist_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_has_twenty_legal_moves() {
        let board = ChessBoard::starting_position();
        assert_eq!(board.legal_moves().len(), 20);
    }

    #[test]
    fn do_undo_restores_hash_and_occupancy() {
        let mut board = ChessBoard::starting_position();
        let before_hash = board.zobrist_hash();
        let before_occ = board.occupied();
        let m = board.legal_moves()[0];
        board.do_move(m);
        assert_ne!(board.zobrist_hash(), before_hash);
        board.undo_move();
        assert_eq!(board.zobrist_hash(), before_hash);
        assert_eq!(board.occupied(), before_occ);
    }

    #[test]
    fn hash_matches_full_recompute_after_moves() {
        let mut board = ChessBoard::starting_position();
        for _ in 0..4 {
            let m = board.legal_moves()[0];
            board.do_move(m);
        }
        assert_eq!(board.zobrist_hash(), board.recompute_hash());
    }

    #[test]
    fn null_move_flips_side_and_is_reversible() {
        let mut board = ChessBoard::starting_position();
        let before = board.zobrist_hash();
        board.do_null_move();
        assert_eq!(board.side_to_move(), Color::Black);
        board.undo_null_move();
        assert_eq!(board.zobrist_hash(), before);
        assert_eq!(board.side_to_move(), Color::White);
    }
}
