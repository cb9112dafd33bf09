use crate::moves::movelist::MoveList;
use crate::moves::mv::Move;
use crate::position::Position;
use crate::types::{Color, PieceKind, Square};

use super::counter::{CountermoveTable, FollowupTable};
use super::history::{HistoryTable, PieceHistoryTable, ThreatTable};
use super::killers::KillerTable;

const HASH_MOVE_BONUS: i32 = 10_000_000;
const CAPTURE_BASE: i32 = 5_000_000;
const HIGH_VALUE_ROOK_BONUS: i32 = 2_000_000;
const HIGH_VALUE_QUEEN_BONUS: i32 = 3_000_000;
const PROMOTION_BONUS: i32 = 4_000_000;
const KILLER_BASE: i32 = 800_000;
const KILLER_STEP: i32 = 50_000;
const COUNTERMOVE_BONUS: i32 = 50_000;
const FOLLOWUP_BONUS: i32 = 30_000;
const GIVES_CHECK_BONUS: i32 = 25_000;
const CENTRALIZATION_BONUS: i32 = 50_000;
const EXTENDED_CENTRE_BONUS: i32 = 25_000;
const TWO_SQUARE_PAWN_BONUS: i32 = 5;
const CREATES_PASSED_PAWN_BONUS: i32 = 30;

/// How many static evaluations elapse between periodic history-family aging
/// sweeps, per spec.md §4.3's Updates ("every 1000 evaluations").
const AGING_EVAL_INTERVAL: u32 = 1000;

/// Shared move-ordering state: one instance lives for the whole search, per
/// spec.md §3 (these are search-lifetime tables, not per-node).
#[derive(Default)]
pub struct OrderingTables {
    pub killers: KillerTable,
    pub history: HistoryTable,
    pub piece_history: PieceHistoryTable,
    pub threat: ThreatTable,
    pub countermove: CountermoveTable,
    pub followup: FollowupTable,
    evaluations_since_aging: u32,
}

impl OrderingTables {
    pub fn new_search(&mut self) {
        self.killers.clear();
    }

    /// Called once per node whose static evaluation is computed. Every
    /// `AGING_EVAL_INTERVAL` calls, halves every history-family table
    /// (spec.md §4.3's Updates periodic trigger).
    pub fn record_evaluation(&mut self) {
        self.evaluations_since_aging += 1;
        if self.evaluations_since_aging >= AGING_EVAL_INTERVAL {
            self.age_history_families();
        }
    }

    fn age_history_families(&mut self) {
        self.history.age_all();
        self.piece_history.age_all();
        self.threat.age_all();
        self.evaluations_since_aging = 0;
    }

    fn development_bonus(pk: PieceKind) -> i32 {
        match pk {
            PieceKind::Knight => 800_000,
            PieceKind::Bishop => 600_000,
            PieceKind::Rook => 400_000,
            PieceKind::Queen => 200_000,
            PieceKind::Pawn | PieceKind::King => 0,
        }
    }

    fn is_central_2x2(sq: Square) -> bool {
        matches!(sq.0, 27 | 28 | 35 | 36) // d5 e5 d4 e4
    }

    fn is_extended_centre(sq: Square) -> bool {
        (2..=5).contains(&sq.file()) && (2..=5).contains(&sq.rank())
    }

    fn pawn_advance_bonus(color: Color, from: Square, to: Square) -> i32 {
        let forward = match color {
            Color::White => to.rank() as i32 - from.rank() as i32,
            Color::Black => from.rank() as i32 - to.rank() as i32,
        };
        if forward <= 0 {
            return 0;
        }
        let promo_rank = if color == Color::White { 7 } else { 0 };
        let dist = (promo_rank as i32 - to.rank() as i32).unsigned_abs();
        (200 - 30 * dist as i32).clamp(2, 200)
    }

    /// Scores one candidate move at `ply`, given the hash move suggested by
    /// the transposition table and the last two moves made by our side (for
    /// countermove/followup) and by the opponent (for countermove).
    pub fn score_move<P: Position>(
        &self,
        pos: &mut P,
        m: Move,
        ply: usize,
        hash_move: Option<Move>,
        opponent_last_move: Option<Move>,
        our_second_last_move: Option<Move>,
    ) -> i32 {
        if Some(m) == hash_move {
            return HASH_MOVE_BONUS;
        }

        let color = pos.side_to_move();
        let (_, moving_kind) = pos.piece_at(m.from()).expect("scored move must originate from an occupied square");
        let target = pos.piece_at(m.to());
        let mut score = 0i32;

        if let Some((_, victim)) = target {
            score += CAPTURE_BASE + 1000 * victim.value() - moving_kind.value();
            if victim.value() >= PieceKind::Queen.value() {
                score += HIGH_VALUE_QUEEN_BONUS;
            } else if victim.value() >= PieceKind::Rook.value() {
                score += HIGH_VALUE_ROOK_BONUS;
            }
        } else if m.is_en_passant() {
            score += CAPTURE_BASE + 1000 * PieceKind::Pawn.value() - moving_kind.value();
        }

        if m.promotion().is_some() {
            score += PROMOTION_BONUS;
        }

        if let Some(slot) = self.killers.is_killer(ply, m) {
            score += KILLER_BASE - KILLER_STEP * slot as i32;
        }

        let plain_hist = self.history.score(color, m.from(), m.to());
        score += plain_hist;
        let butterfly = self.history.butterfly(color, m.from(), m.to());
        if butterfly > 0 {
            score += 2 * self.history.relative(color, m.from(), m.to());
        }
        score += self.piece_history.score(color, moving_kind, m.from(), m.to());

        if let Some(opp) = opponent_last_move {
            if self.countermove.get(opp) == Some(m) {
                score += COUNTERMOVE_BONUS;
            }
        }
        if let Some(ours) = our_second_last_move {
            if self.followup.get(ours) == Some(m) {
                score += FOLLOWUP_BONUS;
            }
        }
        score += 10 * self.threat.score(color, m.from(), m.to());

        if moving_kind != PieceKind::Pawn && moving_kind != PieceKind::King {
            let back_rank = if color == Color::White { 0 } else { 7 };
            if m.from().rank() == back_rank {
                score += Self::development_bonus(moving_kind);
            }
        }
        if moving_kind != PieceKind::Pawn {
            if Self::is_central_2x2(m.to()) {
                score += CENTRALIZATION_BONUS;
            } else if Self::is_extended_centre(m.to()) {
                score += EXTENDED_CENTRE_BONUS;
            }
        }

        if moving_kind == PieceKind::Pawn {
            score += Self::pawn_advance_bonus(color, m.from(), m.to());
            if m.is_double_push() {
                score += TWO_SQUARE_PAWN_BONUS;
            }
        }

        // The remaining two components — gives-check, attacks-after-move,
        // and creates-passed-pawn — require making the move to observe the
        // resulting position, so they are the only part of scoring that
        // touches `pos` mutably.
        pos.do_move(m);
        if pos.is_king_attacked() {
            score += GIVES_CHECK_BONUS;
        }
        score += Self::attacks_after_move(pos, color);
        if moving_kind == PieceKind::Pawn && Self::creates_passed_pawn(pos, color, m.to()) {
            score += CREATES_PASSED_PAWN_BONUS;
        }
        pos.undo_move();

        score
    }

    fn attacks_after_move<P: Position>(pos: &P, us: Color) -> i32 {
        let them = !us;
        let mut total = 0i32;
        for sq in Square::iter() {
            if let Some((c, pk)) = pos.piece_at(sq) {
                if c == them && !pos.attackers_to(sq, us).is_empty() {
                    total += pk.value() / 10;
                }
            }
        }
        total
    }

    fn creates_passed_pawn<P: Position>(pos: &P, us: Color, pawn_sq: Square) -> bool {
        let them = !us;
        let file = pawn_sq.file() as i32;
        for sq in Square::iter() {
            if let Some((c, PieceKind::Pawn)) = pos.piece_at(sq) {
                if c != them {
                    continue;
                }
                let f = sq.file() as i32;
                if (f - file).abs() > 1 {
                    continue;
                }
                let ahead = match us {
                    Color::White => sq.rank() as i32 > pawn_sq.rank() as i32,
                    Color::Black => (sq.rank() as i32) < pawn_sq.rank() as i32,
                };
                if ahead {
                    return false;
                }
            }
        }
        true
    }

    pub fn record_cutoff(
        &mut self,
        color: Color,
        moving_kind: PieceKind,
        m: Move,
        ply: usize,
        depth: i8,
        opponent_last_move: Option<Move>,
        our_second_last_move: Option<Move>,
    ) {
        self.killers.update(ply, m);
        let exceeded_threshold = self.history.record_cutoff(color, m.from(), m.to(), depth);
        self.piece_history.record_cutoff(color, moving_kind, m.from(), m.to(), depth);
        let d = i32::from(depth);
        self.threat.bump(color, m.from(), m.to(), d * d + d);
        if let Some(opp) = opponent_last_move {
            self.countermove.update(opp, m);
        }
        if let Some(ours) = our_second_last_move {
            self.followup.update(ours, m);
        }
        if exceeded_threshold {
            self.age_history_families();
        }
    }

    pub fn record_tried_quiet(&mut self, color: Color, m: Move) {
        self.history.record_tried(color, m.from(), m.to());
    }
}

/// Scores every move in `list` and prepares it for `MoveList::pick_move`
/// selection-sort iteration.
pub fn score_all<P: Position>(
    tables: &OrderingTables,
    pos: &mut P,
    list: &mut MoveList,
    ply: usize,
    hash_move: Option<Move>,
    opponent_last_move: Option<Move>,
    our_second_last_move: Option<Move>,
) {
    for entry in list.arr.iter_mut() {
        entry.score =
            tables.score_move(pos, entry.m, ply, hash_move, opponent_last_move, our_second_last_move);
    }
}

pub fn is_quiet<P: Position>(pos: &P, m: Move) -> bool {
    !m.is_en_passant() && pos.piece_at(m.to()).is_none() && m.promotion().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ChessBoard;

    #[test]
    fn hash_move_dominates_every_other_bonus() {
        let tables = OrderingTables::default();
        let mut board = ChessBoard::starting_position();
        let m = board.legal_moves()[0];
        let score = tables.score_move(&mut board, m, 0, Some(m), None, None);
        assert_eq!(score, HASH_MOVE_BONUS);
    }

    #[test]
    fn quiet_opening_move_scores_below_any_capture_bonus() {
        let tables = OrderingTables::default();
        let mut board = ChessBoard::starting_position();
        let quiet = board.legal_moves().into_iter().find(|m| is_quiet(&board, *m)).unwrap();
        let score = tables.score_move(&mut board, quiet, 0, None, None, None);
        assert!(score < CAPTURE_BASE);
    }

    #[test]
    fn cutoff_populates_the_threat_table() {
        let mut tables = OrderingTables::default();
        let mut board = ChessBoard::starting_position();
        let m = board.legal_moves().into_iter().find(|m| is_quiet(&board, *m)).unwrap();
        let (_, moving_kind) = board.piece_at(m.from()).unwrap();
        tables.record_cutoff(Color::White, moving_kind, m, 0, 4, None, None);
        assert!(tables.threat.score(Color::White, m.from(), m.to()) > 0);
    }

    #[test]
    fn periodic_aging_halves_every_history_family() {
        let mut tables = OrderingTables::default();
        let mut board = ChessBoard::starting_position();
        let m = board.legal_moves().into_iter().find(|m| is_quiet(&board, *m)).unwrap();
        let (_, moving_kind) = board.piece_at(m.from()).unwrap();
        tables.record_cutoff(Color::White, moving_kind, m, 0, 4, None, None);
        let before = tables.history.score(Color::White, m.from(), m.to());
        assert!(before > 0);
        for _ in 0..AGING_EVAL_INTERVAL {
            tables.record_evaluation();
        }
        assert!(tables.history.score(Color::White, m.from(), m.to()) < before);
    }
}
