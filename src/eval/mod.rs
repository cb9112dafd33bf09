pub mod cache;
pub mod endgame;
pub mod king_safety;
pub mod material;
pub mod mobility;
pub mod patterns;
pub mod pawns;
pub mod pst;
pub mod tactics;

use crate::board::chess_board::{CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ};
use crate::position::Position;
use crate::types::{Color, PieceKind, Square};

pub const MATE: i32 = 20_000;
pub const MATE_THRESHOLD: i32 = 9_000;

const OPENING_MATERIAL_THRESHOLD: i32 = 7_800;
const ENDGAME_MATERIAL_THRESHOLD: i32 = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Opening,
    Middlegame,
    Endgame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionType {
    Tactical,
    Open,
    Closed,
    Balanced,
}

fn total_piece_count<P: Position>(pos: &P) -> u32 {
    Square::iter().filter(|&sq| pos.piece_at(sq).is_some()).count() as u32
}

fn open_file_count<P: Position>(pos: &P) -> u32 {
    (0..8u8)
        .filter(|&file| {
            !Square::iter().any(|sq| sq.file() == file && matches!(pos.piece_at(sq), Some((_, PieceKind::Pawn))))
        })
        .count() as u32
}

fn contested_piece_count<P: Position>(pos: &P) -> u32 {
    Square::iter()
        .filter(|&sq| match pos.piece_at(sq) {
            Some((c, pk)) if pk != PieceKind::King => !pos.attackers_to(sq, !c).is_empty(),
            _ => false,
        })
        .count() as u32
}

pub fn classify_phase<P: Position>(pos: &P) -> GamePhase {
    let material = material::total_non_king_material(pos);
    if material >= OPENING_MATERIAL_THRESHOLD {
        GamePhase::Opening
    } else if material <= ENDGAME_MATERIAL_THRESHOLD {
        GamePhase::Endgame
    } else {
        GamePhase::Middlegame
    }
}

pub fn classify_position<P: Position>(pos: &P) -> PositionType {
    let pieces = total_piece_count(pos);
    let open_files = open_file_count(pos);
    if pieces < 20 && contested_piece_count(pos) >= 4 {
        PositionType::Tactical
    } else if open_files >= 4 {
        PositionType::Open
    } else if open_files <= 2 {
        PositionType::Closed
    } else {
        PositionType::Balanced
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Row {
    Material,
    Activity,
    KingSafety,
    PawnStructure,
    Tactical,
}

fn phase_multiplier(row: Row, phase: GamePhase) -> f64 {
    use GamePhase::*;
    use Row::*;
    match (row, phase) {
        (Tactical, Opening) => 0.8,
        (Tactical, Middlegame) => 1.2,
        (Tactical, Endgame) => 0.9,
        (Activity, Opening) => 1.5,
        (Activity, Middlegame) => 1.1,
        (Activity, Endgame) => 1.0,
        (KingSafety, Opening) => 1.2,
        (KingSafety, Middlegame) => 1.0,
        (KingSafety, Endgame) => 1.4,
        (PawnStructure, Opening) => 1.0,
        (PawnStructure, Middlegame) => 1.0,
        (PawnStructure, Endgame) => 1.3,
        (Material, _) => 1.0,
    }
}

fn position_multiplier(row: Row, position: PositionType) -> f64 {
    use PositionType::*;
    use Row::*;
    match (row, position) {
        (_, Balanced) => 1.0,
        (Tactical, Closed) => 0.9,
        (Tactical, Open) => 1.1,
        (Tactical, Tactical) => 1.3,
        (Activity, Closed) => 1.0,
        (Activity, Open) => 1.2,
        (Activity, Tactical) => 1.0,
        (KingSafety, Closed) => 1.0,
        (KingSafety, Open) => 1.0,
        (KingSafety, Tactical) => 1.1,
        (PawnStructure, Closed) => 1.2,
        (PawnStructure, Open) => 1.0,
        (PawnStructure, Tactical) => 1.0,
        (Material, _) => 1.0,
    }
}

fn weighted(row: Row, phase: GamePhase, position: PositionType, value: i32) -> i32 {
    (value as f64 * phase_multiplier(row, phase) * position_multiplier(row, position)).round() as i32
}

fn can_castle(pos: &impl Position, color: Color) -> bool {
    let (k, q) = match color {
        Color::White => (CASTLE_WK, CASTLE_WQ),
        Color::Black => (CASTLE_BK, CASTLE_BQ),
    };
    pos.castling_rights() & (k | q) != 0
}

const CENTRE: [Square; 4] = [Square(27), Square(28), Square(35), Square(36)];

fn centre_occupancy_count<P: Position>(pos: &P, color: Color) -> i32 {
    CENTRE.iter().filter(|&&sq| matches!(pos.piece_at(sq), Some((c, _)) if c == color)).count() as i32
}

fn development_count<P: Position>(pos: &P, color: Color) -> i32 {
    let back_rank = if color == Color::White { 0 } else { 7 };
    Square::iter()
        .filter(|&sq| {
            matches!(pos.piece_at(sq), Some((c, pk)) if c == color && matches!(pk, PieceKind::Knight | PieceKind::Bishop) && sq.rank() != back_rank)
        })
        .count() as i32
}

fn piece_coordination_count<P: Position>(pos: &P, color: Color) -> i32 {
    Square::iter()
        .filter(|&sq| matches!(pos.piece_at(sq), Some((c, pk)) if c == color && pk != PieceKind::King) && !pos.attackers_to(sq, color).is_empty())
        .count() as i32
}

fn passed_pawn_count<P: Position>(pos: &P, color: Color) -> i32 {
    Square::iter()
        .filter(|&sq| {
            if pos.piece_at(sq) != Some((color, PieceKind::Pawn)) {
                return false;
            }
            !Square::iter().any(|s| {
                pos.piece_at(s) == Some((!color, PieceKind::Pawn))
                    && s.file().abs_diff(sq.file()) <= 1
                    && match color {
                        Color::White => s.rank() > sq.rank(),
                        Color::Black => s.rank() < sq.rank(),
                    }
            })
        })
        .count() as i32
}

fn king_activity_bonus<P: Position>(pos: &P, color: Color) -> i32 {
    let king = Square::iter().find(|&sq| pos.piece_at(sq) == Some((color, PieceKind::King)));
    king.map_or(0, |sq| 20 - 4 * CENTRE.iter().map(|&c| sq.dist(c) as i32).min().unwrap_or(4))
}

fn additive_bonus_one_side<P: Position>(pos: &P, color: Color, phase: GamePhase, position: PositionType) -> i32 {
    let mut b = 0;
    match phase {
        GamePhase::Opening => {
            if can_castle(pos, color) {
                b += 50;
            }
            b += 2 * centre_occupancy_count(pos, color);
            b += 5 * development_count(pos, color);
        }
        GamePhase::Middlegame => {
            b += 3 * piece_coordination_count(pos, color);
        }
        GamePhase::Endgame => {
            b += king_activity_bonus(pos, color);
            b += 10 * passed_pawn_count(pos, color);
        }
    }
    b += match position {
        PositionType::Closed => 50,
        PositionType::Open => 30,
        PositionType::Tactical => 100,
        PositionType::Balanced => 10,
    };
    b
}

/// Composite static evaluator. Returns a score in the side-to-move's POV
/// (negamax convention). `ply` is the distance from the search root, used
/// to make mate scores shorter-is-better.
pub struct Evaluator {
    cache: Option<cache::EvalCache>,
}

impl Evaluator {
    pub fn new(cache_capacity: Option<usize>) -> Self {
        Self { cache: cache_capacity.map(cache::EvalCache::new) }
    }

    pub fn cache_stats(&self) -> Option<cache::CacheStats> {
        self.cache.as_ref().map(|c| c.stats())
    }

    pub fn new_search(&mut self) {
        if let Some(cache) = &mut self.cache {
            cache.clear();
        }
    }

    pub fn evaluate<P: Position>(&mut self, pos: &P, ply: u32) -> i32 {
        if pos.is_mated() {
            return -(MATE - ply as i32);
        }
        if pos.is_draw() {
            return 0;
        }

        let key = pos.zobrist_hash();
        if let Some(cache) = &mut self.cache {
            if let Some(score) = cache.get(key) {
                return Self::to_side_to_move(pos, score);
            }
        }

        let white_score = Self::evaluate_white_perspective(pos);

        if let Some(cache) = &mut self.cache {
            cache.insert(key, white_score);
        }

        Self::to_side_to_move(pos, white_score)
    }

    fn to_side_to_move<P: Position>(pos: &P, white_score: i32) -> i32 {
        if pos.side_to_move() == Color::White {
            white_score
        } else {
            -white_score
        }
    }

    fn evaluate_white_perspective<P: Position>(pos: &P) -> i32 {
        let phase = classify_phase(pos);
        let position = classify_position(pos);
        let endgame = phase == GamePhase::Endgame;

        let mut score = 0;
        score += weighted(Row::Material, phase, position, material::material_score(pos));
        score += weighted(Row::Material, phase, position, pst::pst_score(pos));
        score += weighted(Row::Activity, phase, position, mobility::activity_score(pos));
        score += weighted(Row::PawnStructure, phase, position, pawns::pawn_structure_score(pos, endgame));
        score += weighted(Row::KingSafety, phase, position, king_safety::king_safety_score(pos, endgame));
        score += weighted(Row::Tactical, phase, position, tactics::tactical_safety_score(pos));
        score += weighted(Row::Tactical, phase, position, tactics::blunder_score(pos));
        score += weighted(Row::Tactical, phase, position, patterns::simple_tactical_patterns_score(pos));
        score += weighted(Row::Tactical, phase, position, patterns::tactical_pattern_evaluator_score(pos));
        let stm_check_moves = pos.legal_moves();
        score += weighted(Row::Tactical, phase, position, tactics::safe_check_penalty(pos, &stm_check_moves));
        score += endgame::endgame_score(pos);

        score += additive_bonus_one_side(pos, Color::White, phase, position)
            - additive_bonus_one_side(pos, Color::Black, phase, position);

        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ChessBoard;

    #[test]
    fn starting_position_is_roughly_balanced() {
        let board = ChessBoard::starting_position();
        let mut eval = Evaluator::new(None);
        let score = eval.evaluate(&board, 0);
        assert!(score.abs() < 200, "expected near-zero score, got {score}");
    }

    #[test]
    fn classify_phase_detects_opening_material() {
        let board = ChessBoard::starting_position();
        assert_eq!(classify_phase(&board), GamePhase::Opening);
    }

    #[test]
    fn classify_phase_detects_endgame_material() {
        let board = ChessBoard::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        assert_eq!(classify_phase(&board), GamePhase::Endgame);
    }

    #[test]
    fn fools_mate_scores_as_mate_in_zero_for_the_mated_side() {
        let board =
            ChessBoard::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 0 3").unwrap();
        assert!(board.is_mated());
        let mut eval = Evaluator::new(None);
        let score = eval.evaluate(&board, 3);
        assert_eq!(score, -(MATE - 3));
    }

    #[test]
    fn eval_cache_hits_on_repeated_probe() {
        let board = ChessBoard::starting_position();
        let mut eval = Evaluator::new(Some(64));
        let _ = eval.evaluate(&board, 0);
        let _ = eval.evaluate(&board, 0);
        assert_eq!(eval.cache_stats().unwrap().hits, 1);
    }
}
