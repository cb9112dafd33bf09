use crate::moves::attack_tables::{knight_attacks, pawn_attacks};
use crate::position::Position;
use crate::types::{Bitboard, Color, PieceKind, Square};

const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

fn occupied<P: Position>(pos: &P) -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    for sq in Square::iter() {
        if pos.piece_at(sq).is_some() {
            bb.set(sq);
        }
    }
    bb
}

/// First two occupied squares walking outward from `from` along `(df, dr)`,
/// nearest first. Used to spot pins, skewers, and discovered attacks without
/// a full ray-attack rebuild per direction.
fn first_two_along<P: Position>(pos: &P, from: Square, df: i8, dr: i8) -> [Option<Square>; 2] {
    let mut hits = [None, None];
    let (mut f, mut r) = (from.file() as i8, from.rank() as i8);
    let mut found = 0;
    loop {
        f += df;
        r += dr;
        if !(0..8).contains(&f) || !(0..8).contains(&r) {
            break;
        }
        let sq = Square((r * 8 + f) as u8);
        if pos.piece_at(sq).is_some() {
            hits[found] = Some(sq);
            found += 1;
            if found == 2 {
                break;
            }
        }
    }
    hits
}

fn slider_dirs(pk: PieceKind) -> &'static [(i8, i8)] {
    match pk {
        PieceKind::Bishop => &BISHOP_DIRS,
        PieceKind::Rook => &ROOK_DIRS,
        PieceKind::Queen => &[(1, 1), (1, -1), (-1, 1), (-1, -1), (1, 0), (-1, 0), (0, 1), (0, -1)],
        _ => &[],
    }
}

struct LineTactics {
    pins: i32,
    skewers: i32,
    discovered: i32,
}

fn line_tactics<P: Position>(pos: &P, color: Color) -> LineTactics {
    let mut out = LineTactics { pins: 0, skewers: 0, discovered: 0 };
    for sq in Square::iter() {
        let Some((c, pk)) = pos.piece_at(sq) else { continue };
        if c != color {
            continue;
        }
        for &(df, dr) in slider_dirs(pk) {
            let [first, second] = first_two_along(pos, sq, df, dr);
            let (Some(first), Some(second)) = (first, second) else { continue };
            let Some((c1, pk1)) = pos.piece_at(first) else { continue };
            let Some((c2, pk2)) = pos.piece_at(second) else { continue };

            if c1 != color && c2 != color {
                if pk2 == PieceKind::King {
                    out.pins += 1;
                } else if pk1.value() > pk2.value() {
                    out.skewers += 1;
                }
            } else if c1 == color && c2 != color {
                out.discovered += 1;
            }
        }
    }
    out
}

fn enemy_attacked_squares<P: Position>(pos: &P, attacker_sq: Square, attacker_kind: PieceKind, occ: Bitboard) -> Bitboard {
    use crate::moves::attack_tables::{bishop_attacks, queen_attacks, rook_attacks};
    match attacker_kind {
        PieceKind::Knight => knight_attacks(attacker_sq),
        PieceKind::Bishop => bishop_attacks(attacker_sq, occ),
        PieceKind::Rook => rook_attacks(attacker_sq, occ),
        PieceKind::Queen => queen_attacks(attacker_sq, occ),
        PieceKind::King => crate::moves::attack_tables::king_attacks(attacker_sq),
        PieceKind::Pawn => pawn_attacks(attacker_sq, pos.piece_at(attacker_sq).map(|(c, _)| c).unwrap_or(Color::White)),
    }
}

fn double_attack_count<P: Position>(pos: &P, color: Color) -> i32 {
    let occ = occupied(pos);
    let mut count = 0;
    for sq in Square::iter() {
        let Some((c, pk)) = pos.piece_at(sq) else { continue };
        if c != color || pk == PieceKind::Pawn {
            continue;
        }
        let attacked = enemy_attacked_squares(pos, sq, pk, occ);
        let hits = attacked.iter().filter(|&s| matches!(pos.piece_at(s), Some((ec, _)) if ec != color)).count();
        if hits >= 2 {
            count += 1;
        }
    }
    count
}

fn knight_fork_info<P: Position>(pos: &P, color: Color) -> (i32, i32) {
    let mut forks = 0;
    let mut royal_forks = 0;
    for sq in Square::iter() {
        if pos.piece_at(sq) != Some((color, PieceKind::Knight)) {
            continue;
        }
        let targets = knight_attacks(sq);
        let mut hit_count = 0;
        let mut hits_king = false;
        for t in targets.iter() {
            match pos.piece_at(t) {
                Some((c, PieceKind::King)) if c != color => {
                    hit_count += 1;
                    hits_king = true;
                }
                Some((c, pk)) if c != color && pk != PieceKind::Pawn => hit_count += 1,
                _ => {}
            }
        }
        if hit_count >= 2 {
            forks += 1;
            if hits_king {
                royal_forks += 1;
            }
        }
    }
    (forks, royal_forks)
}

fn pawn_fork_count<P: Position>(pos: &P, color: Color) -> i32 {
    let mut count = 0;
    for sq in Square::iter() {
        if pos.piece_at(sq) != Some((color, PieceKind::Pawn)) {
            continue;
        }
        let hit_count = pawn_attacks(sq, color)
            .iter()
            .filter(|&t| matches!(pos.piece_at(t), Some((c, pk)) if c != color && pk != PieceKind::Pawn))
            .count();
        if hit_count >= 2 {
            count += 1;
        }
    }
    count
}

fn hanging_enemy_value<P: Position>(pos: &P, color: Color) -> i32 {
    let mut total = 0;
    for sq in Square::iter() {
        let Some((c, pk)) = pos.piece_at(sq) else { continue };
        if c == color || pk == PieceKind::King {
            continue;
        }
        let attacked = !pos.attackers_to(sq, color).is_empty();
        let defended = !pos.attackers_to(sq, !color).is_empty();
        if attacked && !defended {
            total += pk.value();
        }
    }
    total
}

fn back_rank_threat<P: Position>(pos: &P, color: Color) -> bool {
    let enemy = !color;
    let back_rank = if enemy == Color::White { 0u8 } else { 7u8 };
    let king_sq = Square::iter().find(|&s| pos.piece_at(s) == Some((enemy, PieceKind::King)));
    let Some(king_sq) = king_sq else { return false };
    if king_sq.rank() != back_rank {
        return false;
    }

    let escape_rank = if enemy == Color::White { 1i32 } else { 6i32 };
    let mut trapped = true;
    for df in -1i32..=1 {
        let f = king_sq.file() as i32 + df;
        if !(0..8).contains(&f) {
            continue;
        }
        let sq = Square((escape_rank * 8 + f) as u8);
        if pos.piece_at(sq).map(|(c, _)| c) != Some(enemy) {
            trapped = false;
            break;
        }
    }
    if !trapped {
        return false;
    }

    let occ = occupied(pos);
    Square::iter().any(|sq| {
        matches!(pos.piece_at(sq), Some((c, PieceKind::Rook | PieceKind::Queen)) if c == color)
            && sq.rank() == king_sq.rank()
            && crate::moves::attack_tables::rook_attacks(sq, occ).contains(king_sq)
    })
}

/// Sums the "simple" tactical-pattern bonuses from `color`'s perspective:
/// knight/pawn forks, back-rank mate threats, double attacks, and hanging
/// enemy material (spec.md §4.5).
fn simple_patterns_one_side<P: Position>(pos: &P, color: Color) -> i32 {
    let mut score = 0;
    let (forks, royal_forks) = knight_fork_info(pos, color);
    score += 600 * forks + 600 * royal_forks;
    score += 300 * pawn_fork_count(pos, color);
    if back_rank_threat(pos, color) {
        score += 800;
    }
    score += 450 * double_attack_count(pos, color);
    score += 400 * hanging_enemy_value(pos, color) / 100;
    score
}

/// Sums the dedicated tactical-pattern-evaluator bonuses, white minus black.
/// Spec.md §4.5 lists this as a component distinct from the simple patterns
/// above, with its own weights for the same underlying motifs.
fn pattern_evaluator_one_side<P: Position>(pos: &P, color: Color) -> i32 {
    let mut score = 0;
    let line = line_tactics(pos, color);
    score += 600 * line.pins;
    score += 700 * line.skewers;
    score += 650 * line.discovered;
    score += 500 * double_attack_count(pos, color);
    let (forks, royal_forks) = knight_fork_info(pos, color);
    score += 850 * forks;
    score += 1200 * royal_forks;
    if back_rank_threat(pos, color) {
        score += 900;
    }
    score
}

pub fn simple_tactical_patterns_score<P: Position>(pos: &P) -> i32 {
    simple_patterns_one_side(pos, Color::White) - simple_patterns_one_side(pos, Color::Black)
}

pub fn tactical_pattern_evaluator_score<P: Position>(pos: &P) -> i32 {
    pattern_evaluator_one_side(pos, Color::White) - pattern_evaluator_one_side(pos, Color::Black)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ChessBoard;

    #[test]
    fn starting_position_has_no_patterns() {
        let board = ChessBoard::starting_position();
        assert_eq!(simple_tactical_patterns_score(&board), 0);
        assert_eq!(tactical_pattern_evaluator_score(&board), 0);
    }

    #[test]
    fn forking_knight_scores_positive_for_the_attacker() {
        // White knight on e5 forks the black rook on c6 and queen on g6.
        let board = ChessBoard::from_fen("4k3/8/2r3q1/4N3/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(simple_tactical_patterns_score(&board) > 0);
        assert!(tactical_pattern_evaluator_score(&board) > 0);
    }

    #[test]
    fn pinned_bishop_is_detected() {
        // White queen on e2 pins the black bishop on e5 to the black king on e8.
        let board = ChessBoard::from_fen("4k3/8/8/4b3/8/8/4Q3/4K3 w - - 0 1").unwrap();
        assert!(tactical_pattern_evaluator_score(&board) > 0);
    }
}
