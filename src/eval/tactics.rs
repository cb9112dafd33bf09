use crate::moves::mv::Move;
use crate::position::Position;
use crate::types::{Color, PieceKind, Square};

fn least_valuable_attacker<P: Position>(pos: &P, sq: Square, by: Color) -> Option<PieceKind> {
    pos.attackers_to(sq, by).iter().filter_map(|s| pos.piece_at(s).map(|(_, pk)| pk)).min_by_key(|pk| pk.value())
}

/// Attacked-but-undefended and attacked-but-underdefended penalties for every
/// non-king piece, white's perspective (spec.md §4.5).
pub fn tactical_safety_score<P: Position>(pos: &P) -> i32 {
    let mut score = 0;
    for sq in Square::iter() {
        let Some((color, pk)) = pos.piece_at(sq) else { continue };
        if pk == PieceKind::King {
            continue;
        }
        let sign = if color == Color::White { 1 } else { -1 };
        let attacker = least_valuable_attacker(pos, sq, !color);
        let Some(attacker) = attacker else { continue };
        let defended = least_valuable_attacker(pos, sq, color).is_some();
        if !defended {
            score -= sign * 2 * pk.value();
        } else if attacker.value() < pk.value() {
            score -= sign * (pk.value() - attacker.value()) / 2;
        }
    }
    score
}

/// Hanging-piece penalty weighted ×10, white's perspective. Only considers
/// a piece's own side being hung (mirrored by the caller for black).
pub fn blunder_score<P: Position>(pos: &P) -> i32 {
    let mut score = 0;
    for sq in Square::iter() {
        let Some((color, pk)) = pos.piece_at(sq) else { continue };
        if pk == PieceKind::King {
            continue;
        }
        if least_valuable_attacker(pos, sq, !color).is_none() {
            continue;
        }
        if least_valuable_attacker(pos, sq, color).is_some() {
            continue;
        }
        let sign = if color == Color::White { 1 } else { -1 };
        let penalty = match pk {
            PieceKind::Queen => 5000,
            PieceKind::Rook => 2000,
            PieceKind::Knight | PieceKind::Bishop => 500 * pk.value() / 100,
            PieceKind::Pawn => 0,
            PieceKind::King => 0,
        };
        score -= sign * penalty * 10;
    }
    score
}

/// Penalizes checks whose checking piece lands on a square the opponent
/// attacks and leaves undefended — "cheap check" bias prevention.
pub fn safe_check_penalty<P: Position + Clone>(pos: &P, check_moves: &[Move]) -> i32 {
    let us = pos.side_to_move();
    let mut score = 0;
    for &m in check_moves {
        let mut next = pos.clone();
        next.do_move(m);
        if !next.is_king_attacked() {
            continue;
        }
        let to = m.to();
        let attacked = next.attackers_to(to, !us).count() > 0;
        let defended = next.attackers_to(to, us).count() > 0;
        if attacked && !defended {
            let Some((_, moved_kind)) = next.piece_at(to) else { continue };
            let penalty = if moved_kind == PieceKind::Queen { 5000 } else { 3000 };
            score -= if us == Color::White { penalty } else { -penalty };
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ChessBoard;

    #[test]
    fn starting_position_has_no_tactics() {
        let board = ChessBoard::starting_position();
        assert_eq!(tactical_safety_score(&board), 0);
        assert_eq!(blunder_score(&board), 0);
    }

    #[test]
    fn undefended_attacked_rook_is_penalized() {
        let board = ChessBoard::from_fen("4k3/8/8/8/8/4b3/8/3RK3 w - - 0 1").unwrap();
        assert!(tactical_safety_score(&board) < 0);
        assert!(blunder_score(&board) < 0);
    }

    #[test]
    fn unsafe_check_is_penalized_for_the_mover() {
        // Rd1-d6+ lands on a square the black knight on b7 attacks and
        // nothing white defends: a cheap, unsafe check.
        let board = ChessBoard::from_fen("3k4/1n6/8/8/8/8/8/3RK3 w - - 0 1").unwrap();
        let moves = board.legal_moves();
        assert!(safe_check_penalty(&board, &moves) < 0);
    }
}
