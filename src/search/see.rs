use crate::moves::mv::Move;
use crate::position::Position;
use crate::types::PieceKind;

/// Simplified one-ply static exchange evaluation, spec.md §4.4.4: make the
/// move, then ask whether the landing square is defended. A full swap-off
/// list would be more accurate but costs an unmake per candidate attacker;
/// this is the contract's explicitly sanctioned cheaper substitute.
pub fn see<P: Position>(pos: &mut P, m: Move) -> i32 {
    let Some((_, victim)) = pos.piece_at(m.to()) else { return 0 };
    let gain0 = victim.value();
    let us = pos.side_to_move();
    let Some((_, attacker_kind)) = pos.piece_at(m.from()) else { return gain0 };

    pos.do_move(m);
    let defended = !pos.attackers_to(m.to(), !us).is_empty();
    pos.undo_move();

    if !defended {
        return gain0;
    }

    let mut score = gain0 - attacker_kind.value();
    if attacker_kind.value() > victim.value() {
        score -= (attacker_kind.value() - victim.value()) / 2;
    }
    score
}

/// `true` if capturing on `m.to()` looks safe enough to search in
/// quiescence (spec.md §4.4.3's SEE-pruning threshold of `-50`).
pub fn see_ge<P: Position>(pos: &mut P, m: Move, threshold: i32) -> bool {
    see(pos, m) >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ChessBoard;
    use crate::moves::mv::{Move, MoveFlag};
    use crate::types::Square;

    #[test]
    fn undefended_capture_returns_full_victim_value() {
        let mut board =
            ChessBoard::from_fen("4k3/8/8/8/8/8/8/R3Kr2 w - - 0 1").unwrap();
        let m = Move::new(Square::from_algebraic("a1").unwrap(), Square::from_algebraic("f1").unwrap(), MoveFlag::Normal);
        assert_eq!(see(&mut board, m), PieceKind::Rook.value());
    }

    #[test]
    fn defended_capture_by_a_pawn_costs_more_than_it_wins() {
        // White rook takes a pawn on e5, which is defended by a black pawn on d6.
        let mut board = ChessBoard::from_fen("4k3/8/3p4/4p3/8/8/8/4R1K1 w - - 0 1").unwrap();
        let m = Move::new(Square::from_algebraic("e1").unwrap(), Square::from_algebraic("e5").unwrap(), MoveFlag::Normal);
        assert!(see(&mut board, m) < PieceKind::Pawn.value());
    }
}
